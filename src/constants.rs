/// Port of the frame's settings/command API
pub const CONTROL_PORT: u16 = 3002;

/// Port of the frame's media player app
pub const MEDIA_PORT: u16 = 56789;

/// Local port the one-shot image server listens on
pub const SERVE_PORT: u16 = 8080;

pub const SETTINGS_PATH: &str = "/settings";
pub const COMMAND_PATH: &str = "/command";
pub const LOAD_MEDIA_PATH: &str = "/apps/DepictFramePlayer/load_media";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SERVE_TIMEOUT_SECS: u64 = 120;

/// Number of random bytes hex-encoded into a served image name
pub const IMAGE_NAME_BYTES: usize = 64;

pub const DEFAULT_CONFIG_PATH: &str = "depict.toml";

// Environment overrides
pub const ENV_FRAME_IP: &str = "DEPICT_FRAME_IP";
pub const ENV_LOCAL_ADDRESS: &str = "DEPICT_LOCAL_ADDRESS";
pub const ENV_SERVE_PORT: &str = "DEPICT_SERVE_PORT";
