//! Remote control for Depict digital art frames.
//!
//! ```no_run
//! # async fn example() -> depict_control::Result<()> {
//! let mut frame = depict_control::Frame::connect("192.168.1.40").await?;
//! println!("{} is {}", frame.name(), if frame.is_on() { "on" } else { "asleep" });
//!
//! frame.set_brightness(0.8).await?;
//! frame.upload_image("sunset.jpg").await?;
//! frame.update().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod image_server;
pub mod logging;
pub mod types;

pub use config::{Config, FrameConfig};
pub use error::{FrameError, Result};
pub use frame::Frame;
pub use types::{FrameSettings, PowerState};
