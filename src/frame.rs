use reqwest::Client;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::config::FrameConfig;
use crate::constants::{COMMAND_PATH, LOAD_MEDIA_PATH, SETTINGS_PATH};
use crate::error::Result;
use crate::image_server::{resolve_local_address, ImageServer};
use crate::types::{Command, FrameSettings, LoadMediaRequest, PowerState};

/// Connection to a single Depict frame.
///
/// Holds the settings from the last successful [`Frame::update`]. Setters only
/// send commands; call `update()` afterwards to see their effect.
pub struct Frame {
    client: Client,
    config: FrameConfig,
    settings: FrameSettings,
}

impl Frame {
    /// Connect to the frame at `ip` with default ports and timeouts.
    pub async fn connect(ip: impl Into<String>) -> Result<Self> {
        Self::connect_with(FrameConfig::new(ip)).await
    }

    /// Build a client from `config` and fetch the current settings.
    #[instrument(skip_all, fields(ip = %config.ip))]
    pub async fn connect_with(config: FrameConfig) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .deflate(true)
            .timeout(config.request_timeout())
            .build()?;

        let settings = fetch_settings(&client, &config).await?;
        info!(name = %settings.name, power = %settings.power, "Connected to frame");

        Ok(Self { client, config, settings })
    }

    /// Refresh the mirrored settings. On failure the previous values are kept.
    pub async fn update(&mut self) -> Result<()> {
        self.settings = fetch_settings(&self.client, &self.config).await?;
        Ok(())
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn orientation(&self) -> &str {
        &self.settings.orientation
    }

    pub fn brightness(&self) -> f64 {
        self.settings.brightness
    }

    pub fn contrast(&self) -> f64 {
        self.settings.contrast
    }

    pub fn is_on(&self) -> bool {
        self.settings.is_on()
    }

    pub async fn set_brightness(&self, brightness: f64) -> Result<()> {
        self.send_command(Command::Brightness(brightness)).await
    }

    pub async fn set_contrast(&self, contrast: f64) -> Result<()> {
        self.send_command(Command::Contrast(contrast)).await
    }

    pub async fn sleep(&self) -> Result<()> {
        self.send_command(Command::Power(PowerState::Down)).await
    }

    pub async fn wakeup(&self) -> Result<()> {
        self.send_command(Command::Power(PowerState::Up)).await
    }

    /// Show the local image at `file_path`.
    ///
    /// The file is hosted on a one-shot server reachable from the frame and the
    /// frame is told to load it. Returns after the frame has downloaded the file
    /// and the server has shut down.
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub async fn upload_image(&self, file_path: impl AsRef<Path>) -> Result<()> {
        let local_ip = match self.config.local_address {
            Some(addr) => addr,
            None => resolve_local_address(&self.config.ip)?,
        };

        let mut server = ImageServer::start(file_path, local_ip, self.config.serve_port).await?;

        if let Err(e) = self.set_image_url(server.url()).await {
            warn!("Frame rejected load request, stopping image server");
            if let Err(stop_err) = server.stop().await {
                warn!(error = %stop_err, "Image server did not stop cleanly");
            }
            return Err(e);
        }

        let delivered = server.wait_delivered(self.config.serve_timeout()).await;
        server.stop().await?;
        delivered?;

        info!("Image delivered to frame");
        Ok(())
    }

    /// Tell the frame's player to load and display `url`.
    #[instrument(skip(self))]
    pub async fn set_image_url(&self, url: &str) -> Result<()> {
        let endpoint = self.config.media_url(LOAD_MEDIA_PATH);
        debug!(%endpoint, "Sending load_media");

        let response = self
            .client
            .post(&endpoint)
            .json(&LoadMediaRequest::new(url))
            .send()
            .await?
            .error_for_status()?;
        // Body carries nothing useful but is drained so the connection can be reused
        let _ = response.text().await?;
        Ok(())
    }

    /// Release the underlying HTTP client. Dropping the frame does the same.
    pub fn close(self) {
        debug!(ip = %self.config.ip, "Closing frame connection");
    }

    async fn send_command(&self, command: Command) -> Result<()> {
        let url = self
            .config
            .control_url(&format!("{}/{}", COMMAND_PATH, command.name()));
        debug!(%url, ?command, "Sending command");

        self.client
            .post(&url)
            .query(&command.query())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

async fn fetch_settings(client: &Client, config: &FrameConfig) -> Result<FrameSettings> {
    let url = config.control_url(SETTINGS_PATH);
    debug!(%url, "Fetching settings");

    let body = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    // The frame doesn't send a JSON content type, so parse the raw body
    Ok(serde_json::from_slice(&body)?)
}
