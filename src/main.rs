use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use depict_control::constants::DEFAULT_CONFIG_PATH;
use depict_control::{logging, Config, Frame, FrameConfig};

#[derive(Parser)]
#[command(name = "depict")]
#[command(about = "Control a Depict digital art frame")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Frame IP address; skips the config file when given
    #[arg(long)]
    ip: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the frame's current settings
    Status,
    /// Set display brightness
    Brightness { level: f64 },
    /// Set display contrast
    Contrast { level: f64 },
    /// Put the frame to sleep
    Sleep,
    /// Wake the frame up
    Wake,
    /// Display a local image file
    Show { path: PathBuf },
    /// Display an image the frame can already reach by URL
    LoadUrl { url: String },
}

fn load_frame_config(cli: &Cli) -> anyhow::Result<FrameConfig> {
    let mut frame_config = match &cli.ip {
        Some(ip) => FrameConfig::new(ip.clone()),
        None => {
            Config::load_from(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?
                .frame
        }
    };
    frame_config.apply_env_overrides()?;
    Ok(frame_config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let frame_config = load_frame_config(&cli)?;
    let mut frame = Frame::connect_with(frame_config)
        .await
        .context("connecting to frame")?;

    match cli.command {
        Commands::Status => {}
        Commands::Brightness { level } => {
            frame.set_brightness(level).await?;
            frame.update().await?;
        }
        Commands::Contrast { level } => {
            frame.set_contrast(level).await?;
            frame.update().await?;
        }
        Commands::Sleep => {
            frame.sleep().await?;
            frame.update().await?;
        }
        Commands::Wake => {
            frame.wakeup().await?;
            frame.update().await?;
        }
        Commands::Show { path } => {
            frame.upload_image(&path).await?;
            info!(path = %path.display(), "Image shown");
        }
        Commands::LoadUrl { url } => {
            frame.set_image_url(&url).await?;
        }
    }

    let settings = frame.settings();
    println!("Name:        {}", settings.name);
    println!("Power:       {}", settings.power);
    println!("Orientation: {}", settings.orientation);
    println!("Brightness:  {}", settings.brightness);
    println!("Contrast:    {}", settings.contrast);

    frame.close();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}
