//! Photo Caption Verifier
//!
//! Command line front end: `verify` checks one image from disk and prints the
//! verdict, `serve` starts the HTTP API and upload page.

use anyhow::{Context, Result};
use caption_verifier::api::endpoints::{AppState, serve};
use caption_verifier::core::config::Config;
use caption_verifier::core::constants::defaults;
use caption_verifier::core::logging::init_logging;
use caption_verifier::core::provider::build_provider;
use caption_verifier::verifier::CaptionVerifier;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "caption-verifier",
    about = "Verify if a caption matches an image using a vision-capable language model",
    version
)]
struct Cli {
    /// Path to a TOML configuration file (default: $CONFIG_PATH or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify if a caption matches an image
    Verify {
        /// Path to the image file
        #[arg(short, long, default_value = defaults::IMAGE_PATH)]
        image: PathBuf,

        /// Caption to verify
        #[arg(short, long, default_value = defaults::CAPTION)]
        caption: String,

        /// Additional instructions for verification
        #[arg(short = 'n', long, default_value = defaults::INSTRUCTIONS)]
        instructions: String,
    },
    /// Start the HTTP API and web page
    Serve {
        /// Host to bind to (default from configuration)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default from configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);

    let outcome = match cli.command {
        Commands::Verify {
            image,
            caption,
            instructions,
        } => run_verify(&config, image, caption, instructions).await,
        Commands::Serve { host, port } => run_serve(config, host, port).await,
    };

    if let Err(e) = outcome {
        println!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_verify(
    config: &Config,
    image: PathBuf,
    caption: String,
    instructions: String,
) -> Result<()> {
    let provider = build_provider(config)?;
    let verifier = CaptionVerifier::from_config(config, provider);

    let result = verifier
        .verify_from_path(&image, &caption, Some(instructions.as_str()))
        .await?;

    println!("Verification Result: {}", result.verification_text);
    Ok(())
}

async fn run_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    if !config.validate_api_key() {
        warn!(
            "API key for {:?} looks invalid; verification requests will likely fail",
            config.provider
        );
    }

    let provider = build_provider(&config)?;
    let addr = format!("{}:{}", config.host, config.port);

    info!(
        "Using provider {} with model {} (max_tokens={})",
        provider.provider_name(),
        config.model,
        config.max_tokens
    );

    let state = AppState {
        verifier: CaptionVerifier::from_config(&config, provider),
        config: Arc::new(config),
    };

    serve(state, &addr)
        .await
        .with_context(|| format!("Server on {} stopped", addr))
        .inspect_err(|e| error!("Server error: {:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_defaults() {
        let cli = Cli::try_parse_from(["caption-verifier", "verify"]).unwrap();
        match cli.command {
            Commands::Verify {
                image,
                caption,
                instructions,
            } => {
                assert_eq!(image, PathBuf::from("mountains.jpg"));
                assert_eq!(caption, defaults::CAPTION);
                assert_eq!(instructions, defaults::INSTRUCTIONS);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_short_flags() {
        let cli = Cli::try_parse_from([
            "caption-verifier",
            "--config",
            "custom.toml",
            "verify",
            "-i",
            "barn.png",
            "-c",
            "A red barn",
            "-n",
            "Be strict",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Verify {
                image,
                caption,
                instructions,
            } => {
                assert_eq!(image, PathBuf::from("barn.png"));
                assert_eq!(caption, "A red barn");
                assert_eq!(instructions, "Be strict");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["caption-verifier", "serve", "-H", "127.0.0.1", "-p", "9001"])
            .unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9001));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
