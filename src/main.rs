use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notescribe::cli::{Cli, Commands};
use notescribe::config::Config;
use notescribe::job::TranscriptionPipeline;
use notescribe::render::{self, RenderMode};
use notescribe::source::{self, SourceHint, ALLOWED_EXTENSIONS};
use notescribe::http;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "notescribe=debug"
    } else {
        "notescribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Transcribe {
            input,
            output,
            no_timestamps,
            audio,
            method,
        } => {
            let config = Config::load().await?;
            let pipeline = TranscriptionPipeline::new(config)?;

            // Check for required external dependencies (non-fatal)
            let missing_deps = pipeline.check_dependencies().await;
            if !missing_deps.is_empty() && !cli.quiet {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            tracing::info!("Starting transcription for input: {}", input);

            let hint = audio.then_some(SourceHint::AudioFile);
            let source = source::resolve(&input, hint)?;

            let progress = (!cli.quiet).then(|| {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.green} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner.set_message(format!("Transcribing ({})...", source.describe()));
                spinner
            });

            let result = pipeline.run(source, method.into()).await;

            if let Some(spinner) = progress {
                spinner.finish_and_clear();
            }

            let job_output = result?;

            if let Some(message) = &job_output.message {
                eprintln!("{}", message);
            }

            let mode = if no_timestamps {
                RenderMode::PlainMerged
            } else {
                RenderMode::Timestamped
            };
            let text = render::render(&job_output.sequence, mode);

            match output {
                Some(path) => {
                    fs_err::write(&path, text)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    if !text.is_empty() {
                        println!("{}", text);
                    }
                }
            }
        }
        Commands::Serve { host, port } => {
            let config = Config::load().await?;
            http::serve(config, host, port).await?;
        }
        Commands::Backends => {
            println!("Transcription backends:");
            println!("  • YouTube captions (fetched, zero compute)");
            println!("  • Whisper (on-device speech-to-text)");
            println!("  • Google Speech (cloud, 30-second window)");
            println!("Supported sources:");
            println!("  • YouTube URLs (watch, youtu.be, embed, /v/) and bare video IDs");
            println!("  • Audio files: {}", ALLOWED_EXTENSIONS.join(", "));
            println!("  • Browser microphone captures (WebM)");
        }
        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration initialized. Edit it with: notescribe config --show");
            }
        }
    }

    Ok(())
}
