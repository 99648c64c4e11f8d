// src/main.rs
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_clipper::{
    metadata, Action, ClipperConfig, Clipper, CommandLineInput, NotionHttpClient, SaveOutcome,
};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_clipper.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Results go to stdout as JSON, so log lines go to stderr.
    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Runs the requested action and prints its result as JSON.
async fn execute(config: ClipperConfig) -> anyhow::Result<bool> {
    let client = NotionHttpClient::with_base_url(&config.profile.api_key, config.base_url.as_base())
        .context("Failed to build the Notion client")?;
    let clipper = Clipper::default();
    log::info!(
        "Using database {} with key {}",
        config.profile.database_id,
        config.profile.api_key
    );

    match config.action {
        Action::Save(capture) => {
            let outcome = clipper.save(&client, &config.profile, &capture).await;
            if let SaveOutcome::Saved(report) = &outcome {
                if let Some(updated) = report.updated_profile(&config.profile) {
                    log::warn!(
                        "Title property is now {:?}; update the stored profile",
                        updated.title_property_name.as_str()
                    );
                }
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(outcome.is_success())
        }
        Action::Check => {
            let check = clipper
                .validate_configuration(&client, &config.profile.database_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Database check failed")?;
            let profile = check.apply_to(config.profile);
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(true)
        }
        Action::Labels => {
            let profile = metadata::refresh_profile(&client, &config.profile)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Could not read the database")?;
            println!("{}", serde_json::to_string_pretty(&profile.label_options)?);
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = ClipperConfig::resolve(cli).context("Invalid configuration")?;

    if !execute(config).await? {
        std::process::exit(1);
    }

    Ok(())
}
