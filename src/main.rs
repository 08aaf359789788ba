use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use qualitylock::core::{IntoEnumIterator, display_label};
use qualitylock::youtube::{build_watch_url, is_valid_video_id, is_youtube_url};
use qualitylock::{
    ChannelResolver, Config, FileStore, HttpChannelResolver, PreferenceStore, Quality,
    resolve_best_quality, target_quality,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "qualitylock",
    about = "Force a preferred YouTube playback quality",
    long_about = "Manage per-channel and default YouTube playback qualities and inspect\n\
    what would be enforced on a given video page.\n\n\
    Examples:\n\
      qualitylock add LinusTechTips hd1080                # Channel override\n\
      qualitylock default hd720                          # Set the default\n\
      qualitylock target dQw4w9WgXcQ                      # What would be applied\n\
      qualitylock best hd1080 hd720 medium auto          # Resolve against offered levels"
)]
struct Args {
    /// Preferences file (defaults to the XDG data dir)
    #[arg(long = "prefs", global = true)]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a target against the qualities a player offers
    Best {
        target: String,
        #[arg(required = true)]
        available: Vec<String>,
    },
    /// Print the channel handle of a video page
    Channel { url: String },
    /// Print the quality that would be enforced on a video page
    Target { url: String },
    /// Show or set the default quality
    Default { quality: Option<String> },
    /// Add or update a channel override
    Add { channel: String, quality: String },
    /// Remove a channel override
    Remove { channel: String },
    /// List channel overrides
    List,
    /// List the known quality tokens
    Qualities,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,qualitylock=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Accept a bare video ID as well as a full watch URL
fn page_url(input: &str) -> anyhow::Result<String> {
    if is_valid_video_id(input) {
        return Ok(build_watch_url(input));
    }
    if !is_youtube_url(input) {
        bail!("Not a YouTube URL: {}", input);
    }
    Ok(input.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = Config::load().context("loading config")?;
    if args.prefs.is_some() {
        config.preferences_path = args.prefs;
    }
    let store = FileStore::new(config.preferences_path()?);

    match args.command {
        Command::Best { target, available } => {
            println!("{}", resolve_best_quality(&target, &available)?);
        }
        Command::Channel { url } => {
            let resolver = HttpChannelResolver::new(config.request_timeout())?;
            match resolver.resolve_channel(&page_url(&url)?).await {
                Some(channel) => println!("{}", channel),
                None => println!("none"),
            }
        }
        Command::Target { url } => {
            let resolver = HttpChannelResolver::new(config.request_timeout())?;
            let target = target_quality(&store, &resolver, &page_url(&url)?).await?;
            println!("{} ({})", target, display_label(&target));
        }
        Command::Default { quality: None } => {
            let prefs = store.get().await?;
            println!("{}", display_label(&prefs.default_quality));
        }
        Command::Default {
            quality: Some(quality),
        } => {
            let quality = Quality::parse(&quality)?;
            let mut prefs = store.get().await?;
            prefs.set_default(quality);
            store.set(prefs).await?;
            println!("Default quality set to {}", quality.label());
        }
        Command::Add { channel, quality } => {
            let quality = Quality::parse(&quality)?;
            let channel = channel.trim().trim_start_matches('@');
            if channel.is_empty() {
                bail!("Channel name is empty");
            }
            let mut prefs = store.get().await?;
            prefs.set_channel(channel, quality);
            store.set(prefs).await?;
            println!("Channel added with {} quality", quality.label());
        }
        Command::Remove { channel } => {
            let mut prefs = store.get().await?;
            if !prefs.remove_channel(&channel) {
                bail!("No override for channel {}", channel);
            }
            store.set(prefs).await?;
            println!("Channel deleted");
        }
        Command::List => {
            let prefs = store.get().await?;
            println!("Default: {}", display_label(&prefs.default_quality));
            if prefs.channel_qualities.is_empty() {
                println!("No channel overrides.");
            }
            for (channel, quality) in &prefs.channel_qualities {
                println!("{:<32} {}", channel, display_label(quality));
            }
        }
        Command::Qualities => {
            for quality in Quality::iter() {
                println!("{:<8} {}", quality.as_ref(), quality.label());
            }
        }
    }

    Ok(())
}
