mod channel;
mod config;
mod event;
mod pipeline;
mod session;
mod taxonomy;
#[cfg(test)]
mod testing;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use bpaf::Bpaf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use vdrepg_svdrp::Client;

use crate::channel::ChannelDirectory;
use crate::config::Config;

/// Loads an XMLTV guide into the EPG of a VDR.
#[derive(Bpaf, Clone, Debug)]
#[bpaf(options)]
struct Options {
    /// Perform verbose logging
    #[bpaf(short, long)]
    verbose: bool,

    /// Trace execution, including every SVDRP line
    #[bpaf(short, long)]
    debug: bool,

    /// Configuration file
    #[bpaf(long, argument("PATH"))]
    config: Option<PathBuf>,

    /// host:port of the VDR
    #[bpaf(short('H'), long, argument("ADDRESS"))]
    host: Option<String>,

    /// VDR's channels.conf
    #[bpaf(short('c'), long, argument("PATH"))]
    channels: Option<PathBuf>,

    /// XMLTV guide data
    #[bpaf(short('x'), long, argument("PATH"))]
    xmltv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = options().run();

    let env_filter = EnvFilter::builder()
        .with_default_directive(
            match (options.debug, options.verbose) {
                (true, _) => LevelFilter::TRACE,
                (_, true) => LevelFilter::DEBUG,
                _ => LevelFilter::INFO,
            }
            .into(),
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    let mut config = match &options.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(host) = options.host {
        config.svdrp.address = host;
    }
    if let Some(channels) = options.channels {
        config.files.channels = channels;
    }
    if let Some(xmltv) = options.xmltv {
        config.files.xmltv = xmltv;
    }

    let directory = ChannelDirectory::load_from_file(&config.files.channels)?;
    if directory.is_empty() {
        bail!(
            "No channels are defined in {}. At least one channel is required.",
            config.files.channels.display()
        );
    }
    info!(channels = directory.len(), "Loaded VDR channels");

    let guide = File::open(&config.files.xmltv)
        .with_context(|| format!("Failed to open {}", config.files.xmltv.display()))?;

    let address = config.svdrp.address;
    let summary = pipeline::run(
        Arc::new(directory),
        async move { Client::connect(&address).await },
        BufReader::new(guide),
    )
    .await?;

    for (call_sign, events) in &summary.loaded {
        info!(%call_sign, events = *events, "Loaded EPG of channel");
    }
    info!(events = summary.events(), "Done");

    Ok(())
}
