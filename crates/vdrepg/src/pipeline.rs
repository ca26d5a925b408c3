use std::future::Future;
use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{Sender, channel};
use tracing::{debug, warn};

use vdrepg_svdrp::Client;
use vdrepg_xmltv::{GuideReader, Record, transcode};

use crate::channel::{ChannelDirectory, ChannelMap};
use crate::event::GuideEvent;
use crate::session::{Session, Summary};

/// Events in flight between the guide reader and the session. A single slot makes the
/// reader wait while the previous event is being transmitted.
const QUEUE_DEPTH: usize = 1;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProducerStats {
    pub channels: usize,
    pub mapped_channels: usize,
    pub programmes: usize,
    pub skipped_programmes: usize,
}

/// Reads the guide and queues a translated event for every programme, in document order.
/// Stops early if the session is gone.
fn produce<R: BufRead + Send + 'static>(
    source: R,
    directory: &ChannelDirectory,
    events: Sender<GuideEvent>,
) -> anyhow::Result<ProducerStats> {
    let source = transcode(source).context("Failed to read the guide")?;
    let mut channels = ChannelMap::default();
    let mut stats = ProducerStats::default();

    for record in GuideReader::new(source) {
        match record {
            Record::Channel(channel) => {
                stats.channels += 1;
                if channels.register(&channel, directory).is_some() {
                    stats.mapped_channels += 1;
                }
            }
            Record::Programme(programme) => {
                stats.programmes += 1;

                let event = match GuideEvent::translate(&programme, &channels) {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(
                            %err,
                            channel = %programme.channel,
                            title = %programme.title,
                            "Skipped programme"
                        );
                        stats.skipped_programmes += 1;
                        continue;
                    }
                };

                if events.blocking_send(event).is_err() {
                    debug!("Session ended, stopped reading the guide");
                    break;
                }
            }
        }
    }

    Ok(stats)
}

/// Runs the session concurrently with the guide reader and waits for both to finish.
///
/// The session is started first and connects on its own; the guide is then read on a
/// blocking thread. Closing the queue tells the session that the input has ended.
pub async fn run<S, F, R>(
    directory: Arc<ChannelDirectory>,
    connect: F,
    source: R,
) -> anyhow::Result<Summary>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    F: Future<Output = vdrepg_svdrp::Result<Client<S>>> + Send + 'static,
    R: BufRead + Send + 'static,
{
    let (tx, rx) = channel::<GuideEvent>(QUEUE_DEPTH);
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();

    let mut session = Session::new(directory.clone());
    tokio::spawn(async move {
        let result = session.run(connect, rx).await;
        debug!(state = ?session.state(), "Session ended");
        done_tx.send(result).ok();
    });

    let stats = tokio::task::spawn_blocking(move || produce(source, &directory, tx)).await??;
    debug!(
        channels = stats.channels,
        mapped_channels = stats.mapped_channels,
        programmes = stats.programmes,
        skipped_programmes = stats.skipped_programmes,
        "Finished reading the guide"
    );

    let summary = done_rx
        .await
        .context("Session ended without reporting")?
        .context("SVDRP session failed")?;

    Ok(summary)
}
