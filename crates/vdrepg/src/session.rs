use std::borrow::Cow;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::Receiver;
use tracing::{debug, trace};

use vdrepg_svdrp::{Client, ReplyCode, command};

use crate::channel::{ChannelDescriptor, ChannelDirectory};
use crate::event::GuideEvent;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    Disconnected,
    AwaitingGreeting,
    Ready,
    /// A `PUTE` block is open and carries events of this call sign.
    ChannelOpen(String),
    Closing,
    Closed,
    Fault,
}

/// Events loaded per call sign.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub loaded: BTreeMap<String, usize>,
}

impl Summary {
    pub fn events(&self) -> usize {
        self.loaded.values().sum()
    }
}

/// Encodes a text field for a single EPG data line. VDR uses `|` for line breaks.
fn line_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['\r', '\n']) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(text.replace("\r\n", "|").replace('\n', "|").replace('\r', ""))
}

/// Pushes guide events into VDR's EPG over SVDRP.
///
/// The EPG is cleared first, then consecutive events of a channel are sent in one
/// `PUTE` block. Only the greeting and the commands opening and closing blocks are
/// answered by VDR; event data is streamed without replies. Any unexpected reply
/// ends the session in [`SessionState::Fault`].
pub struct Session {
    directory: Arc<ChannelDirectory>,
    state: SessionState,
    loaded: BTreeMap<String, usize>,
}

impl Session {
    pub fn new(directory: Arc<ChannelDirectory>) -> Self {
        Self {
            directory,
            state: SessionState::Disconnected,
            loaded: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn transition(&mut self, state: SessionState) {
        trace!(from = ?self.state, to = ?state, "Session state changed");
        self.state = state;
    }

    /// Connects and sends every event received until the sender side is closed.
    pub async fn run<S, F>(
        &mut self,
        connect: F,
        events: Receiver<GuideEvent>,
    ) -> vdrepg_svdrp::Result<Summary>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        F: Future<Output = vdrepg_svdrp::Result<Client<S>>>,
    {
        match self.drive(connect, events).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                self.transition(SessionState::Fault);
                Err(err)
            }
        }
    }

    async fn drive<S, F>(
        &mut self,
        connect: F,
        mut events: Receiver<GuideEvent>,
    ) -> vdrepg_svdrp::Result<Summary>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        F: Future<Output = vdrepg_svdrp::Result<Client<S>>>,
    {
        let mut client = connect.await?;
        self.transition(SessionState::AwaitingGreeting);

        let greeting = client.expect_reply(ReplyCode::ServiceReady).await?;
        debug!(greeting = greeting.text(), "Connected to VDR");

        client
            .command(command::CLEAR_EPG, ReplyCode::ActionOk)
            .await?;
        self.transition(SessionState::Ready);

        while let Some(event) = events.recv().await {
            self.send_event(&mut client, event).await?;
        }

        if matches!(self.state, SessionState::ChannelOpen(_)) {
            self.close_channel(&mut client).await?;
        }

        self.transition(SessionState::Closing);
        client
            .command(command::QUIT, ReplyCode::ServiceClosing)
            .await?;
        client.shutdown().await?;
        self.transition(SessionState::Closed);

        Ok(Summary {
            loaded: std::mem::take(&mut self.loaded),
        })
    }

    async fn send_event<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        client: &mut Client<S>,
        event: GuideEvent,
    ) -> vdrepg_svdrp::Result<()> {
        let directory = self.directory.clone();
        let Some((call_sign, channel)) = event
            .call_sign
            .as_deref()
            .and_then(|call_sign| Some((call_sign, directory.get(call_sign)?)))
        else {
            trace!(title = %event.title, "Dropped event of an unknown channel");
            return Ok(());
        };

        if matches!(&self.state, SessionState::ChannelOpen(open) if open != call_sign) {
            self.close_channel(client).await?;
        }

        if self.state == SessionState::Ready {
            self.open_channel(client, call_sign, channel).await?;
        }

        let duration = event.duration();
        client
            .write_line(&format!(
                "E {} {} {} 0",
                event.event_id,
                event.start.timestamp(),
                duration
            ))
            .await?;
        client
            .write_line(&format!("T {}", line_text(&event.title)))
            .await?;
        if !event.sub_title.is_empty() {
            client
                .write_line(&format!("S {}", line_text(&event.sub_title)))
                .await?;
        }
        client
            .write_line(&format!("D {}", line_text(&event.description)))
            .await?;

        let genres = event
            .genres
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        client.write_line(&format!("G {genres}")).await?;
        client.write_line(&format!("R {}", event.rating)).await?;
        client.write_line("e").await?;
        client.flush().await?;

        *self.loaded.entry(call_sign.to_string()).or_default() += 1;

        Ok(())
    }

    async fn open_channel<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        client: &mut Client<S>,
        call_sign: &str,
        channel: &ChannelDescriptor,
    ) -> vdrepg_svdrp::Result<()> {
        client
            .command(command::PUT_EPG, ReplyCode::StartSendingEpg)
            .await?;
        client
            .write_line(&format!("C {} {}", channel.identifier(), call_sign))
            .await?;

        self.transition(SessionState::ChannelOpen(call_sign.to_string()));

        Ok(())
    }

    async fn close_channel<S: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        client: &mut Client<S>,
    ) -> vdrepg_svdrp::Result<()> {
        client.write_line(command::END_OF_CHANNEL).await?;
        client
            .command(command::END_OF_DATA, ReplyCode::ActionOk)
            .await?;

        self.transition(SessionState::Ready);

        Ok(())
    }
}
