use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::trace;

use crate::{Error, Reply, ReplyCode, Result};

/// A buffered SVDRP connection.
///
/// Lines are written with CRLF terminators and buffered until a reply is awaited or
/// [`Client::flush`] is called. Every reply is verified against the status code the
/// caller expects; there is no recovery from a mismatch.
pub struct Client<S> {
    stream: BufStream<S>,
}

impl Client<TcpStream> {
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| Error::Connect {
                address: address.to_string(),
                source,
            })?;

        trace!(address, "Connected");

        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufStream::new(stream),
        }
    }

    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        trace!("sending '{}'", line);

        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;

        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.stream.flush().await?;
        Ok(())
    }

    /// Flushes pending lines and reads exactly one reply line, which must start with
    /// the expected status code.
    pub async fn expect_reply(&mut self, expected: ReplyCode) -> Result<Reply> {
        self.flush().await?;

        trace!(
            "waiting for reply '{}' ({})",
            expected.code(),
            expected.description()
        );

        let mut line = String::new();
        if self.stream.read_line(&mut line).await? == 0 {
            return Err(Error::Closed(expected));
        }

        let reply = Reply::new(&line);
        if !reply.is(expected) {
            return Err(Error::UnexpectedReply {
                expected,
                line: reply.line().to_string(),
            });
        }

        trace!("got reply: {}", reply.line());

        Ok(reply)
    }

    /// Sends a command and verifies its reply.
    pub async fn command(&mut self, command: &str, expected: ReplyCode) -> Result<Reply> {
        self.write_line(command).await?;
        self.expect_reply(expected).await
    }

    /// Flushes and closes the write side of the connection.
    pub async fn shutdown(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
