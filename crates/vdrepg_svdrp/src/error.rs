use thiserror::Error;

use crate::ReplyCode;

#[derive(Error, Debug)]
pub enum Error {
    /// The TCP connection could not be established.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on the SVDRP connection: {0}")]
    Io(#[from] std::io::Error),

    /// The peer answered with a status code other than the expected one.
    #[error("Reply {line:?} didn't match expected {} ({expected})", .expected.code())]
    UnexpectedReply { expected: ReplyCode, line: String },

    /// The peer closed the connection while a reply was awaited.
    #[error("Connection closed while waiting for {} ({0})", .0.code())]
    Closed(ReplyCode),
}

pub type Result<T> = std::result::Result<T, Error>;
