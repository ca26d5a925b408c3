//! Client side of SVDRP, the line-based remote control protocol of the VDR receiver.

mod client;
mod error;
mod reply;

pub use client::Client;
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};

/// Commands and data lines used while pushing EPG data.
pub mod command {
    /// Clears the whole EPG of the receiver.
    pub const CLEAR_EPG: &str = "CLRE";

    /// Starts an EPG data block, answered by [`ReplyCode::StartSendingEpg`](crate::ReplyCode).
    pub const PUT_EPG: &str = "PUTE";

    pub const QUIT: &str = "QUIT";

    /// Terminates the EPG data of one channel inside a block.
    pub const END_OF_CHANNEL: &str = "c";

    /// Terminates an EPG data block.
    pub const END_OF_DATA: &str = ".";
}
