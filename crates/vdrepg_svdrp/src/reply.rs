use std::fmt::{Display, Formatter};

use strum::FromRepr;

/// Status codes a VDR answers with.
#[derive(Copy, Clone, Debug, Eq, FromRepr, Hash, PartialEq)]
#[repr(u16)]
pub enum ReplyCode {
    Help = 214,
    EpgDataRecord = 215,
    ServiceReady = 220,
    ServiceClosing = 221,
    ActionOk = 250,
    StartSendingEpg = 354,
    ActionAborted = 451,
    CommandUnrecognized = 500,
    ParameterSyntaxError = 501,
    CommandNotImplemented = 502,
    ParameterNotImplemented = 504,
    ActionNotTaken = 550,
    TransactionFailed = 554,
}

impl ReplyCode {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Help => "Help message",
            Self::EpgDataRecord => "EPG data record",
            Self::ServiceReady => "VDR service ready",
            Self::ServiceClosing => "VDR service closing transmission channel",
            Self::ActionOk => "Requested VDR action okay, completed",
            Self::StartSendingEpg => "Start sending EPG data",
            Self::ActionAborted => "Requested action aborted: local error in processing",
            Self::CommandUnrecognized => "Syntax error, command unrecognized",
            Self::ParameterSyntaxError => "Syntax error in parameters or arguments",
            Self::CommandNotImplemented => "Command not implemented",
            Self::ParameterNotImplemented => "Command parameter not implemented",
            Self::ActionNotTaken => "Requested action not taken",
            Self::TransactionFailed => "Transaction failed",
        }
    }
}

impl Display for ReplyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// A single reply line, stripped of its line terminator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    line: String,
}

impl Reply {
    pub fn new(line: &str) -> Self {
        Self {
            line: line.trim_end_matches(['\r', '\n']).to_string(),
        }
    }

    /// The leading three characters, if the line is long enough to carry a status.
    pub fn status(&self) -> Option<&str> {
        self.line.get(..3)
    }

    pub fn code(&self) -> Option<ReplyCode> {
        self.status()?
            .parse::<u16>()
            .ok()
            .and_then(ReplyCode::from_repr)
    }

    /// The human-readable part after the status and its separator.
    pub fn text(&self) -> &str {
        self.line.get(4..).unwrap_or_default()
    }

    pub fn is(&self, expected: ReplyCode) -> bool {
        self.status() == Some(expected.code().to_string().as_str())
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}
