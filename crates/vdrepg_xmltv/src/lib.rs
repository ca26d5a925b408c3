//! Streaming decoder for XMLTV program guides.

mod charset;
mod reader;

pub use charset::{Latin1Reader, is_latin1, transcode};
pub use reader::GuideReader;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("<{element}> is missing the {attribute:?} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

/// A `<channel>` element.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Channel {
    pub id: String,
    pub display_names: Vec<String>,
}

/// A `<programme>` element.
///
/// `start` and `stop` are kept as they appear in the document, normally
/// `YYYYMMDDHHMMSS` optionally followed by a zone offset.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Programme {
    pub channel: String,
    pub start: String,
    pub stop: String,
    pub title: String,
    pub sub_title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub rating: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Record {
    Channel(Channel),
    Programme(Programme),
}
