use std::error::Error;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use vdrepg_xmltv::Programme;

use crate::channel::ChannelMap;
use crate::taxonomy::{genre_code, rating_code};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidTimestampError(pub String);

impl Display for InvalidTimestampError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid timestamp {:?}, expected YYYYMMDDHHMMSS", self.0)
    }
}

impl Error for InvalidTimestampError {}

/// A programme ready to be sent to VDR.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuideEvent {
    /// Call sign of the VDR channel, `None` if the guide channel is not mapped.
    pub call_sign: Option<String>,
    pub event_id: u16,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub title: String,
    pub sub_title: String,
    pub description: String,
    pub genres: Vec<u8>,
    pub rating: u8,
}

impl GuideEvent {
    /// Converts a programme, resolving its channel through the cross-reference.
    pub fn translate(
        programme: &Programme,
        channels: &ChannelMap,
    ) -> Result<Self, InvalidTimestampError> {
        let start = parse_timestamp(&programme.start)?;
        let stop = parse_timestamp(&programme.stop)?;

        Ok(Self {
            call_sign: channels.call_sign(&programme.channel).map(str::to_string),
            event_id: event_id(&start),
            start,
            stop,
            title: programme.title.clone(),
            sub_title: programme.sub_title.clone(),
            description: programme.description.clone(),
            genres: programme
                .categories
                .iter()
                .filter_map(|category| genre_code(category))
                .collect(),
            rating: rating_code(programme.rating.as_deref()),
        })
    }

    /// Length in seconds. Negative if the guide has the stop before the start.
    pub fn duration(&self) -> i64 {
        (self.stop - self.start).num_seconds()
    }
}

/// Event IDs count minutes since the epoch, wrapping at 16 bits.
///
/// IDs of events about 45 days apart collide; VDR scopes them per channel.
pub fn event_id(start: &DateTime<Utc>) -> u16 {
    start.timestamp().div_euclid(60).rem_euclid(0x10000) as u16
}

/// Parses the leading `YYYYMMDDHHMMSS` of an XMLTV timestamp as UTC. Anything after the
/// first 14 characters, such as a zone offset, is ignored.
///
/// Out-of-range values carry over into the next larger unit, so month 13 is January of
/// the following year and hour 24 is midnight of the next day.
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, InvalidTimestampError> {
    let invalid = || InvalidTimestampError(timestamp.to_string());
    let field = |range: std::ops::Range<usize>| -> Result<i64, InvalidTimestampError> {
        let digits = timestamp.get(range).ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse().map_err(|_| invalid())
    };

    let months = field(0..4)? * 12 + field(4..6)? - 1;
    let month_start = NaiveDate::from_ymd_opt(
        months.div_euclid(12) as i32,
        months.rem_euclid(12) as u32 + 1,
        1,
    )
    .ok_or_else(invalid)?;

    let offset = TimeDelta::days(field(6..8)? - 1)
        + TimeDelta::hours(field(8..10)?)
        + TimeDelta::minutes(field(10..12)?)
        + TimeDelta::seconds(field(12..14)?);

    month_start
        .and_hms_opt(0, 0, 0)
        .and_then(|datetime| datetime.checked_add_signed(offset))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(invalid)
}
