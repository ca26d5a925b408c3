use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, warn};

use vdrepg_xmltv::Channel as XmltvChannel;

const FIELD_COUNT: usize = 13;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChannelLineError {
    TooFewFields(usize),
    MissingCallSign,
}

impl Display for ChannelLineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewFields(count) => {
                write!(f, "expected {FIELD_COUNT} fields, found {count}")
            }
            Self::MissingCallSign => {
                write!(f, "expected 2 names, format: <vdr name>,<xmltv call sign>")
            }
        }
    }
}

impl Error for ChannelLineError {}

/// A channel as VDR knows it, i.e. one line of its `channels.conf`.
///
/// Numeric parameters are kept as written, they are only ever echoed back to VDR.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChannelDescriptor {
    pub name: String,
    pub call_sign: String,
    pub frequency: String,
    pub param: String,
    pub source: String,
    pub srate: String,
    pub vpid: String,
    pub apid: String,
    pub tpid: String,
    pub conditional_access: String,
    pub service_id: String,
    pub network_id: String,
    pub transport_id: String,
    pub radio_id: String,
}

impl ChannelDescriptor {
    /// Parses a line like `ABC,WCVB;Provider:509028:M10:A:0:49=2:0:0:0:3:0:0:0`.
    pub fn parse(line: &str) -> Result<Self, ChannelLineError> {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() < FIELD_COUNT {
            return Err(ChannelLineError::TooFewFields(fields.len()));
        }

        let names: Vec<&str> = fields[0].split(',').collect();
        let &[name, call_sign, ..] = names.as_slice() else {
            return Err(ChannelLineError::MissingCallSign);
        };
        let call_sign = call_sign.split(';').next().unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            call_sign: call_sign.to_string(),
            frequency: fields[1].to_string(),
            param: fields[2].to_string(),
            source: fields[3].to_string(),
            srate: fields[4].to_string(),
            vpid: fields[5].to_string(),
            apid: fields[6].to_string(),
            tpid: fields[7].to_string(),
            conditional_access: fields[8].to_string(),
            service_id: fields[9].to_string(),
            network_id: fields[10].to_string(),
            transport_id: fields[11].to_string(),
            radio_id: fields[12].to_string(),
        })
    }

    /// The channel ID VDR computes for this channel, used to address it in EPG data.
    pub fn identifier(&self) -> String {
        if self.transport_id != "0" || self.network_id != "0" {
            return format!(
                "{}-{}-{}-{}",
                self.source, self.network_id, self.transport_id, self.service_id
            );
        }

        let mut frequency = self.frequency.parse::<i64>().unwrap_or_default();

        // ATSC and terrestrial frequencies are listed in kHz but identified in MHz.
        if self.source == "A" || self.source == "T" {
            frequency /= 1000;
        }

        format!(
            "{}-{}-{}-{}",
            self.source, self.network_id, frequency, self.service_id
        )
    }
}

impl Display for ChannelDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.name,
            self.call_sign,
            self.frequency,
            self.param,
            self.source,
            self.srate,
            self.vpid,
            self.apid,
            self.tpid,
            self.conditional_access,
            self.service_id,
            self.network_id,
            self.transport_id,
            self.radio_id
        )
    }
}

/// All channels known to VDR, keyed by call sign.
#[derive(Clone, Debug, Default)]
pub struct ChannelDirectory {
    channels: HashMap<String, ChannelDescriptor>,
}

impl ChannelDirectory {
    pub fn parse(text: &str) -> Self {
        let mut channels = HashMap::new();

        for (idx, line) in text.lines().enumerate() {
            // Lines starting with a colon are group separators.
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            match ChannelDescriptor::parse(line) {
                Ok(channel) => {
                    channels.insert(channel.call_sign.clone(), channel);
                }
                Err(err) => {
                    warn!(line = idx + 1, %err, "Skipped channel");
                }
            }
        }

        Self { channels }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read channels from {}", path.display()))?;

        Ok(Self::parse(&file))
    }

    pub fn get(&self, call_sign: &str) -> Option<&ChannelDescriptor> {
        self.channels.get(call_sign)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// A guide channel matched to a VDR channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MappedChannel {
    pub call_sign: String,
    pub aliases: Vec<String>,
}

/// Cross-reference from guide channel IDs to VDR call signs.
#[derive(Debug, Default)]
pub struct ChannelMap {
    channels: HashMap<String, MappedChannel>,
}

impl ChannelMap {
    /// Maps a guide channel by the first of its display names that is a known call sign.
    /// Channels without any known name are ignored.
    pub fn register(
        &mut self,
        channel: &XmltvChannel,
        directory: &ChannelDirectory,
    ) -> Option<&MappedChannel> {
        let Some(descriptor) = channel
            .display_names
            .iter()
            .find_map(|name| directory.get(name))
        else {
            debug!(xmltv_id = %channel.id, "No VDR channel for guide channel");
            return None;
        };

        let mapped = MappedChannel {
            call_sign: descriptor.call_sign.clone(),
            aliases: channel.display_names.clone(),
        };

        debug!(
            channel = %descriptor,
            xmltv_id = %channel.id,
            aliases = ?mapped.aliases,
            "New channel"
        );

        self.channels.insert(channel.id.clone(), mapped);
        self.channels.get(&channel.id)
    }

    pub fn call_sign(&self, xmltv_id: &str) -> Option<&str> {
        self.channels
            .get(xmltv_id)
            .map(|channel| channel.call_sign.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(
        source: &str,
        frequency: &str,
        network_id: &str,
        transport_id: &str,
        service_id: &str,
    ) -> ChannelDescriptor {
        ChannelDescriptor {
            source: source.to_string(),
            frequency: frequency.to_string(),
            network_id: network_id.to_string(),
            transport_id: transport_id.to_string(),
            service_id: service_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_identifier_scales_terrestrial_frequency() {
        let channel = descriptor("T", "474000", "0", "0", "3");

        assert_eq!(channel.identifier(), "T-0-474-3");
        assert_eq!(channel.identifier(), channel.identifier());
    }

    #[test]
    fn test_identifier_scales_atsc_frequency() {
        assert_eq!(descriptor("A", "509028", "0", "0", "3").identifier(), "A-0-509-3");
    }

    #[test]
    fn test_identifier_keeps_other_frequencies() {
        assert_eq!(descriptor("C", "474000", "0", "0", "3").identifier(), "C-0-474000-3");
    }

    #[test]
    fn test_identifier_prefers_transport_id() {
        assert_eq!(descriptor("S", "123000", "1", "1", "7").identifier(), "S-1-1-7");
        assert_eq!(descriptor("T", "474000", "0", "5", "7").identifier(), "T-0-5-7");
        assert_eq!(descriptor("T", "474000", "8468", "0", "7").identifier(), "T-8468-0-7");
    }

    #[test]
    fn test_identifier_unparsable_frequency() {
        assert_eq!(descriptor("T", "abc", "0", "0", "3").identifier(), "T-0-0-3");
    }

    #[test]
    fn test_parse_line() {
        let channel =
            ChannelDescriptor::parse("ABC,WCVB;Hearst:509028:M10:A:0:49=2:52=eng@106:0:0:3:0:0:0")
                .unwrap();

        assert_eq!(channel.name, "ABC");
        assert_eq!(channel.call_sign, "WCVB");
        assert_eq!(channel.frequency, "509028");
        assert_eq!(channel.param, "M10");
        assert_eq!(channel.source, "A");
        assert_eq!(channel.vpid, "49=2");
        assert_eq!(channel.apid, "52=eng@106");
        assert_eq!(channel.service_id, "3");
        assert_eq!(channel.network_id, "0");
        assert_eq!(channel.transport_id, "0");
        assert_eq!(channel.radio_id, "0");
        assert_eq!(channel.identifier(), "A-0-509-3");
        assert_eq!(
            channel.to_string(),
            "ABC,WCVB:509028:M10:A:0:49=2:52=eng@106:0:0:3:0:0:0"
        );
    }

    #[test]
    fn test_parse_bad_lines() {
        assert_eq!(
            ChannelDescriptor::parse("ABC,WCVB:509028:M10"),
            Err(ChannelLineError::TooFewFields(3))
        );
        assert_eq!(
            ChannelDescriptor::parse("ABC:509028:M10:A:0:49=2:52:0:0:3:0:0:0"),
            Err(ChannelLineError::MissingCallSign)
        );
    }

    #[test]
    fn test_parse_directory() {
        let directory = ChannelDirectory::parse(
            ":Local\n\
             ABC,WCVB:509028:M10:A:0:49=2:52:0:0:3:0:0:0\n\
             \n\
             broken line\n\
             NBC,WHDH;NBC:521028:M10:A:0:49=2:52:0:0:3:0:0:0\n",
        );

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.get("WCVB").unwrap().name, "ABC");
        assert_eq!(directory.get("WHDH").unwrap().frequency, "521028");
        assert!(directory.get("ABC").is_none());
    }

    #[test]
    fn test_register_first_matching_name() {
        let directory = ChannelDirectory::parse(
            "ABC,WCVB:509028:M10:A:0:49=2:52:0:0:3:0:0:0\n\
             NBC,WHDH:521028:M10:A:0:49=2:52:0:0:3:0:0:0\n",
        );
        let mut map = ChannelMap::default();

        let channel = XmltvChannel {
            id: "I1".to_string(),
            display_names: vec!["5 WCVB".to_string(), "WHDH".to_string(), "WCVB".to_string()],
        };
        let mapped = map.register(&channel, &directory).unwrap();
        assert_eq!(mapped.call_sign, "WHDH");
        assert_eq!(mapped.aliases.len(), 3);
        assert_eq!(map.call_sign("I1"), Some("WHDH"));

        let unknown = XmltvChannel {
            id: "I2".to_string(),
            display_names: vec!["KXYZ".to_string()],
        };
        assert!(map.register(&unknown, &directory).is_none());
        assert_eq!(map.call_sign("I2"), None);
    }
}
