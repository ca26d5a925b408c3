use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{trace, warn};

use crate::{Channel, Error, Programme, Record};

/// Collected text of the descendants of one element, keyed by their path relative to
/// it (e.g. `rating/value`), in document order.
#[derive(Default)]
struct Fields(Vec<(String, String)>);

impl Fields {
    /// Later occurrences of a single-valued child replace earlier ones.
    fn last(&self, path: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
    }

    fn all(&self, path: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

/// Forward-only sequence of the channels and programmes of an XMLTV document.
///
/// An element that fails to decode is logged and skipped. A tokenizer error outside of
/// an element ends the sequence as if the document had ended.
pub struct GuideReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> GuideReader<R> {
    pub fn new(source: R) -> Self {
        let reader = Reader::from_reader(source);

        Self {
            reader,
            buf: Vec::new(),
            done: false,
        }
    }

    fn read_fields(&mut self, start: &BytesStart) -> Result<Fields, Error> {
        let mut fields = Fields::default();
        // Open descendants as (name, index of their entry in `fields`).
        let mut open: Vec<(String, usize)> = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let path = Self::child_path(&open, e.local_name().as_ref());
                    open.push((path.clone(), fields.0.len()));
                    fields.0.push((path, String::new()));
                }
                Event::Empty(e) => {
                    let path = Self::child_path(&open, e.local_name().as_ref());
                    fields.0.push((path, String::new()));
                }
                Event::Text(e) => {
                    if let Some((_, idx)) = open.last() {
                        fields.0[*idx].1.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some((_, idx)) = open.last() {
                        fields.0[*idx].1.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(e) => {
                    if open.pop().is_none() && e.name() == start.name() {
                        return Ok(fields);
                    }
                }
                Event::Eof => {
                    return Err(quick_xml::Error::IllFormed(
                        quick_xml::errors::IllFormedError::MissingEndTag(
                            String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                        ),
                    )
                    .into());
                }
                _ => {}
            }
        }
    }

    fn child_path(open: &[(String, usize)], name: &[u8]) -> String {
        let name = String::from_utf8_lossy(name);
        match open.last() {
            Some((parent, _)) => format!("{parent}/{name}"),
            None => name.into_owned(),
        }
    }

    fn attribute(
        start: &BytesStart,
        element: &'static str,
        attribute: &'static str,
    ) -> Result<String, Error> {
        let value = start
            .try_get_attribute(attribute)?
            .ok_or(Error::MissingAttribute { element, attribute })?;

        Ok(value.unescape_value()?.into_owned())
    }

    fn read_channel(&mut self, start: &BytesStart) -> Result<Channel, Error> {
        let id = Self::attribute(start, "channel", "id");
        let fields = self.read_fields(start)?;

        Ok(Channel {
            id: id?,
            display_names: fields.all("display-name"),
        })
    }

    fn read_programme(&mut self, start: &BytesStart) -> Result<Programme, Error> {
        let channel = Self::attribute(start, "programme", "channel");
        let start_time = Self::attribute(start, "programme", "start");
        let stop_time = Self::attribute(start, "programme", "stop");

        // Consume the whole element first so a bad attribute only costs this programme.
        let fields = self.read_fields(start)?;

        Ok(Programme {
            channel: channel?,
            start: start_time?,
            stop: stop_time?,
            title: fields.last("title").unwrap_or_default().to_string(),
            sub_title: fields.last("sub-title").unwrap_or_default().to_string(),
            description: fields.last("desc").unwrap_or_default().to_string(),
            categories: fields.all("category"),
            rating: fields.last("rating/value").map(str::to_string),
        })
    }

    fn read_record(&mut self, start: &BytesStart) -> Option<Result<Record, Error>> {
        match start.local_name().as_ref() {
            b"channel" => Some(self.read_channel(start).map(Record::Channel)),
            b"programme" => Some(self.read_programme(start).map(Record::Programme)),
            _ => None,
        }
    }
}

impl<R: BufRead> Iterator for GuideReader<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();

            let start = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => e.into_owned(),
                Ok(Event::Eof) => {
                    trace!("Decoding done");
                    self.done = true;
                    break;
                }
                Ok(_) => continue,
                Err(err) => {
                    warn!(
                        %err,
                        position = self.reader.buffer_position(),
                        "Stopped reading the guide"
                    );
                    self.done = true;
                    break;
                }
            };

            match self.read_record(&start) {
                Some(Ok(record)) => return Some(record),
                Some(Err(err)) => {
                    warn!(
                        %err,
                        position = self.reader.buffer_position(),
                        "Skipped malformed element"
                    );
                }
                None => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE tv SYSTEM "xmltv.dtd">
<tv generator-info-name="test">
  <channel id="I10436.labs.zap2it.com">
    <display-name>WCVB</display-name>
    <display-name>5 WCVB</display-name>
    <icon src="http://example.com/wcvb.png" />
  </channel>
  <programme start="20261017120000 +0000" stop="20261017130000 +0000" channel="I10436.labs.zap2it.com">
    <title lang="en">News &amp; Weather</title>
    <sub-title lang="en">Noon Edition</sub-title>
    <desc lang="en">Local news.</desc>
    <category lang="en">News</category>
    <category lang="en">Weather</category>
    <rating system="VCHIP">
      <value>TV-PG</value>
    </rating>
  </programme>
  <programme start="20261017130000 +0000" stop="20261017133000 +0000" channel="I10436.labs.zap2it.com">
    <title lang="en">Quiz</title>
  </programme>
</tv>
"#;

    fn records(xml: &str) -> Vec<Record> {
        GuideReader::new(xml.as_bytes()).collect()
    }

    #[test]
    fn test_read_guide() {
        let records = records(GUIDE);

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            Record::Channel(Channel {
                id: "I10436.labs.zap2it.com".to_string(),
                display_names: vec!["WCVB".to_string(), "5 WCVB".to_string()],
            })
        );
        assert_eq!(
            records[1],
            Record::Programme(Programme {
                channel: "I10436.labs.zap2it.com".to_string(),
                start: "20261017120000 +0000".to_string(),
                stop: "20261017130000 +0000".to_string(),
                title: "News & Weather".to_string(),
                sub_title: "Noon Edition".to_string(),
                description: "Local news.".to_string(),
                categories: vec!["News".to_string(), "Weather".to_string()],
                rating: Some("TV-PG".to_string()),
            })
        );

        let Record::Programme(programme) = &records[2] else {
            panic!("expected a programme");
        };
        assert_eq!(programme.title, "Quiz");
        assert_eq!(programme.sub_title, "");
        assert!(programme.categories.is_empty());
        assert_eq!(programme.rating, None);
    }

    #[test]
    fn test_skip_programme_without_channel() {
        let records = records(
            r#"<tv>
  <programme start="20261017120000" stop="20261017130000"><title>Orphan</title></programme>
  <programme start="20261017130000" stop="20261017140000" channel="a"><title>Kept</title></programme>
</tv>"#,
        );

        assert_eq!(records.len(), 1);
        let Record::Programme(programme) = &records[0] else {
            panic!("expected a programme");
        };
        assert_eq!(programme.title, "Kept");
    }

    #[test]
    fn test_truncated_document_ends_sequence() {
        let records = records(
            r#"<tv>
  <channel id="a"><display-name>A</display-name></channel>
  <programme start="20261017120000" stop="20261017130000" channel="a"><title>Cut"#,
        );

        assert_eq!(
            records,
            vec![Record::Channel(Channel {
                id: "a".to_string(),
                display_names: vec!["A".to_string()],
            })]
        );
    }

    #[test]
    fn test_cdata_text() {
        let records = records(
            r#"<tv><programme start="1" stop="2" channel="a"><desc><![CDATA[<b>bold</b>]]></desc></programme></tv>"#,
        );

        let Record::Programme(programme) = &records[0] else {
            panic!("expected a programme");
        };
        assert_eq!(programme.description, "<b>bold</b>");
    }

    #[test]
    fn test_adjacent_repeated_elements() {
        let records = records(concat!(
            r#"<tv><channel id="x"><display-name>5 WCVB</display-name><display-name>WCVB</display-name></channel>"#,
            r#"<programme start="1" stop="2" channel="x"><category>News</category><category>Weather</category>"#,
            r#"<title lang="de">Erste</title><title lang="en">Second</title></programme></tv>"#,
        ));

        assert_eq!(
            records[0],
            Record::Channel(Channel {
                id: "x".to_string(),
                display_names: vec!["5 WCVB".to_string(), "WCVB".to_string()],
            })
        );

        let Record::Programme(programme) = &records[1] else {
            panic!("expected a programme");
        };
        assert_eq!(programme.categories, vec!["News".to_string(), "Weather".to_string()]);
        assert_eq!(programme.title, "Second");
    }

    #[test]
    fn test_last_single_valued_child_wins() {
        let records = records(
            r#"<tv><programme start="1" stop="2" channel="a">
  <title lang="de">Erste</title>
  <title lang="en">Second</title>
  <rating system="FSK"><value>16</value></rating>
  <rating system="VCHIP"><value>TV-14</value></rating>
</programme></tv>"#,
        );

        let Record::Programme(programme) = &records[0] else {
            panic!("expected a programme");
        };
        assert_eq!(programme.title, "Second");
        assert_eq!(programme.rating.as_deref(), Some("TV-14"));
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let records = records(
            r#"<tv><programme start="1" stop="2" channel="a"><title>  Padded  </title><desc>one <!-- c --> two</desc></programme></tv>"#,
        );

        let Record::Programme(programme) = &records[0] else {
            panic!("expected a programme");
        };
        assert_eq!(programme.title, "  Padded  ");
        assert_eq!(programme.description, "one  two");
    }
}
