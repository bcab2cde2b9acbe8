//! Streaming reader for Apple-Health style XML exports.
//!
//! Exports routinely run to gigabytes, so records are pulled one at a time
//! from a [`quick_xml::Reader`] and never held as a document tree. Only
//! `Record` elements that are direct children of the root element are
//! yielded; anything nested deeper (metadata entries, correlation members,
//! workout routes) is skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::domain::RawRecord;
use crate::error::{ExportError, ExportResult};

const RECORD_TAG: &[u8] = b"Record";

/// Iterator over the top-level `Record` elements of an export.
///
/// Yields `Err` once on the first XML syntax error and then stops.
///
/// # Examples
///
/// ```
/// use health_export::parsing::health_xml::HealthXmlReader;
///
/// let xml = r#"<HealthData>
///   <Record type="HKQuantityTypeIdentifierStepCount" unit="count" value="42"
///           startDate="2024-01-01 08:00:00 +0000" endDate="2024-01-01 08:05:00 +0000"/>
/// </HealthData>"#;
///
/// let records: Vec<_> = HealthXmlReader::new(xml.as_bytes())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].value.as_deref(), Some("42"));
/// ```
pub struct HealthXmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    finished: bool,
}

impl HealthXmlReader<BufReader<File>> {
    /// Open an export file for streaming.
    pub fn from_path(path: &Path) -> ExportResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> HealthXmlReader<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::with_capacity(1024),
            depth: 0,
            finished: false,
        }
    }

    /// Byte offset the reader has consumed so far.
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    fn xml_error(&self, source: quick_xml::Error) -> ExportError {
        ExportError::Xml {
            position: self.reader.buffer_position(),
            source,
        }
    }
}

impl<R: BufRead> Iterator for HealthXmlReader<R> {
    type Item = ExportResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            let outcome = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => {
                    let top_level = self.depth == 1 && e.name().as_ref() == RECORD_TAG;
                    self.depth += 1;
                    top_level.then(|| record_from_element(e))
                }
                Ok(Event::Empty(ref e)) => {
                    let top_level = self.depth == 1 && e.name().as_ref() == RECORD_TAG;
                    top_level.then(|| record_from_element(e))
                }
                Ok(Event::End(_)) => {
                    self.depth = self.depth.saturating_sub(1);
                    None
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            };

            match outcome {
                Some(Ok(record)) => return Some(Ok(record)),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(self.xml_error(e)));
                }
                None => continue,
            }
        }
    }
}

/// Copy the attributes we care about into an owned record.
fn record_from_element(element: &BytesStart<'_>) -> Result<RawRecord, quick_xml::Error> {
    let mut record = RawRecord::default();

    for attr in element.attributes() {
        let attr = attr?;
        let slot = match attr.key.as_ref() {
            b"type" => &mut record.type_name,
            b"unit" => &mut record.unit,
            b"value" => &mut record.value,
            b"startDate" => &mut record.start_date,
            b"endDate" => &mut record.end_date,
            b"sourceName" => &mut record.source_name,
            _ => continue,
        };
        *slot = Some(attr.unescape_value()?.into_owned());
    }

    Ok(record)
}

/// Read every top-level record of an in-memory export.
pub fn parse_health_xml_str(xml: &str) -> ExportResult<Vec<RawRecord>> {
    HealthXmlReader::new(xml.as_bytes()).collect()
}
