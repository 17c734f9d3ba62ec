mod fit;
mod tcx;

use chrono::NaiveDateTime;

use crate::error::ParseError;
use crate::types::activity::{ClockOffset, FileFormat, ParsedActivity, Timestamp, TIMESTAMP_FORMAT};

pub trait Parser {
    fn parse(&self, bytes: &[u8], offset: ClockOffset) -> Result<ParsedActivity, ParseError>;
}

pub fn parse(bytes: &[u8], format: FileFormat, offset: ClockOffset) -> Result<ParsedActivity, ParseError> {
    match format {
        FileFormat::Tcx => tcx::TcxParser.parse(bytes, offset),
        FileFormat::Fit => fit::FitParser.parse(bytes, offset),
    }
}

/// Parses the `YYYY-MM-DDTHH:MM:SS` prefix of `text`; fractional seconds and zone
/// suffixes are ignored. Returns `None` when the prefix is not a valid time.
pub fn parse_timestamp(text: &str, offset: ClockOffset) -> Option<Timestamp> {
    let prefix = text.trim().get(..19)?;
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT)
        .ok()
        .map(|time| offset.apply(time))
}
