//! Parsing of the provider's fixed-column metrics table.
//!
//! The table has a header line followed by one data line holding
//! `%cpu %mem rss vsz`, whitespace separated. A field that is missing or does
//! not parse is reported as zero, and its name is returned alongside the
//! sample so the caller can account for it.

use crate::core::Sample;
use std::str::FromStr;

/// Names of the data-line columns, in order.
pub const COLUMNS: [&str; 4] = ["%cpu", "%mem", "rss", "vsz"];

/// A parsed data line together with the columns that fell back to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub sample: Sample,
    pub degraded: Vec<&'static str>,
}

impl ParsedTable {
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Parses a provider payload.
///
/// Returns `None` when there is no data line at all (an empty payload, or a
/// header on its own), which means the process was not found.
pub fn parse_table(payload: &str) -> Option<ParsedTable> {
    let mut lines = payload.lines();
    let _header = lines.next()?;
    let data = lines.next().filter(|line| !line.trim().is_empty())?;

    let mut fields = data.split_whitespace();
    let mut degraded = Vec::new();

    let cpu_percent = field(fields.next(), COLUMNS[0], &mut degraded);
    let mem_percent = field(fields.next(), COLUMNS[1], &mut degraded);
    let rss_kib = field(fields.next(), COLUMNS[2], &mut degraded);
    let vsz_kib = field(fields.next(), COLUMNS[3], &mut degraded);

    Some(ParsedTable {
        sample: Sample {
            cpu_percent,
            mem_percent,
            rss_kib,
            vsz_kib,
        },
        degraded,
    })
}

fn field<T>(raw: Option<&str>, column: &'static str, degraded: &mut Vec<&'static str>) -> T
where
    T: FromStr + Default,
{
    match raw.map(str::parse::<T>) {
        Some(Ok(value)) => value,
        _ => {
            degraded.push(column);
            T::default()
        }
    }
}
