/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

//! Directory listing parsers.
//!
//! Every parser turns one raw LIST line into a [`FtpFileEntry`], or `None` if
//! the line is not an entry of its format. Header, footer and blank lines are
//! expected to give `None`.

use std::borrow::Cow;
use std::str::FromStr;

use crate::error::FtpListFormatParseError;

mod entry;
pub use entry::{
    FtpFileAccess, FtpFileEntry, FtpFileEntryType, FtpFilePermissions, FtpFileTimestamp,
    FtpTimestampPrecision,
};

mod composite;
mod listing;
mod mlsx;
mod nt;
mod os2;
pub(crate) mod time_val;
mod unix;
mod vms;

pub use composite::CompositeEntryParser;
pub use listing::{FtpListing, FtpListingCursor};
pub use mlsx::MlsxEntryParser;
pub use nt::NtEntryParser;
pub use os2::Os2EntryParser;
pub use unix::UnixEntryParser;
pub use vms::VmsEntryParser;

pub trait FtpEntryParser: Send + Sync {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry>;

    /// Tell whether the line has the shape of an entry of this format.
    ///
    /// Used to pick a format without building entries.
    fn is_entry_line(&self, line: &str) -> bool {
        self.parse_entry(line).is_some()
    }

    /// Rework the raw lines before entries are parsed.
    ///
    /// Formats that split one entry over several lines, or that print lines
    /// which must be dropped as a whole, can do it here.
    fn preparse<'a>(&self, lines: &'a [String]) -> Cow<'a, [String]> {
        Cow::Borrowed(lines)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FtpListFormat {
    Unix,
    Aix,
    Nt,
    Vms { versioning: bool },
    Os2,
    Mlsx,
    /// try each format in order, the first match wins
    Composite(Vec<FtpListFormat>),
}

impl Default for FtpListFormat {
    fn default() -> Self {
        FtpListFormat::Composite(vec![
            FtpListFormat::Unix,
            FtpListFormat::Nt,
            FtpListFormat::Vms { versioning: false },
            FtpListFormat::Os2,
            FtpListFormat::Mlsx,
        ])
    }
}

impl FromStr for FtpListFormat {
    type Err = FtpListFormatParseError;

    /// Parse a format name, or a comma separated list of them for a composite.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(',') {
            let formats = s
                .split(',')
                .map(|v| FtpListFormat::from_str(v.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(FtpListFormat::Composite(formats));
        }

        match s.to_lowercase().as_str() {
            "unix" => Ok(FtpListFormat::Unix),
            "aix" => Ok(FtpListFormat::Aix),
            "nt" | "windows" => Ok(FtpListFormat::Nt),
            "vms" => Ok(FtpListFormat::Vms { versioning: false }),
            "vms_versioning" | "vms-versioning" => Ok(FtpListFormat::Vms { versioning: true }),
            "os2" => Ok(FtpListFormat::Os2),
            "mlsx" | "mlsd" => Ok(FtpListFormat::Mlsx),
            "auto" => Ok(FtpListFormat::default()),
            _ => Err(FtpListFormatParseError(s.to_string())),
        }
    }
}

impl FtpListFormat {
    pub fn build_parser(&self) -> Box<dyn FtpEntryParser> {
        match self {
            FtpListFormat::Unix => Box::new(UnixEntryParser::default()),
            FtpListFormat::Aix => Box::new(UnixEntryParser::aix()),
            FtpListFormat::Nt => Box::new(NtEntryParser),
            FtpListFormat::Vms { versioning } => Box::new(VmsEntryParser::new(*versioning)),
            FtpListFormat::Os2 => Box::new(Os2EntryParser),
            FtpListFormat::Mlsx => Box::new(MlsxEntryParser),
            FtpListFormat::Composite(formats) => {
                let parsers = formats.iter().map(|f| f.build_parser()).collect();
                Box::new(CompositeEntryParser::new(parsers))
            }
        }
    }
}

fn parse_month(s: &str) -> Option<u32> {
    let month = match s.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Expand a two digit year to 20YY, wrapping back to 19YY above 2080.
fn expand_two_digit_year(yy: i32) -> i32 {
    let year = 2000 + yy;
    if year > 2080 { year - 100 } else { year }
}

/// Parse `MM-DD-YY` or `MM-DD-YYYY`, with `-` or `/` as separator.
fn parse_mdy_date(s: &str) -> Option<chrono::NaiveDate> {
    let mut parts = s.split(['-', '/']);
    let month = u32::from_str(parts.next()?).ok()?;
    let day = u32::from_str(parts.next()?).ok()?;
    let year_s = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let year = i32::from_str(year_s).ok()?;
    let year = match year_s.len() {
        2 => expand_two_digit_year(year),
        4 => year,
        _ => return None,
    };
    chrono::NaiveDate::from_ymd_opt(year, month, day)
}
