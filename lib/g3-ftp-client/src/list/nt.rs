/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use super::{
    FtpEntryParser, FtpFileEntry, FtpFileEntryType, FtpFileTimestamp, FtpTimestampPrecision,
};

static NT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(\d{1,2}[-/]\d{1,2}[-/]\d{2}(?:\d{2})?)\s+",
        r"(\d{1,2}:\d{2}(?:[AaPp][Mm])?)\s+",
        r"(?:(<DIR>)|([0-9]+))\s+(\S.*)$",
    ))
    .unwrap()
});

/// Parser for the default IIS listing style.
///
/// `12-05-96  05:03PM       <DIR>          absoft2`
pub struct NtEntryParser;

/// `hh:mmAM`, `hh:mmPM` or 24 hour `HH:MM`
pub(super) fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    let upper = s.to_ascii_uppercase();
    let (hm, pm) = if let Some(v) = upper.strip_suffix("AM") {
        (v, Some(false))
    } else if let Some(v) = upper.strip_suffix("PM") {
        (v, Some(true))
    } else {
        (upper.as_str(), None)
    };

    let (h, m) = hm.split_once(':')?;
    let mut hour = u32::from_str(h).ok()?;
    let minute = u32::from_str(m).ok()?;
    if let Some(pm) = pm {
        if hour == 0 || hour > 12 {
            return None;
        }
        hour %= 12;
        if pm {
            hour += 12;
        }
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

impl FtpEntryParser for NtEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry> {
        let caps = NT_REGEX.captures(line)?;
        let name = &caps[5];
        if name == "." || name == ".." {
            return None;
        }

        let date = super::parse_mdy_date(&caps[1])?;
        let time = parse_clock_time(&caps[2])?;

        let mut entry = FtpFileEntry::new(line, name);
        if caps.get(3).is_some() {
            entry.set_entry_type(FtpFileEntryType::Directory);
            entry.set_size(0);
        } else {
            entry.set_entry_type(FtpFileEntryType::File);
            if let Ok(size) = u64::from_str(&caps[4]) {
                entry.set_size(size);
            }
        }

        entry.set_timestamp(FtpFileTimestamp::new(
            date.and_time(time),
            FtpTimestampPrecision::Minute,
        ));
        Some(entry)
    }

    fn is_entry_line(&self, line: &str) -> bool {
        NT_REGEX.is_match(line)
    }
}
