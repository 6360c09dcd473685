/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use super::{
    FtpEntryParser, FtpFileEntry, FtpFileEntryType, FtpFileTimestamp, FtpTimestampPrecision,
};

// groups: 1 name;version, 2 blocks, 3 date, 4 time, 6 owner or 7 group and 8 owner
static VMS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(.*?;[0-9]+)\s*(\d+)(?:/\d+)?\s*(\S+)\s+(\S+)\s+",
        r"\[(([0-9$A-Za-z_]+)|([0-9$A-Za-z_]+),([0-9$a-zA-Z_]+))\]?\s*",
        r"\([a-zA-Z]*,([a-zA-Z]*),([a-zA-Z]*),([a-zA-Z]*)\)$",
    ))
    .unwrap()
});

const VMS_BLOCK_SIZE: u64 = 512;

/// Parser for OpenVMS `DIRECTORY/SIZE/DATE/OWNER/PROTECTION` style listings.
///
/// Without versioning the `;N` suffix is removed from names, and only the
/// highest version of each file is kept by [`FtpEntryParser::preparse`].
pub struct VmsEntryParser {
    versioning: bool,
}

impl VmsEntryParser {
    pub fn new(versioning: bool) -> Self {
        VmsEntryParser { versioning }
    }

    fn join_lines(lines: &[String]) -> Vec<String> {
        let mut joined = Vec::with_capacity(lines.len());
        let mut pending = String::new();
        for line in lines {
            let trimmed = line.trim();
            if pending.is_empty() {
                if trimmed.is_empty()
                    || trimmed.starts_with("Directory")
                    || trimmed.starts_with("Total")
                {
                    continue;
                }
            } else {
                pending.push(' ');
            }
            pending.push_str(trimmed);
            if trimmed.ends_with(')') {
                joined.push(std::mem::take(&mut pending));
            }
        }
        if !pending.is_empty() {
            joined.push(pending);
        }
        joined
    }

    fn keep_highest_version(lines: Vec<String>) -> Vec<String> {
        let mut kept: Vec<String> = Vec::with_capacity(lines.len());
        let mut seen: HashMap<String, (usize, u32)> = HashMap::new();
        for line in lines {
            let Some((base, version)) = split_version(&line) else {
                kept.push(line);
                continue;
            };
            match seen.get_mut(base) {
                Some((index, highest)) => {
                    if version > *highest {
                        *highest = version;
                        kept[*index] = line;
                    }
                }
                None => {
                    seen.insert(base.to_string(), (kept.len(), version));
                    kept.push(line);
                }
            }
        }
        kept
    }
}

/// Split the leading `NAME;N` field of a listing line.
fn split_version(line: &str) -> Option<(&str, u32)> {
    let field = line.split_whitespace().next()?;
    let (base, version) = field.rsplit_once(';')?;
    let version = u32::from_str(version).ok()?;
    Some((base, version))
}

/// `D-MMM-YYYY` with `HH:MM:SS` or `HH:MM`
fn parse_timestamp(date: &str, time: &str) -> Option<FtpFileTimestamp> {
    let mut parts = date.split('-');
    let day = u32::from_str(parts.next()?).ok()?;
    let month = super::parse_month(parts.next()?)?;
    let year = i32::from_str(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let mut parts = time.split(':');
    let hour = u32::from_str(parts.next()?).ok()?;
    let minute = u32::from_str(parts.next()?).ok()?;
    let (second, precision) = match parts.next() {
        Some(s) => (u32::from_str(s).ok()?, FtpTimestampPrecision::Second),
        None => (0, FtpTimestampPrecision::Minute),
    };
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(FtpFileTimestamp::new(date.and_time(time), precision))
}

impl FtpEntryParser for VmsEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry> {
        let caps = VMS_REGEX.captures(line)?;

        let full_name = caps[1].trim();
        let (base, _) = full_name.rsplit_once(';')?;
        let name = if self.versioning { full_name } else { base };

        let mut entry = FtpFileEntry::new(line, name);
        if base.to_ascii_uppercase().ends_with(".DIR") {
            entry.set_entry_type(FtpFileEntryType::Directory);
        } else {
            entry.set_entry_type(FtpFileEntryType::File);
        }

        if let Ok(blocks) = u64::from_str(&caps[2]) {
            entry.set_size(blocks.saturating_mul(VMS_BLOCK_SIZE));
        }

        if let Some(owner) = caps.get(6) {
            entry.set_user(owner.as_str());
        } else if let (Some(group), Some(owner)) = (caps.get(7), caps.get(8)) {
            entry.set_group(group.as_str());
            entry.set_user(owner.as_str());
        }

        if let Some(ts) = parse_timestamp(&caps[3], &caps[4]) {
            entry.set_timestamp(ts);
        }

        Some(entry)
    }

    fn is_entry_line(&self, line: &str) -> bool {
        VMS_REGEX.is_match(line)
    }

    fn preparse<'a>(&self, lines: &'a [String]) -> Cow<'a, [String]> {
        let joined = VmsEntryParser::join_lines(lines);
        if self.versioning {
            Cow::Owned(joined)
        } else {
            Cow::Owned(VmsEntryParser::keep_highest_version(joined))
        }
    }
}
