/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::{
    FtpEntryParser, FtpFileEntry, FtpFileEntryType, FtpFileTimestamp, FtpTimestampPrecision,
};

// groups: 1 size, 2 attributes, 3 dir marker, 4 date, 5 time, 6 name
static OS2_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+)\s*(\s+|[A-Z]+)\s*(DIR|\s+)\s*(\S+)\s+(\S+)\s+(\S.*)$").unwrap()
});

/// Parser for OS/2 FTP server listings.
///
/// `     0           DIR   12-30-97   12:32  jbrekke`
pub struct Os2EntryParser;

impl FtpEntryParser for Os2EntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry> {
        let caps = OS2_REGEX.captures(line)?;
        let date = super::parse_mdy_date(&caps[4])?;
        let time = super::nt::parse_clock_time(&caps[5])?;

        let mut entry = FtpFileEntry::new(line, &caps[6]);
        if caps[2].trim() == "DIR" || caps[3].trim() == "DIR" {
            entry.set_entry_type(FtpFileEntryType::Directory);
        } else {
            entry.set_entry_type(FtpFileEntryType::File);
        }
        if let Ok(size) = u64::from_str(&caps[1]) {
            entry.set_size(size);
        }

        entry.set_timestamp(FtpFileTimestamp::new(
            date.and_time(time),
            FtpTimestampPrecision::Minute,
        ));
        Some(entry)
    }

    fn is_entry_line(&self, line: &str) -> bool {
        OS2_REGEX.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn directory() {
        let entry = Os2EntryParser
            .parse_entry("     0           DIR   12-30-97   12:32  jbrekke")
            .unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name(), "jbrekke");
        assert_eq!(entry.size(), Some(0));
        let ts = entry.timestamp().unwrap();
        assert_eq!(
            ts.datetime(),
            &NaiveDate::from_ymd_opt(1997, 12, 30)
                .unwrap()
                .and_hms_opt(12, 32, 0)
                .unwrap()
        );

        let entry = Os2EntryParser
            .parse_entry("   187  A    DIR   05-12-97   16:21  multi word dir")
            .unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name(), "multi word dir");
    }

    #[test]
    fn file() {
        let entry = Os2EntryParser
            .parse_entry("   345           A     12-03-97   08:16  newfile.txt")
            .unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.name(), "newfile.txt");
        assert_eq!(entry.size(), Some(345));

        let entry = Os2EntryParser
            .parse_entry("  1234      A          12-14-97   13:23  sorted.txt")
            .unwrap();
        assert!(entry.is_file());
        assert_eq!(entry.size(), Some(1234));
        let ts = entry.timestamp().unwrap();
        assert_eq!(
            ts.datetime(),
            &NaiveDate::from_ymd_opt(1997, 12, 14)
                .unwrap()
                .and_hms_opt(13, 23, 0)
                .unwrap()
        );
    }

    #[test]
    fn not_entries() {
        for line in [
            "",
            "drwxr-xr-x   2 root     other        512 Apr  8  1994 etc",
            "12-05-96  05:03PM       <DIR>          absoft2",
            "     0           DIR   13-30-97   12:32  bad_month",
        ] {
            assert!(Os2EntryParser.parse_entry(line).is_none(), "{line}");
        }
    }
}
