/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};

use super::{
    FtpEntryParser, FtpFileAccess, FtpFileEntry, FtpFileEntryType, FtpFilePermissions,
    FtpFileTimestamp, FtpTimestampPrecision,
};

// groups: 1 type, 4..=14 permissions, 15 links, 16 user, 17 group,
// 18 size, 19 date, 20 year or time, 21 name
static UNIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([bcdelfmpSs-])",
        r"(((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-])))\+?",
        r"\s*(\d+)\s+",
        r"(?:(\S+(?:\s\S+)*?)\s+)?",
        r"(?:(\S+(?:\s\S+)*)\s+)?",
        r"(\d+(?:,\s*\d+)?)\s+",
        r"((?:\d+[-/]\d+[-/]\d+)|(?:\S{3}\s+\d{1,2})|(?:\d{1,2}\s+\S{3}))\s+",
        r"(\d+(?::\d+)?)\s(.*)$",
    ))
    .unwrap()
});

// same as above, but the day comes before the month
static AIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([bcdelfmpSs-])",
        r"(((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-])))\+?",
        r"\s*(\d+)\s+",
        r"(?:(\S+(?:\s\S+)*?)\s+)?",
        r"(?:(\S+(?:\s\S+)*)\s+)?",
        r"(\d+(?:,\s*\d+)?)\s+",
        r"(\d{1,2}\s+\S{3})\s+",
        r"(\d+(?::\d+)?)\s(.*)$",
    ))
    .unwrap()
});

static TOTAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^total \d+$").unwrap());

const SYMLINK_MARKER: &str = " -> ";

/// Parser for `ls -l` style listings.
///
/// When only `HH:MM` is shown the year is not in the listing, it is taken
/// from the reference date (today by default), or the year before if the
/// month is later than the reference month.
pub struct UnixEntryParser {
    regex: &'static Regex,
    reference_date: Option<NaiveDate>,
}

impl Default for UnixEntryParser {
    fn default() -> Self {
        UnixEntryParser {
            regex: &UNIX_REGEX,
            reference_date: None,
        }
    }
}

impl UnixEntryParser {
    pub fn aix() -> Self {
        UnixEntryParser {
            regex: &AIX_REGEX,
            reference_date: None,
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    fn parse_timestamp(&self, date: &str, time: &str) -> Option<FtpFileTimestamp> {
        let mut fields = date.split_whitespace();
        let first = fields.next()?;
        let Some(second) = fields.next() else {
            return parse_numeric_timestamp(first, time);
        };

        let (month, day) = if first.as_bytes()[0].is_ascii_digit() {
            (super::parse_month(second)?, u32::from_str(first).ok()?)
        } else {
            (super::parse_month(first)?, u32::from_str(second).ok()?)
        };

        match time.split_once(':') {
            Some((h, m)) => {
                let today = self.reference_date();
                let mut year = today.year();
                if month > today.month() {
                    year -= 1;
                }
                let dt = NaiveDate::from_ymd_opt(year, month, day)?
                    .and_hms_opt(u32::from_str(h).ok()?, u32::from_str(m).ok()?, 0)?;
                Some(FtpFileTimestamp::new(dt, FtpTimestampPrecision::Minute))
            }
            None => {
                let year = i32::from_str(time).ok()?;
                let dt = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
                Some(FtpFileTimestamp::new(dt, FtpTimestampPrecision::Day))
            }
        }
    }

    fn build_entry(&self, line: &str, caps: &Captures<'_>) -> FtpFileEntry {
        let mut entry = FtpFileEntry::new(line, &caps[21]);

        let mut device = false;
        let entry_type = match caps[1].as_bytes()[0] {
            b'd' => FtpFileEntryType::Directory,
            b'e' | b'l' => FtpFileEntryType::SymbolicLink,
            b'b' | b'c' => {
                device = true;
                FtpFileEntryType::File
            }
            b'f' | b'-' => FtpFileEntryType::File,
            _ => FtpFileEntryType::Unknown,
        };
        entry.set_entry_type(entry_type);
        if device {
            entry.set_device();
        }

        let access = |i: usize| FtpFileAccess {
            read: &caps[i] != "-",
            write: &caps[i + 1] != "-",
            execute: is_executable(&caps[i + 2]),
        };
        entry.set_permissions(FtpFilePermissions {
            user: access(4),
            group: access(8),
            world: access(12),
        });

        if !device {
            if let Ok(n) = u32::from_str(&caps[15]) {
                entry.set_hard_link_count(n);
            }
            // device lines show "major, minor" here
            if let Ok(size) = u64::from_str(&caps[18]) {
                entry.set_size(size);
            }
        }
        if let Some(user) = caps.get(16) {
            entry.set_user(user.as_str());
        }
        if let Some(group) = caps.get(17) {
            entry.set_group(group.as_str());
        }

        if let Some(ts) = self.parse_timestamp(&caps[19], &caps[20]) {
            entry.set_timestamp(ts);
        }

        if entry_type == FtpFileEntryType::SymbolicLink {
            if let Some((name, target)) = caps[21].split_once(SYMLINK_MARKER) {
                entry.set_name(name);
                entry.set_link_target(target);
            }
        }

        entry
    }
}

fn is_executable(c: &str) -> bool {
    // S, T and L mark a set bit without execute permission
    !matches!(c, "-" | "S" | "T" | "L")
}

/// `YYYY-MM-DD HH:MM` or `MM-DD-YY HH:MM`
fn parse_numeric_timestamp(date: &str, time: &str) -> Option<FtpFileTimestamp> {
    let (h, m) = time.split_once(':')?;
    let fmt_date = if date.split(['-', '/']).next()?.len() == 4 {
        NaiveDate::parse_from_str(&date.replace('/', "-"), "%Y-%m-%d").ok()?
    } else {
        super::parse_mdy_date(date)?
    };
    let dt: NaiveDateTime =
        fmt_date.and_hms_opt(u32::from_str(h).ok()?, u32::from_str(m).ok()?, 0)?;
    Some(FtpFileTimestamp::new(dt, FtpTimestampPrecision::Minute))
}

impl FtpEntryParser for UnixEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry> {
        let caps = self.regex.captures(line)?;
        Some(self.build_entry(line, &caps))
    }

    fn is_entry_line(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    fn preparse<'a>(&self, lines: &'a [String]) -> Cow<'a, [String]> {
        if lines.iter().any(|l| TOTAL_REGEX.is_match(l)) {
            let lines = lines
                .iter()
                .filter(|l| !TOTAL_REGEX.is_match(l))
                .cloned()
                .collect::<Vec<_>>();
            Cow::Owned(lines)
        } else {
            Cow::Borrowed(lines)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> UnixEntryParser {
        UnixEntryParser::default()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn datetime(y: i32, mon: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mon, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn directory_with_year() {
        let line = "drwxr-xr-x   2 root     other        512 Apr  8  1994 etc";
        let entry = parser().parse_entry(line).unwrap();
        assert_eq!(entry.name(), "etc");
        assert!(entry.is_dir());
        assert_eq!(entry.size(), Some(512));
        assert_eq!(entry.hard_link_count(), Some(2));
        assert_eq!(entry.user(), Some("root"));
        assert_eq!(entry.group(), Some("other"));
        assert_eq!(entry.raw(), line);

        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.datetime(), &datetime(1994, 4, 8, 0, 0));
        assert_eq!(ts.precision(), FtpTimestampPrecision::Day);

        let p = entry.permissions().unwrap();
        assert!(p.user.read && p.user.write && p.user.execute);
        assert!(p.group.read && !p.group.write && p.group.execute);
        assert!(p.world.read && !p.world.write && p.world.execute);
    }

    #[test]
    fn file_name_with_spaces() {
        let line = "-rw-r--r--   1 ftp      ftp      1234567 Jan 23 14:05 file name.txt";
        let entry = parser().parse_entry(line).unwrap();
        assert_eq!(entry.name(), "file name.txt");
        assert!(entry.is_file());
        assert_eq!(entry.size(), Some(1234567));
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.datetime(), &datetime(2024, 1, 23, 14, 5));
        assert_eq!(ts.precision(), FtpTimestampPrecision::Minute);
    }

    #[test]
    fn year_inference() {
        // December is after June, so it must be last year
        let line = "-rwsr-Sr-T   1 user     group        100 Dec 31 23:59 suid";
        let entry = parser().parse_entry(line).unwrap();
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.datetime(), &datetime(2023, 12, 31, 23, 59));

        let p = entry.permissions().unwrap();
        assert!(p.user.execute);
        assert!(!p.group.execute);
        assert!(!p.world.execute);

        let line = "-rw-r--r--   1 user     group        100 Jun 15 08:00 today";
        let entry = parser().parse_entry(line).unwrap();
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.datetime(), &datetime(2024, 6, 15, 8, 0));
    }

    #[test]
    fn symbolic_link() {
        let line = "lrwxrwxrwx   1 root     root          11 Mar  1  2020 link -> target dir";
        let entry = parser().parse_entry(line).unwrap();
        assert!(entry.is_symlink());
        assert_eq!(entry.name(), "link");
        assert_eq!(entry.link_target(), Some("target dir"));

        // the marker only splits link names
        let line = "-rw-r--r--   1 root     root          11 Mar  1  2020 a -> b";
        let entry = parser().parse_entry(line).unwrap();
        assert_eq!(entry.name(), "a -> b");
        assert!(entry.link_target().is_none());
    }

    #[test]
    fn device() {
        let line = "crw-rw-rw-   1 root     sys       11, 42 Aug 26  1997 zero";
        let entry = parser().parse_entry(line).unwrap();
        assert!(entry.is_file());
        assert!(entry.is_device());
        assert!(entry.size().is_none());
        assert!(entry.hard_link_count().is_none());
        assert_eq!(entry.name(), "zero");
    }

    #[test]
    fn optional_columns() {
        let line = "-rw-r--r--   1 1000          42 Feb  2 09:00 nogroup";
        let entry = parser().parse_entry(line).unwrap();
        assert_eq!(entry.user(), Some("1000"));
        assert!(entry.group().is_none());
        assert_eq!(entry.size(), Some(42));

        let line = "drwxr-xr-x+  5 user  staff  160 Jun 10 10:10 acl";
        let entry = parser().parse_entry(line).unwrap();
        assert_eq!(entry.name(), "acl");
        assert_eq!(entry.hard_link_count(), Some(5));
    }

    #[test]
    fn numeric_date() {
        let line = "-rw-r--r--   1 owner    group       2048 2020-05-06 07:08 numeric";
        let entry = parser().parse_entry(line).unwrap();
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.datetime(), &datetime(2020, 5, 6, 7, 8));
    }

    #[test]
    fn aix() {
        let parser = UnixEntryParser::aix()
            .with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        let line = "drwxr-xr-x   2 root     system       512 05 Mar 11:20 bin";
        let entry = parser.parse_entry(line).unwrap();
        assert_eq!(entry.name(), "bin");
        assert!(entry.is_dir());
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.datetime(), &datetime(2024, 3, 5, 11, 20));

        let line = "-rw-r--r--   1 owner    group         12 Jan 12  2001 month first";
        assert!(parser.parse_entry(line).is_none());
    }

    #[test]
    fn not_entries() {
        let parser = parser();
        for line in [
            "",
            "total 14",
            "-rw-r--r--   1 owner group 12 Sept 1 2001 bad",
            "12-05-96  05:03PM       <DIR>          absoft2",
            "zrw-r--r--   1 owner    group         12 Jan 12  2001 bad type",
        ] {
            assert!(parser.parse_entry(line).is_none(), "{line}");
        }
    }

    #[test]
    fn total_line_removed() {
        let lines = vec![
            "total 14".to_string(),
            "drwxr-xr-x   2 root     other        512 Apr  8  1994 etc".to_string(),
        ];
        let parser = parser();
        let lines = parser.preparse(&lines);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("drwx"));
    }
}
