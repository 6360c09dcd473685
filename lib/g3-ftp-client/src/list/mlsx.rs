/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use super::{
    FtpEntryParser, FtpFileAccess, FtpFileEntry, FtpFileEntryType, FtpFilePermissions,
    FtpFileTimestamp, FtpTimestampPrecision, time_val,
};
use crate::error::FtpFileFactsParseError;

/// Parser for RFC 3659 machine listings, as sent in reply to MLSD.
///
/// `type=file;size=1024;modify=20210525083610; readme.txt`
pub struct MlsxEntryParser;

impl MlsxEntryParser {
    /// Parse one facts line.
    ///
    /// The `cdir` and `pdir` entries give `Ok(None)`.
    pub fn parse_facts(line: &str) -> Result<Option<FtpFileEntry>, FtpFileFactsParseError> {
        let Some((facts, name)) = line.trim_start().split_once(' ') else {
            return Err(FtpFileFactsParseError::NoSpaceDelimiter);
        };

        let mut entry = FtpFileEntry::new(line, name);
        let mut perm: Option<&str> = None;
        for fact in facts.split(';') {
            if fact.is_empty() {
                continue;
            }

            let Some((key, value)) = fact.split_once('=') else {
                return Err(FtpFileFactsParseError::NoDelimiterInFact(
                    fact.to_string(),
                ));
            };
            match key.to_lowercase().as_str() {
                "type" => match value.to_ascii_lowercase().as_str() {
                    "file" => entry.set_entry_type(FtpFileEntryType::File),
                    "dir" => entry.set_entry_type(FtpFileEntryType::Directory),
                    "cdir" | "pdir" => return Ok(None),
                    v => {
                        if let Some(link) = v
                            .strip_prefix("os.unix=slink")
                            .or_else(|| v.strip_prefix("os.unix=symlink"))
                        {
                            entry.set_entry_type(FtpFileEntryType::SymbolicLink);
                            if link.starts_with(':') {
                                // keep the original case of the target
                                let target = &value[value.len() - link.len() + 1..];
                                if !target.is_empty() {
                                    entry.set_link_target(target);
                                }
                            }
                        }
                    }
                },
                "size" | "sizd" => {
                    let size =
                        u64::from_str(value).map_err(|_| FtpFileFactsParseError::InvalidSize)?;
                    entry.set_size(size);
                }
                "modify" => {
                    let dt = time_val::parse_from_str(value)
                        .map_err(FtpFileFactsParseError::InvalidModifyTime)?;
                    let precision = if value.contains('.') {
                        FtpTimestampPrecision::Millisecond
                    } else {
                        FtpTimestampPrecision::Second
                    };
                    entry.set_timestamp(FtpFileTimestamp::new(dt.naive_utc(), precision));
                }
                "unix.mode" => {
                    let mode = u32::from_str_radix(value, 8)
                        .map_err(|_| FtpFileFactsParseError::InvalidUnixMode)?;
                    entry.set_permissions(FtpFilePermissions::from_unix_mode(mode));
                }
                "unix.owner" | "unix.uid" => {
                    if entry.user().is_none() || key.eq_ignore_ascii_case("unix.owner") {
                        entry.set_user(value);
                    }
                }
                "unix.group" | "unix.gid" => {
                    if entry.group().is_none() || key.eq_ignore_ascii_case("unix.group") {
                        entry.set_group(value);
                    }
                }
                "perm" => perm = Some(value),
                _ => {}
            }
        }

        if entry.permissions().is_none() {
            if let Some(perm) = perm {
                entry.set_permissions(permissions_from_perm_fact(perm));
            }
        }

        Ok(Some(entry))
    }
}

/// Map the `perm` fact letters to the owner access bits.
fn permissions_from_perm_fact(perm: &str) -> FtpFilePermissions {
    let mut user = FtpFileAccess::default();
    for c in perm.chars() {
        match c.to_ascii_lowercase() {
            'r' | 'l' => user.read = true,
            'w' | 'a' | 'c' => user.write = true,
            'e' => user.execute = true,
            _ => {}
        }
    }
    FtpFilePermissions {
        user,
        ..Default::default()
    }
}

impl FtpEntryParser for MlsxEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry> {
        match MlsxEntryParser::parse_facts(line) {
            Ok(entry) => entry,
            Err(e) => {
                log::trace!("not a facts line: {e}");
                None
            }
        }
    }

    fn is_entry_line(&self, line: &str) -> bool {
        line.trim_start()
            .split_once(' ')
            .is_some_and(|(facts, _)| facts.ends_with(';') && facts.contains('='))
    }
}
