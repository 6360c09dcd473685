/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use chrono::NaiveDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FtpFileEntryType {
    File,
    Directory,
    SymbolicLink,
    Unknown,
}

impl FtpFileEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpFileEntryType::File => "file",
            FtpFileEntryType::Directory => "dir",
            FtpFileEntryType::SymbolicLink => "link",
            FtpFileEntryType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FtpFileEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FtpFileAccess {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

impl FtpFileAccess {
    fn from_mode_bits(bits: u32) -> Self {
        FtpFileAccess {
            read: bits & 0b100 != 0,
            write: bits & 0b010 != 0,
            execute: bits & 0b001 != 0,
        }
    }
}

/// Access rights for the owner, the group and everyone else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FtpFilePermissions {
    pub user: FtpFileAccess,
    pub group: FtpFileAccess,
    pub world: FtpFileAccess,
}

impl FtpFilePermissions {
    pub fn from_unix_mode(mode: u32) -> Self {
        FtpFilePermissions {
            user: FtpFileAccess::from_mode_bits(mode >> 6),
            group: FtpFileAccess::from_mode_bits(mode >> 3),
            world: FtpFileAccess::from_mode_bits(mode),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FtpTimestampPrecision {
    Day,
    Minute,
    Second,
    Millisecond,
}

/// A listing timestamp, in the server's own time zone unless stated otherwise by the format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FtpFileTimestamp {
    datetime: NaiveDateTime,
    precision: FtpTimestampPrecision,
}

impl FtpFileTimestamp {
    pub fn new(datetime: NaiveDateTime, precision: FtpTimestampPrecision) -> Self {
        FtpFileTimestamp {
            datetime,
            precision,
        }
    }

    #[inline]
    pub fn datetime(&self) -> &NaiveDateTime {
        &self.datetime
    }

    #[inline]
    pub fn precision(&self) -> FtpTimestampPrecision {
        self.precision
    }
}

/// One parsed line of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FtpFileEntry {
    raw: String,
    name: String,
    entry_type: FtpFileEntryType,
    size: Option<u64>,
    hard_link_count: Option<u32>,
    user: Option<String>,
    group: Option<String>,
    permissions: Option<FtpFilePermissions>,
    timestamp: Option<FtpFileTimestamp>,
    link_target: Option<String>,
    device: bool,
}

impl FtpFileEntry {
    pub(crate) fn new(raw: &str, name: &str) -> Self {
        FtpFileEntry {
            raw: raw.to_string(),
            name: name.to_string(),
            entry_type: FtpFileEntryType::Unknown,
            size: None,
            hard_link_count: None,
            user: None,
            group: None,
            permissions: None,
            timestamp: None,
            link_target: None,
            device: false,
        }
    }

    /// The original listing line.
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn entry_type(&self) -> FtpFileEntryType {
        self.entry_type
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.entry_type == FtpFileEntryType::File
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.entry_type == FtpFileEntryType::Directory
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.entry_type == FtpFileEntryType::SymbolicLink
    }

    /// Block or character device, which has no meaningful size.
    #[inline]
    pub fn is_device(&self) -> bool {
        self.device
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn hard_link_count(&self) -> Option<u32> {
        self.hard_link_count
    }

    #[inline]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[inline]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[inline]
    pub fn permissions(&self) -> Option<&FtpFilePermissions> {
        self.permissions.as_ref()
    }

    #[inline]
    pub fn timestamp(&self) -> Option<&FtpFileTimestamp> {
        self.timestamp.as_ref()
    }

    #[inline]
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_entry_type(&mut self, entry_type: FtpFileEntryType) {
        self.entry_type = entry_type;
    }

    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = Some(size);
    }

    pub(crate) fn set_hard_link_count(&mut self, count: u32) {
        self.hard_link_count = Some(count);
    }

    pub(crate) fn set_user(&mut self, user: &str) {
        self.user = Some(user.to_string());
    }

    pub(crate) fn set_group(&mut self, group: &str) {
        self.group = Some(group.to_string());
    }

    pub(crate) fn set_permissions(&mut self, permissions: FtpFilePermissions) {
        self.permissions = Some(permissions);
    }

    pub(crate) fn set_timestamp(&mut self, timestamp: FtpFileTimestamp) {
        self.timestamp = Some(timestamp);
    }

    pub(crate) fn set_link_target(&mut self, target: &str) {
        self.link_target = Some(target.to_string());
    }

    pub(crate) fn set_device(&mut self) {
        self.device = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_mode() {
        let p = FtpFilePermissions::from_unix_mode(0o754);
        assert_eq!(
            p.user,
            FtpFileAccess {
                read: true,
                write: true,
                execute: true
            }
        );
        assert_eq!(
            p.group,
            FtpFileAccess {
                read: true,
                write: false,
                execute: true
            }
        );
        assert_eq!(
            p.world,
            FtpFileAccess {
                read: true,
                write: false,
                execute: false
            }
        );
    }
}
