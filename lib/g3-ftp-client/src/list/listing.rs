/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tokio::io::AsyncRead;

use super::{FtpEntryParser, FtpFileEntry};
use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;
use crate::transfer::FtpLineDataTransfer;

/// The raw lines of a directory listing, parsed on demand.
///
/// Any number of cursors, each with its own parser, can be opened over the
/// same lines.
pub struct FtpListing {
    lines: Vec<String>,
    parser: Arc<dyn FtpEntryParser>,
}

impl fmt::Debug for FtpListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpListing")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl FtpListing {
    pub fn new(lines: Vec<String>, parser: Arc<dyn FtpEntryParser>) -> Self {
        FtpListing { lines, parser }
    }

    /// Drain `reader` to the end and keep all the lines.
    pub async fn read_from<R>(
        reader: R,
        config: &FtpTransferConfig,
        parser: Arc<dyn FtpEntryParser>,
    ) -> Result<Self, FtpLineDataReadError>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = Vec::new();
        FtpLineDataTransfer::new(reader, config)
            .read_to_end(&mut lines)
            .await?;
        Ok(FtpListing::new(lines, parser))
    }

    #[inline]
    pub fn raw_lines(&self) -> &[String] {
        &self.lines
    }

    #[inline]
    pub fn parser(&self) -> &Arc<dyn FtpEntryParser> {
        &self.parser
    }

    pub fn set_parser(&mut self, parser: Arc<dyn FtpEntryParser>) {
        self.parser = parser;
    }

    /// Open a cursor with the default parser.
    pub fn cursor(&self) -> FtpListingCursor<'_> {
        FtpListingCursor::new(&self.lines, self.parser.as_ref())
    }

    /// Open a cursor with another parser.
    pub fn cursor_with<'a>(&'a self, parser: &'a dyn FtpEntryParser) -> FtpListingCursor<'a> {
        FtpListingCursor::new(&self.lines, parser)
    }

    /// Parse all entries with the default parser.
    pub fn entries(&self) -> Vec<FtpFileEntry> {
        self.cursor().collect()
    }
}

/// A position over the lines of a [`FtpListing`].
///
/// Each line is parsed at most once per cursor.
pub struct FtpListingCursor<'a> {
    lines: Cow<'a, [String]>,
    parser: &'a dyn FtpEntryParser,
    parsed: Vec<Option<Option<FtpFileEntry>>>,
    position: usize,
}

impl<'a> FtpListingCursor<'a> {
    fn new(lines: &'a [String], parser: &'a dyn FtpEntryParser) -> Self {
        let lines = parser.preparse(lines);
        let parsed = vec![None; lines.len()];
        FtpListingCursor {
            lines,
            parser,
            parsed,
            position: 0,
        }
    }

    /// Number of lines after preparse, entries or not.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line index of the next entry to be returned.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the entry at line `index`, or `None` if that line is not an entry.
    pub fn get(&mut self, index: usize) -> Option<&FtpFileEntry> {
        let line = self.lines.get(index)?;
        let slot = &mut self.parsed[index];
        if slot.is_none() {
            *slot = Some(self.parser.parse_entry(line));
        }
        slot.as_ref().and_then(|v| v.as_ref())
    }

    fn next_entry_index(&mut self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|i| self.get(*i).is_some())
    }

    fn previous_entry_index(&mut self, before: usize) -> Option<usize> {
        (0..before).rev().find(|i| self.get(*i).is_some())
    }

    pub fn has_next(&mut self) -> bool {
        self.next_entry_index(self.position).is_some()
    }

    pub fn has_previous(&mut self) -> bool {
        self.previous_entry_index(self.position).is_some()
    }

    /// Return up to `n` entries from the current position and move past them.
    pub fn next_page(&mut self, n: usize) -> Vec<FtpFileEntry> {
        let mut page = Vec::with_capacity(n);
        while page.len() < n {
            let Some(entry) = self.next() else {
                break;
            };
            page.push(entry);
        }
        page
    }

    /// Return up to `n` entries before the current position, in listing
    /// order, and move back to the first of them.
    pub fn previous_page(&mut self, n: usize) -> Vec<FtpFileEntry> {
        let mut page = Vec::with_capacity(n);
        while page.len() < n {
            let Some(i) = self.previous_entry_index(self.position) else {
                break;
            };
            self.position = i;
            if let Some(entry) = self.get(i) {
                page.push(entry.clone());
            }
        }
        page.reverse();
        page
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl Iterator for FtpListingCursor<'_> {
    type Item = FtpFileEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next_entry_index(self.position)?;
        self.position = i + 1;
        self.get(i).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{CompositeEntryParser, NtEntryParser, UnixEntryParser};
    use tokio_test::io::Builder;

    const MIXED_LISTING: &[u8] = b"total 3\r\n\
drwxr-xr-x   2 root     other        512 Apr  8  1994 etc\r\n\
12-05-96  05:03PM       <DIR>          absoft2\r\n\
-rw-r--r--   1 ftp      ftp         42 Jan 23  2001 a.txt\r\n\
\r\n\
11-14-97  04:21PM                  953 AUDITOR3.INI\r\n";

    #[tokio::test]
    async fn read_once_parse_twice() {
        let stream = Builder::new().read(MIXED_LISTING).build();
        let config = FtpTransferConfig::default();
        let parser = Arc::new(UnixEntryParser::default());
        let listing = FtpListing::read_from(stream, &config, parser).await.unwrap();
        assert_eq!(listing.raw_lines().len(), 6);

        let unix: Vec<String> = listing.cursor().map(|e| e.name().to_string()).collect();
        assert_eq!(unix, ["etc", "a.txt"]);

        let nt: Vec<String> = listing
            .cursor_with(&NtEntryParser)
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(nt, ["absoft2", "AUDITOR3.INI"]);

        let composite = CompositeEntryParser::new(vec![
            Box::new(UnixEntryParser::default()),
            Box::new(NtEntryParser),
        ]);
        assert_eq!(listing.cursor_with(&composite).count(), 4);
    }

    #[test]
    fn indexed_access() {
        let lines = MIXED_LISTING
            .split(|b| *b == b'\n')
            .map(|l| String::from_utf8_lossy(l).trim_end().to_string())
            .collect::<Vec<_>>();
        let listing = FtpListing::new(lines, Arc::new(NtEntryParser));
        let mut cursor = listing.cursor();
        assert!(cursor.get(0).is_none());
        assert_eq!(cursor.get(2).unwrap().name(), "absoft2");
        assert!(cursor.get(100).is_none());
        assert_eq!(listing.entries().len(), 2);
    }

    #[test]
    fn debug_raw_lines() {
        let listing = FtpListing::new(vec!["total 0".to_string()], Arc::new(NtEntryParser));
        let s = format!("{listing:?}");
        assert!(s.starts_with("FtpListing"));
        assert!(s.contains("\"total 0\""));
    }

    #[test]
    fn paging() {
        let lines = (0..5)
            .map(|i| format!("-rw-r--r--   1 ftp      ftp         {i} Jan 23  2001 f{i}"))
            .chain(std::iter::once("junk".to_string()))
            .collect::<Vec<_>>();
        let listing = FtpListing::new(lines, Arc::new(UnixEntryParser::default()));
        let mut cursor = listing.cursor();
        assert!(!cursor.has_previous());
        assert!(cursor.has_next());

        let page = cursor.next_page(2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[1].name(), "f1");

        let page = cursor.next_page(2);
        assert_eq!(page[0].name(), "f2");
        assert_eq!(page[1].name(), "f3");

        let page = cursor.next_page(2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name(), "f4");
        assert!(!cursor.has_next());
        assert!(cursor.has_previous());

        let page = cursor.previous_page(3);
        let names: Vec<&str> = page.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["f2", "f3", "f4"]);
        assert_eq!(cursor.next().unwrap().name(), "f2");

        cursor.reset();
        assert_eq!(cursor.next().unwrap().name(), "f0");
    }
}
