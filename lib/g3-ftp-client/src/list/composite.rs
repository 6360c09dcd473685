/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use super::{FtpEntryParser, FtpFileEntry};

/// Try each parser in order, the first match wins.
pub struct CompositeEntryParser {
    parsers: Vec<Box<dyn FtpEntryParser>>,
}

impl CompositeEntryParser {
    pub fn new(parsers: Vec<Box<dyn FtpEntryParser>>) -> Self {
        CompositeEntryParser { parsers }
    }
}

impl FtpEntryParser for CompositeEntryParser {
    fn parse_entry(&self, line: &str) -> Option<FtpFileEntry> {
        self.parsers.iter().find_map(|p| p.parse_entry(line))
    }

    fn is_entry_line(&self, line: &str) -> bool {
        self.parsers.iter().any(|p| p.is_entry_line(line))
    }

    /// Use the preparse of the parser that matches the most raw lines.
    ///
    /// On a tie the earlier parser wins.
    fn preparse<'a>(&self, lines: &'a [String]) -> Cow<'a, [String]> {
        let mut selected: Option<(&dyn FtpEntryParser, usize)> = None;
        for p in &self.parsers {
            let count = lines.iter().filter(|l| p.is_entry_line(l)).count();
            if count > 0 && selected.is_none_or(|(_, max)| count > max) {
                selected = Some((p.as_ref(), count));
            }
        }
        match selected {
            Some((p, _)) => p.preparse(lines),
            None => Cow::Borrowed(lines),
        }
    }
}
