/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::OnceLock;

mod code;
pub use code::{ReplyCategory, ReplyCode};

mod error;
pub use error::{ReplyLineError, ReplyReadError};

mod parser;
pub use parser::{ReplyParser, ReplySyntax};

mod listener;
pub use listener::ReplyListener;

mod reader;
pub use reader::{ReplyReader, ReplyReaderConfig};

/// A complete reply as sent by the server.
///
/// Lines are kept without the trailing CRLF, the first line carries the code.
#[derive(Clone, Debug)]
pub struct Reply {
    code: ReplyCode,
    lines: Vec<String>,
    text: OnceLock<String>,
}

impl Reply {
    pub(crate) fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Reply {
            code,
            lines,
            text: OnceLock::new(),
        }
    }

    #[inline]
    pub fn code(&self) -> ReplyCode {
        self.code
    }

    #[inline]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[inline]
    pub fn is_multi_line(&self) -> bool {
        self.lines.len() > 1
    }

    /// All lines of the reply, each one followed by CRLF.
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| {
            let len = self.lines.iter().map(|l| l.len() + 2).sum();
            let mut s = String::with_capacity(len);
            for line in &self.lines {
                s.push_str(line);
                s.push_str("\r\n");
            }
            s
        })
    }

    /// The text after the code and delimiter on the first line.
    pub fn message(&self) -> &str {
        self.lines
            .first()
            .and_then(|l| l.get(4..))
            .unwrap_or_default()
    }

    /// Messages of all lines, with the code and delimiter removed where present.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        let code = self.code.as_bytes();
        self.lines.iter().map(move |l| {
            if l.len() >= 4 && l.as_bytes()[..3] == code {
                l.get(4..).unwrap_or(l.as_str())
            } else {
                l.as_str()
            }
        })
    }
}

impl PartialEq for Reply {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.lines == other.lines
    }
}

impl Eq for Reply {}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lines.first() {
            Some(line) => f.write_str(line),
            None => write!(f, "{}", self.code),
        }
    }
}
