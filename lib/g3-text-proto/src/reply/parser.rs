/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::{Reply, ReplyCode, ReplyLineError};

/// Protocol specific reply rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplySyntax {
    continuation: Option<u8>,
    closing_code: ReplyCode,
}

impl ReplySyntax {
    pub const FTP: ReplySyntax = ReplySyntax::new(Some(b'-'), ReplyCode::SERVICE_NOT_AVAILABLE);
    pub const SMTP: ReplySyntax = ReplySyntax::new(Some(b'-'), ReplyCode::SERVICE_NOT_AVAILABLE);
    pub const NNTP: ReplySyntax = ReplySyntax::new(None, ReplyCode::NNTP_SERVICE_DISCONTINUED);

    pub const fn new(continuation: Option<u8>, closing_code: ReplyCode) -> Self {
        ReplySyntax {
            continuation,
            closing_code,
        }
    }

    #[inline]
    pub fn continuation(&self) -> Option<u8> {
        self.continuation
    }

    /// The code the server sends right before it closes the connection.
    #[inline]
    pub fn closing_code(&self) -> ReplyCode {
        self.closing_code
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParseState {
    AwaitingFirstLine,
    AwaitingContinuation,
    Complete,
    Malformed,
}

/// Assemble reply lines into a [`Reply`].
///
/// Lines are fed without the line terminator.
pub struct ReplyParser {
    syntax: ReplySyntax,
    strict: bool,
    state: ParseState,
    code: ReplyCode,
    lines: Vec<String>,
}

impl ReplyParser {
    pub fn new(syntax: ReplySyntax, strict: bool) -> Self {
        ReplyParser {
            syntax,
            strict,
            state: ParseState::AwaitingFirstLine,
            code: ReplyCode::default(),
            lines: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.state = ParseState::AwaitingFirstLine;
        self.code = ReplyCode::default();
        self.lines.clear();
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.state == ParseState::Complete
    }

    #[inline]
    pub fn is_malformed(&self) -> bool {
        self.state == ParseState::Malformed
    }

    #[inline]
    pub fn code(&self) -> ReplyCode {
        self.code
    }

    /// Feed one more line.
    ///
    /// Returns the reply once its last line has been seen.
    pub fn feed_line(&mut self, line: &[u8]) -> Result<Option<Reply>, ReplyLineError> {
        let r = match self.state {
            ParseState::AwaitingFirstLine => self.feed_first_line(line),
            ParseState::AwaitingContinuation => Ok(self.feed_following_line(line)),
            ParseState::Complete | ParseState::Malformed => return Err(ReplyLineError::Finished),
        };
        match r {
            Ok(true) => {
                self.state = ParseState::Complete;
                let lines = std::mem::take(&mut self.lines);
                Ok(Some(Reply::new(self.code, lines)))
            }
            Ok(false) => Ok(None),
            Err(e) => {
                self.state = ParseState::Malformed;
                Err(e)
            }
        }
    }

    fn push_line(&mut self, line: &[u8]) {
        self.lines.push(String::from_utf8_lossy(line).into_owned());
    }

    fn feed_first_line(&mut self, line: &[u8]) -> Result<bool, ReplyLineError> {
        if line.len() < 3 {
            return Err(ReplyLineError::TooShort);
        }
        self.code = ReplyCode::parse(line).ok_or(ReplyLineError::InvalidCode)?;
        self.push_line(line);

        let Some(marker) = self.syntax.continuation else {
            return Ok(true);
        };
        if line.len() == 3 {
            return Ok(true);
        }
        if line[3] == marker {
            self.state = ParseState::AwaitingContinuation;
            return Ok(false);
        }
        if self.strict && line[3] != b' ' {
            return Err(ReplyLineError::InvalidDelimiter);
        }
        Ok(true)
    }

    fn feed_following_line(&mut self, line: &[u8]) -> bool {
        self.push_line(line);
        let marker = self.syntax.continuation.unwrap_or(b'-');
        if self.strict {
            line.len() >= 4 && line[..3] == self.code.as_bytes() && line[3] == b' '
        } else {
            line.len() >= 4 && line[3] != marker && line[0].is_ascii_digit()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut ReplyParser, lines: &[&[u8]]) -> Option<Reply> {
        let mut reply = None;
        for line in lines {
            assert!(reply.is_none());
            reply = parser.feed_line(line).unwrap();
        }
        reply
    }

    #[test]
    fn single_line() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        let reply = parser.feed_line(b"220 ready").unwrap().unwrap();
        assert_eq!(reply.code().as_u16(), 220);
        assert_eq!(reply.lines(), &["220 ready"]);
        assert!(parser.finished());
        assert_eq!(
            parser.feed_line(b"220 again").unwrap_err(),
            ReplyLineError::Finished
        );
    }

    #[test]
    fn code_only() {
        let mut parser = ReplyParser::new(ReplySyntax::SMTP, true);
        let reply = parser.feed_line(b"250").unwrap().unwrap();
        assert_eq!(reply.code().as_u16(), 250);
        assert_eq!(reply.message(), "");
    }

    #[test]
    fn multi_line() {
        let mut parser = ReplyParser::new(ReplySyntax::SMTP, false);
        let reply = feed_all(&mut parser, &[b"250-a", b"250-b", b"250 c"]).unwrap();
        assert_eq!(reply.code().as_u16(), 250);
        assert_eq!(reply.lines(), &["250-a", "250-b", "250 c"]);
    }

    #[test]
    fn multi_line_free_text() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        let reply = feed_all(
            &mut parser,
            &[
                b"230-Welcome",
                b"",
                b"  to the server",
                b"ab",
                b"230 Login successful.",
            ],
        )
        .unwrap();
        assert_eq!(reply.code().as_u16(), 230);
        assert_eq!(reply.lines().len(), 5);
        assert_eq!(reply.lines()[1], "");
    }

    #[test]
    fn lenient_end_other_code() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        let reply = feed_all(&mut parser, &[b"211-Features:", b" MDTM", b"999 End"]).unwrap();
        assert_eq!(reply.code().as_u16(), 211);
        assert_eq!(reply.lines().len(), 3);
    }

    #[test]
    fn strict_end_same_code() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, true);
        let r = parser.feed_line(b"211-Features:").unwrap();
        assert!(r.is_none());
        let r = parser.feed_line(b"999 End").unwrap();
        assert!(r.is_none());
        let r = parser.feed_line(b"211?End").unwrap();
        assert!(r.is_none());
        let reply = parser.feed_line(b"211 End").unwrap().unwrap();
        assert_eq!(reply.lines().len(), 4);
    }

    #[test]
    fn truncated() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        assert_eq!(parser.feed_line(b"22").unwrap_err(), ReplyLineError::TooShort);
        assert!(parser.is_malformed());

        parser.reset();
        assert_eq!(parser.feed_line(b"").unwrap_err(), ReplyLineError::TooShort);
    }

    #[test]
    fn invalid_code() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        assert_eq!(
            parser.feed_line(b"abc hello").unwrap_err(),
            ReplyLineError::InvalidCode
        );
        assert_eq!(
            parser.feed_line(b"220 hello").unwrap_err(),
            ReplyLineError::Finished
        );
    }

    #[test]
    fn delimiter() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        let reply = parser.feed_line(b"220+hello").unwrap().unwrap();
        assert_eq!(reply.code().as_u16(), 220);

        let mut parser = ReplyParser::new(ReplySyntax::FTP, true);
        assert_eq!(
            parser.feed_line(b"220+hello").unwrap_err(),
            ReplyLineError::InvalidDelimiter
        );
    }

    #[test]
    fn nntp_single_line_only() {
        let mut parser = ReplyParser::new(ReplySyntax::NNTP, false);
        let reply = parser.feed_line(b"200-news server ready").unwrap().unwrap();
        assert_eq!(reply.code().as_u16(), 200);
        assert!(!reply.is_multi_line());
    }

    #[test]
    fn reuse_after_reset() {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        let _ = parser.feed_line(b"220 ready").unwrap().unwrap();
        parser.reset();
        assert!(!parser.code().is_set());
        let reply = parser.feed_line(b"331 need password").unwrap().unwrap();
        assert_eq!(reply.code().as_u16(), 331);
        assert_eq!(reply.lines().len(), 1);
    }
}
