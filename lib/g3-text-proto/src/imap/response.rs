/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str;

use atoi::FromRadix10Checked;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImapResponseError {
    #[error("empty line")]
    EmptyLine,
    #[error("no tag found as a prefix")]
    NotTagPrefixed,
    #[error("invalid utf-8 tag")]
    InvalidUtf8Tag,
    #[error("no result field found")]
    NoResultField,
    #[error("invalid tagged result")]
    InvalidTaggedResult,
    #[error("invalid literal size")]
    InvalidLiteralSize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImapStatus {
    Ok,
    No,
    Bad,
    PreAuth,
    Bye,
}

impl ImapStatus {
    fn parse(s: &[u8]) -> Option<Self> {
        if s.eq_ignore_ascii_case(b"OK") {
            Some(ImapStatus::Ok)
        } else if s.eq_ignore_ascii_case(b"NO") {
            Some(ImapStatus::No)
        } else if s.eq_ignore_ascii_case(b"BAD") {
            Some(ImapStatus::Bad)
        } else if s.eq_ignore_ascii_case(b"PREAUTH") {
            Some(ImapStatus::PreAuth)
        } else if s.eq_ignore_ascii_case(b"BYE") {
            Some(ImapStatus::Bye)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedResponse {
    pub tag: SmolStr,
    pub status: ImapStatus,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImapResponse {
    Tagged(TaggedResponse),
    Untagged {
        status: Option<ImapStatus>,
        literal: Option<usize>,
    },
    Continuation,
}

impl ImapResponse {
    /// Parse one response line, given without its CRLF terminator.
    pub fn parse_line(line: &[u8]) -> Result<Self, ImapResponseError> {
        match line.first() {
            None => Err(ImapResponseError::EmptyLine),
            Some(b'+') => Ok(ImapResponse::Continuation),
            Some(b'*') => {
                let left = line
                    .strip_prefix(b"* ")
                    .ok_or(ImapResponseError::NoResultField)?;
                let word = match memchr::memchr(b' ', left) {
                    Some(p) => &left[..p],
                    None => left,
                };
                Ok(ImapResponse::Untagged {
                    status: ImapStatus::parse(word),
                    literal: literal_size(line)?,
                })
            }
            Some(b' ') => Err(ImapResponseError::NotTagPrefixed),
            Some(_) => {
                let Some(p) = memchr::memchr(b' ', line) else {
                    return Err(ImapResponseError::NotTagPrefixed);
                };
                let tag =
                    str::from_utf8(&line[..p]).map_err(|_| ImapResponseError::InvalidUtf8Tag)?;
                let left = &line[p + 1..];
                let (word, text) = match memchr::memchr(b' ', left) {
                    Some(p) => (&left[..p], &left[p + 1..]),
                    None => (left, &left[left.len()..]),
                };
                if word.is_empty() {
                    return Err(ImapResponseError::NoResultField);
                }
                let status = match ImapStatus::parse(word) {
                    Some(s @ (ImapStatus::Ok | ImapStatus::No | ImapStatus::Bad)) => s,
                    _ => return Err(ImapResponseError::InvalidTaggedResult),
                };
                Ok(ImapResponse::Tagged(TaggedResponse {
                    tag: SmolStr::from(tag),
                    status,
                    text: String::from_utf8_lossy(text).into_owned(),
                }))
            }
        }
    }
}

/// Size of the literal announced at the end of the line, if any.
pub(crate) fn literal_size(line: &[u8]) -> Result<Option<usize>, ImapResponseError> {
    let Some(left) = line.strip_suffix(b"}") else {
        return Ok(None);
    };
    let Some(p) = memchr::memrchr(b'{', left) else {
        return Ok(None);
    };
    let mut size_s = &left[p + 1..];
    // non-synchronizing literal
    if let Some(s) = size_s.strip_suffix(b"+") {
        size_s = s;
    }
    let (size, offset) = usize::from_radix_10_checked(size_s);
    if size_s.is_empty() || offset != size_s.len() {
        return Err(ImapResponseError::InvalidLiteralSize);
    }
    size.map(Some).ok_or(ImapResponseError::InvalidLiteralSize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged() {
        let rsp = ImapResponse::parse_line(b"a001 OK LOGIN completed").unwrap();
        let ImapResponse::Tagged(r) = rsp else {
            panic!("parse failed")
        };
        assert_eq!(r.tag.as_str(), "a001");
        assert_eq!(r.status, ImapStatus::Ok);
        assert_eq!(r.text, "LOGIN completed");

        let rsp = ImapResponse::parse_line(b"a002 no").unwrap();
        let ImapResponse::Tagged(r) = rsp else {
            panic!("parse failed")
        };
        assert_eq!(r.status, ImapStatus::No);
        assert_eq!(r.text, "");
    }

    #[test]
    fn tagged_invalid() {
        assert_eq!(
            ImapResponse::parse_line(b"a001 FETCH done").unwrap_err(),
            ImapResponseError::InvalidTaggedResult
        );
        assert_eq!(
            ImapResponse::parse_line(b"a001").unwrap_err(),
            ImapResponseError::NotTagPrefixed
        );
        assert_eq!(
            ImapResponse::parse_line(b" OK").unwrap_err(),
            ImapResponseError::NotTagPrefixed
        );
        assert_eq!(
            ImapResponse::parse_line(b"").unwrap_err(),
            ImapResponseError::EmptyLine
        );
    }

    #[test]
    fn untagged() {
        let rsp = ImapResponse::parse_line(b"* BYE Autologout; idle for too long").unwrap();
        assert_eq!(
            rsp,
            ImapResponse::Untagged {
                status: Some(ImapStatus::Bye),
                literal: None
            }
        );

        let rsp = ImapResponse::parse_line(b"* 23 EXISTS").unwrap();
        assert_eq!(
            rsp,
            ImapResponse::Untagged {
                status: None,
                literal: None
            }
        );
    }

    #[test]
    fn fetch_literal() {
        let rsp = ImapResponse::parse_line(b"* 12 FETCH (BODY[HEADER] {342}").unwrap();
        assert_eq!(
            rsp,
            ImapResponse::Untagged {
                status: None,
                literal: Some(342)
            }
        );

        assert_eq!(literal_size(b"x {5+}").unwrap(), Some(5));
        assert_eq!(literal_size(b"x {}").unwrap_err(), ImapResponseError::InvalidLiteralSize);
        assert_eq!(literal_size(b"x {1a}").unwrap_err(), ImapResponseError::InvalidLiteralSize);
        assert_eq!(literal_size(b"x }").unwrap(), None);
    }

    #[test]
    fn continuation() {
        let rsp = ImapResponse::parse_line(b"+ Ready for literal data").unwrap();
        assert_eq!(rsp, ImapResponse::Continuation);
    }
}
