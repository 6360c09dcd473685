/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

/// General category of a reply, taken from the first digit of the code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyCategory {
    /// 1yz
    PositivePreliminary,
    /// 2yz
    PositiveCompletion,
    /// 3yz
    PositiveIntermediate,
    /// 4yz
    TransientNegative,
    /// 5yz
    PermanentNegative,
    Unknown,
}

/// A three digit reply code, stored as its ASCII digits.
///
/// The default value is the unset code, which is never produced by parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ReplyCode {
    a: u8,
    b: u8,
    c: u8,
}

macro_rules! def_const_code {
    ($name:ident, $a:literal, $b:literal, $c:literal) => {
        pub const $name: ReplyCode = ReplyCode {
            a: $a,
            b: $b,
            c: $c,
        };
    };
}

impl ReplyCode {
    def_const_code!(SERVICE_READY, b'2', b'2', b'0');
    def_const_code!(SERVICE_CLOSING, b'2', b'2', b'1');
    def_const_code!(TRANSFER_COMPLETE, b'2', b'2', b'6');
    def_const_code!(NNTP_SERVICE_DISCONTINUED, b'4', b'0', b'0');
    def_const_code!(SERVICE_NOT_AVAILABLE, b'4', b'2', b'1');

    /// Parse the code from the first three bytes of `line`.
    pub fn parse(line: &[u8]) -> Option<Self> {
        if line.len() < 3 {
            return None;
        }
        let (a, b, c) = (line[0], line[1], line[2]);
        if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() {
            Some(ReplyCode { a, b, c })
        } else {
            None
        }
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.a != 0
    }

    pub fn as_u16(&self) -> u16 {
        if !self.is_set() {
            return 0;
        }
        (self.a - b'0') as u16 * 100 + (self.b - b'0') as u16 * 10 + (self.c - b'0') as u16
    }

    #[inline]
    pub fn as_bytes(&self) -> [u8; 3] {
        [self.a, self.b, self.c]
    }

    pub fn category(&self) -> ReplyCategory {
        match self.a {
            b'1' => ReplyCategory::PositivePreliminary,
            b'2' => ReplyCategory::PositiveCompletion,
            b'3' => ReplyCategory::PositiveIntermediate,
            b'4' => ReplyCategory::TransientNegative,
            b'5' => ReplyCategory::PermanentNegative,
            _ => ReplyCategory::Unknown,
        }
    }

    #[inline]
    pub fn is_positive_preliminary(&self) -> bool {
        self.a == b'1'
    }

    #[inline]
    pub fn is_positive_completion(&self) -> bool {
        self.a == b'2'
    }

    #[inline]
    pub fn is_positive_intermediate(&self) -> bool {
        self.a == b'3'
    }

    pub fn is_positive(&self) -> bool {
        matches!(self.a, b'1'..=b'3')
    }

    pub fn is_negative(&self) -> bool {
        matches!(self.a, b'4' | b'5')
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        self.a == b'4'
    }

    #[inline]
    pub fn is_permanent(&self) -> bool {
        self.a == b'5'
    }

    /// Whether more replies for the same command are to be expected.
    #[inline]
    pub fn is_continuation(&self) -> bool {
        self.is_positive_preliminary()
    }
}

impl TryFrom<u16> for ReplyCode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if !(100..1000).contains(&value) {
            return Err(value);
        }
        Ok(ReplyCode {
            a: b'0' + (value / 100) as u8,
            b: b'0' + (value / 10 % 10) as u8,
            c: b'0' + (value % 10) as u8,
        })
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "{}{}{}", self.a as char, self.b as char, self.c as char)
        } else {
            f.write_str("---")
        }
    }
}
