/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::AsyncBufRead;

use super::limited_read_crlf_line::LimitedReadCrlfLine;
use super::limited_read_until::LimitedReadUntil;

pub trait LimitedBufReadExt: AsyncBufRead {
    /// Read bytes into `buf` until the delimiter or `max_len` bytes have been consumed.
    ///
    /// Returns `(found, nr)`, where `nr` includes the delimiter if found.
    /// `(false, 0)` means the reader is at EOF.
    fn limited_read_until<'a>(
        &'a mut self,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadUntil<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadUntil::new(self, delimiter, max_len, buf)
    }

    /// Read one line terminated strictly by CRLF.
    ///
    /// A bare CR or a bare LF is kept as line data. The terminator is not
    /// appended to `buf`. `max_len` limits the bytes consumed, CRLF included.
    ///
    /// Returns `Ok(None)` at EOF when there is no pending data. A trailing
    /// unterminated line at EOF is returned as a normal line.
    fn limited_read_crlf_line<'a>(
        &'a mut self,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadCrlfLine<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadCrlfLine::new(self, max_len, buf)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedBufReadExt for R {}
