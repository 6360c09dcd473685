/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::AsyncWrite;

const MAX_ENCODE_SIZE: usize = 8 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EncodeState {
    Normal,
    LastCr,
    LastLf,
}

/// Writer of a dot terminated message body.
///
/// Bare LF is sent as CRLF and a dot at the start of a line is doubled.
/// Shutting down the writer sends the terminator line and flushes, the
/// underlying writer itself is not shut down.
pub struct TextDataEncodeWriter<'a, W: ?Sized> {
    inner: &'a mut W,
    state: EncodeState,
    buf: Vec<u8>,
    buf_offset: usize,
    closed: bool,
}

impl<'a, W> TextDataEncodeWriter<'a, W>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    pub fn new(inner: &'a mut W) -> Self {
        TextDataEncodeWriter {
            inner,
            state: EncodeState::LastLf,
            buf: Vec::with_capacity(MAX_ENCODE_SIZE),
            buf_offset: 0,
            closed: false,
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn encode(&mut self, data: &[u8]) {
        for b in data {
            match *b {
                b'\r' => {
                    self.buf.push(b'\r');
                    self.state = EncodeState::LastCr;
                }
                b'\n' => {
                    if self.state != EncodeState::LastCr {
                        self.buf.push(b'\r');
                    }
                    self.buf.push(b'\n');
                    self.state = EncodeState::LastLf;
                }
                b'.' => {
                    if self.state == EncodeState::LastLf {
                        self.buf.push(b'.');
                    }
                    self.buf.push(b'.');
                    self.state = EncodeState::Normal;
                }
                c => {
                    self.buf.push(c);
                    self.state = EncodeState::Normal;
                }
            }
        }
    }

    fn push_terminator(&mut self) {
        match self.state {
            EncodeState::LastCr => self.buf.extend_from_slice(b"\n.\r\n"),
            EncodeState::LastLf => self.buf.extend_from_slice(b".\r\n"),
            EncodeState::Normal => self.buf.extend_from_slice(b"\r\n.\r\n"),
        }
        self.state = EncodeState::LastLf;
    }

    fn poll_write_buf(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.buf_offset < self.buf.len() {
            let nw =
                ready!(Pin::new(&mut *self.inner).poll_write(cx, &self.buf[self.buf_offset..]))?;
            if nw == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "write zero byte into writer",
                )));
            }
            self.buf_offset += nw;
        }
        self.buf.clear();
        self.buf_offset = 0;
        Poll::Ready(Ok(()))
    }
}

impl<W> AsyncWrite for TextDataEncodeWriter<'_, W>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.closed {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "text data writer already closed",
            )));
        }
        ready!(self.poll_write_buf(cx))?;

        let len = buf.len().min(MAX_ENCODE_SIZE);
        self.encode(&buf[..len]);
        Poll::Ready(Ok(len))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        ready!(self.poll_write_buf(cx))?;
        Pin::new(&mut *self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if !self.closed {
            self.push_terminator();
            self.closed = true;
        }
        self.poll_flush(cx)
    }
}

impl<W: ?Sized> Drop for TextDataEncodeWriter<'_, W> {
    fn drop(&mut self) {
        if !self.closed {
            log::warn!("text data writer dropped without sending the end of message");
        }
    }
}
