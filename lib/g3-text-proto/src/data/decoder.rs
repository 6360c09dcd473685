/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, ReadBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeState {
    LineStart,
    Normal,
    SeenCr,
    LineStartDot,
    LineStartDotCr,
    End,
}

struct DecodeMachine {
    state: DecodeState,
    pending: [u8; 3],
    pending_start: usize,
    pending_end: usize,
}

impl DecodeMachine {
    fn new() -> Self {
        DecodeMachine {
            state: DecodeState::LineStart,
            pending: [0u8; 3],
            pending_start: 0,
            pending_end: 0,
        }
    }

    #[inline]
    fn has_pending(&self) -> bool {
        self.pending_start < self.pending_end
    }

    #[inline]
    fn finished(&self) -> bool {
        self.state == DecodeState::End && !self.has_pending()
    }

    fn push(&mut self, b: u8) {
        self.pending[self.pending_end] = b;
        self.pending_end += 1;
    }

    fn push_normal(&mut self, b: u8) {
        self.state = if b == b'\r' {
            DecodeState::SeenCr
        } else {
            DecodeState::Normal
        };
        self.push(b);
    }

    /// Feed one byte, only called with no pending output.
    fn feed(&mut self, b: u8) {
        self.pending_start = 0;
        self.pending_end = 0;
        match self.state {
            DecodeState::LineStart => {
                if b == b'.' {
                    self.state = DecodeState::LineStartDot;
                } else {
                    self.push_normal(b);
                }
            }
            DecodeState::Normal => self.push_normal(b),
            DecodeState::SeenCr => {
                if b == b'\n' {
                    self.state = DecodeState::LineStart;
                    self.push(b);
                } else {
                    self.push_normal(b);
                }
            }
            DecodeState::LineStartDot => match b {
                b'.' => {
                    self.state = DecodeState::Normal;
                    self.push(b'.');
                }
                b'\r' => self.state = DecodeState::LineStartDotCr,
                _ => {
                    self.push(b'.');
                    self.push_normal(b);
                }
            },
            DecodeState::LineStartDotCr => {
                if b == b'\n' {
                    self.state = DecodeState::End;
                } else {
                    self.push(b'.');
                    self.push(b'\r');
                    self.push_normal(b);
                }
            }
            DecodeState::End => {}
        }
    }

    fn drain_into(&mut self, buf: &mut ReadBuf<'_>) {
        let len = (self.pending_end - self.pending_start).min(buf.remaining());
        if len > 0 {
            let end = self.pending_start + len;
            buf.put_slice(&self.pending[self.pending_start..end]);
            self.pending_start = end;
        }
    }
}

/// Reader of a dot terminated message body.
///
/// Leading dots are unstuffed, the terminator line is consumed but not
/// returned. The underlying reader is left right after the terminator.
pub struct TextDataDecodeReader<'a, R: ?Sized> {
    inner: &'a mut R,
    machine: DecodeMachine,
    closed: bool,
}

impl<'a, R> TextDataDecodeReader<'a, R>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    pub fn new(inner: &'a mut R) -> Self {
        TextDataDecodeReader {
            inner,
            machine: DecodeMachine::new(),
            closed: false,
        }
    }

    /// Whether the terminator line has been reached and all data returned.
    #[inline]
    pub fn finished(&self) -> bool {
        self.machine.finished()
    }

    /// Read one line into `buf`, without its line terminator.
    ///
    /// Returns `None` at the end of the message.
    pub async fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<Option<usize>> {
        let mut nr = 0usize;
        let mut byte = [0u8; 1];
        loop {
            if self.read(&mut byte).await? == 0 {
                return Ok(if nr == 0 { None } else { Some(nr) });
            }
            if byte[0] == b'\n' {
                if buf.last() == Some(&b'\r') && nr > 0 {
                    buf.pop();
                    nr -= 1;
                }
                return Ok(Some(nr));
            }
            buf.push(byte[0]);
            nr += 1;
        }
    }

    /// Consume the rest of the message, up to and including the terminator.
    ///
    /// Any later read fails.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        let mut buf = [0u8; 1024];
        while !self.machine.finished() {
            if self.read(&mut buf).await? == 0 {
                break;
            }
        }
        self.closed = true;
        Ok(())
    }
}

impl<R> AsyncRead for TextDataDecodeReader<'_, R>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let Self {
            inner,
            machine,
            closed,
        } = &mut *self;
        if *closed {
            return Poll::Ready(Err(io::Error::other("text data reader already closed")));
        }

        let start = buf.filled().len();
        loop {
            machine.drain_into(buf);
            if machine.has_pending() || buf.remaining() == 0 {
                return Poll::Ready(Ok(()));
            }
            if machine.state == DecodeState::End {
                return Poll::Ready(Ok(()));
            }

            let data = match Pin::new(&mut **inner).poll_fill_buf(cx) {
                Poll::Ready(Ok(data)) => data,
                Poll::Ready(Err(e)) => {
                    return if buf.filled().len() > start {
                        Poll::Ready(Ok(()))
                    } else {
                        Poll::Ready(Err(e))
                    };
                }
                Poll::Pending => {
                    return if buf.filled().len() > start {
                        Poll::Ready(Ok(()))
                    } else {
                        Poll::Pending
                    };
                }
            };
            if data.is_empty() {
                return if buf.filled().len() > start {
                    Poll::Ready(Ok(()))
                } else {
                    Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed before the end of message",
                    )))
                };
            }

            let mut used = 0;
            for b in data {
                used += 1;
                machine.feed(*b);
                machine.drain_into(buf);
                if machine.has_pending()
                    || buf.remaining() == 0
                    || machine.state == DecodeState::End
                {
                    break;
                }
            }
            Pin::new(&mut **inner).consume(used);
        }
    }
}

impl<R: ?Sized> Drop for TextDataDecodeReader<'_, R> {
    fn drop(&mut self) {
        if !self.closed && !self.machine.finished() {
            log::warn!("text data reader dropped before the end of message");
        }
    }
}
