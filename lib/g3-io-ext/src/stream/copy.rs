/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const DEFAULT_COPY_BUFFER_SIZE: usize = 16 * 1024; // 16KB
const MINIMAL_COPY_BUFFER_SIZE: usize = 4 * 1024; // 4KB
const DEFAULT_COPY_YIELD_SIZE: usize = 1024 * 1024; // 1MB
const MINIMAL_COPY_YIELD_SIZE: usize = 256 * 1024; // 256KB

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamCopyConfig {
    buffer_size: usize,
    yield_size: usize,
}

impl Default for StreamCopyConfig {
    fn default() -> Self {
        StreamCopyConfig {
            buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            yield_size: DEFAULT_COPY_YIELD_SIZE,
        }
    }
}

impl StreamCopyConfig {
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size.max(MINIMAL_COPY_BUFFER_SIZE);
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn set_yield_size(&mut self, yield_size: usize) {
        self.yield_size = yield_size.max(MINIMAL_COPY_YIELD_SIZE);
    }

    #[inline]
    pub fn yield_size(&self) -> usize {
        self.yield_size
    }
}

/// Receiver of copy progress events.
///
/// Called after each successful write with the cumulative byte count, the
/// size of this write and the expected stream size if the caller knows it.
pub trait StreamCopyProgress {
    fn bytes_transferred(&mut self, total: u64, this_time: usize, stream_size: Option<u64>);
}

impl<F> StreamCopyProgress for F
where
    F: FnMut(u64, usize, Option<u64>),
{
    fn bytes_transferred(&mut self, total: u64, this_time: usize, stream_size: Option<u64>) {
        self(total, this_time, stream_size)
    }
}

#[derive(Error, Debug)]
pub enum StreamCopyError {
    #[error("read failed after {1} bytes copied: {0:?}")]
    ReadFailed(io::Error, u64),
    #[error("write failed after {1} bytes copied: {0:?}")]
    WriteFailed(io::Error, u64),
}

impl StreamCopyError {
    /// Bytes successfully written before the failure.
    pub fn transferred(&self) -> u64 {
        match self {
            StreamCopyError::ReadFailed(_, n) => *n,
            StreamCopyError::WriteFailed(_, n) => *n,
        }
    }
}

struct StreamCopyBuffer {
    buf: Box<[u8]>,
    yield_size: usize,
    r_off: usize,
    w_off: usize,
    read_done: bool,
    need_flush: bool,
    total_read: u64,
    total_write: u64,
}

impl StreamCopyBuffer {
    fn new(config: &StreamCopyConfig) -> Self {
        StreamCopyBuffer {
            buf: vec![0; config.buffer_size].into_boxed_slice(),
            yield_size: config.yield_size,
            r_off: 0,
            w_off: 0,
            read_done: false,
            need_flush: false,
            total_read: 0,
            total_write: 0,
        }
    }

    fn read_failed(&self, e: io::Error) -> StreamCopyError {
        StreamCopyError::ReadFailed(e, self.total_write)
    }

    fn write_failed(&self, e: io::Error) -> StreamCopyError {
        StreamCopyError::WriteFailed(e, self.total_write)
    }

    fn compact(&mut self) {
        if self.w_off == self.r_off {
            self.w_off = 0;
            self.r_off = 0;
        } else if self.w_off > 0 {
            self.buf.copy_within(self.w_off..self.r_off, 0);
            self.r_off -= self.w_off;
            self.w_off = 0;
        }
    }

    fn poll_read_more<R>(
        &mut self,
        cx: &mut Context<'_>,
        reader: Pin<&mut R>,
    ) -> Poll<io::Result<()>>
    where
        R: AsyncRead + ?Sized,
    {
        let mut read_buf = ReadBuf::new(&mut self.buf[self.r_off..]);
        ready!(reader.poll_read(cx, &mut read_buf))?;
        let nr = read_buf.filled().len();
        if nr == 0 {
            self.read_done = true;
        } else {
            self.r_off += nr;
            self.total_read += nr as u64;
        }
        Poll::Ready(Ok(()))
    }

    fn poll_copy<R, W>(
        &mut self,
        cx: &mut Context<'_>,
        mut reader: Pin<&mut R>,
        mut writer: Pin<&mut W>,
        mut progress: Option<&mut (dyn StreamCopyProgress + Send + '_)>,
        stream_size: Option<u64>,
    ) -> Poll<Result<u64, StreamCopyError>>
    where
        R: AsyncRead + ?Sized,
        W: AsyncWrite + ?Sized,
    {
        let mut copy_this_round = 0usize;
        loop {
            if !self.read_done {
                self.compact();
                if self.r_off < self.buf.len() {
                    match self.poll_read_more(cx, reader.as_mut()) {
                        Poll::Ready(Ok(_)) => {}
                        Poll::Ready(Err(e)) => return Poll::Ready(Err(self.read_failed(e))),
                        Poll::Pending => {
                            if self.w_off >= self.r_off {
                                if self.need_flush {
                                    self.need_flush = false;
                                    if let Err(e) = ready!(writer.as_mut().poll_flush(cx)) {
                                        return Poll::Ready(Err(self.write_failed(e)));
                                    }
                                }
                                return Poll::Pending;
                            }
                        }
                    }
                }
            }

            while self.w_off < self.r_off {
                let nw = match ready!(
                    writer
                        .as_mut()
                        .poll_write(cx, &self.buf[self.w_off..self.r_off])
                ) {
                    Ok(0) => {
                        return Poll::Ready(Err(self.write_failed(io::Error::new(
                            io::ErrorKind::WriteZero,
                            "write zero byte into writer",
                        ))));
                    }
                    Ok(n) => n,
                    Err(e) => return Poll::Ready(Err(self.write_failed(e))),
                };
                self.w_off += nw;
                self.total_write += nw as u64;
                self.need_flush = true;
                copy_this_round += nw;
                if let Some(p) = progress.as_deref_mut() {
                    p.bytes_transferred(self.total_write, nw, stream_size);
                }
            }

            if self.read_done {
                if self.need_flush {
                    if let Err(e) = ready!(writer.as_mut().poll_flush(cx)) {
                        return Poll::Ready(Err(self.write_failed(e)));
                    }
                    self.need_flush = false;
                }
                return Poll::Ready(Ok(self.total_write));
            }

            if copy_this_round >= self.yield_size {
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
        }
    }
}

/// Copy all data from `reader` to `writer`, reporting progress if asked to.
///
/// The writer is flushed at the end but never shut down.
pub struct StreamCopy<'a, R: ?Sized, W: ?Sized> {
    reader: &'a mut R,
    writer: &'a mut W,
    buf: StreamCopyBuffer,
    progress: Option<&'a mut (dyn StreamCopyProgress + Send)>,
    stream_size: Option<u64>,
}

impl<'a, R, W> StreamCopy<'a, R, W>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    pub fn new(reader: &'a mut R, writer: &'a mut W, config: &StreamCopyConfig) -> Self {
        StreamCopy {
            reader,
            writer,
            buf: StreamCopyBuffer::new(config),
            progress: None,
            stream_size: None,
        }
    }

    pub fn with_progress(
        mut self,
        progress: &'a mut (dyn StreamCopyProgress + Send),
        stream_size: Option<u64>,
    ) -> Self {
        self.progress = Some(progress);
        self.stream_size = stream_size;
        self
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.buf.read_done && self.buf.r_off == self.buf.w_off
    }

    #[inline]
    pub fn read_size(&self) -> u64 {
        self.buf.total_read
    }

    #[inline]
    pub fn copied_size(&self) -> u64 {
        self.buf.total_write
    }
}

impl<R, W> Future for StreamCopy<'_, R, W>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    type Output = Result<u64, StreamCopyError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = &mut *self;
        me.buf.poll_copy(
            cx,
            Pin::new(&mut *me.reader),
            Pin::new(&mut *me.writer),
            me.progress.as_deref_mut(),
            me.stream_size,
        )
    }
}
