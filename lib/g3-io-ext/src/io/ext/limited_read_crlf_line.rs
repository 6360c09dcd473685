/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use thiserror::Error;
use tokio::io::AsyncBufRead;

#[derive(Debug, Error)]
pub enum RecvLineError {
    #[error("io error: {0:?}")]
    IoError(#[from] io::Error),
    #[error("line too long")]
    LineTooLong,
}

pub struct LimitedReadCrlfLine<'a, R: ?Sized> {
    reader: &'a mut R,
    buf: &'a mut Vec<u8>,
    read: usize,
    limit: usize,
}

impl<'a, R> LimitedReadCrlfLine<'a, R>
where
    R: AsyncBufRead + ?Sized + Unpin,
{
    pub(super) fn new(reader: &'a mut R, max_len: usize, buf: &'a mut Vec<u8>) -> Self {
        LimitedReadCrlfLine {
            reader,
            buf,
            read: 0,
            limit: max_len,
        }
    }
}

/// Find the end offset of the first CRLF in `data`.
///
/// `last_cr` tells whether the byte just before `data` belongs to the same
/// line and is a CR.
fn find_crlf_end(data: &[u8], last_cr: bool) -> Option<usize> {
    let mut offset = 0;
    while let Some(p) = memchr::memchr(b'\n', &data[offset..]) {
        let lf = offset + p;
        let cr = if lf == 0 {
            last_cr
        } else {
            data[lf - 1] == b'\r'
        };
        if cr {
            return Some(lf + 1);
        }
        offset = lf + 1;
    }
    None
}

fn read_crlf_line_internal<R: AsyncBufRead + ?Sized>(
    mut reader: Pin<&mut R>,
    cx: &mut Context<'_>,
    buf: &mut Vec<u8>,
    read: &mut usize,
    limit: usize,
) -> Poll<Result<Option<usize>, RecvLineError>> {
    loop {
        let (found, used) = {
            let available = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if available.is_empty() {
                let nr = mem::replace(read, 0);
                return if nr == 0 {
                    Poll::Ready(Ok(None))
                } else {
                    // the peer closed in the middle of a line
                    Poll::Ready(Err(RecvLineError::IoError(
                        io::ErrorKind::UnexpectedEof.into(),
                    )))
                };
            }

            let left = limit.saturating_sub(*read);
            let available = &available[..available.len().min(left)];
            let last_cr = *read > 0 && buf.last() == Some(&b'\r');
            match find_crlf_end(available, last_cr) {
                Some(end) => {
                    buf.extend_from_slice(&available[..end]);
                    (true, end)
                }
                None => {
                    buf.extend_from_slice(available);
                    (false, available.len())
                }
            }
        };
        reader.as_mut().consume(used);
        *read += used;

        if found {
            buf.truncate(buf.len() - 2);
            let nr = mem::replace(read, 0);
            return Poll::Ready(Ok(Some(nr - 2)));
        }
        if *read >= limit {
            *read = 0;
            return Poll::Ready(Err(RecvLineError::LineTooLong));
        }
    }
}

impl<R: AsyncBufRead + ?Sized + Unpin> Future for LimitedReadCrlfLine<'_, R> {
    type Output = Result<Option<usize>, RecvLineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Self {
            reader,
            buf,
            read,
            limit,
        } = &mut *self;
        read_crlf_line_internal(Pin::new(reader), cx, buf, read, *limit)
    }
}
