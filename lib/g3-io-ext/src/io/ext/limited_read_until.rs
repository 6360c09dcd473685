/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::AsyncBufRead;

pub struct LimitedReadUntil<'a, R: ?Sized> {
    reader: &'a mut R,
    delimiter: u8,
    buf: &'a mut Vec<u8>,
    read: usize,
    limit: usize,
}

impl<'a, R> LimitedReadUntil<'a, R>
where
    R: AsyncBufRead + ?Sized + Unpin,
{
    pub(super) fn new(
        reader: &'a mut R,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> Self {
        LimitedReadUntil {
            reader,
            delimiter,
            buf,
            read: 0,
            limit: max_len,
        }
    }
}

fn read_until_internal<R: AsyncBufRead + ?Sized>(
    mut reader: Pin<&mut R>,
    cx: &mut Context<'_>,
    delimiter: u8,
    buf: &mut Vec<u8>,
    read: &mut usize,
    limit: usize,
) -> Poll<io::Result<(bool, usize)>> {
    loop {
        let (found, used) = {
            let available = ready!(reader.as_mut().poll_fill_buf(cx))?;
            let left = limit.saturating_sub(*read);
            let available = &available[..available.len().min(left)];
            if let Some(i) = memchr::memchr(delimiter, available) {
                buf.extend_from_slice(&available[..=i]);
                (true, i + 1)
            } else {
                buf.extend_from_slice(available);
                (false, available.len())
            }
        };
        reader.as_mut().consume(used);
        *read += used;
        if found || used == 0 || *read >= limit {
            return Poll::Ready(Ok((found, mem::replace(read, 0))));
        }
    }
}

impl<R: AsyncBufRead + ?Sized + Unpin> Future for LimitedReadUntil<'_, R> {
    type Output = io::Result<(bool, usize)>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Self {
            reader,
            delimiter,
            buf,
            read,
            limit,
        } = &mut *self;
        read_until_internal(Pin::new(reader), cx, *delimiter, buf, read, *limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LimitedBufReadExt;
    use tokio_util::io::StreamReader;

    #[tokio::test]
    async fn split_lines() {
        let stream = tokio_stream::iter(vec![
            io::Result::Ok(b"drwxr-xr-x 2 ftp ftp 4096 Jan 1 ".as_slice()),
            io::Result::Ok(b"2020 pub\nlast".as_slice()),
        ]);
        let mut reader = StreamReader::new(stream);

        let mut buf = Vec::new();
        let (found, nr) = reader.limited_read_until(b'\n', 128, &mut buf).await.unwrap();
        assert!(found);
        assert_eq!(nr, 41);
        assert_eq!(buf.as_slice(), b"drwxr-xr-x 2 ftp ftp 4096 Jan 1 2020 pub\n");

        buf.clear();
        let (found, nr) = reader.limited_read_until(b'\n', 128, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(nr, 4);
        assert_eq!(buf.as_slice(), b"last");

        buf.clear();
        let (found, nr) = reader.limited_read_until(b'\n', 128, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(nr, 0);
    }

    #[tokio::test]
    async fn reach_limit() {
        let stream = tokio_stream::iter(vec![io::Result::Ok(b"0123456789\n".as_slice())]);
        let mut reader = StreamReader::new(stream);

        let mut buf = Vec::new();
        let (found, nr) = reader.limited_read_until(b'\n', 4, &mut buf).await.unwrap();
        assert!(!found);
        assert_eq!(nr, 4);
        assert_eq!(buf.as_slice(), b"0123");
    }
}
