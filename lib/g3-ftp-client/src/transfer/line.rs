/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use g3_io_ext::LimitedBufReadExt;

use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;

/// Drain a listing data connection as text lines.
///
/// Both CRLF and bare LF end a line here, as listing output is less strict
/// than the control connection.
pub(crate) struct FtpLineDataTransfer<T> {
    io: BufReader<T>,
    max_lines: usize,
    max_line_len: usize,
    line_buf: Vec<u8>,
}

impl<T> FtpLineDataTransfer<T>
where
    T: AsyncRead + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig) -> Self {
        FtpLineDataTransfer {
            io: BufReader::new(io),
            max_lines: config.list_max_entries,
            max_line_len: config.list_max_line_len,
            line_buf: Vec::with_capacity(config.list_max_line_len),
        }
    }

    /// Append lines to `lines` until EOF.
    ///
    /// Lines already pushed stay in place if an error is returned.
    pub(crate) async fn read_to_end(
        &mut self,
        lines: &mut Vec<String>,
    ) -> Result<(), FtpLineDataReadError> {
        for i in lines.len()..self.max_lines {
            self.line_buf.clear();
            let (found, nr) = self
                .io
                .limited_read_until(b'\n', self.max_line_len, &mut self.line_buf)
                .await?;
            if nr == 0 {
                return Ok(());
            }
            if !found && nr >= self.max_line_len {
                return Err(FtpLineDataReadError::LineTooLong(i + 1));
            }

            let mut line = self.line_buf.as_slice();
            if let Some(l) = line.strip_suffix(b"\n") {
                line = l;
            }
            if let Some(l) = line.strip_suffix(b"\r") {
                line = l;
            }
            let s = std::str::from_utf8(line)
                .map_err(|_| FtpLineDataReadError::UnsupportedEncoding(i + 1))?;
            lines.push(s.to_string());
        }

        if self.io.fill_buf().await?.is_empty() {
            Ok(())
        } else {
            Err(FtpLineDataReadError::TooManyLines)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn read_mixed_endings() {
        let mut stream = Builder::new()
            .read(b"line 1\r\nline 2\nline")
            .read(b" 3\r\n\r\nlast")
            .build();
        let mut transfer = FtpLineDataTransfer::new(&mut stream, &FtpTransferConfig::default());
        let mut lines = Vec::new();
        transfer.read_to_end(&mut lines).await.unwrap();
        assert_eq!(lines, ["line 1", "line 2", "line 3", "", "last"]);
    }

    #[tokio::test]
    async fn too_many_lines() {
        let mut config = FtpTransferConfig::default();
        config.list_max_entries = 2;

        let mut stream = Builder::new().read(b"a\r\nb\r\n").build();
        let mut transfer = FtpLineDataTransfer::new(&mut stream, &config);
        let mut lines = Vec::new();
        transfer.read_to_end(&mut lines).await.unwrap();
        assert_eq!(lines.len(), 2);

        let mut stream = Builder::new().read(b"a\r\nb\r\nc\r\n").build();
        let mut transfer = FtpLineDataTransfer::new(&mut stream, &config);
        let mut lines = Vec::new();
        let e = transfer.read_to_end(&mut lines).await.unwrap_err();
        assert!(matches!(e, FtpLineDataReadError::TooManyLines));
        assert_eq!(lines, ["a", "b"]);
    }

    #[tokio::test]
    async fn line_too_long() {
        let mut config = FtpTransferConfig::default();
        config.list_max_line_len = 8;
        let mut stream = Builder::new().read(b"short\r\n0123456789\r\n").build();
        let mut transfer = FtpLineDataTransfer::new(&mut stream, &config);
        let mut lines = Vec::new();
        let e = transfer.read_to_end(&mut lines).await.unwrap_err();
        assert!(matches!(e, FtpLineDataReadError::LineTooLong(2)));
        assert_eq!(lines, ["short"]);
    }
}
