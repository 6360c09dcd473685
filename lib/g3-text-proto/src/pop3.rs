/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! POP3 status replies.
//!
//! Multi-line POP3 replies carry their body as a dot terminated message,
//! which is read with [`crate::data::TextDataDecodeReader`].

use std::io;

use thiserror::Error;
use tokio::io::AsyncBufRead;

use g3_io_ext::{LimitedBufReadExt, RecvLineError};

pub const MAX_LINE_SIZE: usize = 512;

#[derive(Debug, Error)]
pub enum Pop3ReplyError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("connection closed without indication")]
    ConnectionClosed,
    #[error("line too long")]
    LineTooLong,
    #[error("received invalid reply: {0:?}")]
    InvalidReply(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pop3Status {
    Ok,
    Err,
    /// SASL continuation request
    Continuation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pop3Reply {
    status: Pop3Status,
    message: String,
}

impl Pop3Reply {
    pub fn parse_line(line: &[u8]) -> Result<Self, Pop3ReplyError> {
        let (status, left) = if let Some(left) = line.strip_prefix(b"+OK") {
            (Pop3Status::Ok, left)
        } else if let Some(left) = line.strip_prefix(b"-ERR") {
            (Pop3Status::Err, left)
        } else if line == b"+" {
            (Pop3Status::Continuation, &line[1..])
        } else if let Some(left) = line.strip_prefix(b"+ ") {
            return Ok(Pop3Reply {
                status: Pop3Status::Continuation,
                message: String::from_utf8_lossy(left).into_owned(),
            });
        } else {
            return Err(Pop3ReplyError::InvalidReply(
                String::from_utf8_lossy(line).into_owned(),
            ));
        };

        let message = match left.first() {
            None => String::new(),
            Some(b' ') => String::from_utf8_lossy(&left[1..]).into_owned(),
            Some(_) => {
                return Err(Pop3ReplyError::InvalidReply(
                    String::from_utf8_lossy(line).into_owned(),
                ));
            }
        };
        Ok(Pop3Reply { status, message })
    }

    /// Read one status line.
    pub async fn read<R>(reader: &mut R) -> Result<Self, Pop3ReplyError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut buf = Vec::with_capacity(MAX_LINE_SIZE);
        match reader.limited_read_crlf_line(MAX_LINE_SIZE, &mut buf).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(Pop3ReplyError::ConnectionClosed),
            Err(RecvLineError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(Pop3ReplyError::ConnectionClosed);
            }
            Err(RecvLineError::IoError(e)) => return Err(Pop3ReplyError::ReadFailed(e)),
            Err(RecvLineError::LineTooLong) => return Err(Pop3ReplyError::LineTooLong),
        }
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(&buf);
        Pop3Reply::parse_line(&buf)
    }

    #[inline]
    pub fn status(&self) -> Pop3Status {
        self.status
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == Pop3Status::Ok
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TextDataDecodeReader;
    use tokio::io::AsyncReadExt;

    #[test]
    fn parse() {
        let reply = Pop3Reply::parse_line(b"+OK POP3 server ready").unwrap();
        assert_eq!(reply.status(), Pop3Status::Ok);
        assert_eq!(reply.message(), "POP3 server ready");

        let reply = Pop3Reply::parse_line(b"-ERR no such message").unwrap();
        assert_eq!(reply.status(), Pop3Status::Err);
        assert!(!reply.is_ok());

        let reply = Pop3Reply::parse_line(b"+OK").unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.message(), "");

        let reply = Pop3Reply::parse_line(b"+ dXNlcm5hbWU6").unwrap();
        assert_eq!(reply.status(), Pop3Status::Continuation);
        assert_eq!(reply.message(), "dXNlcm5hbWU6");

        let reply = Pop3Reply::parse_line(b"+").unwrap();
        assert_eq!(reply.status(), Pop3Status::Continuation);
    }

    #[test]
    fn parse_invalid() {
        assert!(matches!(
            Pop3Reply::parse_line(b"OK ready"),
            Err(Pop3ReplyError::InvalidReply(_))
        ));
        assert!(matches!(
            Pop3Reply::parse_line(b"+OKAY"),
            Err(Pop3ReplyError::InvalidReply(_))
        ));
        assert!(matches!(
            Pop3Reply::parse_line(b""),
            Err(Pop3ReplyError::InvalidReply(_))
        ));
    }

    #[tokio::test]
    async fn retrieve() {
        let mut inner: &[u8] =
            b"+OK 20 octets\r\nSubject: hi\r\n\r\n..dot\r\n.\r\n+OK bye\r\n";

        let reply = Pop3Reply::read(&mut inner).await.unwrap();
        assert!(reply.is_ok());

        let mut body = String::new();
        let mut reader = TextDataDecodeReader::new(&mut inner);
        reader.read_to_string(&mut body).await.unwrap();
        drop(reader);
        assert_eq!(body, "Subject: hi\r\n\r\n.dot\r\n");

        let reply = Pop3Reply::read(&mut inner).await.unwrap();
        assert_eq!(reply.message(), "bye");

        let r = Pop3Reply::read(&mut inner).await;
        assert!(matches!(r, Err(Pop3ReplyError::ConnectionClosed)));
    }
}
