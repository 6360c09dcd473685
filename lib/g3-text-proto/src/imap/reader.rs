/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use smol_str::SmolStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use g3_io_ext::{LimitedBufReadExt, RecvLineError};

use super::response::literal_size;
use super::{ImapResponse, ImapResponseError, ImapStatus, TaggedResponse};

const DEFAULT_MAX_LINE_SIZE: usize = 8192;
const DEFAULT_MAX_LITERAL_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImapReadError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("connection closed without indication")]
    ConnectionClosed,
    #[error("line too long")]
    LineTooLong,
    #[error("literal size {0} too large")]
    LiteralTooLarge(usize),
    #[error("invalid response line {line:?}: {error}")]
    InvalidResponse {
        line: String,
        error: ImapResponseError,
    },
    #[error("unexpected tag {0}")]
    UnexpectedTag(SmolStr),
    #[error("unexpected greeting {0:?}")]
    UnexpectedGreeting(String),
}

/// One untagged response, with the literals it carried.
///
/// `line` holds the text segments of the response joined together,
/// literal data is kept apart in `literals`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImapUntagged {
    pub status: Option<ImapStatus>,
    pub line: String,
    pub literals: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImapReply {
    Completed {
        untagged: Vec<ImapUntagged>,
        tagged: TaggedResponse,
    },
    /// The server waits for more data from the client.
    Continuation {
        untagged: Vec<ImapUntagged>,
        text: String,
    },
}

impl ImapReply {
    pub fn untagged(&self) -> &[ImapUntagged] {
        match self {
            ImapReply::Completed { untagged, .. } => untagged,
            ImapReply::Continuation { untagged, .. } => untagged,
        }
    }
}

pub struct ImapReplyReader<S> {
    io: S,
    max_line_len: usize,
    max_literal_size: usize,
    line_buf: Vec<u8>,
}

impl<S> ImapReplyReader<S> {
    pub fn new(io: S) -> Self {
        ImapReplyReader {
            io,
            max_line_len: DEFAULT_MAX_LINE_SIZE,
            max_literal_size: DEFAULT_MAX_LITERAL_SIZE,
            line_buf: Vec::with_capacity(1024),
        }
    }

    pub fn set_max_line_len(&mut self, len: usize) {
        self.max_line_len = len;
    }

    pub fn set_max_literal_size(&mut self, size: usize) {
        self.max_literal_size = size;
    }

    pub fn into_inner(self) -> S {
        self.io
    }
}

impl<S> ImapReplyReader<S>
where
    S: AsyncBufRead + Unpin,
{
    async fn read_line(&mut self) -> Result<(), ImapReadError> {
        self.line_buf.clear();
        match self
            .io
            .limited_read_crlf_line(self.max_line_len, &mut self.line_buf)
            .await
        {
            Ok(Some(_)) => {
                #[cfg(feature = "log-raw-io")]
                crate::debug::log_rsp(&self.line_buf);
                Ok(())
            }
            Ok(None) => Err(ImapReadError::ConnectionClosed),
            Err(RecvLineError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ImapReadError::ConnectionClosed)
            }
            Err(RecvLineError::IoError(e)) => Err(ImapReadError::ReadFailed(e)),
            Err(RecvLineError::LineTooLong) => Err(ImapReadError::LineTooLong),
        }
    }

    fn parse_line(&self) -> Result<ImapResponse, ImapReadError> {
        ImapResponse::parse_line(&self.line_buf).map_err(|error| ImapReadError::InvalidResponse {
            line: String::from_utf8_lossy(&self.line_buf).into_owned(),
            error,
        })
    }

    async fn read_literals(
        &mut self,
        item: &mut ImapUntagged,
        mut literal: Option<usize>,
    ) -> Result<(), ImapReadError> {
        while let Some(size) = literal {
            if size > self.max_literal_size {
                return Err(ImapReadError::LiteralTooLarge(size));
            }
            let mut data = vec![0u8; size];
            self.io.read_exact(&mut data).await.map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    ImapReadError::ConnectionClosed
                } else {
                    ImapReadError::ReadFailed(e)
                }
            })?;
            item.literals.push(data);

            self.read_line().await?;
            literal = literal_size(&self.line_buf).map_err(|error| {
                ImapReadError::InvalidResponse {
                    line: String::from_utf8_lossy(&self.line_buf).into_owned(),
                    error,
                }
            })?;
            item.line.push_str(&String::from_utf8_lossy(&self.line_buf));
        }
        Ok(())
    }

    /// Read the untagged server greeting.
    pub async fn read_greeting(&mut self) -> Result<ImapUntagged, ImapReadError> {
        self.read_line().await?;
        match self.parse_line()? {
            ImapResponse::Untagged {
                status: status @ Some(ImapStatus::Ok | ImapStatus::PreAuth | ImapStatus::Bye),
                literal: None,
            } => Ok(ImapUntagged {
                status,
                line: String::from_utf8_lossy(&self.line_buf).into_owned(),
                literals: Vec::new(),
            }),
            _ => Err(ImapReadError::UnexpectedGreeting(
                String::from_utf8_lossy(&self.line_buf).into_owned(),
            )),
        }
    }

    /// Read responses until the tagged completion of `tag`, or a continuation request.
    pub async fn read_tagged(&mut self, tag: &str) -> Result<ImapReply, ImapReadError> {
        let mut untagged = Vec::new();
        loop {
            self.read_line().await?;
            match self.parse_line()? {
                ImapResponse::Continuation => {
                    let text = self
                        .line_buf
                        .strip_prefix(b"+ ")
                        .unwrap_or(&self.line_buf[1..]);
                    return Ok(ImapReply::Continuation {
                        untagged,
                        text: String::from_utf8_lossy(text).into_owned(),
                    });
                }
                ImapResponse::Untagged { status, literal } => {
                    let mut item = ImapUntagged {
                        status,
                        line: String::from_utf8_lossy(&self.line_buf).into_owned(),
                        literals: Vec::new(),
                    };
                    self.read_literals(&mut item, literal).await?;
                    untagged.push(item);
                }
                ImapResponse::Tagged(tagged) => {
                    if tagged.tag.as_str() != tag {
                        return Err(ImapReadError::UnexpectedTag(tagged.tag));
                    }
                    return Ok(ImapReply::Completed { untagged, tagged });
                }
            }
        }
    }
}

impl<S> ImapReplyReader<S>
where
    S: AsyncWrite + Unpin,
{
    pub async fn send_command(&mut self, tag: &str, command: &str) -> io::Result<()> {
        let line = format!("{tag} {command}\r\n");
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(line.trim_end());
        self.io.write_all(line.as_bytes()).await?;
        self.io.flush().await
    }
}
