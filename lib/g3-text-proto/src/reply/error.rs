/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::Reply;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyLineError {
    #[error("truncated reply")]
    TooShort,
    #[error("could not parse response code")]
    InvalidCode,
    #[error("invalid delimiter")]
    InvalidDelimiter,
    #[error("finished")]
    Finished,
}

#[derive(Debug, Error)]
pub enum ReplyReadError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("connection closed without indication")]
    ConnectionClosed,
    #[error("line too long")]
    LineTooLong,
    #[error("too many lines")]
    TooManyLines,
    #[error("malformed reply line {line:?}: {error}")]
    Malformed { line: String, error: ReplyLineError },
    #[error("service closing: {0}")]
    ServiceClosing(Reply),
}

impl ReplyReadError {
    /// Whether the connection is gone, either abruptly or announced by the server.
    pub fn is_connection_closed(&self) -> bool {
        matches!(
            self,
            ReplyReadError::ConnectionClosed | ReplyReadError::ServiceClosing(_)
        )
    }
}
