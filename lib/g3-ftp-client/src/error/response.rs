/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use g3_text_proto::reply::ReplyReadError;

#[derive(Debug, Error)]
pub enum FtpRawResponseError {
    #[error("read reply failed: {0}")]
    ReadFailed(#[from] ReplyReadError),
    #[error("read response for stage '{0}' timed out")]
    ReadResponseTimedOut(&'static str),
}

impl FtpRawResponseError {
    /// The control connection can not be used any more.
    pub fn is_fatal(&self) -> bool {
        match self {
            FtpRawResponseError::ReadFailed(e) => !matches!(e, ReplyReadError::Malformed { .. }),
            FtpRawResponseError::ReadResponseTimedOut(_) => true,
        }
    }
}
