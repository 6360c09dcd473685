/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use g3_text_proto::reply::ReplyReadError;

use super::{FtpCommandError, FtpRawResponseError};
use crate::control::FtpCommand;

#[derive(Debug, Error)]
pub enum FtpTransferSetupError {
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("unable to connect to data address: {0}")]
    ConnectFailed(Box<dyn std::error::Error + Send + Sync>),
    #[error("timed out to connect to data address")]
    ConnectTimedOut,
}

impl From<FtpCommandError> for FtpTransferSetupError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpTransferSetupError::ServiceNotAvailable,
            _ => FtpTransferSetupError::CommandError(e),
        }
    }
}

/// Failures reported in the reply that ends a data transfer.
#[derive(Debug, Error)]
pub enum FtpTransferServerError {
    #[error("unable to recv end reply: {0}")]
    RecvFailed(FtpRawResponseError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
    #[error("restart marker needed")]
    RestartNeeded,
    #[error("data transfer not established")]
    DataTransferNotEstablished,
    #[error("data transfer lost")]
    DataTransferLost,
    #[error("server failed")]
    ServerFailed,
    #[error("page type unknown")]
    PageTypeUnknown,
    #[error("exceeded storage allocation")]
    ExceededStorageAllocation,
    #[error("unexpected end reply code ({0} -> {1})")]
    UnexpectedEndReplyCode(FtpCommand, u16),
}

impl From<FtpRawResponseError> for FtpTransferServerError {
    fn from(e: FtpRawResponseError) -> Self {
        match e {
            FtpRawResponseError::ReadFailed(ReplyReadError::ServiceClosing(_)) => {
                FtpTransferServerError::ServiceNotAvailable
            }
            FtpRawResponseError::ReadResponseTimedOut(_) => {
                FtpTransferServerError::TimeoutToWaitEndReply
            }
            _ => FtpTransferServerError::RecvFailed(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpLineDataReadError {
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
    #[error("line {0} is too long")]
    LineTooLong(usize),
    #[error("too many lines")]
    TooManyLines,
    #[error("line {0} is not utf-8 encoded")]
    UnsupportedEncoding(usize),
}

/// Error of a data transfer, with the number of bytes moved before it happened.
#[derive(Debug, Error)]
pub enum FtpDataTransferError {
    #[error("data transfer failed after {transferred} bytes: {source}")]
    DataFailed { transferred: u64, source: io::Error },
    #[error("transfer of {transferred} bytes not completed: {source}")]
    EndFailed {
        transferred: u64,
        source: FtpTransferServerError,
    },
    #[error("data transfer failed after {transferred} bytes: {data}, end reply: {end}")]
    BothFailed {
        transferred: u64,
        data: io::Error,
        end: FtpTransferServerError,
    },
}

impl FtpDataTransferError {
    pub(crate) fn new(
        transferred: u64,
        data: Option<io::Error>,
        end: Result<(), FtpTransferServerError>,
    ) -> Option<Self> {
        match (data, end) {
            (None, Ok(_)) => None,
            (Some(source), Ok(_)) => Some(FtpDataTransferError::DataFailed {
                transferred,
                source,
            }),
            (None, Err(source)) => Some(FtpDataTransferError::EndFailed {
                transferred,
                source,
            }),
            (Some(data), Err(end)) => Some(FtpDataTransferError::BothFailed {
                transferred,
                data,
                end,
            }),
        }
    }

    pub fn transferred(&self) -> u64 {
        match self {
            FtpDataTransferError::DataFailed { transferred, .. } => *transferred,
            FtpDataTransferError::EndFailed { transferred, .. } => *transferred,
            FtpDataTransferError::BothFailed { transferred, .. } => *transferred,
        }
    }

    pub fn data_error(&self) -> Option<&io::Error> {
        match self {
            FtpDataTransferError::DataFailed { source, .. } => Some(source),
            FtpDataTransferError::EndFailed { .. } => None,
            FtpDataTransferError::BothFailed { data, .. } => Some(data),
        }
    }

    pub fn end_error(&self) -> Option<&FtpTransferServerError> {
        match self {
            FtpDataTransferError::DataFailed { .. } => None,
            FtpDataTransferError::EndFailed { source, .. } => Some(source),
            FtpDataTransferError::BothFailed { end, .. } => Some(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_transfer_error() {
        assert!(FtpDataTransferError::new(10, None, Ok(())).is_none());

        let e = FtpDataTransferError::new(
            10,
            Some(io::Error::other("reset")),
            Err(FtpTransferServerError::DataTransferLost),
        )
        .unwrap();
        assert_eq!(e.transferred(), 10);
        assert!(e.data_error().is_some());
        assert!(matches!(
            e.end_error(),
            Some(FtpTransferServerError::DataTransferLost)
        ));

        let e = FtpDataTransferError::new(7, None, Err(FtpTransferServerError::ServerFailed))
            .unwrap();
        assert!(matches!(e, FtpDataTransferError::EndFailed { transferred: 7, .. }));
        assert!(e.data_error().is_none());
    }

    #[test]
    fn end_reply_timeout() {
        let e = FtpRawResponseError::ReadResponseTimedOut("wait end reply");
        assert!(matches!(
            FtpTransferServerError::from(e),
            FtpTransferServerError::TimeoutToWaitEndReply
        ));
    }
}
