/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use super::command::FtpCommandError;
use super::transfer::{
    FtpDataTransferError, FtpLineDataReadError, FtpTransferServerError, FtpTransferSetupError,
};

#[derive(Debug, Error)]
pub enum FtpFileFactsParseError {
    #[error("no space delimiter")]
    NoSpaceDelimiter,
    #[error("no delimiter in fact ({0})")]
    NoDelimiterInFact(String),
    #[error("invalid modify time: {0}")]
    InvalidModifyTime(chrono::ParseError),
    #[error("invalid size")]
    InvalidSize,
    #[error("invalid unix mode")]
    InvalidUnixMode,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown list format {0:?}")]
pub struct FtpListFormatParseError(pub(crate) String);

impl FtpListFormatParseError {
    /// The format name that was not recognized.
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum FtpFileRetrieveStartError {
    #[error("data transfer setup error: {0}")]
    TransferSetupFailed(FtpTransferSetupError),
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("file unavailable")]
    FileUnavailable,
}

impl From<FtpCommandError> for FtpFileRetrieveStartError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileRetrieveStartError::ServiceNotAvailable,
            _ => FtpFileRetrieveStartError::CommandError(e),
        }
    }
}

impl From<FtpTransferSetupError> for FtpFileRetrieveStartError {
    fn from(e: FtpTransferSetupError) -> Self {
        match e {
            FtpTransferSetupError::ServiceNotAvailable => {
                FtpFileRetrieveStartError::ServiceNotAvailable
            }
            _ => FtpFileRetrieveStartError::TransferSetupFailed(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileStoreStartError {
    #[error("data transfer setup error: {0}")]
    TransferSetupFailed(FtpTransferSetupError),
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("file unavailable")]
    FileUnavailable,
    #[error("need account for storing")]
    NeedAccountForStoring,
    #[error("filename not allowed")]
    FileNameNotAllowed,
    #[error("insufficient storage space")]
    InsufficientStorageSpace,
}

impl From<FtpCommandError> for FtpFileStoreStartError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileStoreStartError::ServiceNotAvailable,
            _ => FtpFileStoreStartError::CommandError(e),
        }
    }
}

impl From<FtpTransferSetupError> for FtpFileStoreStartError {
    fn from(e: FtpTransferSetupError) -> Self {
        match e {
            FtpTransferSetupError::ServiceNotAvailable => {
                FtpFileStoreStartError::ServiceNotAvailable
            }
            _ => FtpFileStoreStartError::TransferSetupFailed(e),
        }
    }
}

/// Error of a listing, with the number of lines received before it happened.
#[derive(Debug, Error)]
pub enum FtpFileListError {
    #[error("start failed: {0}")]
    StartFailed(#[from] FtpFileRetrieveStartError),
    #[error("data read failed after {received} lines: {source}")]
    DataReadFailed {
        received: usize,
        source: FtpLineDataReadError,
    },
    #[error("server reported error after {received} lines: {source}")]
    ServerReportedError {
        received: usize,
        source: FtpTransferServerError,
    },
    #[error("data read failed after {received} lines: {data}, end reply: {end}")]
    BothFailed {
        received: usize,
        data: FtpLineDataReadError,
        end: FtpTransferServerError,
    },
    #[error("timeout to wait all data, {received} lines received")]
    TimeoutToWaitAllData { received: usize },
}

/// Error of a whole file retrieve or store.
#[derive(Debug, Error)]
pub enum FtpFileTransferError {
    #[error("retrieve start failed: {0}")]
    RetrieveStartFailed(#[from] FtpFileRetrieveStartError),
    #[error("store start failed: {0}")]
    StoreStartFailed(#[from] FtpFileStoreStartError),
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] FtpDataTransferError),
}

impl FtpFileListError {
    pub(crate) fn from_parts(
        received: usize,
        data: Option<FtpLineDataReadError>,
        end: Result<(), FtpTransferServerError>,
    ) -> Option<Self> {
        match (data, end) {
            (None, Ok(_)) => None,
            (Some(source), Ok(_)) => Some(FtpFileListError::DataReadFailed { received, source }),
            (None, Err(source)) => {
                Some(FtpFileListError::ServerReportedError { received, source })
            }
            (Some(data), Err(end)) => Some(FtpFileListError::BothFailed {
                received,
                data,
                end,
            }),
        }
    }

    /// Lines received on the data connection, `None` if it was never used.
    pub fn received_lines(&self) -> Option<usize> {
        match self {
            FtpFileListError::StartFailed(_) => None,
            FtpFileListError::DataReadFailed { received, .. }
            | FtpFileListError::ServerReportedError { received, .. }
            | FtpFileListError::BothFailed { received, .. }
            | FtpFileListError::TimeoutToWaitAllData { received } => Some(*received),
        }
    }
}
