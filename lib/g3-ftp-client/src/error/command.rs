/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use g3_text_proto::reply::ReplyReadError;

use super::FtpRawResponseError;
use crate::control::FtpCommand;

#[derive(Debug, Error)]
pub enum FtpCommandError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("unable to send command: {0:?}")]
    SendFailed(io::Error),
    #[error("unable to recv reply: {0}")]
    RecvFailed(FtpRawResponseError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("{0} syntax rejected by server")]
    RejectedCommandSyntax(FtpCommand),
    #[error("command {0} is not implemented by server")]
    CommandNotImplemented(FtpCommand),
    #[error("parameter is not implemented for command {0}")]
    ParameterNotImplemented(FtpCommand),
    #[error("unexpected reply code ({0} -> {1})")]
    UnexpectedReplyCode(FtpCommand, u16),
    #[error("invalid reply {1} syntax to command {0}")]
    InvalidReplySyntax(FtpCommand, u16),
    #[error("bad sequence of command {0}")]
    BadCommandSequence(FtpCommand),
    #[error("transfer of command {0} is still pending")]
    TransferPending(FtpCommand),
}

impl From<FtpRawResponseError> for FtpCommandError {
    fn from(e: FtpRawResponseError) -> Self {
        match e {
            FtpRawResponseError::ReadFailed(ReplyReadError::ServiceClosing(_)) => {
                FtpCommandError::ServiceNotAvailable
            }
            _ => FtpCommandError::RecvFailed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_closing_reply() {
        let e = FtpRawResponseError::ReadFailed(ReplyReadError::ConnectionClosed);
        assert!(matches!(
            FtpCommandError::from(e),
            FtpCommandError::RecvFailed(_)
        ));

        let e = FtpRawResponseError::ReadResponseTimedOut("test");
        assert!(matches!(
            FtpCommandError::from(e),
            FtpCommandError::RecvFailed(FtpRawResponseError::ReadResponseTimedOut("test"))
        ));
    }
}
