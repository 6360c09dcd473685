/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use crate::error::FtpCommandError;

#[derive(Debug, Error)]
pub enum FtpConnectError<E: std::error::Error> {
    #[error("control connection failed: {0}")]
    ConnectIoError(E),
    #[error("timed out to open control connection")]
    ConnectTimedOut,
    #[error("timed out to receive greetings")]
    GreetingTimedOut,
    #[error("greeting failed: {0}")]
    GreetingFailed(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
}

impl<E: std::error::Error> From<FtpCommandError> for FtpConnectError<E> {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpConnectError::ServiceNotAvailable,
            _ => FtpConnectError::GreetingFailed(e),
        }
    }
}

impl<E: std::error::Error> FtpConnectError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FtpConnectError::ConnectTimedOut | FtpConnectError::GreetingTimedOut
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn from_greeting_error() {
        let e: FtpConnectError<io::Error> = FtpCommandError::ServiceNotAvailable.into();
        assert!(matches!(e, FtpConnectError::ServiceNotAvailable));
        assert!(!e.is_timeout());

        let e: FtpConnectError<io::Error> = FtpCommandError::NotLoggedIn.into();
        assert!(matches!(e, FtpConnectError::GreetingFailed(_)));
        assert!(FtpConnectError::<io::Error>::GreetingTimedOut.is_timeout());
    }
}
