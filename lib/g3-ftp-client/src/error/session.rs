/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

use super::command::FtpCommandError;

/// Login state after one USER / PASS / ACCT exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FtpAuthStatus {
    NotLoggedIn,
    LoggedIn,
    NeedPassword,
    NeedAccount,
}

impl FtpAuthStatus {
    /// Map a final status to the session result.
    ///
    /// Asking for a password again is the same as a rejected login.
    pub(crate) fn finish(self) -> Result<(), FtpSessionOpenError> {
        match self {
            FtpAuthStatus::LoggedIn => Ok(()),
            FtpAuthStatus::NeedAccount => Err(FtpSessionOpenError::AccountIsNeeded),
            FtpAuthStatus::NotLoggedIn | FtpAuthStatus::NeedPassword => {
                Err(FtpSessionOpenError::NotLoggedIn)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpSessionOpenError {
    #[error("login command failed: {0}")]
    RawCommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("login rejected")]
    NotLoggedIn,
    #[error("account is needed")]
    AccountIsNeeded,
}

impl FtpSessionOpenError {
    /// The server rejected the credentials, retrying with others may work.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            FtpSessionOpenError::NotLoggedIn | FtpSessionOpenError::AccountIsNeeded
        )
    }
}

impl From<FtpCommandError> for FtpSessionOpenError {
    fn from(e: FtpCommandError) -> Self {
        if matches!(e, FtpCommandError::ServiceNotAvailable) {
            FtpSessionOpenError::ServiceNotAvailable
        } else {
            FtpSessionOpenError::RawCommandError(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_status() {
        assert!(FtpAuthStatus::LoggedIn.finish().is_ok());
        assert!(matches!(
            FtpAuthStatus::NeedPassword.finish(),
            Err(FtpSessionOpenError::NotLoggedIn)
        ));
        let e = FtpAuthStatus::NeedAccount.finish().unwrap_err();
        assert!(e.is_auth_failure());
    }

    #[test]
    fn from_command_error() {
        let e = FtpSessionOpenError::from(FtpCommandError::ServiceNotAvailable);
        assert!(matches!(e, FtpSessionOpenError::ServiceNotAvailable));
        assert!(!e.is_auth_failure());
        let e = FtpSessionOpenError::from(FtpCommandError::NotLoggedIn);
        assert!(matches!(e, FtpSessionOpenError::RawCommandError(_)));
    }
}
