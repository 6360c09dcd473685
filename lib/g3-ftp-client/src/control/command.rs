/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpControlChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpCommand(&'static str);

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! ftp_commands {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $phrase:expr);
        )+
    ) => {
        impl FtpCommand {
        $(
            $(#[$docs])*
            pub const $konst: FtpCommand = FtpCommand($phrase);
        )+
        }
    };
}

ftp_commands! {
    /// a fake command for greeting
    (GREETING, "-");
    (USER, "USER");
    (PASS, "PASS");
    (ACCT, "ACCT");
    (QUIT, "QUIT");
    (TYPE_A, "TYPE A");
    (TYPE_I, "TYPE I");
    (PASV, "PASV");
    (EPSV, "EPSV");
    (REST, "REST");
    (ABOR, "ABOR");
    (LIST, "LIST");
    (NLST, "NLST");
    (MLSD, "MLSD");
    (RETR, "RETR");
    (STOR, "STOR");
}

impl FtpCommand {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(super) async fn send_cmd(&mut self, cmd: FtpCommand) -> io::Result<()> {
        self.reader.send_command(cmd.0).await
    }

    pub(super) async fn send_cmd1(&mut self, cmd: FtpCommand, param1: &str) -> io::Result<()> {
        if memchr::memchr2(b'\r', b'\n', param1.as_bytes()).is_some() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "line break in command parameter",
            ));
        }
        let mut buf = String::with_capacity(cmd.0.len() + 1 + param1.len());
        buf.push_str(cmd.0);
        buf.push(' ');
        buf.push_str(param1);
        self.reader.send_command(&buf).await
    }
}
