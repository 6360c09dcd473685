/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::error::Error;
use std::fmt;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Address of a data connection announced by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FtpDataAddr {
    /// full address from a PASV reply
    Socket(SocketAddr),
    /// port on the control connection peer, from an EPSV reply
    Port(u16),
}

impl fmt::Display for FtpDataAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpDataAddr::Socket(addr) => write!(f, "{addr}"),
            FtpDataAddr::Port(port) => write!(f, "<peer>:{port}"),
        }
    }
}

/// Transport factory for both control and data connections.
///
/// FTPS is supported by returning TLS streams from this provider.
#[async_trait]
pub trait FtpConnectionProvider<T: AsyncRead + AsyncWrite, E: Error, UD> {
    async fn new_control_connection(&mut self, server: &str, user_data: &UD) -> Result<T, E>;
    async fn new_data_connection(
        &mut self,
        data_addr: FtpDataAddr,
        user_data: &UD,
    ) -> Result<T, E>;
}
