/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod debug;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};

mod config;
pub use config::{FtpClientConfig, FtpControlConfig, FtpPassiveMode, FtpTransferConfig};

mod error;
pub use error::*;

mod connection;
pub use connection::{FtpConnectionProvider, FtpDataAddr};

mod control;
pub use control::FtpCommand;

mod transfer;
pub use transfer::FtpTransferType;

pub mod list;
pub use list::{FtpListing, FtpListingCursor};

mod client;
pub use client::FtpClient;
