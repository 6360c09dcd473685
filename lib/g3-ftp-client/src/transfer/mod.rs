/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod line;
pub(crate) use line::FtpLineDataTransfer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FtpTransferType {
    /// TYPE A, used for listings
    Ascii,
    /// TYPE I, used for file content
    Image,
}
