/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod limited_buf_read_ext;
pub use limited_buf_read_ext::LimitedBufReadExt;

mod limited_read_until;
pub use limited_read_until::LimitedReadUntil;

mod limited_read_crlf_line;
pub use limited_read_crlf_line::{LimitedReadCrlfLine, RecvLineError};
