/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod debug;
pub use debug::{TEXT_PROTO_DEBUG_LOG_LEVEL, TEXT_PROTO_DEBUG_LOG_TARGET};

pub mod data;
pub mod imap;
pub mod pop3;
pub mod reply;
