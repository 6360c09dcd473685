/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use log::Level;

pub const TEXT_PROTO_DEBUG_LOG_LEVEL: Level = Level::Debug;
pub const TEXT_PROTO_DEBUG_LOG_TARGET: &str = "";

#[cfg(feature = "log-raw-io")]
#[inline]
pub(crate) fn log_cmd(cmd: &str) {
    let cmd = if cmd.len() > 5 && cmd.as_bytes()[..5].eq_ignore_ascii_case(b"PASS ") {
        "PASS ******"
    } else {
        cmd
    };
    log::log!(
        target: TEXT_PROTO_DEBUG_LOG_TARGET,
        TEXT_PROTO_DEBUG_LOG_LEVEL,
        "> {cmd}"
    );
}

#[cfg(feature = "log-raw-io")]
#[inline]
pub(crate) fn log_rsp(rsp: &[u8]) {
    log::log!(
        target: TEXT_PROTO_DEBUG_LOG_TARGET,
        TEXT_PROTO_DEBUG_LOG_LEVEL,
        "< {}",
        String::from_utf8_lossy(rsp)
    );
}
