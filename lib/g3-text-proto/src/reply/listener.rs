/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::Reply;

/// Observer of the command / reply exchange on a control connection.
pub trait ReplyListener: Send + Sync {
    fn command_sent(&self, _command: &str) {}

    fn reply_received(&self, reply: &Reply);
}
