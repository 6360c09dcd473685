/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! IMAP responses, including untagged data carrying literals.

mod response;
pub use response::{ImapResponse, ImapResponseError, ImapStatus, TaggedResponse};

mod reader;
pub use reader::{ImapReadError, ImapReply, ImapReplyReader, ImapUntagged};
