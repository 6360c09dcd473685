/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Message bodies terminated by a line holding a single dot.

mod decoder;
pub use decoder::TextDataDecodeReader;

mod encoder;
pub use encoder::TextDataEncodeWriter;
