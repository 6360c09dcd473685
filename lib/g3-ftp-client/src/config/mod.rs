/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use g3_io_ext::StreamCopyConfig;
use g3_text_proto::reply::ReplyReaderConfig;

use crate::list::FtpListFormat;

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_MAX_LINE_LEN: usize = 2048;
const DEFAULT_MAX_MULTI_LINES: usize = 128;
const DEFAULT_LIST_MAX_ENTRIES: usize = 1024;

#[derive(Clone, Debug)]
pub struct FtpControlConfig {
    pub max_line_len: usize,
    pub max_multi_lines: usize,
    pub command_timeout: Duration,
    /// require the final line of a multi-line reply to repeat the code followed by a space
    pub strict_reply_parsing: bool,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_multi_lines: DEFAULT_MAX_MULTI_LINES,
            command_timeout: Duration::from_secs(10),
            strict_reply_parsing: false,
        }
    }
}

impl FtpControlConfig {
    pub(crate) fn reply_reader_config(&self) -> ReplyReaderConfig {
        ReplyReaderConfig {
            max_line_len: self.max_line_len,
            max_lines: self.max_multi_lines,
            strict: self.strict_reply_parsing,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FtpTransferConfig {
    pub list_max_line_len: usize,
    pub list_max_entries: usize,
    list_all_timeout: Duration,
    pub end_wait_timeout: Duration,
    pub copy: StreamCopyConfig,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            list_max_line_len: DEFAULT_MAX_LINE_LEN,
            list_max_entries: DEFAULT_LIST_MAX_ENTRIES,
            list_all_timeout: Duration::from_secs(120),
            end_wait_timeout: Duration::from_secs(2),
            copy: StreamCopyConfig::default(),
        }
    }
}

impl FtpTransferConfig {
    #[inline]
    pub fn list_all_timeout(&self) -> Duration {
        self.list_all_timeout
    }

    /// The listing timeout covers the end reply wait, so it is never shorter than that.
    pub fn set_list_all_timeout(&mut self, timeout: Duration) {
        self.list_all_timeout = timeout.max(self.end_wait_timeout);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FtpPassiveMode {
    #[default]
    Pasv,
    Epsv,
}

impl FromStr for FtpPassiveMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pasv" => Ok(FtpPassiveMode::Pasv),
            "epsv" => Ok(FtpPassiveMode::Epsv),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FtpClientConfig {
    pub control: FtpControlConfig,
    pub transfer: FtpTransferConfig,
    pub connect_timeout: Duration,
    pub greeting_timeout: Duration,
    pub passive_mode: FtpPassiveMode,
    pub list_format: FtpListFormat,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: FtpControlConfig::default(),
            transfer: FtpTransferConfig::default(),
            connect_timeout: Duration::from_secs(30),
            greeting_timeout: Duration::from_secs(10),
            passive_mode: FtpPassiveMode::default(),
            list_format: FtpListFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_all_timeout_floor() {
        let mut config = FtpTransferConfig::default();
        config.set_list_all_timeout(Duration::from_millis(100));
        assert_eq!(config.list_all_timeout(), config.end_wait_timeout);
        config.set_list_all_timeout(Duration::from_secs(60));
        assert_eq!(config.list_all_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn passive_mode_from_str() {
        assert_eq!(FtpPassiveMode::from_str("EPSV"), Ok(FtpPassiveMode::Epsv));
        assert_eq!(FtpPassiveMode::from_str("pasv"), Ok(FtpPassiveMode::Pasv));
        assert!(FtpPassiveMode::from_str("port").is_err());
    }

    #[test]
    fn reply_reader_config() {
        let control = FtpControlConfig {
            strict_reply_parsing: true,
            ..Default::default()
        };
        let config = control.reply_reader_config();
        assert_eq!(config.max_line_len, DEFAULT_MAX_LINE_LEN);
        assert_eq!(config.max_lines, DEFAULT_MAX_MULTI_LINES);
        assert!(config.strict);
    }
}
