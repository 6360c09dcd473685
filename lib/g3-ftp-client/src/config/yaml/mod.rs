/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::{FtpClientConfig, FtpControlConfig, FtpPassiveMode, FtpTransferConfig};
use crate::list::FtpListFormat;

mod value;

impl FtpControlConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = FtpControlConfig::default();
            value::foreach_kv(map, |k, v| match value::normalize_key(k).as_str() {
                "max_line_len" | "max_line_length" => {
                    config.max_line_len = value::as_humanize_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    Ok(())
                }
                "max_multi_lines" => {
                    config.max_multi_lines = value::as_usize(v)
                        .context(format!("invalid usize value for key {k}"))?;
                    Ok(())
                }
                "command_timeout" => {
                    config.command_timeout = value::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "strict_reply_parsing" => {
                    config.strict_reply_parsing = value::as_bool(v)
                        .context(format!("invalid bool value for key {k}"))?;
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}

impl FtpTransferConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = FtpTransferConfig::default();
            let mut list_all_timeout = None;
            value::foreach_kv(map, |k, v| match value::normalize_key(k).as_str() {
                "list_max_line_len" | "list_max_line_length" => {
                    config.list_max_line_len = value::as_humanize_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    Ok(())
                }
                "list_max_entries" => {
                    config.list_max_entries = value::as_usize(v)
                        .context(format!("invalid usize value for key {k}"))?;
                    Ok(())
                }
                "list_all_timeout" => {
                    let timeout = value::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    list_all_timeout = Some(timeout);
                    Ok(())
                }
                "end_wait_timeout" => {
                    config.end_wait_timeout = value::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "copy_buffer_size" => {
                    let size = value::as_humanize_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    config.copy.set_buffer_size(size);
                    Ok(())
                }
                "copy_yield_size" => {
                    let size = value::as_humanize_usize(v)
                        .context(format!("invalid humanize usize value for key {k}"))?;
                    config.copy.set_yield_size(size);
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            // applied last as it depends on end_wait_timeout
            if let Some(timeout) = list_all_timeout {
                config.set_list_all_timeout(timeout);
            }
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}

impl FtpClientConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = FtpClientConfig::default();
            value::foreach_kv(map, |k, v| match value::normalize_key(k).as_str() {
                "control" => {
                    config.control = FtpControlConfig::parse_yaml(v).context(format!(
                        "invalid ftp control connection config value for key {k}"
                    ))?;
                    Ok(())
                }
                "transfer" => {
                    config.transfer = FtpTransferConfig::parse_yaml(v).context(format!(
                        "invalid ftp transfer connection config value for key {k}"
                    ))?;
                    Ok(())
                }
                "connect_timeout" => {
                    config.connect_timeout = value::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "greeting_timeout" => {
                    config.greeting_timeout = value::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                    Ok(())
                }
                "passive_mode" => {
                    let s = value::as_str(v)?;
                    config.passive_mode = FtpPassiveMode::from_str(s)
                        .map_err(|_| anyhow!("invalid passive mode {s} for key {k}"))?;
                    Ok(())
                }
                "always_try_epsv" => {
                    let epsv = value::as_bool(v)
                        .context(format!("invalid bool value for key {k}"))?;
                    config.passive_mode = if epsv {
                        FtpPassiveMode::Epsv
                    } else {
                        FtpPassiveMode::Pasv
                    };
                    Ok(())
                }
                "list_format" => {
                    let s = value::as_str(v)?;
                    config.list_format = FtpListFormat::from_str(s)
                        .map_err(|e| anyhow!("invalid value for key {k}: {e}"))?;
                    Ok(())
                }
                _ => Err(anyhow!("invalid key {k}")),
            })?;
            Ok(config)
        } else {
            Err(anyhow!("invalid yaml type"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use yaml_rust::YamlLoader;

    macro_rules! yaml_doc {
        ($s:expr) => {
            YamlLoader::load_from_str($s).unwrap().remove(0)
        };
    }

    #[test]
    fn ftp_control_config_parse_ok() {
        let yaml = yaml_doc!(
            r#"
                max_line_len: "2KB"
                max_multi_lines: 256
                command_timeout: "30s"
                strict-reply-parsing: true
            "#
        );
        let config = FtpControlConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.max_line_len, 2000);
        assert_eq!(config.max_multi_lines, 256);
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert!(config.strict_reply_parsing);

        let yaml = yaml_doc!("max_line_length: 1KB");
        let config = FtpControlConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.max_line_len, 1000);
    }

    #[test]
    fn ftp_control_config_parse_err() {
        let yaml = yaml_doc!("invalid_key: value");
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("max_line_len: 2KBX");
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("max_multi_lines: -1");
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());

        let yaml = Yaml::String("invalid".to_string());
        assert!(FtpControlConfig::parse_yaml(&yaml).is_err());
    }

    #[test]
    fn ftp_transfer_config_parse_ok() {
        let yaml = yaml_doc!(
            r#"
                list_max_line_len: "4KB"
                list_max_entries: 2048
                list_all_timeout: "5m"
                end_wait_timeout: "500ms"
                copy_buffer_size: "64KiB"
            "#
        );
        let config = FtpTransferConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.list_max_line_len, 4000);
        assert_eq!(config.list_max_entries, 2048);
        assert_eq!(config.list_all_timeout(), Duration::from_secs(300));
        assert_eq!(config.end_wait_timeout, Duration::from_millis(500));
        assert_eq!(config.copy.buffer_size(), 64 * 1024);

        // the listing timeout never drops below the end reply wait
        let yaml = yaml_doc!(
            r#"
                list_all_timeout: "1s"
                end_wait_timeout: "3s"
            "#
        );
        let config = FtpTransferConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.list_all_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn ftp_transfer_config_parse_err() {
        let yaml = yaml_doc!("list_max_entries: -2048");
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("list_all_timeout: 5x");
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("end_wait_timeout: -500ms");
        assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());
    }

    #[test]
    fn ftp_client_config_parse_ok() {
        let yaml = yaml_doc!(
            r#"
                control:
                  max_line_len: "2KB"
                  command_timeout: "15s"
                transfer:
                  list_max_entries: 1024
                  end_wait_timeout: "1s"
                connect_timeout: "10s"
                greeting_timeout: "5s"
                passive_mode: epsv
                list_format: vms
            "#
        );
        let config = FtpClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.control.max_line_len, 2000);
        assert_eq!(config.control.command_timeout, Duration::from_secs(15));
        assert_eq!(config.transfer.list_max_entries, 1024);
        assert_eq!(config.transfer.end_wait_timeout, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.greeting_timeout, Duration::from_secs(5));
        assert_eq!(config.passive_mode, FtpPassiveMode::Epsv);
        assert_eq!(config.list_format, FtpListFormat::Vms { versioning: false });

        let yaml = yaml_doc!("always_try_epsv: true");
        let config = FtpClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.passive_mode, FtpPassiveMode::Epsv);
    }

    #[test]
    fn ftp_client_config_parse_err() {
        let yaml = yaml_doc!("control: invalid");
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("transfer: 1234");
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("passive_mode: port");
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("list_format: dos");
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!("always_try_epsv: not_a_boolean");
        assert!(FtpClientConfig::parse_yaml(&yaml).is_err());
    }

    #[test]
    fn parse_invalid_yaml_types() {
        for yaml in [Yaml::Array(vec![]), Yaml::Integer(123), Yaml::Null] {
            assert!(FtpControlConfig::parse_yaml(&yaml).is_err());
            assert!(FtpTransferConfig::parse_yaml(&yaml).is_err());
            assert!(FtpClientConfig::parse_yaml(&yaml).is_err());
        }
    }
}
