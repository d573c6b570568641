//! Configuration file loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use safe_fetch::ClientConfig;
use safe_fetch::fetch::{MAX_BODY_PREFIX_CHARS, MAX_TIMEOUT_SECS};

/// File configuration for client defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Default `get` timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Characters of GET body text to print.
    pub body_prefix_chars: Option<usize>,
    /// User-Agent header override.
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Validates config values against the client's accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.connect_timeout_secs
            && !(1..=MAX_TIMEOUT_SECS).contains(&secs)
        {
            bail!(
                "Invalid config value for `connect_timeout_secs`: {secs}. Expected range: 1..={MAX_TIMEOUT_SECS}"
            );
        }

        let max_ms = MAX_TIMEOUT_SECS * 1_000;
        if let Some(ms) = self.request_timeout_ms
            && !(1..=max_ms).contains(&ms)
        {
            bail!("Invalid config value for `request_timeout_ms`: {ms}. Expected range: 1..={max_ms}");
        }

        if let Some(chars) = self.body_prefix_chars
            && chars > MAX_BODY_PREFIX_CHARS
        {
            bail!(
                "Invalid config value for `body_prefix_chars`: {chars}. Expected range: 0..={MAX_BODY_PREFIX_CHARS}"
            );
        }

        if let Some(user_agent) = &self.user_agent
            && user_agent.trim().is_empty()
        {
            bail!("Invalid config value for `user_agent`: must not be empty");
        }

        Ok(())
    }

    /// Overlays the values that are set onto `base`.
    #[must_use]
    pub fn apply_to(&self, mut base: ClientConfig) -> ClientConfig {
        if let Some(secs) = self.connect_timeout_secs {
            base = base.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.request_timeout_ms {
            base = base.with_request_timeout(Duration::from_millis(ms));
        }
        if let Some(chars) = self.body_prefix_chars {
            base = base.with_body_prefix_chars(chars);
        }
        if let Some(user_agent) = &self.user_agent {
            base = base.with_user_agent(user_agent.clone());
        }
        base
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/safe-fetch/config.toml`
/// 2. `$HOME/.config/safe-fetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("safe-fetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("safe-fetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` when given, otherwise from the default path
/// if a file exists there.
///
/// An explicit path that does not exist is an error; a missing default file
/// is not.
pub fn load_file_config_from(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;

        match key {
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_number}")
                })?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "request_timeout_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `request_timeout_ms` value on line {line_number}")
                })?;
                cfg.request_timeout_ms = Some(parsed);
            }
            "body_prefix_chars" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `body_prefix_chars` value on line {line_number}")
                })?;
                let chars = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("body_prefix_chars out of range for usize"))?;
                cfg.body_prefix_chars = Some(chars);
            }
            "user_agent" => {
                let parsed = parse_string_literal(value).with_context(|| {
                    format!("Invalid `user_agent` value on line {line_number}")
                })?;
                cfg.user_agent = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}
