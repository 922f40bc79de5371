//! Application configuration loading for CLI defaults.
//!
//! Settings resolve with precedence CLI flag > environment > config file >
//! built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use protopred::config::{ENV_ACCOUNT_TOKEN, ENV_ACCOUNT_USER, ENV_SECRET_KEY};
use protopred::{ClientConfig, Credentials};

use crate::cli::Cli;

/// TOML-style file configuration for client defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// ProtoPRED account token.
    pub account_token: Option<String>,
    /// ProtoPRED account secret key.
    pub account_secret_key: Option<String>,
    /// ProtoPRED account user name.
    pub account_user: Option<String>,
    /// Endpoint override; used verbatim.
    pub base_url: Option<String>,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Retries after the initial attempt.
    pub max_retries: Option<u32>,
    /// Backoff base delay in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Built-in model catalog check.
    pub validate_models: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            bail!("Invalid config value for `timeout_secs`: {timeout}. Expected range: 1..=3600");
        }
        if let Some(retries) = self.max_retries
            && retries > 10
        {
            bail!("Invalid config value for `max_retries`: {retries}. Expected range: 0..=10");
        }
        if let Some(delay) = self.retry_delay_ms
            && delay > 60_000
        {
            bail!("Invalid config value for `retry_delay_ms`: {delay}. Expected range: 0..=60000");
        }
        Ok(())
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/protopred/config.toml`
/// 2. `$HOME/.config/protopred/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("protopred")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("protopred")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file: an explicit path must exist, the default path
/// may be absent.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read_file_config(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
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
        let line_no = line_index + 1;
        let context = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "account_token" => {
                cfg.account_token = Some(parse_string_literal(value).with_context(context)?);
            }
            "account_secret_key" => {
                cfg.account_secret_key = Some(parse_string_literal(value).with_context(context)?);
            }
            "account_user" => {
                cfg.account_user = Some(parse_string_literal(value).with_context(context)?);
            }
            "base_url" => {
                cfg.base_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "timeout_secs" => {
                cfg.timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "max_retries" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_retries out of range for u32"))?;
                cfg.max_retries = Some(n);
            }
            "retry_delay_ms" => {
                cfg.retry_delay_ms = Some(parse_integer_u64(value).with_context(context)?);
            }
            "validate_models" => {
                cfg.validate_models = Some(parse_boolean(value).with_context(context)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
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

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

/// Resolves credentials: flag, then environment, then config file.
///
/// `env_lookup` reads environment variables; injected so tests need not
/// mutate the process environment.
pub fn resolve_credentials(
    cli: &Cli,
    file: &FileConfig,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    let pick = |flag: &Option<String>, var: &str, from_file: &Option<String>| {
        flag.clone()
            .or_else(|| env_lookup(var).filter(|value| !value.trim().is_empty()))
            .or_else(|| from_file.clone())
    };
    let token = pick(&cli.token, ENV_ACCOUNT_TOKEN, &file.account_token);
    let secret_key = pick(&cli.secret_key, ENV_SECRET_KEY, &file.account_secret_key);
    let user = pick(&cli.user, ENV_ACCOUNT_USER, &file.account_user);

    let (Some(token), Some(secret_key), Some(user)) = (token, secret_key, user) else {
        bail!(
            "Missing ProtoPRED credentials. Pass --token, --secret-key and --user, \
             set {ENV_ACCOUNT_TOKEN}, {ENV_SECRET_KEY} and {ENV_ACCOUNT_USER}, \
             or add account_token, account_secret_key and account_user to the config file"
        );
    };
    Ok(Credentials::new(token, secret_key, user)?)
}

/// Resolves client tunables: flag, then config file, then defaults.
pub fn resolve_client_config(cli: &Cli, file: &FileConfig) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(base_url) = cli.base_url.clone().or_else(|| file.base_url.clone()) {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs.or(file.timeout_secs) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = cli.max_retries.or(file.max_retries) {
        config = config.with_max_retries(retries);
    }
    if let Some(ms) = cli.retry_delay_ms.or(file.retry_delay_ms) {
        config = config.with_retry_delay(Duration::from_millis(ms));
    }
    let validate = if cli.no_model_check {
        false
    } else {
        file.validate_models.unwrap_or(true)
    };
    config.with_model_validation(validate)
}
