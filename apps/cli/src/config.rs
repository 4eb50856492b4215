//! 配置加载
//!
//! 查找顺序：
//! 1. `--config` 指定的文件（必须存在）
//! 2. `~/.config/wccontrol/config.toml`（存在时加载）
//! 3. 内置默认值
//!
//! 命令行参数覆盖文件中的值。

use crate::Cli;
use anyhow::{Context, Result};
use std::path::PathBuf;
use wccontrol_driver::Config;

/// 默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wccontrol").join("config.toml"))
}

/// 加载配置并应用命令行覆盖
pub fn resolve(cli: &Cli) -> Result<Config> {
    let mut config = match (&cli.config, default_config_path()) {
        (Some(path), _) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, Some(path)) => Config::load_or_default(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, None) => Config::default(),
    };

    let tx = &mut config.transmitter;
    if let Some(pin) = cli.pin {
        tx.pin = pin;
    }
    if let Some(retries) = cli.retries {
        tx.retries = retries;
    }
    if let Some(gap_ms) = cli.gap_ms {
        tx.gap_ms = gap_ms;
    }
    if let Some(latency_us) = cli.latency_us {
        tx.latency_us = latency_us;
    }
    tx.validate().context("Invalid transmitter settings")?;

    tracing::debug!("Resolved config: {:?}", config);
    Ok(config)
}
