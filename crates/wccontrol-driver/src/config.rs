//! 发送配置
//!
//! 配置文件为 TOML，所有字段均可省略（使用默认值），未知字段报错：
//!
//! ```toml
//! [transmitter]
//! pin = 4           # BCM 引脚编号
//! retries = 20      # 每条命令重复发送次数
//! gap_ms = 20       # 帧间隔（毫秒）
//! latency_us = 80   # 延迟补偿（微秒），按平台标定
//!
//! [gpio]
//! sysfs_root = "/sys/class/gpio"
//! gpio_base = 0     # GPIO 芯片基准编号（新内核可能为 512）
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wccontrol_protocol::{BIT0_TIMING, BIT1_TIMING, DEFAULT_FRAME_GAP_MS, DEFAULT_LATENCY_US};

/// 默认引脚（BCM 4）
pub const DEFAULT_PIN: u32 = 4;
/// 默认重复次数
pub const DEFAULT_RETRIES: u32 = 20;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// 发送器配置
///
/// 一次发送期间不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransmitterConfig {
    /// 输出引脚编号
    pub pin: u32,
    /// 每帧重复发送次数（协议无应答，只能靠重复保证可靠性）
    pub retries: u32,
    /// 帧间隔（毫秒）
    pub gap_ms: u64,
    /// 延迟补偿（微秒），从每个电平阶段的保持时长中扣除
    pub latency_us: u64,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            pin: DEFAULT_PIN,
            retries: DEFAULT_RETRIES,
            gap_ms: DEFAULT_FRAME_GAP_MS,
            latency_us: DEFAULT_LATENCY_US,
        }
    }
}

impl TransmitterConfig {
    pub fn with_pin(mut self, pin: u32) -> Self {
        self.pin = pin;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// 设置帧间隔（毫秒，与配置文件的 `gap_ms` 同单位）
    pub fn with_gap_ms(mut self, gap_ms: u64) -> Self {
        self.gap_ms = gap_ms;
        self
    }

    /// 设置延迟补偿（微秒，与配置文件的 `latency_us` 同单位）
    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }

    /// 帧间隔
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }

    /// 延迟补偿
    pub fn latency(&self) -> Duration {
        Duration::from_micros(self.latency_us)
    }

    /// 校验配置
    ///
    /// 延迟补偿不得超过协议中最短的电平阶段，否则脉冲形状会失真。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let shortest = [BIT0_TIMING, BIT1_TIMING]
            .iter()
            .flat_map(|t| [t.high, t.low])
            .min()
            .unwrap_or_default();
        if self.latency() >= shortest {
            return Err(ConfigError::InvalidValue {
                field: "latency_us",
                message: format!(
                    "{} us must be below the shortest pulse phase ({} us)",
                    self.latency_us,
                    shortest.as_micros()
                ),
            });
        }
        Ok(())
    }
}

/// GPIO 后端配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GpioConfig {
    /// sysfs 根目录（默认 `/sys/class/gpio`）
    pub sysfs_root: Option<PathBuf>,
    /// GPIO 芯片基准编号
    pub gpio_base: u32,
}

/// 配置文件
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub transmitter: TransmitterConfig,
    pub gpio: GpioConfig,
}

impl Config {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.transmitter.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// 文件存在时加载，否则返回默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
