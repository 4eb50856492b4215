//! 发送驱动层
//!
//! 本模块将协议帧转换为引脚上的定时脉冲序列，包括：
//! - 逐位高/低电平脉冲（扣除延迟补偿）
//! - 帧重复发送与帧间隔
//! - 配置加载（TOML）
//! - 批量发送（group × address 笛卡尔积）
//!
//! # 执行模型
//!
//! 完全同步阻塞：发送期间占用调用线程，所有保持时间都是阻塞等待
//! （[`SpinDelay`] 基于 `spin_sleep`，微秒级精度，实现 `embedded_hal::delay::DelayNs`）。
//! 发送开始后不可取消。

pub mod batch;
pub mod config;
pub mod delay;
mod error;
pub mod transmitter;

pub use batch::{BatchPlan, DEFAULT_BATCH_PAUSE};
pub use config::{Config, ConfigError, GpioConfig, TransmitterConfig};
pub use delay::SpinDelay;
pub use error::DriverError;
pub use transmitter::{HeldTimings, PulseTransmitter, send_frames};

pub use embedded_hal;
pub use wccontrol_gpio as gpio;
pub use wccontrol_protocol as protocol;
