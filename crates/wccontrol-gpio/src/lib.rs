//! # wccontrol GPIO Layer
//!
//! 输出引脚抽象层。发送器只需要两个操作：
//!
//! - 将编号引脚配置为输出
//! - 设置编号引脚的电平
//!
//! 任何能提供这两个操作的 GPIO 库都可以作为后端（见 [`GpioBackend`]）。
//!
//! ## 后端
//!
//! - `sysfs`: Linux `/sys/class/gpio` 接口（仅 Linux）
//! - `mock`: 记录所有操作的内存后端（`mock` feature）
//!
//! ## 引脚缓存
//!
//! [`PinRegistry`] 按引脚编号缓存 [`PinHandle`]，同一引脚只初始化一次。
//! 锁定后的 [`PinLine`] 实现 `embedded_hal::digital::OutputPin`，
//! 上层的脉冲发送只依赖该 trait。

use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod sysfs;

#[cfg(target_os = "linux")]
pub use sysfs::SysfsGpio;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{GpioEvent, MockGpio};

pub mod registry;

pub use registry::{PinHandle, PinLine, PinRegistry};

/// GPIO 层统一错误类型
#[derive(Error, Debug)]
pub enum GpioError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] GpioDeviceError),
    #[error("Pin {pin} is not configured as output")]
    NotConfigured { pin: u32 },
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioDeviceErrorKind {
    NotFound,
    AccessDenied,
    Busy,
    InvalidPin,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct GpioDeviceError {
    pub kind: GpioDeviceErrorKind,
    pub message: String,
}

impl GpioDeviceError {
    pub fn new(kind: GpioDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// 硬件不存在或无权限，重试没有意义
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            GpioDeviceErrorKind::NotFound
                | GpioDeviceErrorKind::AccessDenied
                | GpioDeviceErrorKind::InvalidPin
        )
    }
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// 引脚电平
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// 引脚驱动后端
///
/// 引脚以编号标识（例如 Raspberry Pi 的 BCM 编号）。
pub trait GpioBackend: Send {
    /// 将引脚配置为输出
    fn configure_output(&mut self, pin: u32) -> Result<(), GpioError>;

    /// 设置引脚电平
    fn set_level(&mut self, pin: u32, level: Level) -> Result<(), GpioError>;
}

impl<B: GpioBackend + ?Sized> GpioBackend for Box<B> {
    fn configure_output(&mut self, pin: u32) -> Result<(), GpioError> {
        (**self).configure_output(pin)
    }

    fn set_level(&mut self, pin: u32, level: Level) -> Result<(), GpioError> {
        (**self).set_level(pin, level)
    }
}
