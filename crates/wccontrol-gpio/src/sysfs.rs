//! Linux sysfs GPIO 后端
//!
//! 通过 `/sys/class/gpio` 控制引脚：
//!
//! 1. 若 `gpioN` 目录不存在，向 `export` 写入 `N`
//! 2. 等待 `gpioN/direction` 可写（udev 规则可能稍后才修改权限）
//! 3. 写入 `out`
//! 4. 保持 `gpioN/value` 打开，之后每次电平变化只需一次 `pwrite`
//!
//! 较新的 Raspberry Pi 内核中 GPIO 芯片的全局编号带偏移（例如 512），
//! 可通过 [`SysfsGpio::with_base`] 设置。

use crate::{GpioBackend, GpioDeviceError, GpioDeviceErrorKind, GpioError, Level};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// sysfs GPIO 根目录
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// 导出后等待节点出现的最长时间
pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_millis(1000);

const EXPORT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// sysfs GPIO 后端
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    base: u32,
    export_timeout: Duration,
    /// 已配置为输出的引脚 -> 打开的 value 文件
    values: HashMap<u32, File>,
}

impl SysfsGpio {
    /// 使用默认根目录 `/sys/class/gpio`
    pub fn new() -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT)
    }

    /// 使用自定义根目录（测试或容器环境）
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base: 0,
            export_timeout: DEFAULT_EXPORT_TIMEOUT,
            values: HashMap::new(),
        }
    }

    /// 设置 GPIO 芯片基准编号（引脚 N 对应 sysfs 的 `gpio{base + N}`）
    pub fn with_base(mut self, base: u32) -> Self {
        self.base = base;
        self
    }

    /// 设置导出后等待节点出现的最长时间
    pub fn with_export_timeout(mut self, timeout: Duration) -> Self {
        self.export_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn line_dir(&self, line: u32) -> PathBuf {
        self.root.join(format!("gpio{}", line))
    }

    fn line(&self, pin: u32) -> Result<u32, GpioError> {
        self.base.checked_add(pin).ok_or_else(|| {
            GpioDeviceError::new(
                GpioDeviceErrorKind::InvalidPin,
                format!("pin {} overflows base {}", pin, self.base),
            )
            .into()
        })
    }

    fn export(&self, line: u32) -> Result<(), GpioError> {
        let path = self.root.join("export");
        debug!("Exporting GPIO line {} via {}", line, path.display());
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| device_error(e, &path))?;
        file.write_all_at(line.to_string().as_bytes(), 0)
            .map_err(|e| device_error(e, &path))?;
        Ok(())
    }

    /// 等待 direction 文件可写
    ///
    /// 刚导出时节点可能尚未创建，或 udev 尚未修改权限。
    fn open_direction(&self, line: u32) -> Result<File, GpioError> {
        let path = self.line_dir(line).join("direction");
        let deadline = Instant::now() + self.export_timeout;
        loop {
            match OpenOptions::new().write(true).open(&path) {
                Ok(file) => return Ok(file),
                Err(e)
                    if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied)
                        && Instant::now() < deadline =>
                {
                    trace!("Waiting for {}: {}", path.display(), e);
                    std::thread::sleep(EXPORT_POLL_INTERVAL);
                },
                Err(e) => return Err(device_error(e, &path)),
            }
        }
    }
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioBackend for SysfsGpio {
    fn configure_output(&mut self, pin: u32) -> Result<(), GpioError> {
        let line = self.line(pin)?;
        if !self.line_dir(line).exists() {
            self.export(line)?;
        }

        let direction = self.open_direction(line)?;
        direction
            .write_all_at(b"out", 0)
            .map_err(|e| device_error(e, &self.line_dir(line).join("direction")))?;

        let value_path = self.line_dir(line).join("value");
        let value = OpenOptions::new()
            .write(true)
            .open(&value_path)
            .map_err(|e| device_error(e, &value_path))?;

        debug!("GPIO pin {} (line {}) configured as output", pin, line);
        self.values.insert(pin, value);
        Ok(())
    }

    fn set_level(&mut self, pin: u32, level: Level) -> Result<(), GpioError> {
        let file = self.values.get(&pin).ok_or(GpioError::NotConfigured { pin })?;
        let byte: &[u8] = if level.is_high() { b"1" } else { b"0" };
        file.write_all_at(byte, 0)?;
        Ok(())
    }
}

/// 将 IO 错误按类型映射为设备错误，附带出错路径
fn device_error(err: io::Error, path: &Path) -> GpioError {
    let kind = match err.kind() {
        ErrorKind::NotFound => GpioDeviceErrorKind::NotFound,
        ErrorKind::PermissionDenied => GpioDeviceErrorKind::AccessDenied,
        ErrorKind::ResourceBusy => GpioDeviceErrorKind::Busy,
        ErrorKind::InvalidInput => GpioDeviceErrorKind::InvalidPin,
        _ => return GpioError::Io(err),
    };
    GpioDeviceError::new(kind, format!("{}: {}", path.display(), err)).into()
}
