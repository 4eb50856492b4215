//! 引脚注册表
//!
//! 按引脚编号缓存 [`PinHandle`]：同一编号的多个发送器共享同一个底层资源，
//! 引脚只在第一次使用时配置为输出。注册表由应用持有，存活期间不会释放已缓存的句柄。
//!
//! GPIO 后端本身也是首次使用时才创建（一次性初始化），
//! 创建失败会原样返回给调用者，下一次调用会重新尝试。
//!
//! # 锁
//!
//! - 每个引脚一把锁：一次完整发送期间持有，保证同一引脚上的发送互斥
//! - 后端一把锁：每次写电平时短暂持有
//!
//! # 示例
//!
//! ```rust,ignore
//! use wccontrol_gpio::{PinRegistry, SysfsGpio};
//!
//! let registry = PinRegistry::new(|| Ok(SysfsGpio::new()));
//! let a = registry.pin(4)?;
//! let b = registry.pin(4)?;
//! assert!(a.same_line(&b));
//! ```

use crate::{GpioBackend, GpioError, Level};
use embedded_hal::digital::{ErrorType, OutputPin};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

type BackendFactory = Box<dyn Fn() -> Result<Box<dyn GpioBackend>, GpioError> + Send + Sync>;
type SharedBackend = Arc<Mutex<Box<dyn GpioBackend>>>;

/// 引脚编号 -> 句柄 的缓存
pub struct PinRegistry {
    factory: BackendFactory,
    backend: Mutex<Option<SharedBackend>>,
    /// 后端是否已完成初始化
    initialized: AtomicBool,
    pins: Mutex<HashMap<u32, PinHandle>>,
}

impl PinRegistry {
    /// 以后端工厂创建注册表（此时不访问硬件）
    pub fn new<F, B>(factory: F) -> Self
    where
        F: Fn() -> Result<B, GpioError> + Send + Sync + 'static,
        B: GpioBackend + 'static,
    {
        Self {
            factory: Box::new(move || factory().map(|b| Box::new(b) as Box<dyn GpioBackend>)),
            backend: Mutex::new(None),
            initialized: AtomicBool::new(false),
            pins: Mutex::new(HashMap::new()),
        }
    }

    /// GPIO 后端是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 已缓存的引脚数量
    pub fn len(&self) -> usize {
        self.pins.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.lock().is_empty()
    }

    fn backend(&self) -> Result<SharedBackend, GpioError> {
        let mut slot = self.backend.lock();
        if let Some(backend) = slot.as_ref() {
            return Ok(Arc::clone(backend));
        }

        let backend: SharedBackend = Arc::new(Mutex::new((self.factory)()?));
        *slot = Some(Arc::clone(&backend));
        self.initialized.store(true, Ordering::Release);
        info!("GPIO backend initialized");
        Ok(backend)
    }

    /// 获取引脚句柄
    ///
    /// 首次请求某个编号时将其配置为输出并缓存，之后返回同一个句柄。
    ///
    /// # Errors
    /// - 后端创建失败或引脚配置失败（不缓存任何内容）
    pub fn pin(&self, pin: u32) -> Result<PinHandle, GpioError> {
        let mut pins = self.pins.lock();
        if let Some(handle) = pins.get(&pin) {
            return Ok(handle.clone());
        }

        let backend = self.backend()?;
        backend.lock().configure_output(pin)?;
        info!("GPIO pin {} configured as output", pin);

        let handle = PinHandle {
            pin,
            line: Arc::new(Mutex::new(LineState {
                pin,
                backend,
                level: None,
            })),
        };
        pins.insert(pin, handle.clone());
        Ok(handle)
    }
}

impl fmt::Debug for PinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinRegistry")
            .field("initialized", &self.is_initialized())
            .field("pins", &self.pins.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

struct LineState {
    pin: u32,
    backend: SharedBackend,
    /// 最近一次成功写入的电平
    level: Option<Level>,
}

/// 单个输出引脚的句柄
///
/// 克隆得到的句柄指向同一条线路。
#[derive(Clone)]
pub struct PinHandle {
    pin: u32,
    line: Arc<Mutex<LineState>>,
}

impl PinHandle {
    pub fn pin(&self) -> u32 {
        self.pin
    }

    /// 两个句柄是否指向同一底层资源
    pub fn same_line(&self, other: &PinHandle) -> bool {
        Arc::ptr_eq(&self.line, &other.line)
    }

    /// 独占该引脚（阻塞直到其他持有者释放）
    pub fn lock(&self) -> PinLine<'_> {
        PinLine {
            guard: self.line.lock(),
        }
    }
}

impl fmt::Debug for PinHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinHandle").field("pin", &self.pin).finish()
    }
}

/// 持有引脚独占权期间的写接口
pub struct PinLine<'a> {
    guard: MutexGuard<'a, LineState>,
}

impl PinLine<'_> {
    pub fn pin(&self) -> u32 {
        self.guard.pin
    }

    /// 最近一次写入的电平（从未写入时为 `None`）
    pub fn level(&self) -> Option<Level> {
        self.guard.level
    }

    pub fn set(&mut self, level: Level) -> Result<(), GpioError> {
        let pin = self.guard.pin;
        self.guard.backend.lock().set_level(pin, level)?;
        self.guard.level = Some(level);
        Ok(())
    }
}

impl ErrorType for PinLine<'_> {
    type Error = GpioError;
}

impl OutputPin for PinLine<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(Level::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGpio;
    use crate::{GpioDeviceErrorKind, GpioError};
    use std::sync::atomic::AtomicUsize;

    fn counting_registry(mock: &MockGpio) -> (PinRegistry, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let mock = mock.clone();
        let registry = PinRegistry::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(mock.clone())
        });
        (registry, created)
    }

    #[test]
    fn test_lazy_initialization() {
        let mock = MockGpio::new();
        let (registry, created) = counting_registry(&mock);

        assert!(!registry.is_initialized());
        assert_eq!(created.load(Ordering::SeqCst), 0);

        registry.pin(4).unwrap();
        assert!(registry.is_initialized());
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_same_pin_reuses_handle() {
        let mock = MockGpio::new();
        let (registry, created) = counting_registry(&mock);

        let a = registry.pin(4).unwrap();
        let b = registry.pin(4).unwrap();
        let c = registry.pin(17).unwrap();

        assert!(a.same_line(&b));
        assert!(!a.same_line(&c));
        assert_eq!(registry.len(), 2);
        // 后端只创建一次，每个引脚只配置一次
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(mock.configure_count(4), 1);
        assert_eq!(mock.configure_count(17), 1);
    }

    #[test]
    fn test_configure_failure_not_cached() {
        let mock = MockGpio::new();
        mock.fail_configure(GpioDeviceErrorKind::AccessDenied);
        let (registry, _) = counting_registry(&mock);

        assert!(registry.pin(4).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_factory_failure_propagates() {
        let registry = PinRegistry::new(|| -> Result<MockGpio, GpioError> {
            Err(crate::GpioDeviceError::new(GpioDeviceErrorKind::NotFound, "no gpio").into())
        });

        let err = registry.pin(4).unwrap_err();
        assert!(matches!(err, GpioError::Device(_)));
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_line_writes_through_backend() {
        let mock = MockGpio::new();
        let (registry, _) = counting_registry(&mock);
        let handle = registry.pin(4).unwrap();

        let mut line = handle.lock();
        assert_eq!(line.level(), None);
        line.set_high().unwrap();
        line.set_low().unwrap();
        assert_eq!(line.level(), Some(Level::Low));
        drop(line);

        assert_eq!(mock.levels(4), vec![Level::High, Level::Low]);
    }

    /// 只依赖 embedded-hal 的调用方
    fn pulse<P: OutputPin>(pin: &mut P) -> Result<(), P::Error> {
        pin.set_high()?;
        pin.set_low()
    }

    #[test]
    fn test_line_as_embedded_hal_output_pin() {
        use embedded_hal::digital::{Error, ErrorKind};

        let mock = MockGpio::new();
        let (registry, _) = counting_registry(&mock);
        let handle = registry.pin(4).unwrap();

        pulse(&mut handle.lock()).unwrap();
        assert_eq!(mock.levels(4), vec![Level::High, Level::Low]);

        mock.fail_write_at(3);
        let err = pulse(&mut handle.lock()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(handle.lock().level(), Some(Level::High));
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PinRegistry>();
        assert_send_sync::<PinHandle>();
    }
}
