//! Mock GPIO 后端
//!
//! 在内存中记录所有配置与写操作（带时间戳），用于无硬件测试。
//! `MockGpio` 可克隆，所有克隆共享同一份记录。

use crate::{GpioBackend, GpioDeviceError, GpioDeviceErrorKind, GpioError, Level};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// 记录的 GPIO 操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpioEvent {
    Configure { pin: u32 },
    Write { pin: u32, level: Level, at: Instant },
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<GpioEvent>,
    outputs: HashSet<u32>,
    writes: usize,
    fail_configure: Option<GpioDeviceErrorKind>,
    fail_write_at: Option<usize>,
}

/// 模拟 GPIO 后端
#[derive(Debug, Clone, Default)]
pub struct MockGpio {
    state: Arc<Mutex<MockState>>,
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的 `configure_output` 均以给定错误类型失败
    pub fn fail_configure(&self, kind: GpioDeviceErrorKind) {
        self.state.lock().fail_configure = Some(kind);
    }

    /// 第 `n` 次写操作（从 0 开始计数）失败
    pub fn fail_write_at(&self, n: usize) {
        self.state.lock().fail_write_at = Some(n);
    }

    /// 所有记录的操作
    pub fn events(&self) -> Vec<GpioEvent> {
        self.state.lock().events.clone()
    }

    /// 某个引脚的写入电平序列
    pub fn levels(&self, pin: u32) -> Vec<Level> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                GpioEvent::Write { pin: p, level, .. } if *p == pin => Some(*level),
                _ => None,
            })
            .collect()
    }

    /// 配置操作次数
    pub fn configure_count(&self, pin: u32) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, GpioEvent::Configure { pin: p } if *p == pin))
            .count()
    }

    /// 成功写操作总数
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.events.clear();
        state.writes = 0;
    }
}

impl GpioBackend for MockGpio {
    fn configure_output(&mut self, pin: u32) -> Result<(), GpioError> {
        let mut state = self.state.lock();
        if let Some(kind) = state.fail_configure {
            return Err(GpioDeviceError::new(kind, format!("mock configure gpio{}", pin)).into());
        }
        state.outputs.insert(pin);
        state.events.push(GpioEvent::Configure { pin });
        Ok(())
    }

    fn set_level(&mut self, pin: u32, level: Level) -> Result<(), GpioError> {
        let mut state = self.state.lock();
        if !state.outputs.contains(&pin) {
            return Err(GpioError::NotConfigured { pin });
        }
        if state.fail_write_at == Some(state.writes) {
            return Err(GpioDeviceError::new(
                GpioDeviceErrorKind::Backend,
                format!("mock write gpio{}", pin),
            )
            .into());
        }
        state.writes += 1;
        state.events.push(GpioEvent::Write {
            pin,
            level,
            at: Instant::now(),
        });
        Ok(())
    }
}
