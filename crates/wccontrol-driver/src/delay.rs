//! 阻塞延时
//!
//! 发送器通过 `embedded_hal::delay::DelayNs` 保持电平，测试时可替换为记录型实现。

use embedded_hal::delay::DelayNs;
use std::time::Duration;

/// 基于 `spin_sleep` 的高精度延时
///
/// 先由系统 sleep 完成大部分等待，最后一小段自旋，
/// 相比 `std::thread::sleep` 的 1-2ms 误差可达到微秒级精度。
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinDelay {
    sleeper: spin_sleep::SpinSleeper,
}

impl SpinDelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration);
        }
    }
}

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// 以微秒为单位阻塞 `duration`（不足 1µs 的部分舍去）
///
/// 超过 `u32::MAX` 微秒时分段调用 `delay_us`。
pub(crate) fn hold<D: DelayNs>(delay: &mut D, duration: Duration) {
    let mut us = duration.as_micros();
    loop {
        let chunk = u32::try_from(us).unwrap_or(u32::MAX);
        delay.delay_us(chunk);
        us -= u128::from(chunk);
        if us == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[derive(Default)]
    struct Calls(Vec<u32>);

    impl DelayNs for Calls {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_us(&mut self, us: u32) {
            self.0.push(us);
        }
    }

    #[test]
    fn test_spin_delay_holds_at_least_duration() {
        let mut delay = SpinDelay::new();
        let start = Instant::now();
        delay.delay_us(500);
        assert!(start.elapsed() >= Duration::from_micros(500));
    }

    #[test]
    fn test_zero_delay_returns() {
        let mut delay = SpinDelay::new();
        let start = Instant::now();
        delay.delay_ns(0);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_hold_single_call() {
        let mut calls = Calls::default();
        hold(&mut calls, Duration::from_micros(19_920));
        hold(&mut calls, Duration::ZERO);
        assert_eq!(calls.0, vec![19_920, 0]);
    }

    #[test]
    fn test_hold_splits_long_durations() {
        let mut calls = Calls::default();
        let total = u64::from(u32::MAX) + 10;
        hold(&mut calls, Duration::from_micros(total));
        assert_eq!(calls.0, vec![u32::MAX, 10]);
    }
}
