//! 脉冲发送器
//!
//! 将一帧转换为引脚上的脉冲序列并重复发送：
//!
//! ```text
//! 对每次重复:
//!     对帧中每一位（MSB 在前）:
//!         引脚置高 -> 保持 (high - latency) -> 引脚置低 -> 保持 (low - latency)
//!     保持低电平 (gap - latency)
//! ```
//!
//! `latency` 补偿每次写引脚与进入等待之间的软件开销，
//! 使实际观测到的脉冲宽度符合协议时序。
//!
//! 脉冲序列本身只依赖 `embedded_hal` 的 `OutputPin` 与 `DelayNs`（见 [`send_frames`]）。
//!
//! 协议没有应答，`transmit` 返回 `Ok` 只表示"已尽力发送"，不代表接收端已执行。

use crate::config::TransmitterConfig;
use crate::delay::{SpinDelay, hold};
use crate::error::DriverError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use wccontrol_gpio::{PinHandle, PinRegistry};
use wccontrol_protocol::{BitTiming, Command, FRAME_BITS, Frame, bit_duration};

/// 一帧中每一位的保持时长 `(high, low)`
pub type HeldTimings = [(Duration, Duration); FRAME_BITS as usize];

/// 脉冲发送器
///
/// 持有一个引脚句柄（来自 [`PinRegistry`]）、发送配置和延时实现。
pub struct PulseTransmitter<D = SpinDelay> {
    pin: PinHandle,
    config: TransmitterConfig,
    delay: D,
}

impl PulseTransmitter<SpinDelay> {
    /// 使用 `spin_sleep` 延时创建发送器
    ///
    /// `config.pin` 必须与句柄的引脚一致。
    pub fn new(pin: PinHandle, config: TransmitterConfig) -> Self {
        Self::with_delay(pin, config, SpinDelay::new())
    }

    /// 校验配置，从注册表获取 `config.pin` 对应的句柄并创建发送器
    ///
    /// # Errors
    /// - `DriverError::Config`: 配置不合法（此时不访问硬件）
    /// - `DriverError::Gpio`: 后端初始化或引脚配置失败（不重试）
    pub fn from_registry(
        registry: &PinRegistry,
        config: TransmitterConfig,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        let pin = registry.pin(config.pin)?;
        Ok(Self::new(pin, config))
    }
}

impl<D: DelayNs> PulseTransmitter<D> {
    /// 使用自定义延时创建发送器
    ///
    /// `config.pin` 必须与句柄的引脚一致。
    pub fn with_delay(pin: PinHandle, config: TransmitterConfig, delay: D) -> Self {
        debug_assert_eq!(
            pin.pin(),
            config.pin,
            "pin handle does not match config.pin"
        );
        Self { pin, config, delay }
    }

    pub fn config(&self) -> &TransmitterConfig {
        &self.config
    }

    pub fn pin(&self) -> &PinHandle {
        &self.pin
    }

    /// 延时实现（批量发送的命令间停顿也通过它完成）
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// 单帧标称耗时（含帧间隔）
    pub fn frame_duration(&self) -> Duration {
        bit_duration() * FRAME_BITS + self.config.gap()
    }

    /// 完整发送（全部重复）的标称耗时
    pub fn run_duration(&self) -> Duration {
        self.frame_duration() * self.config.retries
    }

    /// 编码并发送一条命令
    pub fn send(&mut self, command: Command) -> Result<(), DriverError> {
        self.transmit(&command.encode())
    }

    /// 发送一帧，重复 `retries` 次
    ///
    /// 整个过程阻塞调用线程，并持有该引脚的独占锁。
    ///
    /// # Errors
    /// - `DriverError::Gpio`: 引脚写入失败（立即返回，不再继续发送）
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), DriverError> {
        let retries = self.config.retries;
        if retries == 0 {
            warn!("retries is 0, frame {} not transmitted", frame);
            return Ok(());
        }

        #[cfg(feature = "realtime")]
        raise_thread_priority();

        let latency = self.config.latency();
        let gap = self.config.gap().saturating_sub(latency);

        // 预先计算每一位的保持时长，发送循环内不做查表
        let mut held: HeldTimings = [(Duration::ZERO, Duration::ZERO); FRAME_BITS as usize];
        for (slot, bit) in held.iter_mut().zip(frame.bits()) {
            *slot = BitTiming::for_bit(bit).held(latency);
        }

        debug!(
            "Transmitting frame {} on pin {} ({} retries)",
            frame,
            self.pin.pin(),
            retries
        );

        let mut line = self.pin.lock();
        let start = Instant::now();
        send_frames(&mut line, &mut self.delay, &held, gap, retries)?;

        debug!(
            "Transmitted {} frames on pin {} in {:?}",
            retries,
            line.pin(),
            start.elapsed()
        );
        Ok(())
    }
}

/// 在 `pin` 上发送 `retries` 次脉冲序列，每帧之后保持低电平 `gap`
///
/// 写引脚失败时立即返回。
pub fn send_frames<P, D>(
    pin: &mut P,
    delay: &mut D,
    held: &HeldTimings,
    gap: Duration,
    retries: u32,
) -> Result<(), P::Error>
where
    P: OutputPin,
    D: DelayNs,
{
    for n in 1..=retries {
        for &(high, low) in held {
            pin.set_high()?;
            hold(delay, high);
            pin.set_low()?;
            hold(delay, low);
        }
        hold(delay, gap);
        trace!("Frame {}/{} sent", n, retries);
    }
    Ok(())
}

#[cfg(feature = "realtime")]
thread_local! {
    static PRIORITY_RAISED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// 提升当前线程优先级，每个线程只尝试一次
///
/// 返回本次调用是否进行了尝试。
#[cfg(feature = "realtime")]
fn raise_thread_priority() -> bool {
    use thread_priority::{ThreadPriority, set_current_thread_priority};

    if PRIORITY_RAISED.with(|raised| raised.replace(true)) {
        return false;
    }
    if let Err(e) = set_current_thread_priority(ThreadPriority::Max) {
        warn!(
            "Failed to set transmit thread priority: {:?}. \
             On Linux, you may need to run with CAP_SYS_NICE.",
            e
        );
    }
    true
}
