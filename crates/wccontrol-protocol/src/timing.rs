//! 协议时序参数
//!
//! 每个位由一个高电平脉冲和一个低电平间隔组成（OOK 调制），
//! 两种位值的总时长相同，只是高/低电平的分配不同。
//!
//! | 位值 | 高电平 | 低电平 | 合计 |
//! |------|--------|--------|------|
//! | `0`  | 938 µs | 250 µs | 1188 µs |
//! | `1`  | 407 µs | 781 µs | 1188 µs |

use std::time::Duration;

/// 每个位的总时长（微秒）
pub const BIT_TOTAL_US: u64 = 1188;
/// 位 `0` 的高电平时长（微秒）
pub const BIT0_HIGH_US: u64 = 938;
/// 位 `1` 的高电平时长（微秒）
pub const BIT1_HIGH_US: u64 = 407;
/// 默认帧间隔（毫秒）
pub const DEFAULT_FRAME_GAP_MS: u64 = 20;
/// 默认延迟补偿（微秒）
///
/// 在 Raspberry Pi 上实测的软件调用开销，针对其他平台可重新标定。
pub const DEFAULT_LATENCY_US: u64 = 80;

/// 单个位的脉冲形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    /// 高电平时长
    pub high: Duration,
    /// 低电平时长
    pub low: Duration,
}

/// 位 `0` 的时序
pub const BIT0_TIMING: BitTiming = BitTiming::from_high_us(BIT0_HIGH_US);
/// 位 `1` 的时序
pub const BIT1_TIMING: BitTiming = BitTiming::from_high_us(BIT1_HIGH_US);

impl BitTiming {
    const fn from_high_us(high_us: u64) -> Self {
        Self {
            high: Duration::from_micros(high_us),
            low: Duration::from_micros(BIT_TOTAL_US - high_us),
        }
    }

    /// 查表：`bit` 为 `true` 表示 `1`
    pub const fn for_bit(bit: bool) -> Self {
        if bit { BIT1_TIMING } else { BIT0_TIMING }
    }

    /// 脉冲总时长
    pub fn total(&self) -> Duration {
        self.high + self.low
    }

    /// 扣除延迟补偿后实际需要保持的时长 `(high, low)`
    ///
    /// 补偿大于某个阶段时该阶段保持时长为 0。
    pub fn held(&self, latency: Duration) -> (Duration, Duration) {
        (
            self.high.saturating_sub(latency),
            self.low.saturating_sub(latency),
        )
    }
}

/// 位的标称总时长
pub const fn bit_duration() -> Duration {
    Duration::from_micros(BIT_TOTAL_US)
}
