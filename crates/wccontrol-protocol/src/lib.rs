//! # wccontrol Protocol
//!
//! Watts Clever 智能插座遥控协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `frame`: 命令与 25 位帧编码
//! - `timing`: 每个位的高/低电平时长表
//!
//! ## 帧格式
//!
//! ```text
//! | 前导码 (10) | group (10) | value (1) | address (3) | 停止位 (1) |
//! | 0011010011  | 大端       | 0=开 1=关 | 大端        | 1          |
//! ```
//!
//! 所有字段按 MSB 在前的顺序发送。协议是开环的（无应答），
//! 可靠性完全依赖于重复发送。

pub mod frame;
pub mod timing;

// 重新导出常用类型
pub use frame::*;
pub use timing::*;

use thiserror::Error;

/// 协议编码错误类型
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Group {group} out of range (0..={max})", max = frame::MAX_GROUP)]
    GroupOutOfRange { group: u16 },

    #[error("Address {address} out of range (0..={max})", max = frame::MAX_ADDRESS)]
    AddressOutOfRange { address: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::GroupOutOfRange { group: 1024 };
        assert_eq!(err.to_string(), "Group 1024 out of range (0..=1023)");

        let err = ProtocolError::AddressOutOfRange { address: 8 };
        assert_eq!(err.to_string(), "Address 8 out of range (0..=7)");
    }
}
