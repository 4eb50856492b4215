//! 命令与帧编码
//!
//! 将 (group, address, on/off) 编码为固定长度的帧。
//! 帧内部以 `u32` 保存，最高有效位（第 24 位）最先发送。

use crate::ProtocolError;
use std::fmt;

/// 前导码（固定 10 位）：`0011010011`
pub const PREAMBLE: u32 = 0b00_1101_0011;
/// 前导码位数
pub const PREAMBLE_BITS: u32 = 10;
/// group 字段位数
pub const GROUP_BITS: u32 = 10;
/// value 字段位数
pub const VALUE_BITS: u32 = 1;
/// address 字段位数
pub const ADDRESS_BITS: u32 = 3;
/// 停止位位数（固定为 1）
pub const STOP_BITS: u32 = 1;

/// 帧总位数
pub const FRAME_BITS: u32 = PREAMBLE_BITS + GROUP_BITS + VALUE_BITS + ADDRESS_BITS + STOP_BITS;

/// group 最大值（10 位）
pub const MAX_GROUP: u16 = (1 << GROUP_BITS) - 1;
/// address 最大值（3 位）
pub const MAX_ADDRESS: u8 = (1 << ADDRESS_BITS) - 1;
/// 广播地址：同组内所有插座
pub const BROADCAST_ADDRESS: u8 = 6;

const ADDRESS_SHIFT: u32 = STOP_BITS;
const VALUE_SHIFT: u32 = ADDRESS_SHIFT + ADDRESS_BITS;
const GROUP_SHIFT: u32 = VALUE_SHIFT + VALUE_BITS;
const PREAMBLE_SHIFT: u32 = GROUP_SHIFT + GROUP_BITS;
const FRAME_MASK: u32 = (1 << FRAME_BITS) - 1;

/// 遥控命令
///
/// 构造时校验字段范围，之后不可变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    group: u16,
    address: u8,
    on: bool,
}

impl Command {
    /// 创建命令
    ///
    /// # Errors
    /// - `ProtocolError::GroupOutOfRange`: `group > 1023`
    /// - `ProtocolError::AddressOutOfRange`: `address > 7`
    ///
    /// # Example
    ///
    /// ```
    /// use wccontrol_protocol::Command;
    ///
    /// let cmd = Command::new(1, 0, true).unwrap();
    /// assert_eq!(cmd.encode().to_string(), "0011010011000000000100001");
    ///
    /// assert!(Command::new(1024, 0, true).is_err());
    /// ```
    pub fn new(group: u16, address: u8, on: bool) -> Result<Self, ProtocolError> {
        if group > MAX_GROUP {
            return Err(ProtocolError::GroupOutOfRange { group });
        }
        if address > MAX_ADDRESS {
            return Err(ProtocolError::AddressOutOfRange { address });
        }
        Ok(Self { group, address, on })
    }

    /// 创建命令，超出范围的值按字段宽度截断（取低位）
    ///
    /// 用于需要兼容"静默回绕"行为的调用方，例如 `1025` 会变成 group `1`。
    pub fn new_truncating(group: u16, address: u8, on: bool) -> Self {
        Self {
            group: group & MAX_GROUP,
            address: address & MAX_ADDRESS,
            on,
        }
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// 是否为组广播命令（address == 6）
    pub fn is_broadcast(&self) -> bool {
        self.address == BROADCAST_ADDRESS
    }

    /// 编码为帧
    pub fn encode(&self) -> Frame {
        // value 位极性与开关语义相反：开 = 0，关 = 1
        let value: u32 = if self.on { 0 } else { 1 };
        let word = (PREAMBLE << PREAMBLE_SHIFT)
            | (u32::from(self.group) << GROUP_SHIFT)
            | (value << VALUE_SHIFT)
            | (u32::from(self.address) << ADDRESS_SHIFT)
            | 1;
        Frame { word }
    }
}

impl From<Command> for Frame {
    fn from(command: Command) -> Self {
        command.encode()
    }
}

/// 将 (group, address, on) 编码为帧
///
/// 纯函数，相同输入总是得到相同输出。
///
/// # Example
///
/// ```
/// use wccontrol_protocol::encode;
///
/// let frame = encode(1023, 6, false).unwrap();
/// assert_eq!(frame.to_string(), "0011010011111111111111101");
/// ```
pub fn encode(group: u16, address: u8, on: bool) -> Result<Frame, ProtocolError> {
    Ok(Command::new(group, address, on)?.encode())
}

/// 一帧完整的位序列
///
/// 只能由 [`Command`] 生成，没有独立身份。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    word: u32,
}

impl Frame {
    /// 帧位数
    pub const fn len(&self) -> usize {
        FRAME_BITS as usize
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    /// 原始帧字（低 `FRAME_BITS` 位有效）
    pub fn as_u32(&self) -> u32 {
        self.word
    }

    /// 按发送顺序（MSB 在前）遍历所有位，`true` 表示 `1`
    pub fn bits(&self) -> Bits {
        Bits {
            word: self.word,
            remaining: FRAME_BITS,
        }
    }

    /// 第 `index` 位（0 为最先发送的位）
    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.len() {
            return None;
        }
        let shift = FRAME_BITS - 1 - index as u32;
        Some((self.word >> shift) & 1 == 1)
    }

    /// 还原本帧携带的命令字段
    ///
    /// 仅用于读取由 [`Command::encode`] 生成的帧（日志、测试），不是接收路径。
    pub fn command(&self) -> Command {
        let group = ((self.word >> GROUP_SHIFT) & u32::from(MAX_GROUP)) as u16;
        let address = ((self.word >> ADDRESS_SHIFT) & u32::from(MAX_ADDRESS)) as u8;
        let on = (self.word >> VALUE_SHIFT) & 1 == 0;
        Command { group, address, on }
    }

    /// 一帧中 `1` 的个数
    pub fn count_ones(&self) -> u32 {
        (self.word & FRAME_MASK).count_ones()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// 帧位迭代器（MSB 在前）
#[derive(Debug, Clone)]
pub struct Bits {
    word: u32,
    remaining: u32,
}

impl Iterator for Bits {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some((self.word >> self.remaining) & 1 == 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Bits {}
