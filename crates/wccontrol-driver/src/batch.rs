//! 批量发送
//!
//! 对 group 列表与 address 列表的笛卡尔积依次发送（group 在外层）。
//! 相邻两条命令之间停顿 [`DEFAULT_BATCH_PAUSE`]，最后一条之后不停顿。
//! 是否为"最后一条"按位置判断，列表中有重复值时也只在末尾省略停顿。

use crate::delay::hold;
use crate::error::DriverError;
use crate::transmitter::PulseTransmitter;
use embedded_hal::delay::DelayNs;
use std::time::Duration;
use tracing::debug;
use wccontrol_protocol::{Command, ProtocolError};

/// 批量发送中相邻命令之间的停顿
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(200);

/// 批量发送计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    commands: Vec<Command>,
    pause: Duration,
}

impl BatchPlan {
    /// 由 group/address 列表生成计划，所有命令使用相同的开关值
    ///
    /// # Errors
    /// - 任一 group 或 address 超出范围
    ///
    /// # Example
    ///
    /// ```
    /// use wccontrol_driver::BatchPlan;
    ///
    /// let plan = BatchPlan::new(&[1, 2], &[3], true).unwrap();
    /// let pairs: Vec<_> = plan.commands().iter().map(|c| (c.group(), c.address())).collect();
    /// assert_eq!(pairs, vec![(1, 3), (2, 3)]);
    /// ```
    pub fn new(groups: &[u16], addresses: &[u8], on: bool) -> Result<Self, ProtocolError> {
        let commands = groups
            .iter()
            .flat_map(|&group| addresses.iter().map(move |&address| (group, address)))
            .map(|(group, address)| Command::new(group, address, on))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            commands,
            pause: DEFAULT_BATCH_PAUSE,
        })
    }

    /// 设置命令间停顿
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// 按顺序给出每条命令及其后的停顿（最后一条为 `None`）
    pub fn steps(&self) -> impl Iterator<Item = (Command, Option<Duration>)> + '_ {
        let last = self.commands.len().saturating_sub(1);
        self.commands
            .iter()
            .enumerate()
            .map(move |(i, &cmd)| (cmd, (i < last).then_some(self.pause)))
    }

    /// 执行计划
    ///
    /// 每条命令发送完成后调用 `on_sent`，停顿通过发送器的延时完成。
    /// 任一命令发送失败时立即返回错误，其余命令不再发送。
    pub fn run<D, F>(&self, tx: &mut PulseTransmitter<D>, mut on_sent: F) -> Result<(), DriverError>
    where
        D: DelayNs,
        F: FnMut(&Command),
    {
        for (cmd, pause) in self.steps() {
            tx.send(cmd)?;
            on_sent(&cmd);
            if let Some(pause) = pause {
                debug!("Pausing {:?} before next command", pause);
                hold(tx.delay_mut(), pause);
            }
        }
        Ok(())
    }
}
