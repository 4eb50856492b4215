//! # wccontrol
//!
//! 通过 Raspberry Pi GPIO 引脚驱动 433MHz 发射模块，控制 Watts Clever 智能插座。
//!
//! ```bash
//! # 打开 group 1 的 3 号插座
//! wccontrol 1 3 1
//!
//! # 关闭 group 1、2 的全部插座（address 6 = 组广播）
//! wccontrol 1,2 6 0
//!
//! # 指定引脚与重复次数
//! wccontrol -p 17 -r 10 1 3 1
//!
//! # 只打印帧，不访问硬件
//! wccontrol --dry-run 1 3 1
//! ```
//!
//! 日志输出到 stderr，由 `RUST_LOG` 控制（默认 `wccontrol=info`，`-v` 为 debug）。

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wccontrol_driver::{BatchPlan, DriverError, GpioConfig, PulseTransmitter};
use wccontrol_gpio::{GpioError, PinRegistry};

mod config;
mod validation;

/// Set a Watts Clever smart switch on or off
#[derive(Parser, Debug)]
#[command(name = "wccontrol")]
#[command(about = "Set a Watts Clever smart switch on or off", long_about = None)]
#[command(version)]
pub struct Cli {
    /// RPi BCM GPIO pin to output [default: 4]
    #[arg(short, long)]
    pub pin: Option<u32>,

    /// Number of retries to send [default: 20]
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Gap between repeated frames in milliseconds [default: 20]
    #[arg(long)]
    pub gap_ms: Option<u64>,

    /// Latency correction in microseconds [default: 80]
    #[arg(long)]
    pub latency_us: Option<u64>,

    /// Config file [default: ~/.config/wccontrol/config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the encoded frames without touching GPIO
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Group, 0 to 1023 (comma-separated list allowed)
    pub group: String,

    /// Switch address, 0 to 7 (6 = all in same group; comma-separated list allowed)
    pub address: String,

    /// Value 0=off, 1=on
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    pub value: u8,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "wccontrol=debug" } else { "wccontrol=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(target_os = "linux")]
fn open_registry(gpio: &GpioConfig) -> Result<PinRegistry> {
    use wccontrol_gpio::SysfsGpio;
    use wccontrol_gpio::sysfs::DEFAULT_SYSFS_ROOT;

    let root = gpio
        .sysfs_root
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSFS_ROOT));
    let base = gpio.gpio_base;
    Ok(PinRegistry::new(move || {
        Ok(SysfsGpio::with_root(root.clone()).with_base(base))
    }))
}

#[cfg(not(target_os = "linux"))]
fn open_registry(_gpio: &GpioConfig) -> Result<PinRegistry> {
    anyhow::bail!("GPIO output is only supported on Linux")
}

/// 引脚初始化失败时的错误链
///
/// 引脚不存在或无权限时附加排查提示（重试没有意义）。
fn setup_error(err: DriverError, pin: u32) -> anyhow::Error {
    let hint = match &err {
        DriverError::Gpio(GpioError::Device(dev)) if dev.is_fatal() => Some(format!(
            "GPIO pin {} is unavailable: check that the sysfs GPIO interface exists \
             and is writable by this user (gpio group or udev rule)",
            pin
        )),
        _ => None,
    };
    let err = anyhow::Error::new(err);
    let err = match hint {
        Some(hint) => err.context(hint),
        None => err,
    };
    err.context(format!("Failed to set up GPIO pin {}", pin))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::resolve(&cli)?;
    let groups = validation::parse_list::<u16>("group", &cli.group)?;
    let addresses = validation::parse_list::<u8>("address", &cli.address)?;
    let plan = BatchPlan::new(&groups, &addresses, cli.value == 1)?;

    if cli.dry_run {
        for cmd in plan.commands() {
            println!(
                "Frame for group {} + address {} value {}: {}",
                cmd.group(),
                cmd.address(),
                cli.value,
                cmd.encode()
            );
        }
        return Ok(());
    }

    let registry = open_registry(&config.gpio)?;
    let pin = config.transmitter.pin;
    let mut tx = PulseTransmitter::from_registry(&registry, config.transmitter)
        .map_err(|e| setup_error(e, pin))?;

    plan.run(&mut tx, |cmd| {
        println!(
            "Set Watts Clever switch group {} + address {} to {}",
            cmd.group(),
            cmd.address(),
            cli.value
        );
    })
    .with_context(|| format!("Transmission on GPIO pin {} failed", pin))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wccontrol_gpio::{GpioDeviceError, GpioDeviceErrorKind};

    fn device(kind: GpioDeviceErrorKind) -> DriverError {
        DriverError::Gpio(GpioDeviceError::new(kind, "gpio4").into())
    }

    #[test]
    fn test_setup_error_hint_for_fatal() {
        let err = setup_error(device(GpioDeviceErrorKind::AccessDenied), 4);
        let chain: Vec<String> = err.chain().map(|e| e.to_string()).collect();
        assert_eq!(chain[0], "Failed to set up GPIO pin 4");
        assert!(chain[1].contains("sysfs GPIO interface"));
    }

    #[test]
    fn test_setup_error_no_hint_for_transient() {
        let err = setup_error(device(GpioDeviceErrorKind::Busy), 4);
        assert!(err.chain().all(|e| !e.to_string().contains("sysfs GPIO interface")));
    }
}
