//! 驱动层错误类型定义

use crate::config::ConfigError;
use thiserror::Error;
use wccontrol_gpio::GpioError;
use wccontrol_protocol::ProtocolError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// GPIO 初始化或写入失败
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),

    /// 命令编码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use wccontrol_gpio::{GpioDeviceError, GpioDeviceErrorKind, GpioError};
    use wccontrol_protocol::ProtocolError;

    /// 测试 DriverError 的 Display 实现
    #[test]
    fn test_driver_error_display() {
        let err = DriverError::Gpio(GpioError::NotConfigured { pin: 4 });
        assert_eq!(
            err.to_string(),
            "GPIO error: Pin 4 is not configured as output"
        );

        let err = DriverError::Protocol(ProtocolError::AddressOutOfRange { address: 9 });
        assert!(err.to_string().contains("Address 9 out of range"));
    }

    /// 测试 From<GpioError> 转换
    #[test]
    fn test_from_gpio_error() {
        let gpio_error: GpioError =
            GpioDeviceError::new(GpioDeviceErrorKind::AccessDenied, "gpio4").into();
        let driver_error: DriverError = gpio_error.into();
        match driver_error {
            DriverError::Gpio(GpioError::Device(e)) => {
                assert_eq!(e.kind, GpioDeviceErrorKind::AccessDenied)
            },
            other => panic!("Expected Gpio variant, got {:?}", other),
        }
    }

    /// 测试 From<ProtocolError> 转换
    #[test]
    fn test_from_protocol_error() {
        let driver_error: DriverError = ProtocolError::GroupOutOfRange { group: 2000 }.into();
        assert!(matches!(
            driver_error,
            DriverError::Protocol(ProtocolError::GroupOutOfRange { group: 2000 })
        ));
    }
}
