//! 输入验证模块
//!
//! 解析逗号分隔的 group / address 列表

use anyhow::{Context, Result};
use std::str::FromStr;

/// 解析逗号分隔的整数列表，例如 `1,2,3`
///
/// # 错误
/// 如果：
/// - 列表为空或含空项
/// - 任一项不是合法整数
pub fn parse_list<T>(name: &str, input: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let values = input
        .split(',')
        .map(|s| {
            let s = s.trim();
            if s.is_empty() {
                anyhow::bail!("{} list {:?} contains an empty entry", name, input);
            }
            s.parse::<T>()
                .with_context(|| format!("Invalid {} {:?}", name, s))
        })
        .collect::<Result<Vec<_>>>()?;

    if values.is_empty() {
        anyhow::bail!("{} list is empty", name);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        assert_eq!(parse_list::<u16>("group", "7").unwrap(), vec![7]);
    }

    #[test]
    fn test_comma_list() {
        assert_eq!(parse_list::<u16>("group", "1,2, 3").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_keeps_order_and_duplicates() {
        assert_eq!(parse_list::<u8>("address", "6,0,6").unwrap(), vec![6, 0, 6]);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = parse_list::<u16>("group", "1,x").unwrap_err();
        assert!(err.to_string().contains("Invalid group"));
    }

    #[test]
    fn test_rejects_empty_entry() {
        assert!(parse_list::<u8>("address", "1,,2").is_err());
        assert!(parse_list::<u8>("address", "").is_err());
    }

    #[test]
    fn test_rejects_negative() {
        assert!(parse_list::<u8>("address", "-1").is_err());
    }
}
