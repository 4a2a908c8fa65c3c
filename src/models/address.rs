//! 硬件地址与网络地址的解析和规范化

use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;

static HARDWARE_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").expect("valid hardware address regex")
});

static NETWORK_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("valid network address regex")
});

/// 规范化 MAC 地址
///
/// 接受以 `:` 或 `-` 分隔的 6 组十六进制，统一输出为大写、冒号分隔，
/// 例如 `aa-bb-cc-dd-ee-ff` -> `AA:BB:CC:DD:EE:FF`。
pub fn normalize_hardware_address(input: &str) -> Result<String, AppError> {
    let input = input.trim();
    if !HARDWARE_ADDRESS_RE.is_match(input) {
        return Err(AppError::Validation(format!(
            "Invalid hardware address: {} (expected e.g. AA:BB:CC:DD:EE:FF)",
            input
        )));
    }

    Ok(input
        .split([':', '-'])
        .map(|octet| octet.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(":"))
}

/// 规范化 IPv4 地址，每段 0-255，去掉前导零
pub fn normalize_network_address(input: &str) -> Result<String, AppError> {
    let input = input.trim();
    let invalid = || {
        AppError::Validation(format!(
            "Invalid network address: {} (expected e.g. 192.168.1.1)",
            input
        ))
    };

    let captures = NETWORK_ADDRESS_RE.captures(input).ok_or_else(invalid)?;

    let mut octets = Vec::with_capacity(4);
    for index in 1..=4 {
        let octet: u8 = captures[index].parse().map_err(|_| invalid())?;
        octets.push(octet.to_string());
    }

    Ok(octets.join("."))
}
