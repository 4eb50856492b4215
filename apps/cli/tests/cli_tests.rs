//! CLI 端到端测试
//!
//! 使用临时配置文件隔离用户配置，使用假 sysfs 目录代替真实 GPIO。

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// 构造已导出 gpio4 的假 sysfs 目录，并写入指向它的配置文件
fn fake_setup(retries: u32) -> TempDir {
    let dir = TempDir::new().unwrap();
    let sysfs = dir.path().join("gpio");
    fs::create_dir_all(sysfs.join("gpio4")).unwrap();
    fs::write(sysfs.join("export"), "").unwrap();
    fs::write(sysfs.join("gpio4/direction"), "in").unwrap();
    fs::write(sysfs.join("gpio4/value"), "0").unwrap();
    fs::write(
        dir.path().join("config.toml"),
        format!(
            "[transmitter]\nretries = {}\ngap_ms = 1\n\n[gpio]\nsysfs_root = {:?}\n",
            retries,
            sysfs.to_str().unwrap()
        ),
    )
    .unwrap();
    dir
}

fn config_arg(dir: &TempDir) -> String {
    dir.path().join("config.toml").to_str().unwrap().to_string()
}

fn wccontrol() -> Command {
    Command::cargo_bin("wccontrol").unwrap()
}

#[test]
fn test_help() {
    wccontrol()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("group"))
        .stdout(predicate::str::contains("--retries"));
}

#[test]
fn test_dry_run_prints_frames() {
    let dir = fake_setup(1);
    wccontrol()
        .args(["-c", &config_arg(&dir), "--dry-run", "1,2", "3", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Frame for group 1 + address 3 value 1: 0011010011000000000100111",
        ))
        .stdout(predicate::str::contains(
            "Frame for group 2 + address 3 value 1: 0011010011000000001000111",
        ));
}

#[test]
fn test_value_out_of_range() {
    wccontrol().args(["1", "3", "2"]).assert().failure();
}

#[test]
fn test_malformed_group_list() {
    let dir = fake_setup(1);
    wccontrol()
        .args(["-c", &config_arg(&dir), "--dry-run", "1,x", "3", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid group"));
}

#[test]
fn test_group_out_of_range() {
    let dir = fake_setup(1);
    wccontrol()
        .args(["-c", &config_arg(&dir), "--dry-run", "1024", "3", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_transmit_on_fake_sysfs() {
    let dir = fake_setup(2);
    wccontrol()
        .args(["-c", &config_arg(&dir), "5", "2,6", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Set Watts Clever switch group 5 + address 2 to 1",
        ))
        .stdout(predicate::str::contains(
            "Set Watts Clever switch group 5 + address 6 to 1",
        ));

    let gpio4 = dir.path().join("gpio/gpio4");
    assert_eq!(fs::read_to_string(gpio4.join("direction")).unwrap(), "out");
    // 每个位以低电平结束
    assert_eq!(fs::read_to_string(gpio4.join("value")).unwrap(), "0");
}

#[cfg(target_os = "linux")]
#[test]
fn test_missing_gpio_fails() {
    let dir = TempDir::new().unwrap();
    let missing = Path::new(dir.path()).join("no-such-gpio");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!("[gpio]\nsysfs_root = {:?}\n", missing.to_str().unwrap()),
    )
    .unwrap();

    wccontrol()
        .args(["-c", config.to_str().unwrap(), "1", "3", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to set up GPIO pin 4"))
        .stderr(predicate::str::contains("sysfs GPIO interface"));
}
