// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "SERIAL_PARSER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "serial-parser.json";

/// 启动配置，所有字段都有默认值
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Lines kept in the live view.
    pub window_size: usize,
    pub read_timeout_ms: u64,
    pub baud_rates: Vec<u32>,
    pub default_baud: u32,
    pub delimiter: String,
    pub export_filename: String,
    pub simulation: SimulationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            read_timeout_ms: 20,
            baud_rates: vec![
                300, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 74880, 115200, 230400, 250000,
            ],
            default_baud: 9600,
            delimiter: ",".to_owned(),
            export_filename: "data".to_owned(),
            simulation: SimulationConfig::default(),
        }
    }
}

// 模拟设备参数
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub channels: usize,
    pub period_ms: u64,
    pub glitch_rate: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { channels: 4, period_ms: 50, glitch_rate: 0.02, seed: None }
    }
}

impl SimulationConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl AppConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }

    /// 环境变量指定的路径优先，否则读取当前目录下的默认文件
    pub fn config_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e:#}; falling back to defaults");
                Self::default()
            }
        }
    }

    fn sanitized(mut self) -> Self {
        if self.baud_rates.is_empty() {
            self.baud_rates = Self::default().baud_rates;
        }
        if !self.baud_rates.contains(&self.default_baud) {
            self.baud_rates.push(self.default_baud);
            self.baud_rates.sort_unstable();
        }
        self.window_size = self.window_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.window_size, 30);
        assert_eq!(config.read_timeout(), Duration::from_millis(20));
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"window_size": 10, "default_baud": 31250, "simulation": {{"channels": 8}}}}"#).unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.window_size, 10);
        assert_eq!(config.simulation.channels, 8);
        assert_eq!(config.simulation.period_ms, 50);
        assert!(config.baud_rates.contains(&31250));
        assert_eq!(config.delimiter, ",");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "window_size = 3").unwrap();
        assert!(AppConfig::load_from(file.path()).is_err());
    }
}
