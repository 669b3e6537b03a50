//! 配置管理
//!
//! 依次合并默认值、可选的配置文件和 `HOSPITAL_` 前缀的环境变量，
//! 加载后经过规则校验。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use hospital_records::IdStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::auth::is_valid_email;

/// 仪表盘完整配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// 登录配置
    pub auth: AuthConfig,
    /// 时钟配置
    pub clock: ClockConfig,
    /// 记录配置
    pub records: RecordsConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 登录配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 唯一的登录邮箱
    pub email: String,
    /// 登录密码
    pub password: String,
    /// 登录状态文件，未设置时只保存在内存中
    pub session_file: Option<String>,
}

/// 时钟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// 刷新间隔（毫秒）
    pub tick_millis: u64,
}

impl ClockConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

/// 记录配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// 新记录ID分配策略
    pub id_strategy: IdStrategy,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或 `EnvFilter` 过滤表达式
    pub level: String,
    /// 日志格式：`full` 或 `compact`
    pub format: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "demo@hospital.com".to_string(),
            password: "demo123".to_string(),
            session_file: None,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_millis: 1000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: DashboardConfig,
    /// 配置文件路径
    config_path: Option<String>,
    /// 配置验证器
    validator: ConfigValidator,
}

impl ConfigManager {
    /// 加载并校验配置；`config_path` 为空时只使用默认值和环境变量
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config,
            config_path: config_path.map(str::to_string),
            validator,
        })
    }

    /// 使用默认配置
    pub fn with_defaults() -> Self {
        Self {
            config: DashboardConfig::default(),
            config_path: None,
            validator: ConfigValidator::new(),
        }
    }

    fn load_config(config_path: Option<&str>) -> Result<DashboardConfig> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("HOSPITAL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: DashboardConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded successfully from: {}", path),
            None => debug!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    /// 获取配置
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// 替换配置，校验失败时保持原配置
    pub fn update_config(&mut self, new_config: DashboardConfig) -> Result<()> {
        self.validator.validate(&new_config)?;
        self.config = new_config;
        info!("Configuration updated successfully");
        Ok(())
    }

    /// 以 TOML 格式写入文件
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_str =
            toml::to_string_pretty(&self.config).context("Failed to serialize configuration")?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: &'static str,
    /// 验证函数
    validator: fn(&DashboardConfig) -> Result<()>,
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "clock.tick_millis",
                validator: |config| {
                    if config.clock.tick_millis == 0 {
                        Err(anyhow::anyhow!("Clock tick cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "auth.email",
                validator: |config| {
                    if is_valid_email(&config.auth.email) {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("'{}' is not an email address", config.auth.email))
                    }
                },
            },
            ValidationRule {
                field_path: "auth.password",
                validator: |config| {
                    if config.auth.password.chars().count() < 6 {
                        Err(anyhow::anyhow!("Password must be at least 6 characters"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "logging.format",
                validator: |config| match config.logging.format.as_str() {
                    "full" | "compact" => Ok(()),
                    other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
                },
            },
        ];

        Self { validation_rules }
    }

    /// 依次执行规则，遇到第一条失败即返回
    pub fn validate(&self, config: &DashboardConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(e.context(format!("Invalid {}", rule.field_path)));
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(ConfigValidator::new().validate(&config).is_ok());
        assert_eq!(config.auth.email, "demo@hospital.com");
        assert_eq!(config.records.id_strategy, IdStrategy::Sequential);
        assert_eq!(config.clock.tick(), Duration::from_secs(1));
    }

    #[test]
    fn test_validator_rejects_bad_values() {
        let validator = ConfigValidator::new();

        let mut config = DashboardConfig::default();
        config.clock.tick_millis = 0;
        assert!(validator.validate(&config).is_err());

        let mut config = DashboardConfig::default();
        config.auth.password = "12345".to_string();
        assert!(validator.validate(&config).is_err());

        let mut config = DashboardConfig::default();
        config.auth.email = "not-an-email".to_string();
        assert!(validator.validate(&config).is_err());

        let mut config = DashboardConfig::default();
        config.logging.format = "json".to_string();
        assert!(validator.validate(&config).is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[records]\nid_strategy = \"monotonic\"\n\n[clock]\ntick_millis = 250").unwrap();

        let manager = ConfigManager::load(file.path().to_str()).unwrap();
        let config = manager.config();
        assert_eq!(config.records.id_strategy, IdStrategy::Monotonic);
        assert_eq!(config.clock.tick_millis, 250);
        assert_eq!(config.auth, AuthConfig::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[auth]\npassword = \"abc\"").unwrap();
        assert!(ConfigManager::load(file.path().to_str()).is_err());
    }

    #[test]
    fn test_update_keeps_old_config_on_failure() {
        let mut manager = ConfigManager::with_defaults();
        let mut bad = DashboardConfig::default();
        bad.clock.tick_millis = 0;

        assert!(manager.update_config(bad).is_err());
        assert_eq!(manager.config().clock.tick_millis, 1000);
    }

    #[tokio::test]
    async fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");

        let mut manager = ConfigManager::with_defaults();
        let mut config = DashboardConfig::default();
        config.records.id_strategy = IdStrategy::Monotonic;
        config.auth.session_file = Some("session.json".to_string());
        manager.update_config(config.clone()).unwrap();
        manager.save(&path).await.unwrap();

        let loaded = ConfigManager::load(path.to_str()).unwrap();
        assert_eq!(loaded.config(), &config);
    }
}
