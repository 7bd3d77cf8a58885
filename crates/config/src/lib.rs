//! arbiter-config - 配置加载库

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 环境变量前缀，嵌套字段用 `__` 分隔 (e.g. `ARBITER_ACCESS__STRATEGY`)
pub const ENV_PREFIX: &str = "ARBITER_";

/// 访问决策配置
#[derive(Debug, Clone, Deserialize)]
pub struct AccessDecisionConfig {
    /// 聚合策略名称: affirmative / consensus / unanimous / priority
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// 所有投票者都弃权时是否放行
    #[serde(default)]
    pub allow_if_all_abstain: bool,
    /// consensus 策略下赞成票与反对票相等时是否放行
    #[serde(default = "default_true")]
    pub allow_if_equal_granted_denied: bool,
}

fn default_strategy() -> String {
    "affirmative".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for AccessDecisionConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            allow_if_all_abstain: false,
            allow_if_equal_granted_denied: true,
        }
    }
}

/// 授权检查器配置
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerConfig {
    /// 没有 token 时是否直接报错 (否则使用 NullToken 继续决策)
    #[serde(default = "default_true")]
    pub require_token: bool,
    /// 是否每次检查前都强制重新认证
    #[serde(default)]
    pub always_authenticate: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            require_token: true,
            always_authenticate: false,
        }
    }
}

/// 角色投票者配置
#[derive(Debug, Clone, Deserialize)]
pub struct RoleVoterConfig {
    #[serde(default = "default_role_prefix")]
    pub prefix: String,
}

fn default_role_prefix() -> String {
    "ROLE_".to_string()
}

impl Default for RoleVoterConfig {
    fn default() -> Self {
        Self {
            prefix: default_role_prefix(),
        }
    }
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_issuer")]
    pub audience: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_issuer() -> String {
    "arbiter".to_string()
}

fn default_expires_in() -> u64 {
    3600
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志 (生产环境)
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub access: AccessDecisionConfig,
    #[serde(default)]
    pub checker: CheckerConfig,
    #[serde(default)]
    pub role_voter: RoleVoterConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub jwt: Option<JwtConfig>,
}

fn default_app_name() -> String {
    "arbiter".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序 (后者覆盖前者): `default.toml` → `{APP_ENV}.toml` → `ARBITER_*` 环境变量
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = config_dir.as_ref();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Figment::new()
            .merge(Toml::file(dir.join("default.toml")))
            .merge(Toml::file(dir.join(format!("{}.toml", env))))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
