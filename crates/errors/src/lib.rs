//! arbiter-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 当前上下文没有可用的 token，且调用方要求必须存在
    #[error("No credentials: {0}")]
    NoCredentials(String),

    /// 构造期配置错误 (未知策略、非法投票值等)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 重新认证失败，原样向上传播
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn no_credentials(msg: impl Into<String>) -> Self {
        Self::NoCredentials(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoCredentials(_) => 401,
            Self::Configuration(_) => 500,
            Self::Authentication(_) => 401,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        match self {
            Self::NoCredentials(_) => "https://arbiter.dev/problems/no-credentials".to_string(),
            Self::Configuration(_) => "https://arbiter.dev/problems/configuration".to_string(),
            Self::Authentication(_) => "https://arbiter.dev/problems/authentication".to_string(),
            Self::Internal(_) => "https://arbiter.dev/problems/internal".to_string(),
        }
    }

    fn problem_title(&self) -> String {
        match self {
            Self::NoCredentials(_) => "No Credentials".to_string(),
            Self::Configuration(_) => "Configuration Error".to_string(),
            Self::Authentication(_) => "Authentication Failed".to_string(),
            Self::Internal(_) => "Internal Server Error".to_string(),
        }
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
