//! 认证主体 (Token) 抽象

use std::fmt;

/// 已认证 (或待认证) 的主体
///
/// 决策引擎只通过该 trait 读取主体信息，从不修改 token
pub trait Token: Send + Sync + fmt::Debug {
    /// 是否已完成认证
    fn is_authenticated(&self) -> bool;

    /// 主体拥有的角色名
    fn role_names(&self) -> &[String];

    /// 用户标识 (日志用)
    fn user_identifier(&self) -> Option<&str> {
        None
    }

    /// 原始凭证，供重新认证使用
    fn credentials(&self) -> Option<&str> {
        None
    }

    fn has_role(&self, role: &str) -> bool {
        self.role_names().iter().any(|r| r == role)
    }
}

/// 空 token
///
/// 存储中没有 token 且检查器不要求 token 时替代使用：永远未认证、没有任何角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullToken;

impl Token for NullToken {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn role_names(&self) -> &[String] {
        &[]
    }
}

/// 由上游 (网关、反向代理等) 完成认证后构造的 token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreAuthenticatedToken {
    user_identifier: String,
    roles: Vec<String>,
}

impl PreAuthenticatedToken {
    pub fn new(user_identifier: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_identifier: user_identifier.into(),
            roles,
        }
    }
}

impl Token for PreAuthenticatedToken {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn role_names(&self) -> &[String] {
        &self.roles
    }

    fn user_identifier(&self) -> Option<&str> {
        Some(&self.user_identifier)
    }
}
