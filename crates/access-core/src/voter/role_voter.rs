//! 角色前缀投票者

use arbiter_auth_core::Token;
use arbiter_config::RoleVoterConfig;

use super::Voter;
use crate::attribute::{Attribute, Subject};
use crate::vote::Vote;

/// 按前缀匹配角色的投票者
///
/// - 没有任何属性带前缀: 弃权
/// - 任一带前缀的属性在 token 角色中: 立即同意
/// - 带前缀的属性都不在 token 角色中: 反对
#[derive(Debug, Clone)]
pub struct RoleVoter {
    prefix: String,
}

impl RoleVoter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &RoleVoterConfig) -> Self {
        Self::new(config.prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for RoleVoter {
    fn default() -> Self {
        Self::new("ROLE_")
    }
}

impl Voter for RoleVoter {
    fn vote(
        &self,
        token: &dyn Token,
        _subject: Option<&dyn Subject>,
        attributes: &[Attribute],
    ) -> Vote {
        let mut result = Vote::abstain();

        for name in attributes.iter().filter_map(Attribute::as_name) {
            if !name.starts_with(&self.prefix) {
                continue;
            }

            if token.has_role(name) {
                return Vote::granted().with_reason(format!("The token has role \"{}\"", name));
            }

            result = Vote::denied().with_reason("The token has none of the required roles");
        }

        result
    }

    fn name(&self) -> &str {
        "RoleVoter"
    }
}
