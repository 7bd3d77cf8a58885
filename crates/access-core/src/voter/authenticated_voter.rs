//! 认证状态投票者

use arbiter_auth_core::Token;

use super::Voter;
use crate::attribute::{Attribute, Subject};
use crate::vote::Vote;

/// 要求 token 已认证
pub const IS_AUTHENTICATED: &str = "IS_AUTHENTICATED";
/// 任何人都可访问，包括匿名 (NullToken)
pub const PUBLIC_ACCESS: &str = "PUBLIC_ACCESS";

/// 处理 `IS_AUTHENTICATED` / `PUBLIC_ACCESS` 两个属性，其余属性弃权
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedVoter;

impl Voter for AuthenticatedVoter {
    fn vote(
        &self,
        token: &dyn Token,
        _subject: Option<&dyn Subject>,
        attributes: &[Attribute],
    ) -> Vote {
        let mut result = Vote::abstain();

        for name in attributes.iter().filter_map(Attribute::as_name) {
            match name {
                PUBLIC_ACCESS => return Vote::granted().with_reason("Public access"),
                IS_AUTHENTICATED if token.is_authenticated() => {
                    return Vote::granted().with_reason("The token is authenticated");
                }
                IS_AUTHENTICATED => {
                    result = Vote::denied().with_reason("The token is not authenticated");
                }
                _ => {}
            }
        }

        result
    }

    fn name(&self) -> &str {
        "AuthenticatedVoter"
    }
}
