//! 投票者

mod authenticated_voter;
mod role_voter;

pub use authenticated_voter::{AuthenticatedVoter, IS_AUTHENTICATED, PUBLIC_ACCESS};
pub use role_voter::RoleVoter;

use arbiter_auth_core::Token;

use crate::attribute::{Attribute, Subject};
use crate::vote::Vote;

/// 投票者接口
///
/// 一次调用接收全部请求属性，并只返回一票。
/// 与自己无关的请求必须弃权而不是报错；不得修改 token 或客体
pub trait Voter: Send + Sync {
    fn vote(
        &self,
        token: &dyn Token,
        subject: Option<&dyn Subject>,
        attributes: &[Attribute],
    ) -> Vote;

    /// 决策轨迹中使用的投票者标识
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
