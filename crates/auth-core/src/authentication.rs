//! 重新认证协作方

use std::sync::Arc;

use arbiter_errors::AppResult;

use crate::token::Token;

/// 认证管理器
///
/// 接收一个 (可能已过期或未认证的) token，返回认证后的新 token。
/// 失败时返回 `AppError::Authentication`，调用方不得吞掉该错误
pub trait AuthenticationManager: Send + Sync {
    fn authenticate(&self, token: Arc<dyn Token>) -> AppResult<Arc<dyn Token>>;
}
