//! Token 存储

use std::sync::{Arc, PoisonError, RwLock};

use crate::token::Token;

/// 当前请求上下文的 token 存取接口
pub trait TokenStorage: Send + Sync {
    fn token(&self) -> Option<Arc<dyn Token>>;

    fn set_token(&self, token: Option<Arc<dyn Token>>);
}

/// 内存 token 存储
#[derive(Debug, Default)]
pub struct InMemoryTokenStorage {
    token: RwLock<Option<Arc<dyn Token>>>,
}

impl InMemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: Arc<dyn Token>) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

impl TokenStorage for InMemoryTokenStorage {
    fn token(&self) -> Option<Arc<dyn Token>> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_token(&self, token: Option<Arc<dyn Token>>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}
