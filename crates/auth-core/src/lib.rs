//! arbiter-auth-core - 认证核心库
//!
//! 授权引擎依赖的认证协作方契约 (Token / TokenStorage / AuthenticationManager)
//! 以及基于 JWT 的默认实现

pub mod authentication;
pub mod jwt;
pub mod storage;
pub mod token;

pub use authentication::AuthenticationManager;
pub use jwt::{Claims, JwtAuthenticationManager, JwtToken, TokenService};
pub use storage::{InMemoryTokenStorage, TokenStorage};
pub use token::{NullToken, PreAuthenticatedToken, Token};
