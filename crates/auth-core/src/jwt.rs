//! JWT token 与认证管理器

use std::fmt;
use std::sync::Arc;

use arbiter_config::JwtConfig;
use arbiter_errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::authentication::AuthenticationManager;
use crate::token::Token;

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
    /// Token type
    #[serde(default)]
    pub token_type: String,
    /// Roles
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    pub fn new(
        subject: &str,
        roles: Vec<String>,
        expires_in_secs: i64,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            token_type: "access".to_string(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 验证 token 类型
    pub fn is_access_token(&self) -> bool {
        self.token_type == "access"
    }
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(secret: &str, expires_in: i64, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            issuer,
            audience,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret.expose_secret(),
            i64::try_from(config.expires_in).unwrap_or(i64::MAX),
            config.issuer.clone(),
            config.audience.clone(),
        )
    }

    /// 生成访问令牌
    pub fn generate_access_token(&self, subject: &str, roles: Vec<String>) -> AppResult<String> {
        let claims = Claims::new(subject, roles, self.expires_in, &self.issuer, &self.audience);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))
    }

    /// 验证令牌
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 0; // 不允许时间偏差

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::authentication(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        if claims.jti.is_empty() {
            return Err(AppError::authentication("Token ID (jti) missing"));
        }

        if !claims.is_access_token() {
            return Err(AppError::authentication("Not an access token"));
        }

        Ok(claims)
    }

    /// 获取访问令牌过期时间（秒）
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }
}

/// Bearer JWT token
///
/// 未认证时只持有原始字符串；经 [`JwtAuthenticationManager`] 验证后携带 claims
#[derive(Clone)]
pub struct JwtToken {
    raw: String,
    claims: Option<Claims>,
}

impl JwtToken {
    /// 从请求头等处取得、尚未验证的 token
    pub fn unauthenticated(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            claims: None,
        }
    }

    pub fn authenticated(raw: impl Into<String>, claims: Claims) -> Self {
        Self {
            raw: raw.into(),
            claims: Some(claims),
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }
}

impl fmt::Debug for JwtToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtToken")
            .field("raw", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

impl Token for JwtToken {
    fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    fn role_names(&self) -> &[String] {
        self.claims.as_ref().map(|c| c.roles.as_slice()).unwrap_or(&[])
    }

    fn user_identifier(&self) -> Option<&str> {
        self.claims.as_ref().map(|c| c.sub.as_str())
    }

    fn credentials(&self) -> Option<&str> {
        Some(&self.raw)
    }
}

/// 基于 JWT 验证的认证管理器
#[derive(Clone)]
pub struct JwtAuthenticationManager {
    token_service: TokenService,
}

impl JwtAuthenticationManager {
    pub fn new(token_service: TokenService) -> Self {
        Self { token_service }
    }
}

impl AuthenticationManager for JwtAuthenticationManager {
    fn authenticate(&self, token: Arc<dyn Token>) -> AppResult<Arc<dyn Token>> {
        let raw = token
            .credentials()
            .ok_or_else(|| AppError::authentication("Token carries no credentials"))?;

        let claims = self.token_service.validate_token(raw)?;
        debug!(subject = %claims.sub, roles = ?claims.roles, "Token re-authenticated");

        Ok(Arc::new(JwtToken::authenticated(raw, claims)))
    }
}
