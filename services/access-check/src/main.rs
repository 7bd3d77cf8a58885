//! access-check - 命令行授权检查
//!
//! 按配置构建决策引擎，对命令行给出的属性做一次授权检查，并以 JSON 输出决策日志。
//!
//! 主体来源 (环境变量):
//! - `ACCESS_CHECK_BEARER`: JWT，需要配置 `[jwt]` 段才会被验证
//! - `ACCESS_CHECK_USER` / `ACCESS_CHECK_ROLES`: 已由上游认证的用户及逗号分隔的角色
//!
//! 退出码: 0 = 授权, 1 = 拒绝

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::bail;
use arbiter_access_core::{
    Attribute, AuthenticatedVoter, AuthorizationChecker, RoleVoter, VotingAccessDecisionManager,
};
use arbiter_auth_core::{
    InMemoryTokenStorage, JwtAuthenticationManager, JwtToken, PreAuthenticatedToken, Token,
    TokenService, TokenStorage,
};
use arbiter_config::AppConfig;
use tracing::info;

fn token_from_env() -> Option<Arc<dyn Token>> {
    if let Ok(bearer) = env::var("ACCESS_CHECK_BEARER") {
        return Some(Arc::new(JwtToken::unauthenticated(bearer)));
    }

    let user = env::var("ACCESS_CHECK_USER").ok()?;
    let roles = env::var("ACCESS_CHECK_ROLES")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(String::from)
        .collect();
    Some(Arc::new(PreAuthenticatedToken::new(user, roles)))
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let config_dir = env::var("ACCESS_CHECK_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir)?;
    arbiter_telemetry::init_from_config(&config.telemetry)?;
    let metrics = arbiter_telemetry::init_metrics()?;

    let attributes: Vec<Attribute> = env::args().skip(1).map(Attribute::from).collect();
    if attributes.is_empty() {
        bail!("usage: access-check ATTRIBUTE [ATTRIBUTE...]");
    }

    let manager = Arc::new(
        VotingAccessDecisionManager::builder()
            .config(&config.access)
            .voter(RoleVoter::from_config(&config.role_voter))
            .voter(AuthenticatedVoter)
            .build_traceable()?,
    );
    info!(
        app = %config.app_name,
        strategy = manager.strategy_name(),
        voters = manager.voters().len(),
        "Access decision manager ready"
    );

    let storage = Arc::new(InMemoryTokenStorage::new());
    storage.set_token(token_from_env());

    let mut checker =
        AuthorizationChecker::new(storage, manager.clone()).with_config(&config.checker);
    if let Some(jwt) = &config.jwt {
        let service = TokenService::from_config(jwt);
        checker = checker.with_authentication_manager(Arc::new(JwtAuthenticationManager::new(service)));
    }

    let granted = checker.is_granted_all(&attributes, None)?;
    info!(granted, "Access check finished");

    println!("{}", serde_json::to_string_pretty(&manager.decision_log())?);
    if env::var_os("ACCESS_CHECK_METRICS").is_some() {
        println!("{}", metrics.render());
    }

    Ok(if granted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
