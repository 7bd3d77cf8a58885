//! 授权检查入口

use std::sync::Arc;

use arbiter_auth_core::{AuthenticationManager, NullToken, Token, TokenStorage};
use arbiter_config::CheckerConfig;
use arbiter_errors::{AppError, AppResult};
use tracing::debug;

use crate::attribute::{Attribute, Subject};
use crate::decision::AccessDecision;
use crate::manager::AccessDecisionManager;

/// 授权检查器
///
/// 步骤:
/// 1. 从 TokenStorage 读取当前 token
/// 2. 没有 token 时: 要求 token 则报 `NoCredentials`，否则使用 NullToken
/// 3. 配置了认证管理器且 token 未认证 (或强制重新认证) 时重新认证，并写回存储
/// 4. 委托给 AccessDecisionManager
pub struct AuthorizationChecker {
    token_storage: Arc<dyn TokenStorage>,
    access_decision_manager: Arc<dyn AccessDecisionManager>,
    authentication_manager: Option<Arc<dyn AuthenticationManager>>,
    require_token: bool,
    always_authenticate: bool,
}

impl AuthorizationChecker {
    pub fn new(
        token_storage: Arc<dyn TokenStorage>,
        access_decision_manager: Arc<dyn AccessDecisionManager>,
    ) -> Self {
        let defaults = CheckerConfig::default();
        Self {
            token_storage,
            access_decision_manager,
            authentication_manager: None,
            require_token: defaults.require_token,
            always_authenticate: defaults.always_authenticate,
        }
    }

    pub fn with_authentication_manager(
        mut self,
        authentication_manager: Arc<dyn AuthenticationManager>,
    ) -> Self {
        self.authentication_manager = Some(authentication_manager);
        self
    }

    pub fn with_config(mut self, config: &CheckerConfig) -> Self {
        self.require_token = config.require_token;
        self.always_authenticate = config.always_authenticate;
        self
    }

    pub fn require_token(mut self, require: bool) -> Self {
        self.require_token = require;
        self
    }

    pub fn always_authenticate(mut self, always: bool) -> Self {
        self.always_authenticate = always;
        self
    }

    /// 检查单个属性是否被授权
    pub fn is_granted(
        &self,
        attribute: impl Into<Attribute>,
        subject: Option<&dyn Subject>,
    ) -> AppResult<bool> {
        Ok(self.get_decision(attribute, subject)?.is_granted())
    }

    /// 单个属性的完整决策 (含投票轨迹)
    pub fn get_decision(
        &self,
        attribute: impl Into<Attribute>,
        subject: Option<&dyn Subject>,
    ) -> AppResult<AccessDecision> {
        self.decide(&[attribute.into()], subject)
    }

    /// 多个属性一起交给投票者判断
    pub fn is_granted_all(
        &self,
        attributes: &[Attribute],
        subject: Option<&dyn Subject>,
    ) -> AppResult<bool> {
        Ok(self.decide(attributes, subject)?.is_granted())
    }

    fn decide(
        &self,
        attributes: &[Attribute],
        subject: Option<&dyn Subject>,
    ) -> AppResult<AccessDecision> {
        let token = self.resolve_token()?;
        Ok(self
            .access_decision_manager
            .get_decision(token.as_ref(), attributes, subject))
    }

    fn resolve_token(&self) -> AppResult<Arc<dyn Token>> {
        let Some(token) = self.token_storage.token() else {
            if self.require_token {
                return Err(AppError::no_credentials(
                    "The token storage contains no authentication token; \
                     the check probably runs outside an authenticated request context",
                ));
            }
            debug!("No token in storage, deciding with a null token");
            return Ok(Arc::new(NullToken));
        };

        let Some(authentication_manager) = &self.authentication_manager else {
            return Ok(token);
        };

        if !self.always_authenticate && token.is_authenticated() {
            return Ok(token);
        }

        let token = authentication_manager.authenticate(token)?;
        debug!(
            user = token.user_identifier().unwrap_or("anonymous"),
            "Token re-authenticated before access check"
        );
        self.token_storage.set_token(Some(token.clone()));
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::VotingAccessDecisionManager;
    use crate::strategy::Strategy;
    use crate::voter::{AuthenticatedVoter, RoleVoter};
    use arbiter_auth_core::{InMemoryTokenStorage, PreAuthenticatedToken};
    use mockall::mock;

    mock! {
        Authenticator {}

        impl AuthenticationManager for Authenticator {
            fn authenticate(&self, token: Arc<dyn Token>) -> AppResult<Arc<dyn Token>>;
        }
    }

    /// 未认证的 token，角色信息要等重新认证后才可信
    #[derive(Debug)]
    struct StaleToken;

    impl Token for StaleToken {
        fn is_authenticated(&self) -> bool {
            false
        }

        fn role_names(&self) -> &[String] {
            &[]
        }
    }

    fn manager(strategy: Strategy, allow_if_all_abstain: bool) -> Arc<dyn AccessDecisionManager> {
        Arc::new(
            VotingAccessDecisionManager::builder()
                .strategy(strategy)
                .allow_if_all_abstain(allow_if_all_abstain)
                .voter(RoleVoter::default())
                .voter(AuthenticatedVoter)
                .build()
                .unwrap(),
        )
    }

    fn admin() -> Arc<dyn Token> {
        Arc::new(PreAuthenticatedToken::new("alice", vec!["ROLE_ADMIN".to_string()]))
    }

    #[test]
    fn test_missing_token_is_an_error_when_required() {
        let checker = AuthorizationChecker::new(
            Arc::new(InMemoryTokenStorage::new()),
            manager(Strategy::Affirmative, true),
        );

        let err = checker.is_granted("ROLE_ADMIN", None).unwrap_err();
        assert!(matches!(err, AppError::NoCredentials(_)));
    }

    #[test]
    fn test_missing_token_falls_back_to_null_token() {
        let checker = AuthorizationChecker::new(
            Arc::new(InMemoryTokenStorage::new()),
            manager(Strategy::Affirmative, true),
        )
        .require_token(false);

        assert!(!checker.is_granted("ROLE_ADMIN", None).unwrap());
        assert!(!checker.is_granted("IS_AUTHENTICATED", None).unwrap());
        assert!(checker.is_granted("PUBLIC_ACCESS", None).unwrap());
        // 所有投票者弃权时按 allow_if_all_abstain 处理
        assert!(checker.is_granted("SOMETHING_ELSE", None).unwrap());
    }

    #[test]
    fn test_decision_for_stored_token() {
        let checker = AuthorizationChecker::new(
            Arc::new(InMemoryTokenStorage::with_token(admin())),
            manager(Strategy::Unanimous, false),
        );

        let decision = checker.get_decision("ROLE_ADMIN", None).unwrap();
        assert!(decision.is_granted());
        assert_eq!(decision.votes().len(), 2);
        assert!(!checker.is_granted("ROLE_USER", None).unwrap());
        assert!(
            checker
                .is_granted_all(&["ROLE_ADMIN".into(), "IS_AUTHENTICATED".into()], None)
                .unwrap()
        );
    }

    #[test]
    fn test_unauthenticated_token_is_refreshed_and_stored() {
        let storage = Arc::new(InMemoryTokenStorage::with_token(Arc::new(StaleToken)));
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .times(1)
            .returning(|_| Ok(admin()));

        let checker = AuthorizationChecker::new(storage.clone(), manager(Strategy::Affirmative, false))
            .with_authentication_manager(Arc::new(authenticator));

        assert!(checker.is_granted("ROLE_ADMIN", None).unwrap());
        let stored = storage.token().unwrap();
        assert_eq!(stored.user_identifier(), Some("alice"));

        // 存储中已是认证过的 token，不再调用认证管理器 (times(1) 会校验)
        assert!(checker.is_granted("ROLE_ADMIN", None).unwrap());
    }

    #[test]
    fn test_authenticated_token_skips_authentication_unless_forced() {
        let mut authenticator = MockAuthenticator::new();
        authenticator.expect_authenticate().never();

        let checker = AuthorizationChecker::new(
            Arc::new(InMemoryTokenStorage::with_token(admin())),
            manager(Strategy::Affirmative, false),
        )
        .with_authentication_manager(Arc::new(authenticator));

        assert!(checker.is_granted("ROLE_ADMIN", None).unwrap());

        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .times(2)
            .returning(|token| Ok(token));

        let checker = AuthorizationChecker::new(
            Arc::new(InMemoryTokenStorage::with_token(admin())),
            manager(Strategy::Affirmative, false),
        )
        .with_authentication_manager(Arc::new(authenticator))
        .with_config(&CheckerConfig {
            require_token: true,
            always_authenticate: true,
        });

        assert!(checker.is_granted("ROLE_ADMIN", None).unwrap());
        assert!(checker.is_granted("IS_AUTHENTICATED", None).unwrap());
    }

    #[test]
    fn test_authentication_errors_propagate() {
        let storage = Arc::new(InMemoryTokenStorage::with_token(Arc::new(StaleToken)));
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .returning(|_| Err(AppError::authentication("expired")));

        let checker = AuthorizationChecker::new(storage.clone(), manager(Strategy::Affirmative, true))
            .with_authentication_manager(Arc::new(authenticator));

        let err = checker.get_decision("ROLE_ADMIN", None).unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
        // 认证失败时不改写存储
        assert!(!storage.token().unwrap().is_authenticated());
    }

    #[test]
    fn test_null_token_is_never_reauthenticated() {
        let mut authenticator = MockAuthenticator::new();
        authenticator.expect_authenticate().never();

        let checker = AuthorizationChecker::new(
            Arc::new(InMemoryTokenStorage::new()),
            manager(Strategy::Affirmative, false),
        )
        .require_token(false)
        .always_authenticate(true)
        .with_authentication_manager(Arc::new(authenticator));

        assert!(!checker.is_granted("ROLE_USER", None).unwrap());
    }
}
