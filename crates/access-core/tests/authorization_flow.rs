//! 端到端授权流程: 配置 → JWT 重新认证 → 投票决策 → 审计日志

use std::sync::Arc;

use arbiter_access_core::{
    AccessDecisionManager, Attribute, AuthenticatedVoter, AuthorizationChecker, RoleVoter,
    Strategy, Subject, TraceableAccessDecisionManager, Vote, Voter, VotingAccessDecisionManager,
};
use arbiter_auth_core::{
    InMemoryTokenStorage, JwtAuthenticationManager, JwtToken, Token, TokenService, TokenStorage,
};
use arbiter_config::{AccessDecisionConfig, CheckerConfig, RoleVoterConfig};
use arbiter_errors::AppError;

#[derive(Debug)]
struct Article {
    author: String,
}

/// 作者本人才可编辑文章
struct ArticleAuthorVoter;

impl Voter for ArticleAuthorVoter {
    fn vote(
        &self,
        token: &dyn Token,
        subject: Option<&dyn Subject>,
        attributes: &[Attribute],
    ) -> Vote {
        let Some(article) = subject.and_then(|s| s.as_any().downcast_ref::<Article>()) else {
            return Vote::abstain();
        };
        if !attributes.iter().any(|a| a.as_name() == Some("ARTICLE_EDIT")) {
            return Vote::abstain();
        }

        if token.user_identifier() == Some(article.author.as_str()) {
            Vote::granted().with_reason("Author edits own article")
        } else {
            Vote::denied().with_reason("Only the author may edit")
        }
    }

    fn name(&self) -> &str {
        "ArticleAuthorVoter"
    }
}

fn token_service() -> TokenService {
    TokenService::new(
        "integration-secret",
        600,
        "arbiter".to_string(),
        "arbiter".to_string(),
    )
}

fn traceable_manager(strategy: &str) -> Arc<TraceableAccessDecisionManager> {
    let config = AccessDecisionConfig {
        strategy: strategy.to_string(),
        allow_if_all_abstain: false,
        allow_if_equal_granted_denied: false,
    };
    let manager = VotingAccessDecisionManager::builder()
        .config(&config)
        .voter(ArticleAuthorVoter)
        .voter(RoleVoter::from_config(&RoleVoterConfig::default()))
        .voter(AuthenticatedVoter)
        .build_traceable()
        .expect("valid strategy");
    Arc::new(manager)
}

#[test]
fn jwt_token_is_reauthenticated_and_decision_is_traced() {
    let service = token_service();
    let raw = service
        .generate_access_token("alice", vec!["ROLE_EDITOR".to_string()])
        .unwrap();

    let storage = Arc::new(InMemoryTokenStorage::with_token(Arc::new(
        JwtToken::unauthenticated(raw),
    )));
    let manager = traceable_manager("priority");
    let checker = AuthorizationChecker::new(storage.clone(), manager.clone())
        .with_config(&CheckerConfig::default())
        .with_authentication_manager(Arc::new(JwtAuthenticationManager::new(service)));

    let own = Article {
        author: "alice".to_string(),
    };
    let foreign = Article {
        author: "bob".to_string(),
    };

    assert!(checker.is_granted("ARTICLE_EDIT", Some(&own as &dyn Subject)).unwrap());
    assert!(!checker.is_granted("ARTICLE_EDIT", Some(&foreign as &dyn Subject)).unwrap());
    assert!(checker.is_granted("ROLE_EDITOR", None).unwrap());
    assert!(!checker.is_granted("ROLE_ADMIN", None).unwrap());

    // 重新认证后的 token 已写回存储
    let stored = storage.token().unwrap();
    assert!(stored.is_authenticated());
    assert_eq!(stored.user_identifier(), Some("alice"));

    let log = manager.decision_log();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].subject.as_deref(), Some("Article { author: \"alice\" }"));
    // priority: 第一个投票者即给出结论
    assert_eq!(log[0].voter_details.len(), 1);
    assert_eq!(log[0].voter_details[0].voter, "ArticleAuthorVoter");
    assert_eq!(log[1].voter_details[0].vote.reason(), Some("Only the author may edit"));
    assert_eq!(log[2].voter_details.len(), 2);
    assert!(!log[3].result.is_granted());
    assert_eq!(manager.strategy_name(), "priority");
    assert_eq!(manager.voters().len(), 3);
}

#[test]
fn invalid_jwt_surfaces_authentication_error() {
    let storage = Arc::new(InMemoryTokenStorage::with_token(Arc::new(
        JwtToken::unauthenticated("not-a-jwt"),
    )));
    let checker = AuthorizationChecker::new(storage, traceable_manager("affirmative"))
        .with_authentication_manager(Arc::new(JwtAuthenticationManager::new(token_service())));

    let err = checker.is_granted("ROLE_EDITOR", None).unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}

#[test]
fn unknown_strategy_is_rejected_before_any_decision() {
    let config = AccessDecisionConfig {
        strategy: "majority".to_string(),
        ..Default::default()
    };
    let result = VotingAccessDecisionManager::from_config(&config, vec![Arc::new(AuthenticatedVoter)]);

    let Err(err) = result else {
        panic!("unknown strategy must fail at construction");
    };
    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn consensus_across_all_voters() {
    let manager = VotingAccessDecisionManager::builder()
        .strategy(Strategy::Consensus)
        .allow_if_equal_granted_denied(false)
        .voter(RoleVoter::default())
        .voter(AuthenticatedVoter)
        .build()
        .unwrap();
    let token = arbiter_auth_core::PreAuthenticatedToken::new("carol", vec![]);

    // RoleVoter 反对、AuthenticatedVoter 同意: 平票，按配置拒绝
    let decision = manager.get_decision(
        &token,
        &["ROLE_ADMIN".into(), "IS_AUTHENTICATED".into()],
        None,
    );
    assert!(!decision.is_granted());
    assert_eq!(decision.votes().len(), 2);
    assert_eq!(decision.reasons().count(), 2);
}
