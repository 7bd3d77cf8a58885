//! 访问决策管理器

use std::sync::Arc;

use arbiter_auth_core::Token;
use arbiter_config::AccessDecisionConfig;
use arbiter_errors::AppResult;
use metrics::{counter, histogram};
use tracing::debug;

use crate::attribute::{Attribute, Subject};
use crate::decision::{AccessDecision, VoterVote};
use crate::strategy::{Strategy, StrategyConfig};
use crate::traceable::TraceableAccessDecisionManager;
use crate::voter::Voter;

/// 访问决策管理器接口
pub trait AccessDecisionManager: Send + Sync {
    /// 对一组属性做出决策
    fn get_decision(
        &self,
        token: &dyn Token,
        attributes: &[Attribute],
        subject: Option<&dyn Subject>,
    ) -> AccessDecision;
}

/// 基于投票的决策管理器
///
/// 投票者顺序即调用顺序 (priority 策略下也是优先级)，构造后不可变，可跨线程共享
pub struct VotingAccessDecisionManager {
    voters: Vec<Arc<dyn Voter>>,
    strategy: StrategyConfig,
}

impl VotingAccessDecisionManager {
    pub fn new(strategy: StrategyConfig, voters: Vec<Arc<dyn Voter>>) -> Self {
        Self { voters, strategy }
    }

    pub fn builder() -> AccessDecisionManagerBuilder {
        AccessDecisionManagerBuilder::default()
    }

    /// 从配置构建，策略名非法时返回 `AppError::Configuration`
    pub fn from_config(
        config: &AccessDecisionConfig,
        voters: Vec<Arc<dyn Voter>>,
    ) -> AppResult<Self> {
        Ok(Self::new(StrategyConfig::from_config(config)?, voters))
    }

    pub fn strategy(&self) -> &StrategyConfig {
        &self.strategy
    }

    pub fn voters(&self) -> &[Arc<dyn Voter>] {
        &self.voters
    }
}

impl AccessDecisionManager for VotingAccessDecisionManager {
    fn get_decision(
        &self,
        token: &dyn Token,
        attributes: &[Attribute],
        subject: Option<&dyn Subject>,
    ) -> AccessDecision {
        let mut trail = Vec::with_capacity(self.voters.len());

        let granted = self.strategy.decide(self.voters.iter().map(|voter| {
            let vote = voter.vote(token, subject, attributes);
            let result = vote.result();
            trail.push(VoterVote {
                voter: voter.name().to_string(),
                vote,
            });
            result
        }));

        debug!(
            strategy = %self.strategy.strategy,
            attributes = ?attributes,
            user = token.user_identifier().unwrap_or("anonymous"),
            granted,
            voters_invoked = trail.len(),
            "Access decision made"
        );
        counter!("access_decisions_total",
            "strategy" => self.strategy.strategy.as_str(),
            "granted" => granted.to_string()
        )
        .increment(1);
        histogram!("access_decision_voters_invoked").record(trail.len() as f64);

        AccessDecision::new(granted, trail)
    }
}

/// 决策管理器构建器
pub struct AccessDecisionManagerBuilder {
    voters: Vec<Arc<dyn Voter>>,
    strategy: Strategy,
    strategy_name: Option<String>,
    allow_if_all_abstain: bool,
    allow_if_equal_granted_denied: bool,
}

impl Default for AccessDecisionManagerBuilder {
    fn default() -> Self {
        let defaults = StrategyConfig::default();
        Self {
            voters: Vec::new(),
            strategy: defaults.strategy,
            strategy_name: None,
            allow_if_all_abstain: defaults.allow_if_all_abstain,
            allow_if_equal_granted_denied: defaults.allow_if_equal_granted_denied,
        }
    }
}

impl AccessDecisionManagerBuilder {
    /// 追加一个投票者 (按追加顺序调用)
    pub fn voter<V: Voter + 'static>(self, voter: V) -> Self {
        self.shared_voter(Arc::new(voter))
    }

    pub fn shared_voter(mut self, voter: Arc<dyn Voter>) -> Self {
        self.voters.push(voter);
        self
    }

    pub fn voters(mut self, voters: impl IntoIterator<Item = Arc<dyn Voter>>) -> Self {
        self.voters.extend(voters);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self.strategy_name = None;
        self
    }

    /// 按名称选择策略，名称在 `build` 时解析
    pub fn strategy_name(mut self, name: impl Into<String>) -> Self {
        self.strategy_name = Some(name.into());
        self
    }

    pub fn allow_if_all_abstain(mut self, allow: bool) -> Self {
        self.allow_if_all_abstain = allow;
        self
    }

    pub fn allow_if_equal_granted_denied(mut self, allow: bool) -> Self {
        self.allow_if_equal_granted_denied = allow;
        self
    }

    pub fn config(mut self, config: &AccessDecisionConfig) -> Self {
        self.strategy_name = Some(config.strategy.clone());
        self.allow_if_all_abstain = config.allow_if_all_abstain;
        self.allow_if_equal_granted_denied = config.allow_if_equal_granted_denied;
        self
    }

    fn strategy_config(&self) -> AppResult<StrategyConfig> {
        let strategy = match &self.strategy_name {
            Some(name) => name.parse()?,
            None => self.strategy,
        };

        Ok(StrategyConfig::new(strategy)
            .with_allow_if_all_abstain(self.allow_if_all_abstain)
            .with_allow_if_equal_granted_denied(self.allow_if_equal_granted_denied))
    }

    pub fn build(self) -> AppResult<VotingAccessDecisionManager> {
        let strategy = self.strategy_config()?;
        Ok(VotingAccessDecisionManager::new(strategy, self.voters))
    }

    /// 构建带决策日志的管理器
    pub fn build_traceable(self) -> AppResult<TraceableAccessDecisionManager> {
        let strategy = self.strategy_config()?;
        Ok(TraceableAccessDecisionManager::new(strategy, self.voters))
    }
}
