//! 投票聚合策略

use std::fmt;
use std::str::FromStr;

use arbiter_config::AccessDecisionConfig;
use arbiter_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::vote::VoteResult;

/// 聚合策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// 任一投票者同意即放行
    #[default]
    Affirmative,
    /// 少数服从多数
    Consensus,
    /// 任一投票者反对即拒绝
    Unanimous,
    /// 第一个非弃权投票者说了算
    Priority,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Affirmative => "affirmative",
            Self::Consensus => "consensus",
            Self::Unanimous => "unanimous",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "affirmative" => Ok(Self::Affirmative),
            "consensus" => Ok(Self::Consensus),
            "unanimous" => Ok(Self::Unanimous),
            "priority" => Ok(Self::Priority),
            _ => Err(AppError::configuration(format!(
                "Unknown access decision strategy \"{}\" (expected one of affirmative, consensus, unanimous, priority)",
                s
            ))),
        }
    }
}

/// 策略及其参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyConfig {
    pub strategy: Strategy,
    /// 全部弃权时的结果
    pub allow_if_all_abstain: bool,
    /// consensus 平票时的结果
    pub allow_if_equal_granted_denied: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

impl StrategyConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            allow_if_all_abstain: false,
            allow_if_equal_granted_denied: true,
        }
    }

    pub fn with_allow_if_all_abstain(mut self, allow: bool) -> Self {
        self.allow_if_all_abstain = allow;
        self
    }

    pub fn with_allow_if_equal_granted_denied(mut self, allow: bool) -> Self {
        self.allow_if_equal_granted_denied = allow;
        self
    }

    /// 从配置构建，策略名非法时立即失败
    pub fn from_config(config: &AccessDecisionConfig) -> AppResult<Self> {
        Ok(Self {
            strategy: config.strategy.parse()?,
            allow_if_all_abstain: config.allow_if_all_abstain,
            allow_if_equal_granted_denied: config.allow_if_equal_granted_denied,
        })
    }

    /// 聚合投票
    ///
    /// `votes` 是惰性序列：策略一旦确定结果就停止拉取，后续投票者不会被调用
    pub fn decide<I>(&self, votes: I) -> bool
    where
        I: IntoIterator<Item = VoteResult>,
    {
        let votes = votes.into_iter();
        match self.strategy {
            Strategy::Affirmative => affirmative(votes, self.allow_if_all_abstain),
            Strategy::Consensus => consensus(
                votes,
                self.allow_if_all_abstain,
                self.allow_if_equal_granted_denied,
            ),
            Strategy::Unanimous => unanimous(votes, self.allow_if_all_abstain),
            Strategy::Priority => priority(votes, self.allow_if_all_abstain),
        }
    }
}

fn affirmative(votes: impl Iterator<Item = VoteResult>, allow_if_all_abstain: bool) -> bool {
    let mut denied = false;
    for vote in votes {
        match vote {
            VoteResult::Granted => return true,
            VoteResult::Denied => denied = true,
            VoteResult::Abstain => {}
        }
    }

    if denied { false } else { allow_if_all_abstain }
}

fn consensus(
    votes: impl Iterator<Item = VoteResult>,
    allow_if_all_abstain: bool,
    allow_if_equal_granted_denied: bool,
) -> bool {
    let (mut granted, mut denied) = (0usize, 0usize);
    for vote in votes {
        match vote {
            VoteResult::Granted => granted += 1,
            VoteResult::Denied => denied += 1,
            VoteResult::Abstain => {}
        }
    }

    if granted > denied {
        true
    } else if denied > granted {
        false
    } else if granted > 0 {
        allow_if_equal_granted_denied
    } else {
        allow_if_all_abstain
    }
}

fn unanimous(votes: impl Iterator<Item = VoteResult>, allow_if_all_abstain: bool) -> bool {
    let mut granted = false;
    for vote in votes {
        match vote {
            VoteResult::Denied => return false,
            VoteResult::Granted => granted = true,
            VoteResult::Abstain => {}
        }
    }

    if granted { true } else { allow_if_all_abstain }
}

fn priority(mut votes: impl Iterator<Item = VoteResult>, allow_if_all_abstain: bool) -> bool {
    match votes.find(|vote| *vote != VoteResult::Abstain) {
        Some(vote) => vote == VoteResult::Granted,
        None => allow_if_all_abstain,
    }
}
