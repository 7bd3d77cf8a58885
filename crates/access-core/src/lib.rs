//! arbiter-access-core - 访问决策引擎
//!
//! 由多个可插拔投票者 (Voter) 投票，再按聚合策略 (Strategy) 得出最终的授权决策。
//!
//! ```text
//! AuthorizationChecker ──▶ AccessDecisionManager ──▶ Strategy(Voter, Voter, ...) ──▶ AccessDecision
//! ```

pub mod attribute;
pub mod checker;
pub mod decision;
pub mod manager;
pub mod strategy;
pub mod traceable;
pub mod vote;
pub mod voter;

pub use attribute::{Attribute, Subject};
pub use checker::AuthorizationChecker;
pub use decision::{AccessDecision, VoterVote};
pub use manager::{AccessDecisionManager, AccessDecisionManagerBuilder, VotingAccessDecisionManager};
pub use strategy::{Strategy, StrategyConfig};
pub use traceable::{DecisionLogEntry, TraceableAccessDecisionManager, VoterDetail};
pub use vote::{Vote, VoteResult};
pub use voter::{AuthenticatedVoter, RoleVoter, Voter};
