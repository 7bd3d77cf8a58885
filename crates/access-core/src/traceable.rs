//! 可追踪的访问决策管理器
//!
//! 在不改变决策结果的前提下，为每次决策记录审计日志：请求属性、客体、
//! 每个投票者的投票以及最终结果。
//!
//! 嵌套决策 (投票者内部再次发起授权检查) 通过调用栈记录：进入时压栈，
//! 退出时出栈并追加到日志，因此内层决策总是先于外层完成记录，且互不交错。
//! 每个线程各自维护一个栈，并发决策不会串到同一帧里。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use arbiter_auth_core::Token;
use serde::Serialize;
use tracing::info;

use crate::attribute::{Attribute, Subject};
use crate::decision::AccessDecision;
use crate::manager::{AccessDecisionManager, VotingAccessDecisionManager};
use crate::strategy::StrategyConfig;
use crate::vote::Vote;
use crate::voter::Voter;

/// 单个投票者的投票明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoterDetail {
    pub voter: String,
    pub attributes: Vec<Attribute>,
    pub vote: Vote,
}

/// 一次决策的日志条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionLogEntry {
    pub attributes: Vec<Attribute>,
    /// 客体的 Debug 表示
    pub subject: Option<String>,
    pub voter_details: Vec<VoterDetail>,
    pub result: AccessDecision,
}

struct PendingEntry {
    attributes: Vec<Attribute>,
    subject: Option<String>,
    voter_details: Vec<VoterDetail>,
}

#[derive(Default)]
struct RecorderState {
    frames: HashMap<ThreadId, Vec<PendingEntry>>,
    log: Vec<DecisionLogEntry>,
}

#[derive(Default)]
struct DecisionRecorder {
    state: Mutex<RecorderState>,
}

impl DecisionRecorder {
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, attributes: &[Attribute], subject: Option<&dyn Subject>) -> FrameGuard<'_> {
        let entry = PendingEntry {
            attributes: attributes.to_vec(),
            subject: subject.map(|s| format!("{:?}", s)),
            voter_details: Vec::new(),
        };
        self.lock()
            .frames
            .entry(thread::current().id())
            .or_default()
            .push(entry);

        FrameGuard {
            recorder: self,
            completed: false,
        }
    }

    /// 记录到当前线程栈顶的帧；不在追踪中的调用直接忽略
    fn record_vote(&self, voter: &str, attributes: &[Attribute], vote: &Vote) {
        let mut state = self.lock();
        if let Some(frame) = state
            .frames
            .get_mut(&thread::current().id())
            .and_then(|stack| stack.last_mut())
        {
            frame.voter_details.push(VoterDetail {
                voter: voter.to_string(),
                attributes: attributes.to_vec(),
                vote: vote.clone(),
            });
        }
    }

    fn pop(&self) -> Option<PendingEntry> {
        let mut state = self.lock();
        let id = thread::current().id();
        let stack = state.frames.get_mut(&id)?;
        let entry = stack.pop();
        if stack.is_empty() {
            state.frames.remove(&id);
        }
        entry
    }

    fn log(&self) -> Vec<DecisionLogEntry> {
        self.lock().log.clone()
    }
}

/// 决策进行中的帧；未正常完成 (投票者 panic) 时在 drop 中丢弃该帧
struct FrameGuard<'a> {
    recorder: &'a DecisionRecorder,
    completed: bool,
}

impl FrameGuard<'_> {
    fn complete(mut self, decision: &AccessDecision) {
        self.completed = true;
        let Some(pending) = self.recorder.pop() else {
            return;
        };

        let entry = DecisionLogEntry {
            attributes: pending.attributes,
            subject: pending.subject,
            voter_details: pending.voter_details,
            result: decision.clone(),
        };
        info!(
            attributes = ?entry.attributes,
            subject = entry.subject.as_deref().unwrap_or("-"),
            granted = decision.is_granted(),
            votes = entry.voter_details.len(),
            "Access decision recorded"
        );
        self.recorder.lock().log.push(entry);
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.recorder.pop();
        }
    }
}

/// 把投票结果报告给记录器的投票者包装
struct TraceableVoter {
    voter: Arc<dyn Voter>,
    recorder: Arc<DecisionRecorder>,
}

impl Voter for TraceableVoter {
    fn vote(
        &self,
        token: &dyn Token,
        subject: Option<&dyn Subject>,
        attributes: &[Attribute],
    ) -> Vote {
        let vote = self.voter.vote(token, subject, attributes);
        self.recorder.record_vote(self.voter.name(), attributes, &vote);
        vote
    }

    fn name(&self) -> &str {
        self.voter.name()
    }
}

/// 带审计日志的决策管理器
///
/// 直接接收策略配置与投票者列表，内部用同样的配置构建被装饰的管理器，
/// 决策结果与未装饰时完全一致。日志只增不减，生命周期与实例相同。
pub struct TraceableAccessDecisionManager {
    inner: VotingAccessDecisionManager,
    voters: Vec<Arc<dyn Voter>>,
    recorder: Arc<DecisionRecorder>,
}

impl TraceableAccessDecisionManager {
    pub fn new(strategy: StrategyConfig, voters: Vec<Arc<dyn Voter>>) -> Self {
        let recorder = Arc::new(DecisionRecorder::default());
        let traced = voters
            .iter()
            .map(|voter| {
                Arc::new(TraceableVoter {
                    voter: voter.clone(),
                    recorder: recorder.clone(),
                }) as Arc<dyn Voter>
            })
            .collect();

        Self {
            inner: VotingAccessDecisionManager::new(strategy, traced),
            voters,
            recorder,
        }
    }

    pub fn strategy(&self) -> &StrategyConfig {
        self.inner.strategy()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.inner.strategy().strategy.as_str()
    }

    /// 原始 (未包装的) 投票者
    pub fn voters(&self) -> &[Arc<dyn Voter>] {
        &self.voters
    }

    /// 已完成决策的日志快照，按完成顺序
    pub fn decision_log(&self) -> Vec<DecisionLogEntry> {
        self.recorder.log()
    }
}

impl AccessDecisionManager for TraceableAccessDecisionManager {
    fn get_decision(
        &self,
        token: &dyn Token,
        attributes: &[Attribute],
        subject: Option<&dyn Subject>,
    ) -> AccessDecision {
        let frame = self.recorder.enter(attributes, subject);
        let decision = self.inner.get_decision(token, attributes, subject);
        frame.complete(&decision);
        decision
    }
}
