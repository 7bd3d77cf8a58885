//! 访问决策结果

use serde::Serialize;

use crate::vote::Vote;

/// 某个投票者投出的一票
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoterVote {
    pub voter: String,
    pub vote: Vote,
}

/// 访问决策
///
/// 除最终结果外，还按调用顺序保留每个实际被调用的投票者及其投票 (被短路跳过的投票者不在其中)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    granted: bool,
    votes: Vec<VoterVote>,
}

impl AccessDecision {
    pub fn new(granted: bool, votes: Vec<VoterVote>) -> Self {
        Self { granted, votes }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    pub fn votes(&self) -> &[VoterVote] {
        &self.votes
    }

    /// 所有附带了原因的投票说明，按投票顺序
    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.votes.iter().filter_map(|v| v.vote.reason())
    }
}
