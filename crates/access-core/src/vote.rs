//! 投票值

use std::fmt;

use arbiter_errors::AppError;
use serde::{Deserialize, Serialize};

/// 三态投票结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteResult {
    Granted,
    Denied,
    Abstain,
}

impl VoteResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "GRANTED",
            Self::Denied => "DENIED",
            Self::Abstain => "ABSTAIN",
        }
    }
}

impl fmt::Display for VoteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 旧版整数表示: 1 = granted, -1 = denied, 0 = abstain
impl From<VoteResult> for i8 {
    fn from(result: VoteResult) -> Self {
        match result {
            VoteResult::Granted => 1,
            VoteResult::Denied => -1,
            VoteResult::Abstain => 0,
        }
    }
}

impl TryFrom<i8> for VoteResult {
    type Error = AppError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Granted),
            -1 => Ok(Self::Denied),
            0 => Ok(Self::Abstain),
            other => Err(AppError::configuration(format!(
                "Invalid legacy vote value: {}",
                other
            ))),
        }
    }
}

/// 一次投票
///
/// 创建后不可变；相等性只比较结果，原因仅作说明
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Vote {
    result: VoteResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Vote {
    pub fn granted() -> Self {
        Self::new(VoteResult::Granted)
    }

    pub fn denied() -> Self {
        Self::new(VoteResult::Denied)
    }

    pub fn abstain() -> Self {
        Self::new(VoteResult::Abstain)
    }

    pub fn new(result: VoteResult) -> Self {
        Self {
            result,
            reason: None,
        }
    }

    /// 附加原因说明
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn result(&self) -> VoteResult {
        self.result
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn is_granted(&self) -> bool {
        self.result == VoteResult::Granted
    }

    pub fn is_denied(&self) -> bool {
        self.result == VoteResult::Denied
    }

    pub fn is_abstain(&self) -> bool {
        self.result == VoteResult::Abstain
    }
}

impl PartialEq for Vote {
    fn eq(&self, other: &Self) -> bool {
        self.result == other.result
    }
}

impl From<VoteResult> for Vote {
    fn from(result: VoteResult) -> Self {
        Self::new(result)
    }
}
