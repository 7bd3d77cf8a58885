//! 权限属性与授权客体

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 请求的权限属性
///
/// 引擎本身不解释属性含义，只原样交给投票者
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Attribute {
    /// 普通权限字符串 (e.g. "ROLE_ADMIN")
    Name(String),
    /// 结构化表达式，由支持它的投票者自行求值
    Expression(String),
}

impl Attribute {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        Self::Expression(expression.into())
    }

    /// 仅当属性是普通字符串时返回
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Expression(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Expression(expression) => write!(f, "expr({})", expression),
        }
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Attribute {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// 授权客体 (被访问的资源实例)
///
/// 任意 `Debug + Send + Sync + 'static` 类型都自动实现；投票者通过
/// `subject.as_any().downcast_ref::<T>()` 取回具体类型
pub trait Subject: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Subject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
