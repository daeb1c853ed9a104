//! 调用者身份

/// 用量计数的归属身份
///
/// 优先使用登录用户，其次使用客户端地址；两者都没有时不计量
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Address(String),
    Unknown,
}

impl Identity {
    /// 按优先级解析身份
    pub fn resolve(user_id: Option<String>, address: Option<String>) -> Self {
        match (user_id, address) {
            (Some(user), _) if !user.is_empty() => Self::User(user),
            (_, Some(addr)) if !addr.is_empty() => Self::Address(addr),
            _ => Self::Unknown,
        }
    }

    /// 用量表中的键，未知身份返回 None
    pub fn usage_key(&self) -> Option<String> {
        match self {
            Self::User(id) => Some(format!("user:{}", id)),
            Self::Address(addr) => Some(format!("ip:{}", addr)),
            Self::Unknown => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            _ => None,
        }
    }
}
