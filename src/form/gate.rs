/// 表单页的访问状态。
///
/// 每次加载页面都从 `Checking` 开始，依据 URL 中的 `key` 落到 `Denied` 或 `Authorized`，
/// 不做任何会话持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Checking,
    Denied,
    Authorized,
}

/// 访问口令闸门：URL 查询值与配置值做普通字符串相等比较。
///
/// 这是弱校验：无限流、无轮换、非恒定时间比较，仅用于隐藏表单入口。
#[derive(Debug, Clone, Copy)]
pub struct AccessGate<'a> {
    expected: Option<&'a str>,
}

impl<'a> AccessGate<'a> {
    /// `expected` 为 None（或空串）时闸门永远拒绝。
    pub fn new(expected: Option<&'a str>) -> Self {
        Self {
            expected: expected.filter(|s| !s.is_empty()),
        }
    }

    pub fn evaluate(&self, provided: Option<&str>) -> GateState {
        match (self.expected, provided) {
            (Some(expected), Some(provided)) if !provided.is_empty() && provided == expected => {
                GateState::Authorized
            }
            _ => GateState::Denied,
        }
    }
}
