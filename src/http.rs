use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

/// 全局复用的 HTTP Client（统一连接池/Keep-Alive），不设置超时。
///
/// 导出是一次性全量读取，耗时随集合大小增长，默认不主动截断。
static CLIENT_DEFAULT: OnceCell<Client> = OnceCell::new();

/// 默认 HTTP Client（无超时）
pub fn client_default() -> Result<&'static Client, reqwest::Error> {
    CLIENT_DEFAULT.get_or_try_init(|| Client::builder().build())
}

/// 按需构建带总超时的 HTTP Client（CLI `--timeout-secs` 使用）
pub fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}
