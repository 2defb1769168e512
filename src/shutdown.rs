//! 优雅退出
//!
//! 监听 SIGINT / SIGTERM（Windows 下仅 Ctrl+C），收到后通知 `axum::serve` 停止接收新连接。
//! 正在进行的导出请求会继续执行，直至完成或超过配置的超时时间。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
    /// 应用内部请求退出
    Application,
}

/// 退出协调器：可克隆，任一持有者都可以触发或等待退出。
#[derive(Debug, Clone, Default)]
pub struct ShutdownManager {
    notify: Arc<Notify>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用内部触发退出（测试或后台任务使用）
    pub fn trigger(&self) {
        tracing::info!("触发优雅退出: {:?}", ShutdownReason::Application);
        self.notify.notify_one();
    }

    /// 等待系统信号或应用内部触发，返回退出原因。
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        tokio::select! {
            _ = interrupt() => ShutdownReason::Interrupt,
            _ = terminate() => ShutdownReason::Terminate,
            _ = self.notify.notified() => ShutdownReason::Application,
        }
    }
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("注册 Ctrl+C 处理器失败: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut s) => {
            s.recv().await;
        }
        Err(e) => {
            tracing::error!("注册 SIGTERM 处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// 为 `with_graceful_shutdown` 构造的退出信号：等到退出原因后返回。
///
/// 超过 `timeout` 仍有请求未完成时直接结束进程，避免挂起的全量读取拖住退出。
pub async fn shutdown_signal(manager: ShutdownManager, timeout: Duration) {
    let reason = manager.wait_for_shutdown().await;
    tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);

    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!("优雅退出超时（{}秒），强制退出", timeout.as_secs());
        std::process::exit(1);
    });
}
