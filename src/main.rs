use collection_export::app::build_router;
use collection_export::shutdown::shutdown_signal;
use collection_export::startup::run_startup_checks;
use collection_export::state::AppState;
use collection_export::{AppConfig, ShutdownManager};

#[tokio::main]
async fn main() {
    if let Err(e) = AppConfig::init_global() {
        // 日志尚未初始化，直接输出到 stderr
        eprintln!("配置加载失败: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "collection_export={lvl},tower_http={lvl}",
                    lvl = config.logging.level
                )
                .into()
            }),
        )
        .init();

    run_startup_checks(config);

    let app = build_router(config, AppState::from_config(config));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    let prefix = collection_export::app::normalize_prefix(&config.api.prefix);
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Form: http://{}/?key=<ACCESS_KEY>", addr);
    tracing::info!("Export API: http://{}{}/download", addr, prefix);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);

    let shutdown_manager = ShutdownManager::new();
    let timeout = config.shutdown.timeout_duration();
    tracing::info!("优雅退出超时时间: {}秒", config.shutdown.timeout_secs);

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal(shutdown_manager, timeout).await;
        tracing::info!("开始优雅关闭HTTP服务器...");
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
