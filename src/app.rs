use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::{export::create_export_router, health::health_check, page::create_page_router};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 导出结果是大体积 JSON，压缩收益明显；二进制下载类型排除在外。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由：表单页、健康检查、导出接口（挂在 `api.prefix` 下）与 Swagger UI。
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let prefix = normalize_prefix(&config.api.prefix);
    let api_router = create_export_router();

    let mut app = Router::<AppState>::new()
        .merge(create_page_router())
        .route("/health", get(health_check));
    app = if prefix.is_empty() {
        app.merge(api_router)
    } else {
        app.nest(&prefix, api_router)
    };

    let mut app = app
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CompressionLayer::new().compress_when(compression_predicate()));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // 最外层：保证所有响应（含 CORS 预检）都带 request_id。
    app.layer(axum::middleware::from_fn(request_id_middleware))
}

/// `"/api/"` → `"/api"`；`"/"` 或空串 → 不嵌套
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
