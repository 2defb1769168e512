use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

use crate::features::export::API_KEY_HEADER;

/// 在 OpenAPI 中注入 `x-api-key` 的安全定义，供导出接口引用。
struct ApiKeySecurity;

impl Modify for ApiKeySecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "ApiKey",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
        );
    }
}

/// 为 Swagger UI 提供业务接口前缀的 Servers 配置。
///
/// - 导出接口挂载在 `config.api.prefix`（默认 `/api`）下；
/// - `/health` 不带前缀，额外提供 `/` 以便在 Swagger UI 中切换测试。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP__API__PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::export::handler::download_collection,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::features::export::ExportResponse,
        crate::features::health::HealthResponse,
    )),
    modifiers(&ApiKeySecurity, &ApiServers),
    tags(
        (name = "Export", description = "集合导出：读取指定集合的全部文档并以 JSON 返回。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Collection Export API",
        version = env!("CARGO_PKG_VERSION"),
        description = "MongoDB 集合导出服务。除 /health 外，导出接口实际挂载在 `config.api.prefix`（默认 /api）下，OpenAPI 的 paths 不包含该前缀。"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_download_and_health() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/download"));
        assert!(doc.paths.paths.contains_key("/health"));
        let schemes = doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("ApiKey"))
            .unwrap_or(false);
        assert!(schemes);
    }
}
