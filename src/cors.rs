use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 中间件（未启用或配置无效时返回 None）
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let (any_origin, origins) = parse_list(&cors.allowed_origins, "allowed_origins", |v| {
        HeaderValue::from_str(v).ok()
    });
    if !any_origin && origins.is_empty() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }

    // 导出接口需要跨域携带 x-api-key，因此默认放行该请求头。
    let (any_methods, mut methods) = parse_list(&cors.allowed_methods, "allowed_methods", |v| {
        Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
    });
    if methods.is_empty() {
        methods.push(Method::GET);
    }
    let (any_headers, mut headers) = parse_list(&cors.allowed_headers, "allowed_headers", |v| {
        header::HeaderName::from_bytes(v.to_ascii_lowercase().as_bytes()).ok()
    });
    if headers.is_empty() {
        headers.push(header::HeaderName::from_static("x-api-key"));
    }

    let mut layer = CorsLayer::new();
    layer = if any_origin {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    };
    layer = if any_methods {
        layer.allow_methods(Any)
    } else {
        layer.allow_methods(methods)
    };
    layer = if any_headers {
        layer.allow_headers(Any)
    } else {
        layer.allow_headers(headers)
    };

    if let Some(secs) = cors.max_age_secs
        && secs > 0
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

/// 解析配置列表："*" 表示任意，空白项跳过，无效项告警后忽略。
fn parse_list<T>(
    values: &[String],
    label: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> (bool, Vec<T>) {
    let mut any = false;
    let mut out = Vec::new();
    for raw in values {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if value == "*" {
            any = true;
            continue;
        }
        match parse(value) {
            Some(v) => out.push(v),
            None => tracing::warn!("CORS {} 含无效值: {}", label, value),
        }
    }
    (any, out)
}

#[cfg(test)]
mod tests {
    use super::{build_cors_layer, parse_list};
    use crate::config::CorsConfig;
    use axum::http::Method;

    #[test]
    fn disabled_config_builds_nothing() {
        assert!(build_cors_layer(&CorsConfig::default()).is_none());
    }

    #[test]
    fn enabled_without_origins_is_skipped() {
        let cors = CorsConfig {
            enabled: true,
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn parse_list_handles_wildcard_blank_and_invalid() {
        let values = vec![
            " get ".to_string(),
            "".to_string(),
            "*".to_string(),
            "BAD METHOD".to_string(),
        ];
        let (any, methods) = parse_list(&values, "allowed_methods", |v| {
            Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
        });
        assert!(any);
        assert_eq!(methods, vec![Method::GET]);
    }
}
