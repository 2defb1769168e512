use crate::config::AppConfig;

/// 启动检查结果：缺失的配置项名称（仅告警，不阻断启动）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub missing: Vec<&'static str>,
}

impl StartupReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// 执行启动检查
///
/// 1. 连接串未配置时，所有导出请求都会返回 500
/// 2. API 密钥未配置时，所有导出请求都会返回 401
/// 3. 访问口令未配置时，表单页永远显示拒绝页
pub fn run_startup_checks(config: &AppConfig) -> StartupReport {
    tracing::info!("🔍 开始执行启动检查...");

    let mut report = StartupReport::default();
    let checks = [
        (
            "MONGODB_URI",
            config.export.mongodb_uri().is_some(),
            "导出请求将返回 500",
        ),
        (
            "API_KEY",
            config.export.api_key().is_some(),
            "导出请求将一律返回 401",
        ),
        (
            "ACCESS_KEY",
            config.export.access_key().is_some(),
            "表单页将一律显示 Access Denied",
        ),
    ];

    for (name, present, effect) in checks {
        if present {
            tracing::info!("✅ {} 已配置", name);
        } else {
            tracing::warn!("⚠️ {} 未配置，{}", name, effect);
            report.missing.push(name);
        }
    }

    if !config.api.prefix.starts_with('/') {
        tracing::warn!(
            "⚠️ api.prefix 应以 / 开头，当前值: {:?}",
            config.api.prefix
        );
    }

    tracing::info!("✅ 启动检查完成");
    report
}
