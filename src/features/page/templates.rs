use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::error::AppError;

/// 表单页模板随二进制一同编译，部署时不依赖 resources 目录。
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const TEMPLATES: [(&str, &str); 3] = [
    (
        "layout.html",
        include_str!("../../../resources/templates/page/layout.html.jinja"),
    ),
    (
        "denied.html",
        include_str!("../../../resources/templates/page/denied.html.jinja"),
    ),
    (
        "form.html",
        include_str!("../../../resources/templates/page/form.html.jinja"),
    ),
];

pub const PAGE_TITLE: &str = "MongoDB Collection Downloader";
pub const DENIED_TITLE: &str = "Access Denied";

fn get_template_env() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(|| {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            if let Err(e) = env.add_template(name, source) {
                tracing::error!("加载页面模板失败（{name}）: {e}");
            }
        }
        env
    })
}

fn render(template_name: &str, ctx: minijinja::Value) -> Result<String, AppError> {
    let tpl = get_template_env()
        .get_template(template_name)
        .map_err(|e| AppError::Internal(format!("加载页面模板失败（{template_name}）: {e}")))?;
    tpl.render(ctx)
        .map_err(|e| AppError::Internal(format!("渲染页面模板失败（{template_name}）: {e}")))
}

/// 拒绝页：不包含任何输入控件
pub fn render_denied() -> Result<String, AppError> {
    render("denied.html", context! { title => DENIED_TITLE })
}

/// 表单页：`download_path` 写入脚本，作为 fetch 的目标地址
pub fn render_form(download_path: &str) -> Result<String, AppError> {
    render(
        "form.html",
        context! { title => PAGE_TITLE, download_path => download_path },
    )
}
