use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    form::{AccessGate, GateState},
    state::AppState,
};

use super::templates;

/// `/?key=...`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub key: Option<String>,
}

/// 表单页：访问口令匹配时渲染表单，否则渲染拒绝页（均为 200）。
pub async fn form_page(
    State(state): State<AppState>,
    query: Option<Query<PageQuery>>,
) -> Result<Html<String>, AppError> {
    let provided = query.as_ref().and_then(|Query(q)| q.key.as_deref());
    let gate = AccessGate::new(state.export.access_key());

    let html = match gate.evaluate(provided) {
        GateState::Authorized => templates::render_form(&state.download_path())?,
        GateState::Denied | GateState::Checking => {
            tracing::debug!("表单页访问口令缺失或不匹配");
            templates::render_denied()?
        }
    };
    Ok(Html(html))
}

pub fn create_page_router() -> Router<AppState> {
    Router::new().route("/", get(form_page))
}
