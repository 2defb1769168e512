pub mod handler;
pub mod templates;

pub use handler::{PageQuery, create_page_router, form_page};
