/// 集合导出接口
pub mod export;
/// 健康检查
pub mod health;
/// 表单页（访问闸门 + 服务端渲染）
pub mod page;
