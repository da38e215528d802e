pub mod dispatch;
pub mod page;
pub mod render;
