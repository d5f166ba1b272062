//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod segment_handlers;

pub use segment_handlers::*;
