//! Memory Layer - In-Memory State Management
//!
//! 生成任务只保存在进程内存中，重启即丢失

mod job_registry;

pub use job_registry::InMemoryJobRegistry;
