//! Worker Layer - Background Task Processing
//!
//! 实现 GenerationWorker，消费工作队列并执行调度

mod generation_worker;

pub use generation_worker::{GenerationWorker, GenerationWorkerConfig};
