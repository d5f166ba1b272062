//! Events - 片段事件推送

mod publisher;

pub use publisher::EventPublisher;
