//! HTTP Handlers

mod audio;
mod job;
mod ping;
mod segment;
mod websocket;

pub use audio::*;
pub use job::*;
pub use ping::*;
pub use segment::*;
pub use websocket::*;
