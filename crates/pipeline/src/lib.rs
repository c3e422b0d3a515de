//! The scribeflow message processing pipeline.
//!
//! Orchestrates one chat turn end to end: the [`RequestGate`] admits a
//! single request at a time, the safety validator screens it, editor
//! context and windowed history are gathered and trimmed to the token
//! budget, the streaming generation call runs under linear-backoff retry,
//! and the [`ResponsePostProcessor`] derives suggestions and actions from
//! the final text. Every invocation resolves to a `ChatResponse`.

pub mod gate;
pub mod pipeline;
pub mod post;

pub use gate::{GatePass, RequestGate};
pub use pipeline::ChatPipeline;
pub use post::ResponsePostProcessor;
