//! Observability module providing structured logging.
//!
//! Every request runs inside a span carrying its correlation uuid, so log
//! lines emitted while handling a request can be joined on that field.

mod tracing_init;

pub use tracing_init::*;
