//! Transports around the query service: the interactive question loop and
//! the HTTP API, plus the settings and tracing wiring both share.

pub mod api;
pub mod repl;
pub mod settings;
pub mod telemetry;
