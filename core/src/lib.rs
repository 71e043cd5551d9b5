//! kullect core: a stream agent that prices Kubernetes resource usage.
//!
//! The host pipeline negotiates capabilities, initializes the agent with the
//! cluster's hourly cost and capacity, then streams usage points. Each point
//! comes back with `cpu_cost` and `memory_cost` fields in place of its
//! measurements.
//!
//! | Module | Role |
//! |--------|------|
//! | [`options`] | Validate init options into a [`CostConfig`] |
//! | [`cost`] | Pure per-point cost transform |
//! | [`machine`] | Protocol state machine |
//! | [`pump`] | Inbound loop and outbound task |
//! | [`transport`] | NDJSON framing behind pluggable traits |

#![forbid(unsafe_code)]

pub mod cost;
pub mod error;
pub mod logger;
pub mod machine;
pub mod options;
pub mod point;
pub mod protocol;
pub mod pump;
pub mod transport;


// Re-exports for convenience
pub use error::{AgentError, ConfigError};
pub use machine::{AgentState, CostAgent, Outcome};
pub use options::CostConfig;
pub use point::Point;
pub use protocol::{Request, Response};
pub use pump::{serve, Exit, PumpConfig, PumpSummary};
pub use transport::{JsonLinesSink, JsonLinesSource, RequestSource, ResponseSink};
