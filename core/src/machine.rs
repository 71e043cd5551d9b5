//! Protocol state machine for the cost agent
//!
//! The machine is pure: no async, no IO, no channels. The pump feeds it one
//! request at a time and forwards whatever it returns.
//!
//! ```text
//! Created --info--> Negotiating --init ok--> Initialized --point--> Running
//!                        |
//!                        +--init failed--> Stopped
//! any state --stop--> Stopped (shutdown)
//! ```
//!
//! Every request except `stop` yields exactly one response, in order.

use log::{debug, info, trace, warn};

use crate::cost;
use crate::options::{self, CostConfig};
use crate::point::Point;
use crate::protocol::{EdgeType, OptionEntry, Request, Response};

pub const BATCHING_NOT_SUPPORTED: &str = "batching not supported";
pub const ALREADY_INITIALIZED: &str = " agent already initialized";
pub const NOT_INITIALIZED: &str = "point received before successful initialization";
pub const INIT_AFTER_STOP: &str = " agent stopped, initialization is closed";

/// Lifecycle state of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Created,
    Negotiating,
    Initialized,
    Running,
    Stopped,
}

/// What the pump should do after a request
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Queue this response for the host
    Respond(Response),
    /// Finish the response queue and exit
    Shutdown,
}

/// The cost agent
#[derive(Debug)]
pub struct CostAgent {
    state: AgentState,
    config: Option<CostConfig>,
    points: u64,
}

impl Default for CostAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl CostAgent {
    pub fn new() -> Self {
        Self {
            state: AgentState::Created,
            config: None,
            points: 0,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Validated settings, once init has succeeded
    pub fn config(&self) -> Option<&CostConfig> {
        self.config.as_ref()
    }

    /// Number of points transformed so far
    pub fn points_processed(&self) -> u64 {
        self.points
    }

    /// Capability response; identical in every state
    pub fn info() -> Response {
        Response::Info {
            wants: EdgeType::Stream,
            provides: EdgeType::Stream,
            options: options::recognized_options(),
        }
    }

    /// Apply one request
    pub fn handle(&mut self, request: Request) -> Outcome {
        trace!("{:?} <- {}", self.state, request.kind());
        match request {
            Request::Info => Outcome::Respond(self.negotiate()),
            Request::Init { options } => Outcome::Respond(self.init(&options)),
            Request::Keepalive { time } => Outcome::Respond(Response::Keepalive { time }),
            Request::Snapshot => Outcome::Respond(Response::Snapshot {
                snapshot: Vec::new(),
            }),
            Request::Restore { snapshot } => {
                debug!("ignoring restore of {} byte snapshot", snapshot.len());
                Outcome::Respond(Response::Restore {
                    success: true,
                    error: String::new(),
                })
            }
            Request::BeginBatch { .. } | Request::EndBatch { .. } => {
                warn!("rejecting {}: {}", request.kind(), BATCHING_NOT_SUPPORTED);
                Outcome::Respond(Response::error(BATCHING_NOT_SUPPORTED))
            }
            Request::Point { point } => Outcome::Respond(self.point(point)),
            Request::Stop => {
                info!(
                    "stop requested in {:?} after {} points",
                    self.state, self.points
                );
                self.state = AgentState::Stopped;
                Outcome::Shutdown
            }
        }
    }

    fn negotiate(&mut self) -> Response {
        if self.state == AgentState::Created {
            debug!("capabilities requested, negotiating");
            self.state = AgentState::Negotiating;
        }
        Self::info()
    }

    fn init(&mut self, entries: &[OptionEntry]) -> Response {
        match self.state {
            AgentState::Created | AgentState::Negotiating => {}
            AgentState::Initialized | AgentState::Running => {
                warn!("init received in {:?}, keeping current settings", self.state);
                return Response::Init {
                    success: false,
                    error: ALREADY_INITIALIZED.to_string(),
                };
            }
            AgentState::Stopped => {
                // A failed init is final; the host has to stop and relaunch the agent
                warn!("init received in {:?}, refusing", self.state);
                return Response::Init {
                    success: false,
                    error: INIT_AFTER_STOP.to_string(),
                };
            }
        }

        match options::validate(entries) {
            Ok(config) => {
                info!(
                    "initialized: hourly_cost={} total_cpu={} total_memory={}",
                    config.hourly_cost(),
                    config.total_cpu(),
                    config.total_memory()
                );
                self.config = Some(config);
                self.state = AgentState::Initialized;
                Response::Init {
                    success: true,
                    error: String::new(),
                }
            }
            Err(err) => {
                warn!("initialization failed:{}", err.message);
                self.state = AgentState::Stopped;
                Response::Init {
                    success: false,
                    error: err.message,
                }
            }
        }
    }

    fn point(&mut self, point: Point) -> Response {
        let config = match (self.state, self.config.as_ref()) {
            (AgentState::Initialized | AgentState::Running, Some(config)) => config,
            _ => {
                warn!("rejecting point in {:?}: {}", self.state, NOT_INITIALIZED);
                return Response::error(NOT_INITIALIZED);
            }
        };

        let out = cost::transform(&point, config);
        if self.state == AgentState::Initialized {
            info!("first point received, running");
            self.state = AgentState::Running;
        }
        self.points += 1;
        trace!("point {} at {} priced", self.points, out.time);

        Response::Point { point: out }
    }
}
