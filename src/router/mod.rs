pub mod arbiter;
pub mod config;
pub mod credit;
pub mod port;
pub mod route;
#[cfg(test)]
mod unit_tests;

pub use arbiter::{ArbiterInputs, Grant, OutputArbiter};
pub use config::RouterConfig;
pub use credit::{CreditInputs, CreditManager};
pub use port::{Port, PortTier, NUM_ROUTE_PORTS};
pub use route::{Position, RouteComputer, RouteDecision, RouteRequest};
