//! Per-port control plane of a mesh/cluster network-on-chip router: credit
//! tracking, output arbitration and next-hop route computation, modeled as
//! cycle-stepped blocks.

pub mod base;
pub mod builtin;
pub mod router;
pub mod sim;

pub use base::mask::PortMask;
pub use router::{
    ArbiterInputs, CreditInputs, CreditManager, Grant, OutputArbiter, Port, Position,
    RouteComputer, RouteDecision, RouteRequest, RouterConfig,
};
