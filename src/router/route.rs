//! Next-hop port selection for the packet at the head of a queue.
//!
//! Evaluation is a fixed pipeline of pure steps:
//!
//! 1. classify the move (same tile: local cardinal/diagonal port; other tile:
//!    SerDes port, subject to the VC class being SerDes-eligible),
//! 2. mask the primary candidate with the livelink mask,
//! 3. if nothing survives and the primary was a single cardinal or SerDes
//!    port, try its one fallback port, masked the same way,
//! 4. an empty result is reported as [`RouteDecision::Retry`].

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::base::mask::PortMask;
use crate::router::config::RouterConfig;
use crate::router::port::{Port, NUM_ROUTE_PORTS};

/// Tile coordinates pick the cluster, local coordinates the node within it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub tile_x: u32,
    pub tile_y: u32,
    pub local_x: u32,
    pub local_y: u32,
}

impl Position {
    pub const fn new(tile_x: u32, tile_y: u32, local_x: u32, local_y: u32) -> Self {
        Position {
            tile_x,
            tile_y,
            local_x,
            local_y,
        }
    }

    pub fn same_tile(&self, other: &Position) -> bool {
        self.tile_x == other.tile_x && self.tile_y == other.tile_y
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{}:{},{})",
            self.tile_x, self.tile_y, self.local_x, self.local_y
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequest {
    pub packet_valid: bool,
    pub current: Position,
    pub dest: Position,
    pub vc_class: u8,
    /// bit set: link usable
    pub livelink: PortMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Ports(PortMask),
    Retry,
}

impl RouteDecision {
    pub fn candidate_ports(&self) -> PortMask {
        match self {
            RouteDecision::Ports(mask) => *mask,
            RouteDecision::Retry => PortMask::EMPTY,
        }
    }

    pub fn retry(&self) -> bool {
        matches!(self, RouteDecision::Retry)
    }
}

/// Unmasked outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primary {
    /// no hop needed; ejection is handled elsewhere
    Arrived,
    /// cross-tile move by a class that may not use SerDes
    Restricted,
    Hop(Port),
}

#[derive(Debug, Clone)]
pub struct RouteComputer {
    config: Arc<RouterConfig>,
}

impl RouteComputer {
    pub fn new(config: Arc<RouterConfig>) -> Self {
        RouteComputer { config }
    }

    pub fn compute(&self, req: &RouteRequest) -> RouteDecision {
        if !req.packet_valid {
            return RouteDecision::Ports(PortMask::EMPTY);
        }
        let livelink = req.livelink.truncate(NUM_ROUTE_PORTS);
        let port = match self.classify(req) {
            Primary::Arrived => return RouteDecision::Ports(PortMask::EMPTY),
            Primary::Restricted => {
                trace!(
                    "route {} -> {}: vc {} barred from serdes",
                    req.current,
                    req.dest,
                    req.vc_class
                );
                return RouteDecision::Retry;
            }
            Primary::Hop(port) => port,
        };

        let masked = port.mask() & livelink;
        if !masked.is_empty() {
            return RouteDecision::Ports(masked);
        }

        let rerouted = port.fallback().map_or(PortMask::EMPTY, |alt| {
            trace!("route {} -> {}: {} down, trying {}", req.current, req.dest, port, alt);
            alt.mask() & livelink
        });
        if rerouted.is_empty() {
            trace!("route {} -> {}: exhausted, retry", req.current, req.dest);
            RouteDecision::Retry
        } else {
            RouteDecision::Ports(rerouted)
        }
    }

    fn classify(&self, req: &RouteRequest) -> Primary {
        let (curr, dest) = (&req.current, &req.dest);
        if curr.same_tile(dest) {
            let dx = dest.local_x.cmp(&curr.local_x);
            let dy = dest.local_y.cmp(&curr.local_y);
            return Port::local(dx, dy).map_or(Primary::Arrived, Primary::Hop);
        }
        if !self.config.serdes_eligible(req.vc_class) {
            return Primary::Restricted;
        }
        let dx = dest.tile_x.cmp(&curr.tile_x);
        let dy = dest.tile_y.cmp(&curr.tile_y);
        // tiles differ, so at least one ordering is non-equal
        Port::serdes(dx, dy).map_or(Primary::Arrived, Primary::Hop)
    }
}
