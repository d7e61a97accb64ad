use std::sync::Arc;

use crate::base::mask::PortMask;
use crate::router::config::RouterConfig;
use crate::router::port::{Port, ALL_PORTS, NUM_ROUTE_PORTS};
use crate::router::route::{Position, RouteComputer, RouteDecision, RouteRequest};

const ALL_UP: PortMask = PortMask::full(NUM_ROUTE_PORTS);

type Coord = (u32, u32, u32, u32);

fn route(curr: Coord, dest: Coord, vc: u8, livelink: PortMask) -> RouteDecision {
    let rc = RouteComputer::new(Arc::new(RouterConfig::default()));
    rc.compute(&RouteRequest {
        packet_valid: true,
        current: Position::new(curr.0, curr.1, curr.2, curr.3),
        dest: Position::new(dest.0, dest.1, dest.2, dest.3),
        vc_class: vc,
        livelink,
    })
}

fn expect_port(decision: RouteDecision, port: Port) {
    assert_eq!(decision, RouteDecision::Ports(port.mask()), "expected {}", port);
    assert!(!decision.retry());
}

fn expect_retry(decision: RouteDecision) {
    assert!(decision.retry());
    assert_eq!(decision.candidate_ports(), PortMask::EMPTY);
}

#[test]
fn short_range_cardinals() {
    expect_port(route((0, 0, 1, 1), (0, 0, 2, 1), 0, ALL_UP), Port::East);
    expect_port(route((0, 0, 1, 1), (0, 0, 0, 1), 0, ALL_UP), Port::West);
    expect_port(route((0, 0, 1, 1), (0, 0, 1, 2), 0, ALL_UP), Port::North);
    expect_port(route((0, 0, 1, 1), (0, 0, 1, 0), 0, ALL_UP), Port::South);
}

#[test]
fn mid_range_diagonals() {
    expect_port(route((0, 0, 1, 1), (0, 0, 2, 2), 0, ALL_UP), Port::NorthEast);
    expect_port(route((0, 0, 1, 1), (0, 0, 0, 2), 0, ALL_UP), Port::NorthWest);
    expect_port(route((0, 0, 1, 1), (0, 0, 2, 0), 0, ALL_UP), Port::SouthEast);
    expect_port(route((0, 0, 1, 1), (0, 0, 0, 0), 0, ALL_UP), Port::SouthWest);
}

#[test]
fn longer_local_moves_use_sign_only() {
    expect_port(route((0, 0, 0, 0), (0, 0, 7, 0), 0, ALL_UP), Port::East);
    expect_port(route((0, 0, 0, 0), (0, 0, 5, 3), 0, ALL_UP), Port::NorthEast);
}

#[test]
fn inter_cluster_serdes() {
    expect_port(route((1, 1, 1, 1), (2, 1, 1, 1), 0, ALL_UP), Port::SerdesEast);
    expect_port(route((1, 1, 1, 1), (0, 1, 1, 1), 0, ALL_UP), Port::SerdesWest);
    expect_port(route((1, 1, 1, 1), (1, 2, 1, 1), 0, ALL_UP), Port::SerdesNorth);
    expect_port(route((1, 1, 1, 1), (0, 0, 1, 1), 0, ALL_UP), Port::SerdesSouth);
}

#[test]
fn inter_cluster_ignores_local_offset() {
    expect_port(route((1, 1, 0, 0), (2, 1, 2, 2), 0, ALL_UP), Port::SerdesEast);
}

#[test]
fn restricted_vc_cannot_cross_tiles() {
    expect_retry(route((0, 0, 1, 1), (1, 0, 1, 1), 1, ALL_UP));
    expect_retry(route((0, 0, 1, 1), (1, 0, 1, 1), 1, PortMask::EMPTY));
    // restriction only applies to SerDes hops
    expect_port(route((0, 0, 1, 1), (0, 0, 2, 1), 1, ALL_UP), Port::East);
}

#[test]
fn restriction_follows_configured_mask() {
    let mut cfg = RouterConfig::default();
    cfg.serdes_vc_mask = 0b10;
    let rc = RouteComputer::new(Arc::new(cfg));
    let mut req = RouteRequest {
        packet_valid: true,
        current: Position::new(0, 0, 1, 1),
        dest: Position::new(1, 0, 1, 1),
        vc_class: 1,
        livelink: ALL_UP,
    };
    assert_eq!(rc.compute(&req), RouteDecision::Ports(Port::SerdesEast.mask()));
    req.vc_class = 0;
    assert_eq!(rc.compute(&req), RouteDecision::Retry);
}

#[test]
fn reroute_east_to_north() {
    let live = ALL_UP.without(Port::East.index());
    expect_port(route((0, 0, 1, 1), (0, 0, 2, 1), 0, live), Port::North);
}

#[test]
fn reroute_serdes_east_to_serdes_north() {
    let live = ALL_UP.without(Port::SerdesEast.index());
    expect_port(route((1, 1, 1, 1), (2, 1, 1, 1), 0, live), Port::SerdesNorth);
}

#[test]
fn reroute_exhausted_retries() {
    expect_retry(route((1, 1, 1, 1), (2, 1, 1, 1), 0, PortMask::EMPTY));
    let live = ALL_UP.without(Port::East.index()).without(Port::North.index());
    expect_retry(route((0, 0, 1, 1), (0, 0, 2, 1), 0, live));
}

#[test]
fn fallback_is_one_level_deep() {
    // West is up but is the second-level alternate of East
    let live = PortMask::EMPTY.with(Port::West.index());
    expect_retry(route((0, 0, 1, 1), (0, 0, 2, 1), 0, live));
}

#[test]
fn serdes_fallback_never_drops_to_local() {
    let live = ALL_UP
        .without(Port::SerdesEast.index())
        .without(Port::SerdesNorth.index());
    expect_retry(route((1, 1, 1, 1), (2, 1, 1, 1), 0, live));
}

#[test]
fn diagonals_have_no_fallback() {
    let live = ALL_UP.without(Port::NorthEast.index());
    expect_retry(route((0, 0, 1, 1), (0, 0, 2, 2), 0, live));
}

#[test]
fn every_cardinal_reroutes_when_alternate_live() {
    let cases = [
        ((0, 0, 2, 1), Port::East),
        ((0, 0, 1, 2), Port::North),
        ((0, 0, 0, 1), Port::West),
        ((0, 0, 1, 0), Port::South),
    ];
    for (dest, primary) in cases {
        let alt = primary.fallback().unwrap();
        let live = ALL_UP.without(primary.index());
        expect_port(route((0, 0, 1, 1), dest, 0, live), alt);
    }
}

#[test]
fn every_serdes_reroutes_counter_clockwise() {
    let cases = [
        ((2, 1, 1, 1), Port::SerdesEast, Port::SerdesNorth),
        ((1, 2, 1, 1), Port::SerdesNorth, Port::SerdesWest),
        ((0, 1, 1, 1), Port::SerdesWest, Port::SerdesSouth),
        ((1, 0, 1, 1), Port::SerdesSouth, Port::SerdesEast),
    ];
    for (dest, primary, alt) in cases {
        expect_port(route((1, 1, 1, 1), dest, 0, ALL_UP), primary);
        let live = ALL_UP.without(primary.index());
        expect_port(route((1, 1, 1, 1), dest, 0, live), alt);
        expect_retry(route((1, 1, 1, 1), dest, 0, live.without(alt.index())));
    }
}

#[test]
fn never_retry_with_ports() {
    let rc = RouteComputer::new(Arc::new(RouterConfig::default()));
    for live_bits in [0u32, 0x0ff, 0xf00, 0xfff, 0x555, 0xaaa] {
        for tile_x in 0..3 {
            for lx in 0..3 {
                for ly in 0..3 {
                    for vc in 0..2 {
                        let d = rc.compute(&RouteRequest {
                            packet_valid: true,
                            current: Position::new(1, 1, 1, 1),
                            dest: Position::new(tile_x, 1, lx, ly),
                            vc_class: vc,
                            livelink: PortMask::from_bits(live_bits),
                        });
                        assert!(!(d.retry() && !d.candidate_ports().is_empty()));
                        assert!(d.candidate_ports().count() <= 1);
                        let ports = d.candidate_ports();
                        assert_eq!(ports & PortMask::from_bits(live_bits), ports);
                    }
                }
            }
        }
    }
}

#[test]
fn livelink_bits_above_port_range_are_ignored() {
    let live = PortMask::from_bits(0xffff_f000);
    expect_retry(route((0, 0, 1, 1), (0, 0, 2, 1), 0, live));
    assert_eq!(ALL_PORTS.len(), NUM_ROUTE_PORTS);
}
