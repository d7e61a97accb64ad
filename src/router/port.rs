use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::base::mask::PortMask;

pub const NUM_ROUTE_PORTS: usize = 12;

/// Egress ports seen by route computation. Discriminants are the bit index
/// in every route port mask.
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Port {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
    SerdesNorth = 8,
    SerdesSouth = 9,
    SerdesEast = 10,
    SerdesWest = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortTier {
    Cardinal,
    Diagonal,
    Serdes,
}

pub const ALL_PORTS: [Port; NUM_ROUTE_PORTS] = [
    Port::North,
    Port::South,
    Port::East,
    Port::West,
    Port::NorthEast,
    Port::NorthWest,
    Port::SouthEast,
    Port::SouthWest,
    Port::SerdesNorth,
    Port::SerdesSouth,
    Port::SerdesEast,
    Port::SerdesWest,
];

// indexed [sign(dy) + 1][sign(dx) + 1]
const LOCAL_DIRECTIONS: [[Option<Port>; 3]; 3] = [
    [Some(Port::SouthWest), Some(Port::South), Some(Port::SouthEast)],
    [Some(Port::West), None, Some(Port::East)],
    [Some(Port::NorthWest), Some(Port::North), Some(Port::NorthEast)],
];

fn sign_index(ord: Ordering) -> usize {
    match ord {
        Ordering::Less => 0,
        Ordering::Equal => 1,
        Ordering::Greater => 2,
    }
}

impl Port {
    pub fn from_index(idx: usize) -> Option<Port> {
        Port::from_usize(idx)
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn mask(self) -> PortMask {
        PortMask::onehot(self as usize)
    }

    pub fn tier(self) -> PortTier {
        match self {
            Port::North | Port::South | Port::East | Port::West => PortTier::Cardinal,
            Port::NorthEast | Port::NorthWest | Port::SouthEast | Port::SouthWest => {
                PortTier::Diagonal
            }
            _ => PortTier::Serdes,
        }
    }

    /// Local port for a move whose x/y deltas compare to zero as given.
    /// `None` when both are zero.
    pub fn local(dx: Ordering, dy: Ordering) -> Option<Port> {
        LOCAL_DIRECTIONS[sign_index(dy)][sign_index(dx)]
    }

    /// SerDes port for an inter-tile move. The y dimension is resolved first.
    pub fn serdes(dx: Ordering, dy: Ordering) -> Option<Port> {
        match (dy, dx) {
            (Ordering::Greater, _) => Some(Port::SerdesNorth),
            (Ordering::Less, _) => Some(Port::SerdesSouth),
            (Ordering::Equal, Ordering::Greater) => Some(Port::SerdesEast),
            (Ordering::Equal, Ordering::Less) => Some(Port::SerdesWest),
            (Ordering::Equal, Ordering::Equal) => None,
        }
    }

    /// Alternate port tried once when this port is the sole candidate and is
    /// down. Rotates a quarter turn counter-clockwise within the same tier;
    /// diagonal ports have no alternate.
    pub fn fallback(self) -> Option<Port> {
        match self {
            Port::East => Some(Port::North),
            Port::North => Some(Port::West),
            Port::West => Some(Port::South),
            Port::South => Some(Port::East),
            Port::SerdesEast => Some(Port::SerdesNorth),
            Port::SerdesNorth => Some(Port::SerdesWest),
            Port::SerdesWest => Some(Port::SerdesSouth),
            Port::SerdesSouth => Some(Port::SerdesEast),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Port::North => "N",
            Port::South => "S",
            Port::East => "E",
            Port::West => "W",
            Port::NorthEast => "NE",
            Port::NorthWest => "NW",
            Port::SouthEast => "SE",
            Port::SouthWest => "SW",
            Port::SerdesNorth => "SER_N",
            Port::SerdesSouth => "SER_S",
            Port::SerdesEast => "SER_E",
            Port::SerdesWest => "SER_W",
        }
    }
}

impl Display for Port {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering::*;

    #[test]
    fn indices_round_trip_through_from_index() {
        for (i, port) in ALL_PORTS.iter().enumerate() {
            assert_eq!(port.index(), i);
            assert_eq!(Port::from_index(i), Some(*port));
        }
        assert_eq!(Port::from_index(NUM_ROUTE_PORTS), None);
    }

    #[test]
    fn local_table_covers_every_sign_pattern() {
        assert_eq!(Port::local(Greater, Equal), Some(Port::East));
        assert_eq!(Port::local(Less, Equal), Some(Port::West));
        assert_eq!(Port::local(Equal, Greater), Some(Port::North));
        assert_eq!(Port::local(Equal, Less), Some(Port::South));
        assert_eq!(Port::local(Greater, Greater), Some(Port::NorthEast));
        assert_eq!(Port::local(Less, Greater), Some(Port::NorthWest));
        assert_eq!(Port::local(Greater, Less), Some(Port::SouthEast));
        assert_eq!(Port::local(Less, Less), Some(Port::SouthWest));
        assert_eq!(Port::local(Equal, Equal), None);
    }

    #[test]
    fn serdes_prefers_y_dimension() {
        assert_eq!(Port::serdes(Less, Less), Some(Port::SerdesSouth));
        assert_eq!(Port::serdes(Greater, Greater), Some(Port::SerdesNorth));
        assert_eq!(Port::serdes(Greater, Equal), Some(Port::SerdesEast));
        assert_eq!(Port::serdes(Equal, Equal), None);
    }

    #[test]
    fn fallback_stays_in_tier() {
        for port in ALL_PORTS {
            match port.fallback() {
                Some(alt) => {
                    assert_eq!(alt.tier(), port.tier());
                    assert_ne!(alt, port);
                }
                None => assert_eq!(port.tier(), PortTier::Diagonal),
            }
        }
    }
}
