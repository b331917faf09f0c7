//! Records that travel on the wire, either as line arguments or as the
//! embedded JSON payloads of `READY`, `SCOREBOARD` and `STATE`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Current layout version of [`MatchSnapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// What a connected identity is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Holds one of the two seats and may submit a fleet and shoot.
    Player,
    /// Receives broadcasts only.
    Observer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "PLAYER"),
            Self::Observer => write!(f, "OBSERVER"),
        }
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("PLAYER") {
            Ok(Self::Player)
        } else if s.eq_ignore_ascii_case("OBSERVER") {
            Ok(Self::Observer)
        } else {
            Err(ProtocolError::InvalidArgument(format!(
                "role must be PLAYER or OBSERVER, got {s}"
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Boat
// ---------------------------------------------------------------------------

/// One boat of a fleet: a 1-based origin, a length, and an orientation.
///
/// A horizontal boat occupies `x..x+length` on row `y`; a vertical one
/// occupies `y..y+length` on column `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boat {
    pub x: u8,
    pub y: u8,
    pub length: u8,
    #[serde(rename = "isHorizontal")]
    pub is_horizontal: bool,
}

impl Boat {
    /// Creates a boat.
    pub const fn new(x: u8, y: u8, length: u8, is_horizontal: bool) -> Self {
        Self {
            x,
            y,
            length,
            is_horizontal,
        }
    }

    /// Returns `true` if the cell `(x, y)` lies on this boat.
    pub fn covers(&self, x: u8, y: u8) -> bool {
        let (along, fixed, origin, origin_fixed) = if self.is_horizontal {
            (x, y, self.x, self.y)
        } else {
            (y, x, self.y, self.x)
        };
        fixed == origin_fixed
            && along >= origin
            && u16::from(along) < u16::from(origin) + u16::from(self.length)
    }

    /// Iterates over every occupied cell. Widened to `u16` so boats that
    /// run past the edge of a `u8` board can still be described (and
    /// rejected) without overflow.
    pub fn cells(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        (0..u16::from(self.length)).map(move |i| {
            if self.is_horizontal {
                (u16::from(self.x) + i, u16::from(self.y))
            } else {
                (u16::from(self.x), u16::from(self.y) + i)
            }
        })
    }
}

/// Decodes the JSON array carried by `READY`.
pub fn decode_fleet(json: &str) -> Result<Vec<Boat>, ProtocolError> {
    serde_json::from_str(json).map_err(ProtocolError::InvalidPayload)
}

// ---------------------------------------------------------------------------
// Shot
// ---------------------------------------------------------------------------

/// One entry of a shooter's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    pub x: u8,
    pub y: u8,
    pub hit: bool,
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Cumulative result counters for one identity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct ScoreEntry {
    pub wins: u32,
    pub losses: u32,
}

/// identity name → counters. Ordered so the encoded JSON is stable.
pub type Scoreboard = BTreeMap<String, ScoreEntry>;

// ---------------------------------------------------------------------------
// MatchSnapshot
// ---------------------------------------------------------------------------

/// A point-in-time copy of the match, sent as `STATE` on reconnection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub version: u32,
    /// Seat order; `None` marks an empty seat.
    pub players: [Option<String>; 2],
    pub current_index: usize,
    pub over: bool,
    pub fleets: BTreeMap<String, Vec<Boat>>,
    pub shots: BTreeMap<String, Vec<Shot>>,
}

impl MatchSnapshot {
    /// Parses a `STATE` payload, rejecting layouts this build doesn't know.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(ProtocolError::InvalidPayload)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ProtocolError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("player".parse::<Role>().unwrap(), Role::Player);
        assert_eq!("Observer".parse::<Role>().unwrap(), Role::Observer);
        assert!("referee".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_matches_wire_keyword() {
        assert_eq!(Role::Player.to_string(), "PLAYER");
        assert_eq!(Role::Observer.to_string(), "OBSERVER");
    }

    #[test]
    fn test_boat_serializes_with_camel_case_orientation() {
        let json = serde_json::to_value(Boat::new(1, 2, 3, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"x": 1, "y": 2, "length": 3, "isHorizontal": true})
        );
    }

    #[test]
    fn test_boat_covers_horizontal_half_open_range() {
        let boat = Boat::new(3, 4, 3, true);
        assert!(boat.covers(3, 4));
        assert!(boat.covers(5, 4));
        assert!(!boat.covers(6, 4), "end is exclusive");
        assert!(!boat.covers(2, 4));
        assert!(!boat.covers(4, 5), "wrong row");
    }

    #[test]
    fn test_boat_covers_vertical_half_open_range() {
        let boat = Boat::new(7, 1, 2, false);
        assert!(boat.covers(7, 1));
        assert!(boat.covers(7, 2));
        assert!(!boat.covers(7, 3));
        assert!(!boat.covers(8, 1));
    }

    #[test]
    fn test_boat_cells_do_not_overflow_near_u8_max() {
        let boat = Boat::new(255, 1, 3, true);
        let cells: Vec<_> = boat.cells().collect();
        assert_eq!(cells, vec![(255, 1), (256, 1), (257, 1)]);
        assert!(!boat.covers(0, 1));
    }

    #[test]
    fn test_decode_fleet_accepts_client_array() {
        let json = r#"[{"x":1,"y":1,"length":5,"isHorizontal":true},
                       {"x":2,"y":3,"length":2,"isHorizontal":false}]"#;
        let fleet = decode_fleet(json).unwrap();
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet[1], Boat::new(2, 3, 2, false));
    }

    #[test]
    fn test_decode_fleet_rejects_missing_field() {
        let json = r#"[{"x":1,"y":1,"length":5}]"#;
        assert!(matches!(
            decode_fleet(json),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_decode_fleet_rejects_negative_coordinate() {
        let json = r#"[{"x":-1,"y":1,"length":5,"isHorizontal":true}]"#;
        assert!(decode_fleet(json).is_err());
    }

    #[test]
    fn test_score_entry_json_shape() {
        let mut board = Scoreboard::new();
        board.insert("bob".into(), ScoreEntry { wins: 0, losses: 2 });
        board.insert("alice".into(), ScoreEntry { wins: 3, losses: 1 });
        assert_eq!(
            serde_json::to_string(&board).unwrap(),
            r#"{"alice":{"wins":3,"losses":1},"bob":{"wins":0,"losses":2}}"#
        );
    }

    #[test]
    fn test_snapshot_from_json_rejects_unknown_version() {
        let snapshot = MatchSnapshot {
            version: 99,
            players: [Some("alice".into()), None],
            current_index: 0,
            over: false,
            fleets: BTreeMap::new(),
            shots: BTreeMap::new(),
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            MatchSnapshot::from_json(&json),
            Err(ProtocolError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_snapshot_empty_seat_is_null() {
        let snapshot = MatchSnapshot {
            version: SNAPSHOT_VERSION,
            players: [Some("alice".into()), None],
            current_index: 0,
            over: false,
            fleets: BTreeMap::new(),
            shots: BTreeMap::new(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["players"], serde_json::json!(["alice", null]));
        assert_eq!(
            MatchSnapshot::from_json(&json.to_string()).unwrap(),
            snapshot
        );
    }
}
