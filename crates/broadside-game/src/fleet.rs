//! Fleet validation, hit testing, and random placement.

use std::collections::HashSet;

use broadside_protocol::Boat;
use rand::Rng;

use crate::{FleetRules, GameError};

/// Attempts per boat before the whole placement starts over.
const PLACEMENT_ATTEMPTS: usize = 200;
/// Full restarts before giving up on the rules.
const PLACEMENT_RESTARTS: usize = 50;

/// Checks a submitted fleet against the rules.
///
/// The boats must match `ship_lengths` as a multiset, lie fully on the
/// board, and not share any cell.
///
/// # Errors
/// [`GameError::InvalidFleet`] naming the first problem found.
pub fn validate_fleet(rules: &FleetRules, fleet: &[Boat]) -> Result<(), GameError> {
    let mut expected = rules.ship_lengths.clone();
    let mut submitted: Vec<u8> = fleet.iter().map(|b| b.length).collect();
    expected.sort_unstable();
    submitted.sort_unstable();
    if expected != submitted {
        return Err(GameError::InvalidFleet(format!(
            "expected ships of lengths {:?}",
            rules.ship_lengths
        )));
    }

    let size = u16::from(rules.board_size);
    let mut occupied = HashSet::new();
    for boat in fleet {
        for (x, y) in boat.cells() {
            if x < 1 || y < 1 || x > size || y > size {
                return Err(GameError::InvalidFleet(format!(
                    "boat at ({}, {}) leaves the board",
                    boat.x, boat.y
                )));
            }
            if !occupied.insert((x, y)) {
                return Err(GameError::InvalidFleet(format!(
                    "boats overlap at ({x}, {y})"
                )));
            }
        }
    }
    Ok(())
}

/// Returns `true` if any boat of `fleet` occupies `(x, y)`.
pub fn is_hit(fleet: &[Boat], x: u8, y: u8) -> bool {
    fleet.iter().any(|boat| boat.covers(x, y))
}

/// Places a random valid fleet, longest ships first.
///
/// # Errors
/// [`GameError::InvalidRules`] if the rules are inconsistent or no
/// placement was found within the attempt budget.
pub fn generate_fleet<R: Rng>(
    rules: &FleetRules,
    rng: &mut R,
) -> Result<Vec<Boat>, GameError> {
    rules.check()?;

    let mut lengths = rules.ship_lengths.clone();
    lengths.sort_unstable_by(|a, b| b.cmp(a));

    'restart: for _ in 0..PLACEMENT_RESTARTS {
        let mut fleet = Vec::with_capacity(lengths.len());
        let mut occupied: HashSet<(u16, u16)> = HashSet::new();

        for &length in &lengths {
            let Some(boat) = place_one(rules.board_size, length, &occupied, rng) else {
                continue 'restart;
            };
            occupied.extend(boat.cells());
            fleet.push(boat);
        }
        return Ok(fleet);
    }

    Err(GameError::InvalidRules(
        "could not place the configured ships".into(),
    ))
}

fn place_one<R: Rng>(
    board_size: u8,
    length: u8,
    occupied: &HashSet<(u16, u16)>,
    rng: &mut R,
) -> Option<Boat> {
    // Last origin along the boat's axis that keeps its tail on the board.
    let max_start = board_size - length + 1;
    for _ in 0..PLACEMENT_ATTEMPTS {
        let is_horizontal = rng.random_bool(0.5);
        let (x, y) = if is_horizontal {
            (rng.random_range(1..=max_start), rng.random_range(1..=board_size))
        } else {
            (rng.random_range(1..=board_size), rng.random_range(1..=max_start))
        };
        let boat = Boat::new(x, y, length, is_horizontal);
        if boat.cells().all(|cell| !occupied.contains(&cell)) {
            return Some(boat);
        }
    }
    None
}
