//! Fleet rules and the match phase state machine.

use std::fmt;

use crate::GameError;

// ---------------------------------------------------------------------------
// FleetRules
// ---------------------------------------------------------------------------

/// Board size and fleet composition for every match on this server.
///
/// The board is `board_size × board_size` with 1-based coordinates. A
/// fleet is exactly one boat per entry of `ship_lengths`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetRules {
    pub board_size: u8,
    pub ship_lengths: Vec<u8>,
}

impl Default for FleetRules {
    /// The classic 10×10 board with 5, 4, 3, 3 and 2 cell ships.
    fn default() -> Self {
        Self {
            board_size: 10,
            ship_lengths: vec![5, 4, 3, 3, 2],
        }
    }
}

impl FleetRules {
    /// Builds rules, rejecting combinations no fleet could satisfy.
    ///
    /// # Errors
    /// [`GameError::InvalidRules`] if the board is empty, there are no
    /// ships, a ship is longer than the board, or the ships cover more
    /// cells than the board has.
    pub fn new(board_size: u8, ship_lengths: Vec<u8>) -> Result<Self, GameError> {
        let rules = Self {
            board_size,
            ship_lengths,
        };
        rules.check()?;
        Ok(rules)
    }

    pub(crate) fn check(&self) -> Result<(), GameError> {
        if self.board_size == 0 {
            return Err(GameError::InvalidRules("board size must be at least 1".into()));
        }
        if self.ship_lengths.is_empty() {
            return Err(GameError::InvalidRules("at least one ship is required".into()));
        }
        if let Some(bad) = self
            .ship_lengths
            .iter()
            .find(|&&len| len == 0 || len > self.board_size)
        {
            return Err(GameError::InvalidRules(format!(
                "ship length {bad} does not fit a {0}x{0} board",
                self.board_size
            )));
        }
        let area = u32::from(self.board_size).pow(2);
        if self.total_cells() > area {
            return Err(GameError::InvalidRules(format!(
                "ships cover {} cells but the board has {area}",
                self.total_cells()
            )));
        }
        Ok(())
    }

    /// Sum of all ship lengths.
    pub fn total_cells(&self) -> u32 {
        self.ship_lengths.iter().map(|&l| u32::from(l)).sum()
    }

    /// Returns `true` if `(x, y)` is on the board.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        let size = i64::from(self.board_size);
        (1..=size).contains(&x) && (1..=size).contains(&y)
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// Where the match is in its lifecycle.
///
/// ```text
/// Lobby ──(both fleets in)──→ InProgress ──(victory)──→ Concluded
///   ↑                                                       │
///   └──────────────────(reset for next match)───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Fewer than two fleets submitted.
    Lobby,
    /// Both fleets in, shots being exchanged.
    InProgress,
    /// Someone sank the whole opposing fleet.
    Concluded,
}

impl MatchPhase {
    /// Returns `true` if fleets may be submitted.
    pub fn accepts_fleets(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if shots may be fired.
    pub fn is_active(self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` if the state machine allows moving to `target`.
    ///
    /// An unfinished match may also be reset straight back to the lobby.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::InProgress)
                | (Self::InProgress, Self::Concluded)
                | (Self::InProgress, Self::Lobby)
                | (Self::Concluded, Self::Lobby)
        )
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Concluded => write!(f, "Concluded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_phase_can_transition_to() {
        assert!(MatchPhase::Lobby.can_transition_to(MatchPhase::InProgress));
        assert!(MatchPhase::InProgress.can_transition_to(MatchPhase::Concluded));
        assert!(MatchPhase::Concluded.can_transition_to(MatchPhase::Lobby));
        assert!(MatchPhase::InProgress.can_transition_to(MatchPhase::Lobby));

        assert!(!MatchPhase::Lobby.can_transition_to(MatchPhase::Concluded));
        assert!(!MatchPhase::Lobby.can_transition_to(MatchPhase::Lobby));
        assert!(!MatchPhase::Concluded.can_transition_to(MatchPhase::InProgress));
    }

    #[test]
    fn test_match_phase_predicates() {
        assert!(MatchPhase::Lobby.accepts_fleets());
        assert!(!MatchPhase::InProgress.accepts_fleets());
        assert!(MatchPhase::InProgress.is_active());
        assert!(!MatchPhase::Concluded.is_active());
    }

    #[test]
    fn test_fleet_rules_default_is_classic_fleet() {
        let rules = FleetRules::default();
        assert_eq!(rules.board_size, 10);
        assert_eq!(rules.total_cells(), 17);
        assert!(rules.check().is_ok());
    }

    #[test]
    fn test_fleet_rules_new_rejects_ship_longer_than_board() {
        let result = FleetRules::new(4, vec![5]);
        assert!(matches!(result, Err(GameError::InvalidRules(_))));
    }

    #[test]
    fn test_fleet_rules_new_rejects_overfull_board() {
        let result = FleetRules::new(2, vec![2, 2, 1]);
        assert!(matches!(result, Err(GameError::InvalidRules(_))));
    }

    #[test]
    fn test_fleet_rules_new_rejects_empty_fleet() {
        assert!(FleetRules::new(10, Vec::new()).is_err());
        assert!(FleetRules::new(0, vec![1]).is_err());
    }

    #[test]
    fn test_in_bounds_is_one_based_inclusive() {
        let rules = FleetRules::default();
        assert!(rules.in_bounds(1, 1));
        assert!(rules.in_bounds(10, 10));
        assert!(!rules.in_bounds(0, 5));
        assert!(!rules.in_bounds(5, 11));
        assert!(!rules.in_bounds(-1, -1));
    }
}
