//! The match state machine and the shot resolver.
//!
//! `MatchState` owns everything about the current match: the seats, each
//! seated player's fleet and shot log, whose turn it is, and the phase.
//! It does no I/O and takes no locks; the caller serializes access.

use std::collections::{BTreeMap, HashMap};

use broadside_protocol::{Boat, MatchSnapshot, SNAPSHOT_VERSION, Shot};

use crate::fleet::{is_hit, validate_fleet};
use crate::{FleetRules, GameError, MatchPhase, PlayerOrder};

/// What a fleet submission did to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetOutcome {
    /// Stored; the other seat has not submitted yet.
    Waiting,
    /// This was the second fleet. The match is now in progress and slot
    /// `0` has the first move.
    Started,
}

/// A resolved shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotOutcome {
    pub shooter: String,
    pub opponent: String,
    pub x: u8,
    pub y: u8,
    pub hit: bool,
    /// The shot sank the last opposing cell. The match is now concluded.
    pub victory: bool,
}

/// Shared turn-based state for the one match the server runs.
#[derive(Debug)]
pub struct MatchState {
    rules: FleetRules,
    order: PlayerOrder,
    current_index: usize,
    phase: MatchPhase,
    fleets: HashMap<String, Vec<Boat>>,
    shots: HashMap<String, Vec<Shot>>,
}

impl MatchState {
    pub fn new(rules: FleetRules) -> Self {
        Self {
            rules,
            order: PlayerOrder::new(),
            current_index: 0,
            phase: MatchPhase::Lobby,
            fleets: HashMap::new(),
            shots: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &FleetRules {
        &self.rules
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn order(&self) -> &PlayerOrder {
        &self.order
    }

    /// Seats a player, or returns the slot it already holds.
    ///
    /// Returns `None` when both seats are taken by others; the caller
    /// then treats the identity as an observer.
    pub fn seat(&mut self, name: &str) -> Option<usize> {
        let slot = self.order.seat(name)?;
        tracing::debug!(name = %name, slot, "player seated");
        Some(slot)
    }

    /// Frees the seat of a player who left before submitting a fleet.
    ///
    /// A player with a fleet keeps the seat so that it can reconnect.
    /// Returns `true` if the seat was freed.
    pub fn release_if_unready(&mut self, name: &str) -> bool {
        if !self.phase.accepts_fleets() || self.fleets.contains_key(name) {
            return false;
        }
        let freed = self.order.vacate(name).is_some();
        if freed {
            tracing::debug!(name = %name, "seat released");
        }
        freed
    }

    /// Stores a seated player's fleet and starts the match once both
    /// seats have one.
    ///
    /// # Errors
    /// - [`GameError::AlreadyStarted`]: not in the lobby.
    /// - [`GameError::NotAPlayer`]: `name` holds no seat.
    /// - [`GameError::FleetAlreadySubmitted`]: `name` already has a fleet.
    /// - [`GameError::InvalidFleet`]: the fleet breaks the rules.
    pub fn submit_fleet(
        &mut self,
        name: &str,
        fleet: Vec<Boat>,
    ) -> Result<FleetOutcome, GameError> {
        if !self.phase.accepts_fleets() {
            return Err(GameError::AlreadyStarted);
        }
        if !self.order.contains(name) {
            return Err(GameError::NotAPlayer(name.to_string()));
        }
        if self.fleets.contains_key(name) {
            return Err(GameError::FleetAlreadySubmitted);
        }
        validate_fleet(&self.rules, &fleet)?;

        self.fleets.insert(name.to_string(), fleet);
        self.shots.entry(name.to_string()).or_default();
        tracing::info!(name = %name, "fleet submitted");

        let both_ready =
            self.order.is_full() && self.order.names().all(|n| self.fleets.contains_key(n));
        if both_ready {
            self.set_phase(MatchPhase::InProgress);
            self.current_index = 0;
            tracing::info!(
                first = self.order.get(0).unwrap_or_default(),
                second = self.order.get(1).unwrap_or_default(),
                "match started"
            );
            Ok(FleetOutcome::Started)
        } else {
            Ok(FleetOutcome::Waiting)
        }
    }

    /// The identity allowed to shoot right now.
    pub fn current_mover(&self) -> Option<&str> {
        if !self.phase.is_active() {
            return None;
        }
        self.order.get(self.current_index)
    }

    /// Resolves one shot.
    ///
    /// Checks, in order and without side effects on failure: the match
    /// is in progress, `shooter` is the current mover, `(x, y)` is on
    /// the board, and `shooter` has not fired there before. Then tests
    /// the opponent's fleet, logs the shot, and either concludes the
    /// match or passes the turn.
    ///
    /// Victory comes when the shooter's hit count reaches the number of
    /// cells in the opponent's submitted fleet.
    pub fn resolve(
        &mut self,
        shooter: &str,
        x: i64,
        y: i64,
    ) -> Result<ShotOutcome, GameError> {
        if !self.phase.is_active() {
            return Err(GameError::NotInProgress);
        }
        let slot = self
            .order
            .slot_of(shooter)
            .ok_or_else(|| GameError::NotAPlayer(shooter.to_string()))?;
        if slot != self.current_index {
            return Err(GameError::NotYourTurn);
        }
        let (x, y) = match (u8::try_from(x), u8::try_from(y)) {
            (Ok(cx), Ok(cy)) if self.rules.in_bounds(x, y) => (cx, cy),
            _ => {
                return Err(GameError::OutOfBounds {
                    x,
                    y,
                    size: self.rules.board_size,
                });
            }
        };
        let log = self.shots.get(shooter).map(Vec::as_slice).unwrap_or_default();
        if log.iter().any(|s| s.x == x && s.y == y) {
            return Err(GameError::AlreadyFired { x, y });
        }

        let opponent = self
            .order
            .get(1 - slot)
            .ok_or(GameError::NotInProgress)?
            .to_string();
        let target = self
            .fleets
            .get(&opponent)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let hit = is_hit(target, x, y);
        let needed: u32 = target.iter().map(|b| u32::from(b.length)).sum();

        let log = self.shots.entry(shooter.to_string()).or_default();
        log.push(Shot { x, y, hit });
        let hits = log.iter().filter(|s| s.hit).count();
        let victory = u32::try_from(hits).is_ok_and(|h| h >= needed);

        if victory {
            self.set_phase(MatchPhase::Concluded);
            tracing::info!(winner = %shooter, loser = %opponent, "match concluded");
        } else {
            self.current_index = 1 - self.current_index;
        }
        tracing::debug!(shooter = %shooter, x, y, hit, "shot resolved");

        Ok(ShotOutcome {
            shooter: shooter.to_string(),
            opponent,
            x,
            y,
            hit,
            victory,
        })
    }

    /// Snapshot for a reconnecting player.
    ///
    /// # Errors
    /// [`GameError::UnknownPlayer`] unless `name` has a recorded fleet.
    pub fn snapshot_for(&self, name: &str) -> Result<MatchSnapshot, GameError> {
        if !self.fleets.contains_key(name) {
            return Err(GameError::UnknownPlayer(name.to_string()));
        }
        Ok(self.snapshot())
    }

    /// A point-in-time copy of the whole match.
    pub fn snapshot(&self) -> MatchSnapshot {
        let fleets: BTreeMap<_, _> = self
            .fleets
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let shots: BTreeMap<_, _> = self
            .shots
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        MatchSnapshot {
            version: SNAPSHOT_VERSION,
            players: self.order.to_array(),
            current_index: self.current_index,
            over: self.phase == MatchPhase::Concluded,
            fleets,
            shots,
        }
    }

    fn set_phase(&mut self, next: MatchPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal phase transition {} -> {next}",
            self.phase
        );
        tracing::debug!(from = %self.phase, to = %next, "phase changed");
        self.phase = next;
    }

    /// Clears fleets and shot logs and returns to the lobby.
    ///
    /// Seats whose holder fails `retain` are freed; the rest keep their
    /// slot for the next match.
    pub fn reset_for_next_match(&mut self, retain: impl Fn(&str) -> bool) {
        let leaving: Vec<String> = self
            .order
            .names()
            .filter(|&n| !retain(n))
            .map(str::to_string)
            .collect();
        for name in &leaving {
            self.order.vacate(name);
        }
        self.fleets.clear();
        self.shots.clear();
        self.current_index = 0;
        self.set_phase(MatchPhase::Lobby);
        tracing::info!(released = leaving.len(), "match reset to lobby");
    }
}
