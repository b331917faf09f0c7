//! The coordination service: one lock around every piece of shared state.
//!
//! Handlers never see the registry, the match, or the ledger directly.
//! Each public method takes the lock once and holds it for its whole
//! read-check-write sequence, including the announcements it makes. An
//! announcement only pushes onto an unbounded outbox, so holding the lock
//! while sending cannot block on a slow or dead socket.

use broadside_game::{FleetOutcome, FleetRules, GameError, MatchState, generate_fleet};
use broadside_ledger::ScoreLedger;
use broadside_protocol::{Boat, Role, ServerMessage};
use broadside_session::{Binding, IdentityRegistry, Notifier, Outbox, SessionError};
use broadside_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::BroadsideError;

struct Shared {
    registry: IdentityRegistry,
    game: MatchState,
    ledger: ScoreLedger,
}

/// Owns the registry, the match state, and the score ledger.
pub struct Coordinator {
    shared: Mutex<Shared>,
}

impl Coordinator {
    pub fn new(rules: FleetRules, ledger: ScoreLedger) -> Self {
        Self {
            shared: Mutex::new(Shared {
                registry: IdentityRegistry::new(),
                game: MatchState::new(rules),
                ledger,
            }),
        }
    }

    /// Registers `name` on `conn` and tells it its role and the scores.
    ///
    /// A PLAYER request takes a free seat if there is one and becomes an
    /// OBSERVER otherwise. A name that still holds a seat from an earlier
    /// connection gets that seat back whatever role it asked for.
    pub async fn join(
        &self,
        conn: ConnectionId,
        outbox: &Outbox,
        name: &str,
        requested: Role,
    ) -> Result<Role, BroadsideError> {
        let mut guard = self.shared.lock().await;
        let Shared {
            registry,
            game,
            ledger,
        } = &mut *guard;

        if registry.is_connected(name) {
            return Err(BroadsideError::NameInUse(name.to_string()));
        }

        let slot = match game.order().slot_of(name) {
            Some(slot) => Some(slot),
            None if requested == Role::Player => game.seat(name),
            None => None,
        };
        let role = if slot.is_some() {
            Role::Player
        } else {
            Role::Observer
        };
        registry.bind(name, Binding::new(role, conn, outbox.clone()));

        let assigned = match slot {
            Some(slot) => ServerMessage::AssignedPlayer(slot),
            None => ServerMessage::AssignedObserver,
        };
        tell(registry, name, assigned);
        tell(registry, name, ServerMessage::Scoreboard(ledger.scoreboard().clone()));
        if role == Role::Player && game.phase().is_active() {
            announce_turn_to(registry, game, name);
        }

        tracing::info!(
            %conn,
            name = %name,
            requested = %requested,
            assigned = %role,
            connected = registry.len(),
            "joined"
        );
        Ok(role)
    }

    /// Stores a player's fleet, placing a random one if none was sent.
    /// Starts the match when this is the second fleet.
    pub async fn ready(
        &self,
        conn: ConnectionId,
        name: &str,
        fleet: Option<Vec<Boat>>,
    ) -> Result<(), BroadsideError> {
        let mut guard = self.shared.lock().await;
        let Shared { registry, game, .. } = &mut *guard;

        require_owner(registry, conn, name)?;

        let placed = fleet.is_none();
        let fleet = match fleet {
            Some(fleet) => fleet,
            None => place_fleet(game.rules())?,
        };
        let outcome = game.submit_fleet(name, fleet)?;

        if placed {
            tell(registry, name, ServerMessage::info("fleet placed"));
        }
        match outcome {
            FleetOutcome::Waiting => {
                tell(registry, name, ServerMessage::info("waiting for opponent"));
            }
            FleetOutcome::Started => {
                registry.send_all(&ServerMessage::Start);
                announce_turns(registry, game);
            }
        }
        Ok(())
    }

    /// Fires one shot for `name` and announces everything it caused.
    pub async fn play(
        &self,
        conn: ConnectionId,
        name: &str,
        x: i64,
        y: i64,
    ) -> Result<(), BroadsideError> {
        let mut guard = self.shared.lock().await;
        let Shared {
            registry,
            game,
            ledger,
        } = &mut *guard;

        require_owner(registry, conn, name)?;
        let shot = game.resolve(name, x, y)?;

        tell(registry, &shot.shooter, ServerMessage::Result { hit: shot.hit });
        let echo = ServerMessage::OpponentPlayed {
            x: shot.x,
            y: shot.y,
            hit: shot.hit,
        };
        registry.send_observers(&echo);
        tell(registry, &shot.opponent, echo);

        if !shot.victory {
            announce_turns(registry, game);
            return Ok(());
        }

        tell(registry, &shot.shooter, ServerMessage::Win);
        tell(registry, &shot.opponent, ServerMessage::Lose);

        ledger.record_result(&shot.shooter, &shot.opponent);
        if let Err(e) = ledger.save().await {
            tracing::warn!(error = %e, "scores not persisted");
        }
        registry.send_all(&ServerMessage::Scoreboard(ledger.scoreboard().clone()));
        registry.send_observers(&ServerMessage::info(format!("{} wins", shot.shooter)));

        game.reset_for_next_match(|n| registry.is_connected(n));
        let seated: Vec<String> = game.order().names().map(str::to_string).collect();
        for player in &seated {
            tell(registry, player, ServerMessage::info("send READY to start a new match"));
        }
        Ok(())
    }

    /// Moves a seated player with a recorded fleet onto `conn` and sends
    /// it the full match state.
    ///
    /// Reconnection never creates a seat. If an older connection still
    /// holds the name it loses its routing to the new one.
    pub async fn reconnect(
        &self,
        conn: ConnectionId,
        outbox: &Outbox,
        name: &str,
    ) -> Result<(), BroadsideError> {
        let mut guard = self.shared.lock().await;
        let Shared {
            registry,
            game,
            ledger,
        } = &mut *guard;

        let snapshot = game.snapshot_for(name)?;
        if let Some(previous) = registry.bind(name, Binding::new(Role::Player, conn, outbox.clone())) {
            tracing::info!(name = %name, old = %previous.conn, new = %conn, "identity moved");
        }

        tell(registry, name, ServerMessage::State(Box::new(snapshot)));
        tell(registry, name, ServerMessage::Scoreboard(ledger.scoreboard().clone()));
        if game.phase().is_active() {
            announce_turn_to(registry, game, name);
        }
        tracing::info!(%conn, name = %name, "reconnected");
        Ok(())
    }

    /// Drops the binding `conn` holds for `name`.
    ///
    /// Does nothing if `name` has since moved to another connection. A
    /// player who leaves the lobby without a fleet gives up the seat; one
    /// with a fleet keeps it so it can reconnect.
    pub async fn disconnect(&self, conn: ConnectionId, name: &str) {
        let mut guard = self.shared.lock().await;
        let Shared { registry, game, .. } = &mut *guard;

        let binding = match registry.unregister(name, conn) {
            Ok(binding) => binding,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "nothing to unregister");
                return;
            }
        };
        tracing::info!(%conn, name = %name, connected = registry.len(), "left");
        if binding.role != Role::Player {
            return;
        }

        let opponent = game.order().opponent_of(name).map(str::to_string);
        game.release_if_unready(name);
        if let Some(opponent) = opponent {
            tell(registry, &opponent, ServerMessage::info(format!("{name} disconnected")));
        }
    }

    #[cfg(test)]
    async fn phase(&self) -> broadside_game::MatchPhase {
        self.shared.lock().await.game.phase()
    }
}

/// Random placement. Kept synchronous so the thread-local RNG never
/// lives across an await point.
fn place_fleet(rules: &FleetRules) -> Result<Vec<Boat>, GameError> {
    generate_fleet(rules, &mut rand::rng())
}

/// Targeted send whose failure is logged and ignored.
fn tell(registry: &IdentityRegistry, name: &str, message: ServerMessage) {
    if let Err(e) = registry.send_to(name, message) {
        tracing::debug!(name = %name, error = %e, "delivery dropped");
    }
}

/// `YOUR_TURN` to the mover and `WAIT` to the other seat.
fn announce_turns(registry: &IdentityRegistry, game: &MatchState) {
    for name in game.order().names() {
        announce_turn_to(registry, game, name);
    }
}

fn announce_turn_to(registry: &IdentityRegistry, game: &MatchState, name: &str) {
    let message = if game.current_mover() == Some(name) {
        ServerMessage::YourTurn
    } else {
        ServerMessage::Wait
    };
    tell(registry, name, message);
}

/// The caller's connection must still own `name`.
///
/// Seat and phase checks belong to the match state, which reports them in
/// the order a client should see them.
fn require_owner(
    registry: &IdentityRegistry,
    conn: ConnectionId,
    name: &str,
) -> Result<(), BroadsideError> {
    let binding = registry
        .get(name)
        .ok_or_else(|| SessionError::NotBound(name.to_string()))?;
    if binding.conn != conn {
        return Err(SessionError::StaleConnection {
            name: name.to_string(),
            conn,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use broadside_game::MatchPhase;
    use broadside_protocol::Scoreboard;
    use tokio::sync::mpsc;

    use super::*;

    type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

    struct Client {
        conn: ConnectionId,
        outbox: Outbox,
        inbox: Inbox,
    }

    impl Client {
        fn new(id: u64) -> Self {
            let (outbox, inbox) = mpsc::unbounded_channel();
            Self {
                conn: ConnectionId::new(id),
                outbox,
                inbox,
            }
        }

        fn drain(&mut self) -> Vec<ServerMessage> {
            let mut out = Vec::new();
            while let Ok(m) = self.inbox.try_recv() {
                out.push(m);
            }
            out
        }
    }

    fn tiny() -> Coordinator {
        Coordinator::new(FleetRules::new(3, vec![2]).unwrap(), ScoreLedger::in_memory())
    }

    async fn seated_pair(c: &Coordinator) -> (Client, Client) {
        let mut alice = Client::new(1);
        let mut bob = Client::new(2);
        c.join(alice.conn, &alice.outbox, "alice", Role::Player).await.unwrap();
        c.join(bob.conn, &bob.outbox, "bob", Role::Player).await.unwrap();
        alice.drain();
        bob.drain();
        (alice, bob)
    }

    async fn started_pair(c: &Coordinator) -> (Client, Client) {
        let (mut alice, mut bob) = seated_pair(c).await;
        c.ready(alice.conn, "alice", Some(vec![Boat::new(1, 1, 2, true)])).await.unwrap();
        c.ready(bob.conn, "bob", Some(vec![Boat::new(1, 1, 2, false)])).await.unwrap();
        alice.drain();
        bob.drain();
        (alice, bob)
    }

    #[tokio::test]
    async fn test_join_assigns_slots_then_observer() {
        let c = tiny();
        let mut alice = Client::new(1);
        let mut carol = Client::new(3);

        assert_eq!(c.join(alice.conn, &alice.outbox, "alice", Role::Player).await.unwrap(), Role::Player);
        let bob = Client::new(2);
        c.join(bob.conn, &bob.outbox, "bob", Role::Player).await.unwrap();
        assert_eq!(c.join(carol.conn, &carol.outbox, "carol", Role::Player).await.unwrap(), Role::Observer);

        assert_eq!(
            alice.drain(),
            vec![ServerMessage::AssignedPlayer(0), ServerMessage::Scoreboard(Scoreboard::new())]
        );
        assert_eq!(carol.drain()[0], ServerMessage::AssignedObserver);
    }

    #[tokio::test]
    async fn test_join_live_name_is_rejected() {
        let c = tiny();
        let (_alice, _bob) = seated_pair(&c).await;
        let imposter = Client::new(5);

        let result = c.join(imposter.conn, &imposter.outbox, "alice", Role::Observer).await;

        assert!(matches!(result, Err(BroadsideError::NameInUse(_))));
    }

    #[tokio::test]
    async fn test_ready_second_fleet_starts_match() {
        let c = tiny();
        let (mut alice, mut bob) = seated_pair(&c).await;

        c.ready(alice.conn, "alice", Some(vec![Boat::new(1, 1, 2, true)])).await.unwrap();
        assert_eq!(alice.drain(), vec![ServerMessage::info("waiting for opponent")]);

        c.ready(bob.conn, "bob", None).await.unwrap();

        assert_eq!(alice.drain(), vec![ServerMessage::Start, ServerMessage::YourTurn]);
        assert_eq!(
            bob.drain(),
            vec![ServerMessage::info("fleet placed"), ServerMessage::Start, ServerMessage::Wait]
        );
        assert_eq!(c.phase().await, MatchPhase::InProgress);
    }

    #[tokio::test]
    async fn test_ready_from_observer_is_rejected() {
        let c = tiny();
        let (_alice, _bob) = seated_pair(&c).await;
        let carol = Client::new(3);
        c.join(carol.conn, &carol.outbox, "carol", Role::Observer).await.unwrap();

        let result = c.ready(carol.conn, "carol", None).await;

        assert_eq!(result.unwrap_err().to_string(), "carol is not a player");
    }

    #[tokio::test]
    async fn test_play_out_of_turn_changes_nothing() {
        let c = tiny();
        let (mut alice, mut bob) = started_pair(&c).await;

        let err = c.play(bob.conn, "bob", 1, 1).await.unwrap_err();

        assert_eq!(err.to_string(), "not your turn");
        assert!(alice.drain().is_empty());
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_play_miss_announces_and_passes_turn() {
        let c = tiny();
        let (mut alice, mut bob) = started_pair(&c).await;

        c.play(alice.conn, "alice", 3, 3).await.unwrap();

        assert_eq!(alice.drain(), vec![ServerMessage::Result { hit: false }, ServerMessage::Wait]);
        assert_eq!(
            bob.drain(),
            vec![ServerMessage::OpponentPlayed { x: 3, y: 3, hit: false }, ServerMessage::YourTurn]
        );
    }

    #[tokio::test]
    async fn test_play_victory_records_and_resets() {
        let c = tiny();
        let (mut alice, mut bob) = started_pair(&c).await;

        c.play(alice.conn, "alice", 1, 1).await.unwrap();
        c.play(bob.conn, "bob", 3, 3).await.unwrap();
        alice.drain();
        bob.drain();
        c.play(alice.conn, "alice", 1, 2).await.unwrap();

        let alice_msgs = alice.drain();
        assert_eq!(alice_msgs[0], ServerMessage::Result { hit: true });
        assert_eq!(alice_msgs[1], ServerMessage::Win);
        let ServerMessage::Scoreboard(board) = &alice_msgs[2] else {
            panic!("expected scoreboard, got {:?}", alice_msgs[2]);
        };
        assert_eq!(board["alice"].wins, 1);
        assert_eq!(board["bob"].losses, 1);
        assert_eq!(alice_msgs[3], ServerMessage::info("send READY to start a new match"));

        let bob_msgs = bob.drain();
        assert_eq!(bob_msgs[0], ServerMessage::OpponentPlayed { x: 1, y: 2, hit: true });
        assert_eq!(bob_msgs[1], ServerMessage::Lose);
        assert_eq!(c.phase().await, MatchPhase::Lobby);
    }

    #[tokio::test]
    async fn test_reconnect_unknown_name_fails() {
        let c = tiny();
        let stranger = Client::new(7);

        let err = c.reconnect(stranger.conn, &stranger.outbox, "bob").await.unwrap_err();

        assert_eq!(err.to_string(), "unknown player to reconnect");
    }

    #[tokio::test]
    async fn test_reconnect_rebinds_and_sends_state() {
        let c = tiny();
        let (mut alice, bob) = started_pair(&c).await;
        c.disconnect(bob.conn, "bob").await;
        assert_eq!(alice.drain(), vec![ServerMessage::info("bob disconnected")]);

        let mut bob2 = Client::new(20);
        c.reconnect(bob2.conn, &bob2.outbox, "bob").await.unwrap();

        let msgs = bob2.drain();
        assert!(matches!(&msgs[0], ServerMessage::State(s) if s.players[1].as_deref() == Some("bob")));
        assert!(matches!(msgs[1], ServerMessage::Scoreboard(_)));
        assert_eq!(msgs[2], ServerMessage::Wait);

        // The old connection no longer speaks for bob.
        c.disconnect(bob.conn, "bob").await;
        c.play(alice.conn, "alice", 3, 3).await.unwrap();
        assert!(bob2.drain().contains(&ServerMessage::YourTurn));
    }

    #[tokio::test]
    async fn test_disconnect_in_lobby_without_fleet_frees_seat() {
        let c = tiny();
        let (_alice, bob) = seated_pair(&c).await;
        c.disconnect(bob.conn, "bob").await;

        let mut dave = Client::new(4);
        c.join(dave.conn, &dave.outbox, "dave", Role::Player).await.unwrap();

        assert_eq!(dave.drain()[0], ServerMessage::AssignedPlayer(1));
    }

    #[tokio::test]
    async fn test_play_in_lobby_reports_phase_before_role() {
        let c = tiny();
        let (_alice, _bob) = seated_pair(&c).await;
        let carol = Client::new(3);
        c.join(carol.conn, &carol.outbox, "carol", Role::Observer).await.unwrap();

        let err = c.play(carol.conn, "carol", 1, 1).await.unwrap_err();

        assert_eq!(err.to_string(), "match is not in progress");
    }

    #[tokio::test]
    async fn test_play_by_observer_during_match_is_rejected() {
        let c = tiny();
        let (mut alice, _bob) = started_pair(&c).await;
        let carol = Client::new(3);
        c.join(carol.conn, &carol.outbox, "carol", Role::Observer).await.unwrap();

        let err = c.play(carol.conn, "carol", 1, 1).await.unwrap_err();

        assert_eq!(err.to_string(), "carol is not a player");
        assert!(alice.drain().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_shots_accept_exactly_one() {
        for _ in 0..50 {
            let c = Arc::new(tiny());
            let (mut alice, mut bob) = started_pair(&c).await;

            let shots = [(3, 3), (2, 2)].map(|(x, y)| {
                let c = Arc::clone(&c);
                let conn = alice.conn;
                tokio::spawn(async move { c.play(conn, "alice", x, y).await })
            });
            let mut accepted = 0;
            for shot in shots {
                match shot.await.unwrap() {
                    Ok(()) => accepted += 1,
                    Err(e) => assert_eq!(e.to_string(), "not your turn"),
                }
            }

            assert_eq!(accepted, 1);
            let results = alice
                .drain()
                .into_iter()
                .filter(|m| matches!(m, ServerMessage::Result { .. }))
                .count();
            assert_eq!(results, 1);
            assert_eq!(bob.drain().iter().filter(|m| **m == ServerMessage::YourTurn).count(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fleets_start_match_once() {
        for _ in 0..50 {
            let c = Arc::new(tiny());
            let (mut alice, mut bob) = seated_pair(&c).await;

            let fleets = [
                (alice.conn, "alice", Boat::new(1, 1, 2, true)),
                (bob.conn, "bob", Boat::new(1, 1, 2, false)),
            ]
            .map(|(conn, name, boat)| {
                let c = Arc::clone(&c);
                tokio::spawn(async move { c.ready(conn, name, Some(vec![boat])).await })
            });
            for fleet in fleets {
                fleet.await.unwrap().unwrap();
            }

            let alice_msgs = alice.drain();
            let bob_msgs = bob.drain();
            let starts = alice_msgs
                .iter()
                .chain(&bob_msgs)
                .filter(|m| **m == ServerMessage::Start)
                .count();
            assert_eq!(starts, 2, "one START per seat");
            let turns = alice_msgs
                .iter()
                .chain(&bob_msgs)
                .filter(|m| **m == ServerMessage::YourTurn)
                .count();
            assert_eq!(turns, 1);
            assert_eq!(c.phase().await, MatchPhase::InProgress);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fleets_from_one_player_count_once() {
        let c = Arc::new(tiny());
        let (alice, _bob) = seated_pair(&c).await;

        let fleets = [Boat::new(1, 1, 2, true), Boat::new(2, 2, 2, false)].map(|boat| {
            let c = Arc::clone(&c);
            let conn = alice.conn;
            tokio::spawn(async move { c.ready(conn, "alice", Some(vec![boat])).await })
        });
        let mut accepted = 0;
        for fleet in fleets {
            match fleet.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(e) => assert_eq!(e.to_string(), "fleet already submitted"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(c.phase().await, MatchPhase::Lobby);
    }
}
