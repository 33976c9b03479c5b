pub mod tickets;

pub use tickets::{allocate, TicketAllocation, TicketRange, MAX_POT};

use crate::config::EngineConfig;
use crate::error::{JackpotError, Result};
use crate::events::{EventBus, RoundEvent};
use crate::player::{Player, PlayerId};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Notify;

/// Creation time in nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub i64);

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a round. Ordered, and only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoundState {
    Idle,
    InProgress,
    Ended,
    WinnerPicked,
}

impl RoundState {
    pub fn accepts_bets(self) -> bool {
        self < RoundState::Ended
    }

    /// The only state this one may move to.
    pub fn next(self) -> Option<RoundState> {
        match self {
            RoundState::Idle => Some(RoundState::InProgress),
            RoundState::InProgress => Some(RoundState::Ended),
            RoundState::Ended => Some(RoundState::WinnerPicked),
            RoundState::WinnerPicked => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

impl Wager {
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            created_at: Utc::now(),
        }
    }
}

/// A player's wagers within one round, plus their ticket range once allocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub player: Player,
    pub wagers: Vec<Wager>,
    pub start_ticket: u64,
    pub end_ticket: u64,
    pub tickets: u64,
    pub share: f64,
}

impl PlayerPosition {
    fn new(player: Player, wager: Wager) -> Self {
        Self {
            player,
            wagers: vec![wager],
            start_ticket: 0,
            end_ticket: 0,
            tickets: 0,
            share: 0.0,
        }
    }

    pub fn total_bet(&self) -> f64 {
        self.wagers.iter().map(|w| w.amount).sum()
    }

    fn owns(&self, ticket: u64) -> bool {
        self.tickets > 0 && self.start_ticket <= ticket && ticket <= self.end_ticket
    }
}

/// Read-only copy of a round, as carried by events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub id: RoundId,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub state: RoundState,
    pub positions: Vec<PlayerPosition>,
    pub total_pot: f64,
    pub ticket_space: u64,
}

/// Size of a round at one instant, without the positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub id: RoundId,
    pub state: RoundState,
    pub player_count: usize,
    pub total_pot: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetReceipt {
    pub round_id: RoundId,
    pub player_total: f64,
    pub total_pot: f64,
    pub player_count: usize,
    pub quorum_reached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub round_id: RoundId,
    pub winner: Player,
    pub winning_ticket: u64,
    pub total_pot: f64,
    /// Pot minus the winner's own stake.
    pub payout: f64,
}

/// Everything the round lock guards.
#[derive(Debug)]
struct Book {
    state: RoundState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    positions: Vec<PlayerPosition>,
    index: HashMap<PlayerId, usize>,
    /// Running sum of every accepted wager.
    pot: f64,
}

impl Book {
    fn total_pot(&self) -> f64 {
        self.pot
    }

    /// Step to the immediate successor state, stamping start/end times.
    fn advance(&mut self, next: RoundState) -> bool {
        if self.state.next() != Some(next) {
            return false;
        }
        self.state = next;
        match next {
            RoundState::InProgress => self.started_at = Some(Utc::now()),
            RoundState::Ended => self.ended_at = Some(Utc::now()),
            _ => {}
        }
        true
    }

    fn allocate(&mut self) -> Result<TicketAllocation> {
        let totals: Vec<(PlayerId, f64)> = self
            .positions
            .iter()
            .map(|p| (p.player.id, p.total_bet()))
            .collect();
        let allocation = allocate(&totals)?;

        for (position, range) in self.positions.iter_mut().zip(&allocation.ranges) {
            position.start_ticket = range.start;
            position.end_ticket = range.end;
            position.tickets = range.tickets;
            position.share = range.share;
        }
        Ok(allocation)
    }
}

/// One betting round. All mutation goes through a single lock, and events
/// are published only after it is released.
#[derive(Debug)]
pub struct Round {
    id: RoundId,
    created_at: DateTime<Utc>,
    duration_seconds: u64,
    quorum: usize,
    book: Mutex<Book>,
    wake: Notify,
    events: EventBus,
}

impl Round {
    pub fn new(id: RoundId, config: &EngineConfig, events: EventBus) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            duration_seconds: config.round_duration_secs,
            quorum: config.quorum,
            book: Mutex::new(Book {
                state: RoundState::Idle,
                started_at: None,
                ended_at: None,
                positions: Vec::new(),
                index: HashMap::new(),
                pot: 0.0,
            }),
            wake: Notify::new(),
            events,
        }
    }

    pub fn id(&self) -> RoundId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> RoundState {
        self.book.lock().state
    }

    pub fn player_count(&self) -> usize {
        self.book.lock().positions.len()
    }

    pub fn position(&self, player_id: PlayerId) -> Option<PlayerPosition> {
        let book = self.book.lock();
        book.index.get(&player_id).map(|&i| book.positions[i].clone())
    }

    pub fn total_pot(&self) -> f64 {
        self.book.lock().total_pot()
    }

    pub fn total_per_player(&self) -> HashMap<PlayerId, f64> {
        self.book
            .lock()
            .positions
            .iter()
            .map(|p| (p.player.id, p.total_bet()))
            .collect()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let book = self.book.lock();
        self.snapshot_locked(&book)
    }

    fn snapshot_locked(&self, book: &Book) -> RoundSnapshot {
        let total_pot = book.total_pot();
        RoundSnapshot {
            id: self.id,
            created_at: self.created_at,
            started_at: book.started_at,
            ended_at: book.ended_at,
            duration_seconds: self.duration_seconds,
            state: book.state,
            positions: book.positions.clone(),
            total_pot,
            ticket_space: tickets::ticket_space(total_pot).unwrap_or_default(),
        }
    }

    fn summary_locked(&self, book: &Book) -> RoundSummary {
        RoundSummary {
            id: self.id,
            state: book.state,
            player_count: book.positions.len(),
            total_pot: book.total_pot(),
        }
    }

    /// Record a wager, opening the player's position if needed.
    pub fn place_bet(&self, player: &Player, amount: f64) -> Result<BetReceipt> {
        if !amount.is_finite() || amount <= 0.0 || amount > MAX_POT {
            tracing::warn!(
                "Round {}: rejected wager {} from player {}",
                self.id,
                amount,
                player.id
            );
            return Err(JackpotError::InvalidWager(amount));
        }

        let (receipt, summary) = {
            let mut book = self.book.lock();
            if !book.state.accepts_bets() {
                return Err(JackpotError::BettingClosed { round_id: self.id });
            }

            if book.pot + amount > MAX_POT {
                tracing::warn!(
                    "Round {}: wager {} from player {} would push the pot past {}",
                    self.id,
                    amount,
                    player.id,
                    MAX_POT
                );
                return Err(JackpotError::InvalidWager(amount));
            }

            let wager = Wager::new(amount);
            let player_total = match book.index.get(&player.id).copied() {
                Some(i) => {
                    book.positions[i].wagers.push(wager);
                    book.positions[i].total_bet()
                }
                None => {
                    let i = book.positions.len();
                    book.positions.push(PlayerPosition::new(player.clone(), wager));
                    book.index.insert(player.id, i);
                    amount
                }
            };
            book.pot += amount;

            let summary = self.summary_locked(&book);
            let receipt = BetReceipt {
                round_id: self.id,
                player_total,
                total_pot: summary.total_pot,
                player_count: summary.player_count,
                quorum_reached: summary.player_count >= self.quorum,
            };
            (receipt, summary)
        };

        tracing::info!(
            "Round {}: new bet ${:.2} from player {} (pot ${:.2})",
            self.id,
            amount,
            player.id,
            receipt.total_pot
        );

        let idle = summary.state == RoundState::Idle;
        self.events.publish(RoundEvent::BetPlaced {
            round: summary,
            player: player.clone(),
            amount,
        });

        if idle && receipt.quorum_reached {
            tracing::info!(
                "Round {}: {} players in, ready to start",
                self.id,
                receipt.player_count
            );
            self.wake.notify_one();
        }

        Ok(receipt)
    }

    /// Resolves once the round has reached quorum or was started directly.
    pub async fn ready(&self) {
        self.wake.notified().await
    }

    /// Step to the next lifecycle state. Only `InProgress` and `Ended` can be
    /// set directly; `WinnerPicked` is reached by drawing a winner.
    pub fn set_state(&self, next: RoundState) -> Result<()> {
        let moved = match next {
            RoundState::InProgress => self.begin().is_some(),
            RoundState::Ended => self.close().is_some(),
            RoundState::Idle | RoundState::WinnerPicked => false,
        };

        if !moved {
            return Err(JackpotError::invalid_state(format!(
                "round {} cannot move from {:?} to {:?}",
                self.id,
                self.state(),
                next
            )));
        }
        Ok(())
    }

    /// Idle -> InProgress. `None` if the round had already started.
    pub(crate) fn begin(&self) -> Option<RoundSnapshot> {
        let snapshot = {
            let mut book = self.book.lock();
            if !book.advance(RoundState::InProgress) {
                return None;
            }
            self.snapshot_locked(&book)
        };
        self.wake.notify_one();
        Some(snapshot)
    }

    /// InProgress -> Ended. `None` unless the round was in progress.
    pub(crate) fn close(&self) -> Option<RoundSnapshot> {
        let mut book = self.book.lock();
        if !book.advance(RoundState::Ended) {
            return None;
        }
        Some(self.snapshot_locked(&book))
    }

    /// Fill in ticket ranges and shares for the current positions.
    pub fn compute_ticket_allocation(&self) -> Result<TicketAllocation> {
        let (allocation, snapshot) = {
            let mut book = self.book.lock();
            let allocation = book.allocate()?;
            (allocation, self.snapshot_locked(&book))
        };

        for range in &allocation.ranges {
            tracing::debug!(
                "Round {}: player {} tickets [{}, {}] share {:.4}%",
                self.id,
                range.player_id,
                range.start,
                range.end,
                range.share
            );
        }

        self.events.publish(RoundEvent::SharesUpdated { round: snapshot });
        Ok(allocation)
    }

    /// Draw with a freshly seeded generator.
    pub fn draw_winner(&self) -> Result<DrawOutcome> {
        let mut rng = StdRng::from_entropy();
        self.draw_winner_with(&mut rng)
    }

    /// Allocate tickets and pick the winner of an ended round.
    pub fn draw_winner_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DrawOutcome> {
        tracing::info!("Round {}: picking a winner", self.id);

        let (result, shares) = {
            let mut book = self.book.lock();
            if book.state != RoundState::Ended {
                return Err(JackpotError::invalid_state(format!(
                    "round {} must be Ended to draw, is {:?}",
                    self.id, book.state
                )));
            }

            let allocation = book.allocate()?;
            let shares = self.snapshot_locked(&book);
            let result = self.pick_locked(&mut book, &allocation, rng);
            (result, shares)
        };

        self.events.publish(RoundEvent::SharesUpdated { round: shares });

        let (outcome, snapshot) = match result {
            Ok(picked) => picked,
            Err(e) => {
                if let JackpotError::AllocationInvariantViolation { .. } = e {
                    tracing::error!("Round {}: ticket allocation bug: {}", self.id, e);
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Round {}: winner is player {} with ticket {} (payout ${:.2})",
            self.id,
            outcome.winner.id,
            outcome.winning_ticket,
            outcome.payout
        );

        self.events.publish(RoundEvent::WinnerPicked {
            round: snapshot,
            player: outcome.winner.clone(),
            payout: outcome.payout,
        });

        Ok(outcome)
    }

    fn pick_locked<R: Rng + ?Sized>(
        &self,
        book: &mut Book,
        allocation: &TicketAllocation,
        rng: &mut R,
    ) -> Result<(DrawOutcome, RoundSnapshot)> {
        let winning_ticket = allocation
            .draw_ticket(rng)
            .ok_or(JackpotError::EmptyPotOnDraw { round_id: self.id })?;

        let winner = book
            .positions
            .iter()
            .find(|p| p.owns(winning_ticket))
            .ok_or(JackpotError::AllocationInvariantViolation {
                round_id: self.id,
                ticket: winning_ticket,
            })?;

        let total_pot = book.total_pot();
        let outcome = DrawOutcome {
            round_id: self.id,
            winner: winner.player.clone(),
            winning_ticket,
            total_pot,
            payout: total_pot - winner.total_bet(),
        };

        book.advance(RoundState::WinnerPicked);
        Ok((outcome, self.snapshot_locked(book)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;

    fn round_with_bus() -> (Round, EventBus) {
        let bus = EventBus::new(256);
        let round = Round::new(RoundId(1), &EngineConfig::default(), bus.clone());
        (round, bus)
    }

    fn alice() -> Player {
        Player::new(1, "alice@example.com")
    }

    fn bob() -> Player {
        Player::new(2, "bob@example.com")
    }

    #[test]
    fn test_repeated_bets_extend_one_position() {
        let (round, _bus) = round_with_bus();
        for _ in 0..3 {
            let receipt = round.place_bet(&alice(), 5.0).unwrap();
            assert!(!receipt.quorum_reached);
        }

        assert_eq!(round.player_count(), 1);
        assert_eq!(round.total_pot(), 15.0);
        assert_eq!(round.position(1).unwrap().wagers.len(), 3);
        assert_eq!(round.state(), RoundState::Idle);
    }

    #[test]
    fn test_invalid_wager_leaves_round_untouched() {
        let (round, bus) = round_with_bus();
        let mut rx = bus.subscribe();

        for amount in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                round.place_bet(&alice(), amount),
                Err(JackpotError::InvalidWager(_))
            ));
        }

        assert_eq!(round.player_count(), 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_bet_placed_event_carries_pot() {
        let (round, bus) = round_with_bus();
        let mut rx = bus.subscribe();

        round.place_bet(&alice(), 4.0).unwrap();
        round.place_bet(&bob(), 6.0).unwrap();

        let _ = rx.try_recv().unwrap();
        match rx.try_recv().unwrap() {
            RoundEvent::BetPlaced {
                round,
                player,
                amount,
            } => {
                assert_eq!(round.total_pot, 10.0);
                assert_eq!(round.player_count, 2);
                assert_eq!(round.state, RoundState::Idle);
                assert_eq!(player, bob());
                assert_eq!(amount, 6.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_per_player_totals() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&alice(), 1.5).unwrap();
        round.place_bet(&bob(), 2.0).unwrap();
        round.place_bet(&alice(), 0.5).unwrap();

        let totals = round.total_per_player();
        assert_eq!(totals[&1], 2.0);
        assert_eq!(totals[&2], 2.0);
        assert_eq!(round.total_pot(), 4.0);
    }

    #[test]
    fn test_state_only_moves_forward() {
        let (round, _bus) = round_with_bus();
        assert!(round.begin().is_some());
        assert!(round.begin().is_none());
        assert!(round.set_state(RoundState::Idle).is_err());
        assert!(round.set_state(RoundState::InProgress).is_err());
        assert!(round.close().is_some());
        assert!(round.close().is_none());
        assert_eq!(round.state(), RoundState::Ended);
        assert!(round.set_state(RoundState::WinnerPicked).is_err());
        assert_eq!(round.state(), RoundState::Ended);
    }

    #[test]
    fn test_set_state_cannot_skip_ahead() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&alice(), 10.0).unwrap();

        assert!(round.set_state(RoundState::WinnerPicked).is_err());
        assert!(round.set_state(RoundState::Ended).is_err());
        assert_eq!(round.state(), RoundState::Idle);

        round.set_state(RoundState::InProgress).unwrap();
        round.set_state(RoundState::Ended).unwrap();

        let snapshot = round.snapshot();
        assert!(snapshot.started_at.is_some());
        assert!(snapshot.ended_at.is_some());
        assert_eq!(snapshot.state, RoundState::Ended);
    }

    #[test]
    fn test_oversized_wagers_are_rejected() {
        let (round, bus) = round_with_bus();
        let mut rx = bus.subscribe();

        assert!(matches!(
            round.place_bet(&alice(), 2e17),
            Err(JackpotError::InvalidWager(_))
        ));
        assert_eq!(round.player_count(), 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        round.place_bet(&alice(), MAX_POT / 2.0).unwrap();
        round.place_bet(&bob(), MAX_POT / 2.0).unwrap();
        assert!(matches!(
            round.place_bet(&bob(), 1.0),
            Err(JackpotError::InvalidWager(_))
        ));
        assert_eq!(round.total_pot(), MAX_POT);
        assert_eq!(round.position(2).unwrap().wagers.len(), 1);

        round.begin();
        round.close();
        let outcome = round.draw_winner().unwrap();
        assert_eq!(outcome.total_pot, MAX_POT);
        assert_eq!(outcome.payout, MAX_POT / 2.0);
    }

    #[test]
    fn test_no_bets_after_close() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&alice(), 10.0).unwrap();
        round.begin();
        round.close();

        assert!(matches!(
            round.place_bet(&bob(), 10.0),
            Err(JackpotError::BettingClosed { .. })
        ));
        assert_eq!(round.total_pot(), 10.0);
    }

    #[test]
    fn test_draw_requires_ended_round() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&alice(), 10.0).unwrap();
        round.place_bet(&bob(), 10.0).unwrap();
        assert!(matches!(
            round.draw_winner(),
            Err(JackpotError::InvalidState(_))
        ));
    }

    #[test]
    fn test_two_player_draw() {
        let (round, bus) = round_with_bus();
        let mut rx = bus.subscribe();
        round.place_bet(&alice(), 10.0).unwrap();
        round.place_bet(&bob(), 10.0).unwrap();
        round.begin();
        round.close();

        let outcome = round.draw_winner().unwrap();
        assert_eq!(outcome.total_pot, 20.0);
        assert_eq!(outcome.payout, 10.0);
        assert!(outcome.winning_ticket < 2000);
        assert_eq!(round.state(), RoundState::WinnerPicked);

        let a = round.position(1).unwrap();
        let b = round.position(2).unwrap();
        assert_eq!((a.start_ticket, a.end_ticket), (0, 999));
        assert_eq!((b.start_ticket, b.end_ticket), (1000, 1999));
        let expected = if outcome.winning_ticket < 1000 { alice() } else { bob() };
        assert_eq!(outcome.winner, expected);

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind())
            .collect();
        assert_eq!(
            kinds,
            ["bet-placed", "bet-placed", "shares-updated", "winner-picked"]
        );
    }

    #[test]
    fn test_empty_pot_draw_fails() {
        let (round, bus) = round_with_bus();
        let mut rx = bus.subscribe();
        round.place_bet(&alice(), 0.001).unwrap();
        round.place_bet(&bob(), 0.002).unwrap();
        round.begin();
        round.close();

        assert!(matches!(
            round.draw_winner(),
            Err(JackpotError::EmptyPotOnDraw { .. })
        ));
        assert_eq!(round.state(), RoundState::Ended);
        assert!(std::iter::from_fn(|| rx.try_recv().ok()).all(|e| e.kind() != "winner-picked"));
    }

    #[test]
    fn test_allocation_is_stable() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&bob(), 3.0).unwrap();
        round.place_bet(&alice(), 7.25).unwrap();

        let first = round.compute_ticket_allocation().unwrap();
        let second = round.compute_ticket_allocation().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.ranges[0].player_id, 2);
        assert_eq!(round.position(1).unwrap().start_ticket, 300);
    }

    #[test]
    fn test_draw_frequency_tracks_shares() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&alice(), 10.0).unwrap();
        round.place_bet(&bob(), 30.0).unwrap();
        round.begin();
        round.close();

        let allocation = round.compute_ticket_allocation().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let trials = 100_000;
        let mut alice_wins = 0;
        for _ in 0..trials {
            let ticket = allocation.draw_ticket(&mut rng).unwrap();
            if allocation.owner_of(ticket).unwrap().player_id == 1 {
                alice_wins += 1;
            }
        }

        let observed = alice_wins as f64 / trials as f64;
        assert!((observed - 0.25).abs() < 0.01, "observed {}", observed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bets_are_all_counted() {
        let bus = EventBus::new(16);
        let round = Arc::new(Round::new(RoundId(1), &EngineConfig::default(), bus));

        let mut handles = Vec::new();
        for player_id in 0..8u64 {
            let round = round.clone();
            handles.push(tokio::spawn(async move {
                let player = Player::new(player_id, format!("p{}@example.com", player_id));
                for _ in 0..50 {
                    round.place_bet(&player, 0.5).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(round.player_count(), 8);
        assert_eq!(round.total_pot(), 8.0 * 50.0 * 0.5);
        assert!(round.total_per_player().values().all(|&t| t == 25.0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_close_races_with_bets() {
        let bus = EventBus::new(16);
        let round = Arc::new(Round::new(RoundId(1), &EngineConfig::default(), bus));
        round.place_bet(&alice(), 1.0).unwrap();
        round.place_bet(&bob(), 1.0).unwrap();
        round.begin();

        let mut handles = Vec::new();
        for player_id in 10..18u64 {
            let round = round.clone();
            handles.push(tokio::spawn(async move {
                let player = Player::new(player_id, format!("p{}@example.com", player_id));
                let mut accepted = 0.0;
                let mut closed = false;
                for _ in 0..2_000 {
                    match round.place_bet(&player, 0.25) {
                        Ok(_) => {
                            assert!(!closed, "bet accepted after the round closed");
                            accepted += 0.25;
                        }
                        Err(JackpotError::BettingClosed { .. }) => closed = true,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                    tokio::task::yield_now().await;
                }
                accepted
            }));
        }

        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let closed = round.close().unwrap();

        let mut accepted = 2.0;
        for handle in handles {
            accepted += handle.await.unwrap();
        }

        assert_eq!(closed.total_pot, round.total_pot());
        assert_eq!(round.total_pot(), accepted);

        let outcome = round.draw_winner().unwrap();
        assert_eq!(outcome.total_pot, accepted);
        let per_player: f64 = round.total_per_player().values().sum();
        assert_eq!(per_player, accepted);
    }

    #[tokio::test]
    async fn test_quorum_wakes_waiter() {
        let (round, _bus) = round_with_bus();
        round.place_bet(&alice(), 1.0).unwrap();
        round.place_bet(&bob(), 1.0).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), round.ready())
            .await
            .expect("quorum signal was lost");
    }
}
