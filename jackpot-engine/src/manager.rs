use crate::config::EngineConfig;
use crate::error::{JackpotError, Result};
use crate::events::{EventBus, RoundEvent};
use crate::player::Player;
use crate::round::{BetReceipt, Round, RoundId, RoundSnapshot};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Owns the current round and the archive of closed ones, and drives the
/// round lifecycle from a single control loop.
pub struct RoundManager {
    config: EngineConfig,
    events: EventBus,
    current: Mutex<Arc<Round>>,
    archive: RwLock<HashMap<RoundId, Arc<Round>>>,
    last_id: Mutex<i64>,
}

impl RoundManager {
    /// The first round is created immediately but only announced once the
    /// control loop starts.
    pub fn new(config: EngineConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let events = EventBus::new(config.event_capacity);
        let first_id = RoundId(Self::clock_nanos());
        let first = Arc::new(Round::new(first_id, &config, events.clone()));

        Ok(Arc::new(Self {
            config,
            events,
            current: Mutex::new(first),
            archive: RwLock::new(HashMap::new()),
            last_id: Mutex::new(first_id.0),
        }))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// The round accepting bets right now. It is replaced wholesale by
    /// `new_round`, so do not hold on to it across cycles.
    pub fn current_round(&self) -> Arc<Round> {
        self.current.lock().clone()
    }

    /// Inbound entry point for the transport layer.
    pub fn place_bet(&self, player: &Player, amount: f64) -> Result<BetReceipt> {
        let round = self.current_round();
        round.place_bet(player, amount)
    }

    pub fn past_round(&self, id: RoundId) -> Option<Arc<Round>> {
        self.archive.read().get(&id).cloned()
    }

    /// Archived rounds, oldest first.
    pub fn past_rounds(&self) -> Vec<RoundSnapshot> {
        let rounds: Vec<Arc<Round>> = self.archive.read().values().cloned().collect();
        let mut snapshots: Vec<RoundSnapshot> = rounds.iter().map(|r| r.snapshot()).collect();
        snapshots.sort_by_key(|s| s.id);
        snapshots
    }

    fn clock_nanos() -> i64 {
        let now = Utc::now();
        now.timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000))
    }

    fn next_round_id(&self) -> RoundId {
        let mut last = self.last_id.lock();
        let id = Self::clock_nanos().max(*last + 1);
        *last = id;
        RoundId(id)
    }

    /// Replace the current round with a fresh Idle one.
    pub fn new_round(&self) -> Arc<Round> {
        let round = Arc::new(Round::new(
            self.next_round_id(),
            &self.config,
            self.events.clone(),
        ));

        {
            let mut current = self.current.lock();
            *current = round.clone();
        }

        self.announce(&round);
        round
    }

    fn announce(&self, round: &Round) {
        self.events.publish(RoundEvent::NewGame {
            round: round.snapshot(),
        });
        tracing::info!("Round {} created", round.id());
        tracing::info!(
            "Waiting for bets from at least {} players",
            self.config.quorum
        );
    }

    /// Idle -> InProgress on the current round. Returns false if it had
    /// already started.
    pub fn start_round(&self) -> bool {
        let round = self.current_round();
        match round.begin() {
            Some(snapshot) => {
                tracing::info!("Round {} started", round.id());
                self.events.publish(RoundEvent::StartGame { round: snapshot });
                true
            }
            None => {
                tracing::debug!("Round {} already started", round.id());
                false
            }
        }
    }

    /// InProgress -> Ended on the current round, archiving it. Returns the
    /// closed round, or `None` if it was not in progress.
    pub fn end_round(&self) -> Option<Arc<Round>> {
        let round = self.current_round();
        let snapshot = round.close()?;

        {
            let mut archive = self.archive.write();
            archive.insert(round.id(), round.clone());
        }

        tracing::info!(
            "Round {} has ended with a pot of ${:.2}, no more bets",
            round.id(),
            snapshot.total_pot
        );
        self.events.publish(RoundEvent::EndGame { round: snapshot });
        Some(round)
    }

    /// Draw the winner of a closed round. Failures become `draw-failed`
    /// events so the cycle keeps going.
    pub fn settle(&self, round: &Round) {
        match round.draw_winner() {
            Ok(_) => {}
            Err(e) => {
                match &e {
                    JackpotError::AllocationInvariantViolation { .. } => {
                        tracing::error!("Round {}: draw aborted: {}", round.id(), e)
                    }
                    _ => tracing::warn!("Round {}: no winner drawn: {}", round.id(), e),
                }
                self.events.publish(RoundEvent::DrawFailed {
                    round_id: round.id(),
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Start the control loop on the current runtime.
    pub fn spawn(self: &Arc<Self>) -> LifecycleHandle {
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(self.clone().run(signal));
        LifecycleHandle { shutdown, task }
    }

    /// create -> wait for quorum -> countdown -> close -> draw -> delay -> repeat,
    /// until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut round = self.current_round();
        if round.state().accepts_bets() {
            self.announce(&round);
        } else {
            round = self.new_round();
        }

        loop {
            tokio::select! {
                _ = round.ready() => {}
                _ = stopped(&mut shutdown) => break,
            }

            self.start_round();

            if !self.countdown(&mut shutdown).await {
                break;
            }

            if let Some(closed) = self.end_round() {
                self.settle(&closed);
            }

            tracing::info!(
                "Starting a new round in {:?}",
                self.config.restart_delay
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.restart_delay) => {}
                _ = stopped(&mut shutdown) => break,
            }

            round = self.new_round();
        }

        tracing::info!("Round lifecycle stopped");
    }

    /// Emit `countdown` events every tick until the countdown elapses.
    /// Returns false if interrupted by shutdown.
    async fn countdown(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.config.countdown_tick);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stopped(shutdown) => return false,
            }

            let elapsed = started.elapsed();
            if elapsed >= self.config.countdown {
                return true;
            }

            let time_left = (self.config.countdown - elapsed).as_secs_f64();
            tracing::debug!("Countdown: {:.1}s left", time_left);
            self.events.publish(RoundEvent::Countdown { time_left });
        }
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Handle to a running control loop.
pub struct LifecycleHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LifecycleHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop at its next wait point and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| JackpotError::internal(format!("Lifecycle task failed: {}", e)))
    }
}
