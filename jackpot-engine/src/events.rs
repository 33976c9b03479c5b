use crate::player::Player;
use crate::round::{RoundId, RoundSnapshot, RoundSummary};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lifecycle and betting events published to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RoundEvent {
    NewGame {
        round: RoundSnapshot,
    },
    StartGame {
        round: RoundSnapshot,
    },
    Countdown {
        time_left: f64,
    },
    BetPlaced {
        round: RoundSummary,
        player: Player,
        amount: f64,
    },
    EndGame {
        round: RoundSnapshot,
    },
    SharesUpdated {
        round: RoundSnapshot,
    },
    WinnerPicked {
        round: RoundSnapshot,
        player: Player,
        payout: f64,
    },
    DrawFailed {
        round_id: RoundId,
        reason: String,
    },
}

impl RoundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RoundEvent::NewGame { .. } => "new-game",
            RoundEvent::StartGame { .. } => "start-game",
            RoundEvent::Countdown { .. } => "countdown",
            RoundEvent::BetPlaced { .. } => "bet-placed",
            RoundEvent::EndGame { .. } => "end-game",
            RoundEvent::SharesUpdated { .. } => "shares-updated",
            RoundEvent::WinnerPicked { .. } => "winner-picked",
            RoundEvent::DrawFailed { .. } => "draw-failed",
        }
    }
}

/// Fan-out publish point. Sends never block: a subscriber that falls more
/// than `capacity` events behind loses the oldest ones.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RoundEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: RoundEvent) {
        let kind = event.kind();
        // Err only means nobody is listening right now.
        if self.sender.send(event).is_err() {
            tracing::trace!("No subscribers for {} event", kind);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
