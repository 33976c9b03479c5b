use serde::{Deserialize, Serialize};

pub type PlayerId = u64;

/// Caller-supplied player identity. Rounds reference players by `id` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub email: String,
}

impl Player {
    pub fn new(id: PlayerId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.id, self.email)
    }
}
