// THEORY:
// The unlock state is the only piece of information that outlives a single frame.
// It is a two-state machine, `Locked` then `Unlocked`, with no way back. The
// `UnlockCell` wraps it so that the transition can only happen through `unlock`,
// and only the first caller observes a successful transition.

/// Whether the hidden content has been revealed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnlockState {
    #[default]
    Locked,
    /// Terminal. Remembers which trigger won the race.
    Unlocked { reason: String },
}

/// Single-writer cell guarding the `Locked -> Unlocked` transition.
#[derive(Debug, Default)]
pub struct UnlockCell {
    state: UnlockState,
}

impl UnlockCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to `Unlocked`. Returns `true` only for the call that performed the
    /// transition; every later call returns `false` and changes nothing.
    pub fn unlock(&mut self, reason: &str) -> bool {
        match self.state {
            UnlockState::Unlocked { .. } => false,
            UnlockState::Locked => {
                self.state = UnlockState::Unlocked { reason: reason.to_string() };
                true
            }
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, UnlockState::Unlocked { .. })
    }

    pub fn state(&self) -> &UnlockState {
        &self.state
    }

    /// The reason recorded by the winning `unlock` call.
    pub fn reason(&self) -> Option<&str> {
        match &self.state {
            UnlockState::Locked => None,
            UnlockState::Unlocked { reason } => Some(reason),
        }
    }
}
