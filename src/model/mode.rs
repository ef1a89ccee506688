use serde::{Deserialize, Serialize};

/// Whether the host is running timers (controls locked) or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UiMode {
    #[default]
    Editing,
    Running,
}

impl UiMode {
    pub fn opposite(self) -> UiMode {
        match self {
            UiMode::Editing => UiMode::Running,
            UiMode::Running => UiMode::Editing,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UiMode::Editing => "Editing",
            UiMode::Running => "Running",
        }
    }
}

/// Two-state machine with an optimistic pending layer.
///
/// `request` shows the target mode immediately. The host outcome then either
/// confirms it or rejects it; a rejection lands on the opposite mode, so a
/// failed start always ends in `Editing` and a failed stop in `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeMachine {
    confirmed: UiMode,
    pending: Option<UiMode>,
}

impl ModeMachine {
    /// Mode the controls should reflect right now
    pub fn displayed(&self) -> UiMode {
        self.pending.unwrap_or(self.confirmed)
    }

    /// Last mode the host acknowledged
    #[cfg(test)]
    pub fn confirmed(&self) -> UiMode {
        self.confirmed
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Optimistic transition, applied before the host call
    pub fn request(&mut self, target: UiMode) -> UiMode {
        self.pending = Some(target);
        self.displayed()
    }

    /// Host accepted the transition to `target`
    pub fn confirm(&mut self, target: UiMode) -> UiMode {
        self.confirmed = target;
        if self.pending == Some(target) {
            self.pending = None;
        }
        self.displayed()
    }

    /// Host rejected the transition to `target`
    pub fn reject(&mut self, target: UiMode) -> UiMode {
        self.confirmed = target.opposite();
        self.pending = None;
        self.displayed()
    }
}
