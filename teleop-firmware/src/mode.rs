//! Competition mode tracking from the field-control inputs.
//!
//! Two digital lines arrive from the field system: enable and autonomous. A
//! new mode is accepted only after it reads the same on two consecutive
//! samples, so a contact bounce on either line cannot flap driver control.

use core::fmt;

/// Mode reported by the field-control inputs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CompetitionMode {
    #[default]
    Disabled,
    Autonomous,
    DriverControl,
}

impl CompetitionMode {
    pub const fn from_inputs(enabled: bool, autonomous: bool) -> Self {
        match (enabled, autonomous) {
            (false, _) => CompetitionMode::Disabled,
            (true, true) => CompetitionMode::Autonomous,
            (true, false) => CompetitionMode::DriverControl,
        }
    }

    pub const fn is_driver_control(self) -> bool {
        matches!(self, CompetitionMode::DriverControl)
    }
}

impl fmt::Display for CompetitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompetitionMode::Disabled => f.write_str("disabled"),
            CompetitionMode::Autonomous => f.write_str("autonomous"),
            CompetitionMode::DriverControl => f.write_str("driver-control"),
        }
    }
}

/// What the gate should do after a mode change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GateAction {
    Open,
    Close,
}

/// Accepted mode change.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeChange {
    pub from: CompetitionMode,
    pub to: CompetitionMode,
}

impl ModeChange {
    /// Gate action implied by this change, if driver control was entered or left.
    pub const fn gate_action(&self) -> Option<GateAction> {
        match (self.from.is_driver_control(), self.to.is_driver_control()) {
            (false, true) => Some(GateAction::Open),
            (true, false) => Some(GateAction::Close),
            _ => None,
        }
    }
}

/// Two-sample debounced mode tracker.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ModeTracker {
    current: CompetitionMode,
    candidate: Option<CompetitionMode>,
}

impl ModeTracker {
    pub const fn new() -> Self {
        Self {
            current: CompetitionMode::Disabled,
            candidate: None,
        }
    }

    pub const fn current(&self) -> CompetitionMode {
        self.current
    }

    /// Feeds one sample of the field-control lines.
    pub fn sample(&mut self, enabled: bool, autonomous: bool) -> Option<ModeChange> {
        let observed = CompetitionMode::from_inputs(enabled, autonomous);
        if observed == self.current {
            self.candidate = None;
            return None;
        }

        if self.candidate != Some(observed) {
            self.candidate = Some(observed);
            return None;
        }

        let change = ModeChange {
            from: self.current,
            to: observed,
        };
        self.current = observed;
        self.candidate = None;
        Some(change)
    }
}
