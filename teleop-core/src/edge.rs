//! Press-edge detection for held-level button reads.

use crate::input::{ALL_BUTTONS, BUTTON_COUNT, ButtonId, ControllerInput};

/// One-shot notification that a button went from released to held.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PressEvent {
    pub button: ButtonId,
}

impl PressEvent {
    pub const fn new(button: ButtonId) -> Self {
        Self { button }
    }
}

/// Edge detector state for one button.
///
/// `armed` is `true` exactly when the most recent observation saw the button
/// released. Nothing has been observed when a loop starts, so detectors begin
/// disarmed and a button already held at startup stays silent until it has
/// been released once.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EdgeDetector {
    button: ButtonId,
    armed: bool,
}

impl EdgeDetector {
    pub const fn new(button: ButtonId) -> Self {
        Self {
            button,
            armed: false,
        }
    }

    pub const fn button(&self) -> ButtonId {
        self.button
    }

    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feeds one tick's level, returning a press event on the released→held edge.
    pub fn observe(&mut self, held: bool) -> Option<PressEvent> {
        let fire = held && self.armed;
        self.armed = !held;
        fire.then_some(PressEvent::new(self.button))
    }

    /// Forgets every previous observation.
    pub fn reset(&mut self) {
        self.armed = false;
    }
}

/// One [`EdgeDetector`] per tracked button.
#[derive(Clone, Debug)]
pub struct EdgeBank {
    detectors: [EdgeDetector; BUTTON_COUNT],
}

impl EdgeBank {
    pub const fn new() -> Self {
        let mut detectors = [EdgeDetector::new(ButtonId::ClampToggle); BUTTON_COUNT];
        let mut index = 0;
        while index < BUTTON_COUNT {
            detectors[index] = EdgeDetector::new(ALL_BUTTONS[index].id);
            index += 1;
        }
        Self { detectors }
    }

    pub fn detector(&self, button: ButtonId) -> &EdgeDetector {
        &self.detectors[button.as_index()]
    }

    /// Samples `button` from `input` and advances its detector.
    pub fn observe<C>(&mut self, input: &C, button: ButtonId) -> Option<PressEvent>
    where
        C: ControllerInput + ?Sized,
    {
        self.observe_level(button, input.read_digital(button))
    }

    /// Advances the detector for `button` with an already sampled level.
    pub fn observe_level(&mut self, button: ButtonId, held: bool) -> Option<PressEvent> {
        self.detectors[button.as_index()].observe(held)
    }

    pub fn reset(&mut self) {
        for detector in &mut self.detectors {
            detector.reset();
        }
    }
}

impl Default for EdgeBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ControllerSnapshot;

    fn count_events(levels: &[bool]) -> usize {
        let mut detector = EdgeDetector::new(ButtonId::ClampToggle);
        levels
            .iter()
            .filter_map(|&level| detector.observe(level))
            .count()
    }

    #[test]
    fn fires_once_per_press() {
        let mut detector = EdgeDetector::new(ButtonId::ClampToggle);
        assert_eq!(detector.observe(false), None);
        assert_eq!(
            detector.observe(true),
            Some(PressEvent::new(ButtonId::ClampToggle))
        );
        assert_eq!(detector.observe(true), None);
        assert_eq!(detector.observe(true), None);
        assert_eq!(detector.observe(false), None);
        assert!(detector.is_armed());
    }

    #[test]
    fn held_at_startup_waits_for_release() {
        let mut detector = EdgeDetector::new(ButtonId::IntakeForward);
        assert_eq!(detector.observe(true), None);
        assert_eq!(detector.observe(true), None);
        assert_eq!(detector.observe(false), None);
        assert!(detector.observe(true).is_some());
    }

    #[test]
    fn one_event_per_run_of_held_reads() {
        let levels = [
            false, true, true, false, true, false, false, true, true, true, false,
        ];
        assert_eq!(count_events(&levels), 3);

        // The leading run is suppressed because it was already held at start.
        let leading = [true, true, false, true, false, true];
        assert_eq!(count_events(&leading), 2);
    }

    #[test]
    fn reset_disarms_detector() {
        let mut detector = EdgeDetector::new(ButtonId::ArmToggle);
        detector.observe(false);
        detector.reset();
        assert_eq!(detector.observe(true), None);
    }

    #[test]
    fn bank_reads_through_controller_input() {
        let mut bank = EdgeBank::new();
        let released = ControllerSnapshot::neutral();
        let held = released.with_button(ButtonId::IntakeReverse, true);

        assert_eq!(bank.observe(&released, ButtonId::IntakeReverse), None);
        assert_eq!(
            bank.observe(&held, ButtonId::IntakeReverse),
            Some(PressEvent::new(ButtonId::IntakeReverse))
        );
        assert!(!bank.detector(ButtonId::IntakeReverse).is_armed());
        assert_eq!(
            bank.detector(ButtonId::ArmJogUp).button(),
            ButtonId::ArmJogUp
        );
    }
}
