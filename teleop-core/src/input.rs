//! Controller input model shared by firmware and host targets.
//!
//! The tracked buttons and axes form a fixed catalog. Each [`ButtonId`] is
//! bound to the label printed on the physical controller, and every reader of
//! the controller goes through the narrow [`ControllerInput`] capability so
//! loops can be driven by real hardware, a shared snapshot store, or a
//! scripted test double.

use core::fmt;

/// Number of tracked digital buttons.
pub const BUTTON_COUNT: usize = 6;

/// Number of tracked analog axes.
pub const AXIS_COUNT: usize = 2;

/// Smallest axis reading after normalization.
pub const AXIS_MIN: i8 = -127;

/// Largest axis reading.
pub const AXIS_MAX: i8 = 127;

/// Logical digital controls tracked by the teleop core.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ButtonId {
    ClampToggle,
    IntakeForward,
    IntakeReverse,
    ArmToggle,
    ArmJogUp,
    ArmJogDown,
}

impl ButtonId {
    /// Deterministic index for lookups into [`ALL_BUTTONS`].
    pub const fn as_index(self) -> usize {
        match self {
            ButtonId::ClampToggle => 0,
            ButtonId::IntakeForward => 1,
            ButtonId::IntakeReverse => 2,
            ButtonId::ArmToggle => 3,
            ButtonId::ArmJogUp => 4,
            ButtonId::ArmJogDown => 5,
        }
    }

    /// Attempts to construct a [`ButtonId`] from a raw index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ButtonId::ClampToggle),
            1 => Some(ButtonId::IntakeForward),
            2 => Some(ButtonId::IntakeReverse),
            3 => Some(ButtonId::ArmToggle),
            4 => Some(ButtonId::ArmJogUp),
            5 => Some(ButtonId::ArmJogDown),
            _ => None,
        }
    }

    /// Bit used for this button inside a packed button mask.
    pub const fn mask_bit(self) -> u8 {
        1 << self.as_index()
    }

    /// Returns the physical label bound to this control.
    pub const fn label(self) -> &'static str {
        binding_for(self).label
    }

    /// Looks a control up by its physical label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        ALL_BUTTONS
            .iter()
            .find(|binding| binding.label.eq_ignore_ascii_case(label))
            .map(|binding| binding.id)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the teleop loop consumes a button.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trigger {
    /// Only the released→held transition matters.
    Edge,
    /// The held level is read every tick.
    Level,
}

/// Static description of how a logical control is wired on the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonBinding {
    pub id: ButtonId,
    pub label: &'static str,
    pub trigger: Trigger,
}

impl ButtonBinding {
    pub const fn new(id: ButtonId, label: &'static str, trigger: Trigger) -> Self {
        Self { id, label, trigger }
    }
}

/// Compile-time catalog of every tracked button.
pub const ALL_BUTTONS: [ButtonBinding; BUTTON_COUNT] = [
    ButtonBinding::new(ButtonId::ClampToggle, "A", Trigger::Edge),
    ButtonBinding::new(ButtonId::IntakeForward, "R2", Trigger::Edge),
    ButtonBinding::new(ButtonId::IntakeReverse, "R1", Trigger::Edge),
    ButtonBinding::new(ButtonId::ArmToggle, "L1", Trigger::Edge),
    ButtonBinding::new(ButtonId::ArmJogUp, "UP", Trigger::Level),
    ButtonBinding::new(ButtonId::ArmJogDown, "DOWN", Trigger::Level),
];

/// Retrieve the binding for a button.
pub const fn binding_for(id: ButtonId) -> ButtonBinding {
    ALL_BUTTONS[id.as_index()]
}

/// Analog axes read by the drive loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AxisId {
    /// Left stick, vertical.
    Forward,
    /// Right stick, horizontal.
    Turn,
}

impl AxisId {
    pub const fn as_index(self) -> usize {
        match self {
            AxisId::Forward => 0,
            AxisId::Turn => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AxisId::Forward => "LEFT_Y",
            AxisId::Turn => "RIGHT_X",
        }
    }
}

/// Clamps a raw reading into the symmetric `AXIS_MIN..=AXIS_MAX` range.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub const fn normalize_axis(raw: i16) -> i8 {
    if raw < AXIS_MIN as i16 {
        AXIS_MIN
    } else if raw > AXIS_MAX as i16 {
        AXIS_MAX
    } else {
        raw as i8
    }
}

/// Read-only capability over the game controller.
///
/// Implementations must never block and must report released buttons and
/// centered axes while the controller link is down.
pub trait ControllerInput {
    /// Returns `true` while the button is physically held.
    fn read_digital(&self, button: ButtonId) -> bool;

    /// Returns the axis position in `AXIS_MIN..=AXIS_MAX`.
    fn read_analog(&self, axis: AxisId) -> i8;

    /// Captures every tracked control into a [`ControllerSnapshot`].
    fn snapshot(&self) -> ControllerSnapshot {
        let mut snapshot = ControllerSnapshot::neutral();
        for binding in &ALL_BUTTONS {
            snapshot.set_button(binding.id, self.read_digital(binding.id));
        }
        snapshot.set_axis(AxisId::Forward, self.read_analog(AxisId::Forward));
        snapshot.set_axis(AxisId::Turn, self.read_analog(AxisId::Turn));
        snapshot
    }
}

/// Immutable copy of every tracked control at one instant.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ControllerSnapshot {
    buttons: u8,
    axes: [i8; AXIS_COUNT],
}

impl ControllerSnapshot {
    /// All buttons released, both sticks centered.
    pub const fn neutral() -> Self {
        Self {
            buttons: 0,
            axes: [0; AXIS_COUNT],
        }
    }

    /// Rebuilds a snapshot from its packed representation.
    pub const fn from_raw(buttons: u8, forward: i8, turn: i8) -> Self {
        Self {
            buttons: buttons & ALL_BUTTONS_MASK,
            axes: [normalize_axis(forward as i16), normalize_axis(turn as i16)],
        }
    }

    /// Packed button mask (see [`ButtonId::mask_bit`]).
    pub const fn buttons(&self) -> u8 {
        self.buttons
    }

    #[must_use]
    pub const fn with_button(mut self, button: ButtonId, held: bool) -> Self {
        if held {
            self.buttons |= button.mask_bit();
        } else {
            self.buttons &= !button.mask_bit();
        }
        self
    }

    #[must_use]
    pub const fn with_axis(mut self, axis: AxisId, value: i8) -> Self {
        self.axes[axis.as_index()] = normalize_axis(value as i16);
        self
    }

    pub fn set_button(&mut self, button: ButtonId, held: bool) {
        *self = self.with_button(button, held);
    }

    pub fn set_axis(&mut self, axis: AxisId, value: i8) {
        *self = self.with_axis(axis, value);
    }

    pub const fn is_held(&self, button: ButtonId) -> bool {
        self.buttons & button.mask_bit() != 0
    }

    pub const fn axis(&self, axis: AxisId) -> i8 {
        self.axes[axis.as_index()]
    }
}

/// Mask covering every tracked button bit.
pub const ALL_BUTTONS_MASK: u8 = (1 << BUTTON_COUNT) - 1;

impl ControllerInput for ControllerSnapshot {
    fn read_digital(&self, button: ButtonId) -> bool {
        self.is_held(button)
    }

    fn read_analog(&self, axis: AxisId) -> i8 {
        self.axis(axis)
    }

    fn snapshot(&self) -> ControllerSnapshot {
        *self
    }
}
