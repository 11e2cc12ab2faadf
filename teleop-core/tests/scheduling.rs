use core::ops::Add;
use core::time::Duration;

use teleop_core::actuator::{ActuatorCommand, ActuatorFault, ActuatorId, ActuatorOutput};
use teleop_core::config::TeleopConfig;
use teleop_core::drive::{DriveCommand, DrivetrainOutput};
use teleop_core::input::{AxisId, ButtonId, ControllerSnapshot};
use teleop_core::intake::IntakeState;
use teleop_core::schedule::{LoopKind, ScheduledTick, Scheduler};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct Millis(u64);

impl Add<Duration> for Millis {
    type Output = Millis;

    fn add(self, rhs: Duration) -> Millis {
        Millis(self.0 + u64::try_from(rhs.as_millis()).unwrap())
    }
}

#[derive(Default)]
struct Actuators {
    commands: Vec<ActuatorCommand>,
    offline: bool,
}

impl ActuatorOutput for Actuators {
    fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorFault> {
        if self.offline {
            return Err(ActuatorFault::Disconnected);
        }
        self.commands.push(command);
        Ok(())
    }
}

#[derive(Default)]
struct Drivetrain {
    commands: Vec<(u64, DriveCommand)>,
    now: u64,
}

impl DrivetrainOutput for Drivetrain {
    fn arcade_drive(&mut self, command: DriveCommand) -> Result<(), ActuatorFault> {
        self.commands.push((self.now, command));
        Ok(())
    }
}

/// Polls one millisecond at a time so deadlines line up with wall time.
fn run_until(
    scheduler: &mut Scheduler<Millis>,
    from: u64,
    to: u64,
    input: &ControllerSnapshot,
    actuators: &mut Actuators,
    drivetrain: &mut Drivetrain,
) -> Vec<(u64, LoopKind)> {
    let mut ticks = Vec::new();
    for ms in from..=to {
        drivetrain.now = ms;
        scheduler.poll(Millis(ms), input, actuators, drivetrain, |at, tick| {
            ticks.push((at.0, tick.kind()));
        });
    }
    ticks
}

#[test]
fn long_hold_never_delays_drive_ticks() {
    let mut scheduler = Scheduler::new(&TeleopConfig::default());
    let mut actuators = Actuators::default();
    let mut drivetrain = Drivetrain::default();
    scheduler.start(Millis(0), &mut actuators, &mut drivetrain);

    let quiet = ControllerSnapshot::neutral();
    run_until(&mut scheduler, 0, 10, &quiet, &mut actuators, &mut drivetrain);

    // Hold R2 for two full seconds with the stick pushed.
    let holding = quiet
        .with_button(ButtonId::IntakeForward, true)
        .with_axis(AxisId::Forward, 90);
    run_until(&mut scheduler, 11, 2_010, &holding, &mut actuators, &mut drivetrain);
    assert_eq!(scheduler.status().awaiting, Some(ButtonId::IntakeForward));

    let stamps: Vec<u64> = drivetrain.commands.iter().map(|(at, _)| *at).collect();
    assert_eq!(stamps.first(), Some(&0));
    assert!(stamps.windows(2).all(|pair| pair[1] - pair[0] == 20));
    assert_eq!(stamps.last(), Some(&2_000));

    assert!(
        drivetrain
            .commands
            .iter()
            .filter(|(at, _)| *at > 10)
            .all(|(_, command)| command.forward == 90)
    );
    assert_eq!(
        actuators.commands,
        [ActuatorCommand::MotorPower {
            id: ActuatorId::Intake,
            power: teleop_core::actuator::MotorPower::FULL_FORWARD
        }]
    );
}

#[test]
fn stop_leaves_safe_state_and_restart_reinitializes() {
    let mut scheduler = Scheduler::new(&TeleopConfig::default());
    let mut actuators = Actuators::default();
    let mut drivetrain = Drivetrain::default();
    let quiet = ControllerSnapshot::neutral();

    for round in 0..3u64 {
        let base = round * 1_000;
        let started = scheduler.start(Millis(base), &mut actuators, &mut drivetrain);
        assert_eq!(started.stopped, None);
        assert_eq!(scheduler.status().intake, IntakeState::Idle);

        run_until(&mut scheduler, base, base + 60, &quiet, &mut actuators, &mut drivetrain);
        run_until(
            &mut scheduler,
            base + 61,
            base + 120,
            &quiet.with_button(ButtonId::IntakeReverse, true),
            &mut actuators,
            &mut drivetrain,
        );
        assert_eq!(scheduler.status().intake, IntakeState::RunningReverse);

        actuators.commands.clear();
        drivetrain.commands.clear();
        let report = scheduler.stop(&mut actuators, &mut drivetrain);
        assert_eq!(report.drive_fault, None);
        assert_eq!(
            actuators.commands,
            [
                ActuatorCommand::MotorBrake {
                    id: ActuatorId::Intake
                },
                ActuatorCommand::MotorBrake {
                    id: ActuatorId::Arm
                },
            ]
        );
        assert_eq!(drivetrain.commands.len(), 1);
        assert!(drivetrain.commands[0].1.is_neutral());

        // Nothing runs between periods.
        let idle = run_until(
            &mut scheduler,
            base + 121,
            base + 999,
            &quiet,
            &mut actuators,
            &mut drivetrain,
        );
        assert!(idle.is_empty());
    }
}

#[test]
fn actuator_faults_do_not_halt_either_loop() {
    let mut scheduler = Scheduler::new(&TeleopConfig::default());
    let mut actuators = Actuators {
        offline: true,
        ..Actuators::default()
    };
    let mut drivetrain = Drivetrain::default();
    scheduler.start(Millis(0), &mut actuators, &mut drivetrain);

    let mut faults = 0;
    let mut drive_ticks = 0;
    let quiet = ControllerSnapshot::neutral();
    let clamp = quiet.with_button(ButtonId::ClampToggle, true);
    for ms in 0..=400u64 {
        let input = if (100..200).contains(&ms) || (300..350).contains(&ms) {
            &clamp
        } else {
            &quiet
        };
        scheduler.poll(Millis(ms), input, &mut actuators, &mut drivetrain, |_, tick| {
            match tick {
                ScheduledTick::Input(report) => faults += report.faults().count(),
                ScheduledTick::Drive(_) => drive_ticks += 1,
            }
        });
    }

    assert_eq!(faults, 2);
    assert_eq!(drive_ticks, 21);
    assert!(scheduler.is_running());
}

#[test]
fn start_while_running_stops_the_running_period_first() {
    let mut scheduler = Scheduler::new(&TeleopConfig::default());
    let mut actuators = Actuators::default();
    let mut drivetrain = Drivetrain::default();
    let quiet = ControllerSnapshot::neutral();
    scheduler.start(Millis(0), &mut actuators, &mut drivetrain);

    run_until(&mut scheduler, 0, 10, &quiet, &mut actuators, &mut drivetrain);
    run_until(
        &mut scheduler,
        11,
        60,
        &quiet.with_button(ButtonId::IntakeForward, true),
        &mut actuators,
        &mut drivetrain,
    );
    assert_eq!(scheduler.status().intake, IntakeState::RunningForward);

    actuators.commands.clear();
    drivetrain.commands.clear();
    let started = scheduler.start(Millis(60), &mut actuators, &mut drivetrain);

    let stopped = started.stopped.expect("running period is stopped");
    assert_eq!(stopped.drive_fault, None);
    assert_eq!(
        actuators.commands,
        [
            ActuatorCommand::MotorBrake {
                id: ActuatorId::Intake
            },
            ActuatorCommand::MotorBrake {
                id: ActuatorId::Arm
            },
        ]
    );
    assert_eq!(drivetrain.commands.len(), 1);
    assert!(drivetrain.commands[0].1.is_neutral());
    assert_eq!(scheduler.status().intake, IntakeState::Idle);
    assert!(scheduler.is_running());
}
