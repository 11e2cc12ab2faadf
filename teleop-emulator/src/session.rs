use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::ops::Add;
use std::path::Path;
use std::time::Duration;

use teleop_core::actuator::{ActuatorCommand, ActuatorFault, ActuatorOutput};
use teleop_core::config::TeleopConfig;
use teleop_core::drive::{DriveCommand, DrivetrainOutput};
use teleop_core::input::{AxisId, ButtonId, ControllerSnapshot, normalize_axis};
use teleop_core::schedule::{ScheduledTick, Scheduler, StopReport};
use winnow::ascii::{Caseless, alpha1, alphanumeric1, dec_int, dec_uint, space0, space1};
use winnow::combinator::{alt, eof, opt, preceded, separated_pair, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "press",
        "press <A|R2|R1|L1|UP|DOWN>      - hold a controller button",
    ),
    (
        "release",
        "release <A|R2|R1|L1|UP|DOWN>    - let go of a controller button",
    ),
    (
        "axis",
        "axis <forward|turn> <-127..127> - move a stick",
    ),
    (
        "tick",
        "tick [count]                    - advance by input periods (default 1)",
    ),
    (
        "wait",
        "wait <ms>                       - advance virtual time",
    ),
    (
        "start",
        "start                           - begin a driver-control period",
    ),
    (
        "stop",
        "stop                            - end the period and make actuators safe",
    ),
    (
        "fault",
        "fault <actuators|drive> <on|off> - take a device link down or up",
    ),
    (
        "status",
        "status                          - show the operator status line",
    ),
    (
        "help",
        "help [topic]                    - show help for a command",
    ),
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Clamp,
    Intake,
    Arm,
    Drive,
    Fault,
}

impl TranscriptProfile {
    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::Clamp => "transcripts/teleop-clamp.log",
            TranscriptProfile::Intake => "transcripts/teleop-intake.log",
            TranscriptProfile::Arm => "transcripts/teleop-arm.log",
            TranscriptProfile::Drive => "transcripts/teleop-drive.log",
            TranscriptProfile::Fault => "transcripts/teleop-fault.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Clamp => "Teleop emulator clamp toggle transcript",
            TranscriptProfile::Intake => "Teleop emulator intake transcript",
            TranscriptProfile::Arm => "Teleop emulator arm toggle and jog transcript",
            TranscriptProfile::Drive => "Teleop emulator long-hold drive transcript",
            TranscriptProfile::Fault => "Teleop emulator actuator fault transcript",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        const TAGS: [(&str, TranscriptProfile); 5] = [
            ("clamp", TranscriptProfile::Clamp),
            ("intake", TranscriptProfile::Intake),
            ("arm", TranscriptProfile::Arm),
            ("drive", TranscriptProfile::Drive),
            ("fault", TranscriptProfile::Fault),
        ];

        TAGS.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tag))
            .map(|(_, profile)| *profile)
            .ok_or_else(|| format!("Unknown transcript profile `{tag}`"))
    }
}

/// Virtual milliseconds since the session began.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct HostMillis(u64);

impl HostMillis {
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    fn elapsed(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Add<Duration> for HostMillis {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

/// Operator command accepted at the prompt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command<'a> {
    Press(ButtonId),
    Release(ButtonId),
    Axis(AxisId, i8),
    Tick(u32),
    Wait(Duration),
    Start,
    Stop,
    Fault(FaultTarget, bool),
    Status,
    Help(Option<&'a str>),
}

/// Device link the operator can take down.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaultTarget {
    Actuators,
    Drive,
}

pub fn parse_command(line: &str) -> Result<Command<'_>, String> {
    terminated(command, (space0, eof))
        .parse(line)
        .map_err(|err| format!("unrecognized input at column {}", err.offset() + 1))
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    preceded(
        space0,
        alt((
            preceded((Caseless("press"), space1), button).map(Command::Press),
            preceded((Caseless("release"), space1), button).map(Command::Release),
            preceded(
                (Caseless("axis"), space1),
                separated_pair(axis, space1, dec_int),
            )
            .map(|(axis, value): (AxisId, i16)| Command::Axis(axis, normalize_axis(value))),
            preceded(Caseless("tick"), opt(preceded(space1, dec_uint)))
                .map(|count: Option<u32>| Command::Tick(count.unwrap_or(1))),
            preceded((Caseless("wait"), space1), dec_uint)
                .map(|millis: u64| Command::Wait(Duration::from_millis(millis))),
            Caseless("start").value(Command::Start),
            Caseless("stop").value(Command::Stop),
            Caseless("status").value(Command::Status),
            preceded(
                (Caseless("fault"), space1),
                separated_pair(fault_target, space1, on_off),
            )
            .map(|(target, down)| Command::Fault(target, down)),
            preceded(Caseless("help"), opt(preceded(space1, alpha1))).map(Command::Help),
        )),
    )
    .parse_next(input)
}

fn button(input: &mut &str) -> ModalResult<ButtonId> {
    alphanumeric1
        .verify_map(ButtonId::from_label)
        .parse_next(input)
}

fn axis(input: &mut &str) -> ModalResult<AxisId> {
    alt((
        Caseless("forward").value(AxisId::Forward),
        Caseless("turn").value(AxisId::Turn),
    ))
    .parse_next(input)
}

fn fault_target(input: &mut &str) -> ModalResult<FaultTarget> {
    alt((
        Caseless("actuators").value(FaultTarget::Actuators),
        Caseless("drive").value(FaultTarget::Drive),
    ))
    .parse_next(input)
}

fn on_off(input: &mut &str) -> ModalResult<bool> {
    alt((Caseless("on").value(true), Caseless("off").value(false))).parse_next(input)
}

/// Actuator sink that accepts everything until its link is taken down.
#[derive(Debug, Default)]
struct HostActuators {
    offline: bool,
    accepted: usize,
}

impl ActuatorOutput for HostActuators {
    fn apply(&mut self, _: ActuatorCommand) -> Result<(), ActuatorFault> {
        if self.offline {
            return Err(ActuatorFault::Disconnected);
        }
        self.accepted += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HostDrivetrain {
    offline: bool,
    accepted: usize,
}

impl DrivetrainOutput for HostDrivetrain {
    fn arcade_drive(&mut self, _: DriveCommand) -> Result<(), ActuatorFault> {
        if self.offline {
            return Err(ActuatorFault::Disconnected);
        }
        self.accepted += 1;
        Ok(())
    }
}

/// Last drive outcome echoed to the operator; repeats are suppressed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct DriveEcho {
    command: Option<DriveCommand>,
    fault: Option<ActuatorFault>,
}

pub struct Session {
    scheduler: Scheduler<HostMillis>,
    controller: ControllerSnapshot,
    actuators: HostActuators,
    drivetrain: HostDrivetrain,
    echo: DriveEcho,
    now: HostMillis,
    transcript: TranscriptLogger,
}

impl Session {
    pub fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let transcript = TranscriptLogger::new(profile)?;
        Ok(Self::with_transcript(transcript))
    }

    /// Session whose transcript goes nowhere.
    #[cfg(test)]
    pub fn detached() -> Self {
        Self::with_transcript(TranscriptLogger::discard())
    }

    fn with_transcript(transcript: TranscriptLogger) -> Self {
        Self {
            scheduler: Scheduler::new(&TeleopConfig::default()),
            controller: ControllerSnapshot::neutral(),
            actuators: HostActuators::default(),
            drivetrain: HostDrivetrain::default(),
            echo: DriveEcho::default(),
            now: HostMillis::default(),
            transcript,
        }
    }

    #[cfg(test)]
    pub const fn now(&self) -> HostMillis {
        self.now
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.now.elapsed();
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, trimmed)?;

        let lines = match parse_command(trimmed) {
            Ok(command) => self.execute(command),
            Err(err) => vec![format!("ERR syntax {err}")],
        };

        self.record_output(self.now.elapsed(), &lines)?;
        Ok(lines)
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<String> {
        match command {
            Command::Press(button) => {
                self.controller.set_button(button, true);
                vec![format!("OK {button} held")]
            }
            Command::Release(button) => {
                self.controller.set_button(button, false);
                vec![format!("OK {button} released")]
            }
            Command::Axis(axis, value) => {
                self.controller.set_axis(axis, value);
                vec![format!("OK {}={value:+}", axis.label())]
            }
            Command::Tick(count) => {
                let period = self.scheduler.periods().input;
                self.advance(period.saturating_mul(count))
            }
            Command::Wait(duration) => self.advance(duration),
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Fault(target, down) => {
                let (label, offline) = match target {
                    FaultTarget::Actuators => ("actuators", &mut self.actuators.offline),
                    FaultTarget::Drive => ("drive", &mut self.drivetrain.offline),
                };
                *offline = down;
                let state = if down { "offline" } else { "online" };
                vec![format!("OK {label} {state}")]
            }
            Command::Status => self.status(),
            Command::Help(topic) => help(topic),
        }
    }

    fn start(&mut self) -> Vec<String> {
        self.echo = DriveEcho::default();
        let report = self
            .scheduler
            .start(self.now, &mut self.actuators, &mut self.drivetrain);
        let mut lines = Vec::new();
        if let Some(stopped) = &report.stopped {
            self.describe_stop(stopped, &mut lines);
        }
        lines.extend(
            report
                .input
                .events()
                .iter()
                .map(|event| stamp(self.now, &format!("input {event}"))),
        );
        lines.push("OK driver control started".to_string());
        lines
    }

    fn stop(&mut self) -> Vec<String> {
        if !self.scheduler.is_running() {
            return vec!["ERR not running".to_string()];
        }

        let report = self
            .scheduler
            .stop(&mut self.actuators, &mut self.drivetrain);
        let mut lines = Vec::new();
        self.describe_stop(&report, &mut lines);
        lines.push("OK driver control stopped".to_string());
        lines
    }

    fn describe_stop(&self, report: &StopReport, lines: &mut Vec<String>) {
        lines.extend(
            report
                .input
                .events()
                .iter()
                .map(|event| stamp(self.now, &format!("input {event}"))),
        );
        match report.drive_fault {
            Some(fault) => lines.push(stamp(self.now, &format!("drive fault: {fault}"))),
            None => lines.push(stamp(self.now, &format!("drive {}", DriveCommand::neutral()))),
        }
    }

    fn advance(&mut self, duration: Duration) -> Vec<String> {
        let target = self.now + duration;
        let mut lines = Vec::new();
        let mut input_ticks = 0usize;
        let mut drive_ticks = 0usize;
        let echo = &mut self.echo;

        self.scheduler.poll(
            target,
            &self.controller,
            &mut self.actuators,
            &mut self.drivetrain,
            |deadline, tick| match tick {
                ScheduledTick::Input(report) => {
                    input_ticks += 1;
                    for event in report.events() {
                        lines.push(stamp(deadline, &format!("input {event}")));
                    }
                }
                ScheduledTick::Drive(report) => {
                    drive_ticks += 1;
                    if echo.command != Some(report.command) {
                        echo.command = Some(report.command);
                        lines.push(stamp(deadline, &format!("drive {}", report.command)));
                    }
                    if echo.fault != report.fault {
                        echo.fault = report.fault;
                        let detail = match report.fault {
                            Some(fault) => format!("drive fault: {fault}"),
                            None => "drive link restored".to_string(),
                        };
                        lines.push(stamp(deadline, &detail));
                    }
                }
            },
        );

        self.now = target;
        if self.scheduler.is_running() {
            lines.push(format!(
                "OK t={} ms ({input_ticks} input, {drive_ticks} drive ticks)",
                self.now.as_millis()
            ));
        } else {
            lines.push(format!("OK t={} ms (loops stopped)", self.now.as_millis()));
        }
        lines
    }

    fn status(&self) -> Vec<String> {
        let mut lines = vec![self.scheduler.status().to_string()];
        if let Some(command) = self.echo.command {
            lines.push(format!("last {command}"));
        }
        lines.push(format!(
            "accepted actuators={} drive={}",
            self.actuators.accepted, self.drivetrain.accepted
        ));
        lines
    }

    fn record_output(&mut self, elapsed: Duration, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(elapsed, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn stamp(at: HostMillis, text: &str) -> String {
    format!("[{:>6} ms] {text}", at.as_millis())
}

fn help(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => {
            let mut lines = vec![format!("Topics: {}", help_topic_list())];
            lines.extend(HELP_TOPICS.iter().map(|(_, usage)| (*usage).to_string()));
            lines
        }
        Some(topic) => HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(topic))
            .map_or_else(
                || vec![format!("ERR unknown topic `{topic}`. Topics: {}", help_topic_list())],
                |(_, usage)| vec![(*usage).to_string()],
            ),
    }
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

struct TranscriptLogger {
    writer: Box<dyn Write>,
}

impl TranscriptLogger {
    fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let path = Path::new(profile.log_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: Box::new(BufWriter::new(file)),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    #[cfg(test)]
    fn discard() -> Self {
        Self {
            writer: Box::new(io::sink()),
        }
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are virtual milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(session: &mut Session, line: &str) -> Vec<String> {
        session.handle_command(line).unwrap()
    }

    fn mentions(lines: &[String], needle: &str) -> usize {
        lines.iter().filter(|line| line.contains(needle)).count()
    }

    #[test]
    fn parses_operator_commands() {
        assert_eq!(
            parse_command("press r2"),
            Ok(Command::Press(ButtonId::IntakeForward))
        );
        assert_eq!(
            parse_command("RELEASE Down"),
            Ok(Command::Release(ButtonId::ArmJogDown))
        );
        assert_eq!(
            parse_command("axis turn -300"),
            Ok(Command::Axis(AxisId::Turn, -127))
        );
        assert_eq!(parse_command("tick"), Ok(Command::Tick(1)));
        assert_eq!(parse_command("tick 4  "), Ok(Command::Tick(4)));
        assert_eq!(
            parse_command("wait 120"),
            Ok(Command::Wait(Duration::from_millis(120)))
        );
        assert_eq!(
            parse_command("fault drive on"),
            Ok(Command::Fault(FaultTarget::Drive, true))
        );
        assert_eq!(parse_command("help axis"), Ok(Command::Help(Some("axis"))));
        assert_eq!(parse_command("status"), Ok(Command::Status));
        assert_eq!(parse_command("stop"), Ok(Command::Stop));
    }

    #[test]
    fn rejects_unknown_buttons_and_trailing_input() {
        assert!(parse_command("press X").is_err());
        assert!(parse_command("startx").is_err());
        assert!(parse_command("tick -1").is_err());
    }

    #[test]
    fn intake_press_runs_once_per_hold() {
        let mut session = Session::detached();
        run(&mut session, "start");
        run(&mut session, "tick");
        run(&mut session, "press R2");
        let held = run(&mut session, "tick 3");
        assert_eq!(mentions(&held, "command intake power +127"), 1);

        run(&mut session, "release R2");
        run(&mut session, "tick");
        run(&mut session, "press R2");
        let second = run(&mut session, "tick");
        assert_eq!(mentions(&second, "command intake brake"), 1);
        assert_eq!(run(&mut session, "status")[0], "CLP:O INT:- ARM:S *");
    }

    #[test]
    fn drive_echo_only_reports_changes() {
        let mut session = Session::detached();
        run(&mut session, "start");
        run(&mut session, "axis forward 64");
        let lines = run(&mut session, "wait 100");

        assert_eq!(mentions(&lines, "drive arcade fwd=+64"), 1);
        assert_eq!(lines.last().unwrap(), "OK t=100 ms (3 input, 6 drive ticks)");
        assert_eq!(session.now(), HostMillis(100));
    }

    #[test]
    fn faults_are_reported_and_stop_is_safe() {
        let mut session = Session::detached();
        run(&mut session, "start");
        run(&mut session, "fault actuators on");
        run(&mut session, "tick");
        run(&mut session, "press A");
        let lines = run(&mut session, "tick");
        assert_eq!(mentions(&lines, "fault clamp assert: disconnected"), 1);

        run(&mut session, "fault actuators off");
        let stopped = run(&mut session, "stop");
        assert_eq!(mentions(&stopped, "command intake brake"), 1);
        assert_eq!(mentions(&stopped, "command arm brake"), 1);
        assert_eq!(stopped.last().unwrap(), "OK driver control stopped");
        assert_eq!(run(&mut session, "stop"), vec!["ERR not running".to_string()]);
    }

    #[test]
    fn restart_brakes_a_running_intake() {
        let mut session = Session::detached();
        run(&mut session, "start");
        run(&mut session, "tick");
        run(&mut session, "press R2");
        run(&mut session, "tick");
        run(&mut session, "release R2");
        assert_eq!(run(&mut session, "status")[0], "CLP:O INT:F ARM:S *");

        let lines = run(&mut session, "start");
        assert_eq!(mentions(&lines, "command intake brake"), 1);
        assert_eq!(mentions(&lines, "input stopped"), 1);
        assert_eq!(mentions(&lines, "input started"), 1);
        assert_eq!(run(&mut session, "status")[0], "CLP:O INT:- ARM:S");
    }

    #[test]
    fn unknown_input_reports_syntax_error() {
        let mut session = Session::detached();
        let lines = run(&mut session, "jump 3");
        assert!(lines[0].starts_with("ERR syntax"));
        assert_eq!(help(Some("nope")).len(), 1);
    }
}
