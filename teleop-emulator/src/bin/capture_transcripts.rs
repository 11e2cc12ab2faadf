use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    record_profile(TranscriptProfile::Clamp)?;
    record_profile(TranscriptProfile::Intake)?;
    record_profile(TranscriptProfile::Arm)?;
    record_profile(TranscriptProfile::Drive)?;
    record_profile(TranscriptProfile::Fault)?;
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::new(profile)?;
    let script: &[&str] = match profile {
        TranscriptProfile::Clamp => &[
            "start",
            "tick",
            "press A",
            "tick",
            "release A",
            "tick",
            "press A",
            "tick",
            "release A",
            "tick",
            "status",
        ],
        TranscriptProfile::Intake => &[
            "start",
            "tick",
            "press R2",
            "tick 3",
            "release R2",
            "tick",
            "press R2",
            "tick",
            "release R2",
            "tick",
            "press R1",
            "press R2",
            "tick",
            "status",
            "release R1",
            "release R2",
            "tick",
            "press R1",
            "tick",
            "status",
        ],
        TranscriptProfile::Arm => &[
            "start",
            "tick",
            "press L1",
            "tick",
            "release L1",
            "tick",
            "press UP",
            "tick 2",
            "release UP",
            "tick",
            "press DOWN",
            "tick",
            "press L1",
            "tick",
            "status",
            "release L1",
            "tick 2",
            "status",
        ],
        TranscriptProfile::Drive => &[
            "start",
            "axis forward 90",
            "axis turn -40",
            "tick",
            "press A",
            "wait 2000",
            "status",
            "release A",
            "tick",
            "axis forward 0",
            "axis turn 0",
            "tick",
            "stop",
        ],
        TranscriptProfile::Fault => &[
            "start",
            "tick",
            "fault actuators on",
            "fault drive on",
            "press R2",
            "wait 200",
            "release R2",
            "fault actuators off",
            "fault drive off",
            "tick",
            "press R2",
            "tick",
            "status",
            "stop",
        ],
    };

    for line in script {
        let _ = session.handle_command(line)?;
    }
    Ok(())
}
