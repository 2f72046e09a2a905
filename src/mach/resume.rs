use super::{KeystrokeSink, LoadedSnapshot, Session, SoundQueue};
use crate::lang::{decode, Error, Format};
use log::{info, warn};

type Result<T> = std::result::Result<T, Error>;

/// A live session rebuilt from a snapshot, with the file handles that could
/// not be reopened.
#[derive(Debug)]
pub struct Resumed {
    pub session: Session,
    pub failures: Vec<Error>,
}

impl Resumed {
    pub fn failed_handles(&self) -> Vec<u8> {
        self.failures.iter().filter_map(|e| e.handle()).collect()
    }
}

/// Bring a loaded snapshot back to life. Only a program that fails to
/// decode stops the resume. Files are reopened before the pending keys are
/// queued, since those keys may refer to the files.
pub fn resume(loaded: LoadedSnapshot) -> Result<Resumed> {
    let snapshot = loaded.into_inner();
    let program = decode(&snapshot.program)?;

    let mut session = Session::new(snapshot.config);
    session.program = program;
    session.protected = snapshot.program.format() == Format::Protected;
    session.var = snapshot.var;

    let mut failures = vec![];
    for record in &snapshot.files {
        if let Err(error) = session.files.reopen(record) {
            failures.push(error);
        }
    }

    session.sound = SoundQueue::from_events(snapshot.sound);
    session.play_state = snapshot.play;
    session.foreground = snapshot.foreground;
    session.keys.inject(&snapshot.keys);

    if failures.is_empty() {
        info!(
            "resumed {} lines, {} files",
            session.program.len(),
            session.files.len()
        );
    } else {
        warn!(
            "resumed {} lines, {} of {} files failed to reopen",
            session.program.len(),
            failures.len(),
            snapshot.files.len()
        );
    }
    Ok(Resumed { session, failures })
}
