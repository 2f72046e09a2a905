use super::{
    load, persist, resume, snapshot, Command, FileTable, Host, KeyBuffer, Mml, PlayState, Resumed,
    SoundQueue, Tone, Var,
};
use crate::config::Config;
use crate::error;
use crate::lang::{decode, encode, EncodedBlob, Error, Format, ProgramImage};
use chrono::{DateTime, Utc};
use log::debug;
use std::path::Path;

type Result<T> = std::result::Result<T, Error>;

/// ## Session
///
/// Everything a running interpreter owns: the program, its variables, the
/// open files, the sound queue with its PLAY settings and the keys waiting
/// to be read. The
/// language executor drives it through `&mut Session`; a snapshot borrows
/// it immutably, so nothing can change while one is being taken.

#[derive(Debug)]
pub struct Session {
    pub(crate) program: ProgramImage,
    pub(crate) protected: bool,
    pub(crate) var: Var,
    pub(crate) files: FileTable,
    pub(crate) sound: SoundQueue,
    pub(crate) play_state: PlayState,
    pub(crate) foreground: bool,
    pub(crate) keys: KeyBuffer,
    pub(crate) config: Config,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Config::default())
    }
}

impl Session {
    pub fn new(config: Config) -> Session {
        Session {
            program: ProgramImage::new(),
            protected: false,
            var: Var::new(),
            files: FileTable::new(config.max_files, config.record_len),
            sound: SoundQueue::new(),
            play_state: PlayState::default(),
            foreground: true,
            keys: KeyBuffer::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn program(&self) -> &ProgramImage {
        &self.program
    }

    /// The program for editing. Editing a protected program is refused.
    pub fn program_mut(&mut self) -> Result<&mut ProgramImage> {
        if self.protected {
            return Err(error!(IllegalFunctionCall; "PROGRAM IS PROTECTED"));
        }
        Ok(&mut self.program)
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Replace the program with the contents of a program file. Variables
    /// are cleared the way LOAD clears them.
    pub fn load_program(&mut self, blob: &EncodedBlob) -> Result<()> {
        let program = decode(blob)?;
        self.program = program;
        self.protected = blob.format() == Format::Protected;
        self.var.clear();
        debug!(
            "loaded {} lines{}",
            self.program.len(),
            if self.protected { ", protected" } else { "" }
        );
        Ok(())
    }

    pub fn save_program(&self, format: Format) -> Result<EncodedBlob> {
        if self.protected && format != Format::Protected {
            return Err(error!(IllegalFunctionCall; "PROGRAM IS PROTECTED"));
        }
        Ok(encode(&self.program, format))
    }

    /// The program the way it sits in memory, for snapshots.
    pub fn resident_program(&self) -> EncodedBlob {
        if self.protected {
            encode(&self.program, Format::Protected)
        } else {
            encode(&self.program, Format::Tokenised)
        }
    }

    pub fn var(&self) -> &Var {
        &self.var
    }

    pub fn var_mut(&mut self) -> &mut Var {
        &mut self.var
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FileTable {
        &mut self.files
    }

    pub fn keys(&self) -> &KeyBuffer {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut KeyBuffer {
        &mut self.keys
    }

    pub fn sound(&self) -> &SoundQueue {
        &self.sound
    }

    pub fn foreground(&self) -> bool {
        self.foreground
    }

    /// MB and MF.
    pub fn set_foreground(&mut self, foreground: bool) {
        self.foreground = foreground;
    }

    /// Queue a note. In the background this first waits until no more than
    /// `backlog` notes will be pending; in the foreground it waits afterwards
    /// until the note is the last one left. A break from the host drops the
    /// note along with the rest of the queue.
    pub fn play<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        tone: Tone,
        duration: f64,
        fill: f64,
        looping: bool,
    ) {
        if self.queue_note(host, tone, duration, fill, looping) && self.foreground {
            self.sound.wait(0, false, host);
        }
    }

    /// PLAY with a music macro language string. In the foreground this
    /// returns once the tune has finished.
    pub fn play_mml<H: Host + ?Sized>(&mut self, host: &mut H, mml: &str) -> Result<()> {
        let mut mml = Mml::new(mml);
        while let Some(command) = mml.next(&mut self.play_state, &self.var)? {
            match command {
                Command::Foreground(foreground) => self.foreground = foreground,
                Command::Note {
                    tone,
                    duration,
                    fill,
                } => {
                    if !self.queue_note(host, tone, duration, fill, false) {
                        return Ok(());
                    }
                }
            }
        }
        if self.foreground {
            self.sound.wait(0, true, host);
        }
        Ok(())
    }

    pub fn play_state(&self) -> &PlayState {
        &self.play_state
    }

    fn queue_note<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        tone: Tone,
        duration: f64,
        fill: f64,
        looping: bool,
    ) -> bool {
        if !self.sound.wait(self.config.sound.backlog, true, host) {
            return false;
        }
        self.sound.enqueue(host.now(), tone, duration, fill, looping);
        true
    }

    pub fn beep<H: Host + ?Sized>(&mut self, host: &mut H) {
        let tone = Tone::Frequency(self.config.sound.beep_frequency);
        let duration = self.config.sound.beep_duration;
        self.play(host, tone, duration, 1.0, false);
    }

    /// Notes queued behind the one playing.
    pub fn notes_pending(&self) -> usize {
        self.sound.pending_count()
    }

    pub fn stop_sound(&mut self) {
        self.sound.reset();
    }

    /// Once per pass of the executor's event loop.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.sound.reap(now);
    }

    /// Save the whole session to `path`.
    pub fn checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist(&snapshot(self)?, path)
    }

    /// Bring back a session saved with `checkpoint`.
    pub fn restore<P: AsRef<Path>>(path: P) -> Result<Resumed> {
        resume(load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;
    use crate::mach::Clock;
    use chrono::{Duration, TimeZone};

    struct Tick {
        now: DateTime<Utc>,
    }

    impl Clock for Tick {
        fn now(&self) -> DateTime<Utc> {
            self.now
        }
    }

    impl Host for Tick {
        fn idle(&mut self) {
            self.now = self.now + Duration::milliseconds(10);
        }

        fn check_events(&mut self) -> bool {
            false
        }
    }

    fn host() -> Tick {
        Tick {
            now: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn test_protected_program_stays_protected() {
        let mut session = Session::default();
        let text = EncodedBlob::from_bytes(b"10 PRINT 1\r\n\x1a".to_vec()).unwrap();
        session.load_program(&text).unwrap();
        let protected = session.save_program(Format::Protected).unwrap();
        session.load_program(&protected).unwrap();
        assert!(session.is_protected());
        assert_eq!(session.resident_program().format(), Format::Protected);
        let error = session.save_program(Format::PlainText).unwrap_err();
        assert_eq!(error.code(), ErrorCode::IllegalFunctionCall);
        assert!(session.program_mut().is_err());
        session.load_program(&text).unwrap();
        assert!(!session.is_protected());
        assert!(session.program_mut().is_ok());
    }

    #[test]
    fn test_background_play_keeps_backlog() {
        let mut session = Session::default();
        session.config.sound.backlog = 2;
        session.set_foreground(false);
        let mut host = host();
        for _ in 0..6 {
            session.play(&mut host, Tone::Frequency(440), 0.1, 1.0, false);
            assert!(session.notes_pending() <= 2);
        }
        assert_eq!(session.notes_pending(), 2);
    }

    #[test]
    fn test_play_mml() {
        let mut session = Session::default();
        let mut host = host();
        session.play_mml(&mut host, "MB T240 L8 O2 CDEFGAB>C").unwrap();
        assert!(!session.foreground());
        assert_eq!(session.notes_pending(), 7);
        let first = session.sound().events().next().unwrap().clone();
        assert_eq!(first.tone, Tone::Frequency(262));
        assert_eq!(first.duration, 0.125);
        assert_eq!(first.fill, 7.0 / 8.0);
        assert_eq!(session.play_state().octave, 3);

        session.play_mml(&mut host, "MF C").unwrap();
        assert!(session.foreground());
        assert!(session.sound().is_empty());
        assert_eq!(session.play_state().tempo, 240);

        let error = session.play_mml(&mut host, "L0").unwrap_err();
        assert_eq!(error.code(), ErrorCode::IllegalFunctionCall);
    }

    #[test]
    fn test_foreground_play_waits() {
        let mut session = Session::default();
        let mut host = host();
        session.play(&mut host, Tone::Frequency(440), 0.1, 1.0, false);
        session.beep(&mut host);
        assert_eq!(session.notes_pending(), 0);
        assert_eq!(session.sound().len(), 1);
        let beep = session.sound().events().next().unwrap().clone();
        assert_eq!(beep.tone, Tone::Frequency(800));
        session.tick(host.now + Duration::seconds(1));
        assert!(session.sound().is_empty());
    }
}
