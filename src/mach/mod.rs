/*!
## Rust Machine Module

This Rust module holds a running BASIC session: variables, open files,
the sound queue, PLAY settings and pending keystrokes, and the snapshots that let a
session stop in one process and carry on in another.

*/

mod file;
mod keys;
mod play;
mod resume;
mod session;
mod snapshot;
mod sound;
mod val;
mod var;

pub use file::{FileMode, FileRecord, FileTable};
pub use keys::{KeyBuffer, KeystrokeSink};
pub use play::{note_frequency, Articulation, Command, Mml, PlayState};
pub use resume::{resume, Resumed};
pub use session::Session;
pub use snapshot::{load, persist, snapshot, LoadedSnapshot, SessionSnapshot};
pub use sound::{Clock, Host, SoundEvent, SoundQueue, SystemClock, Tone};
pub use val::Val;
pub use var::Var;
