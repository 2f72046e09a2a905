/*!
## Session snapshots

A snapshot is everything needed to carry a session across a restart. On
disk it is a small header followed by the snapshot as compressed JSON:

| Bytes | Contents                                  |
|-------|-------------------------------------------|
| 8     | `BASICSES`                                |
| 2     | major version, little endian              |
| 2     | minor version, little endian              |
| 4     | payload length, little endian             |
| 4     | CRC-32 of the payload, little endian      |
| ...   | payload: zlib compressed JSON             |

Files written by any minor version of the same major version load.

*/

use super::{FileRecord, PlayState, Session, SoundEvent, Val, Var};
use crate::config::Config;
use crate::error;
use crate::lang::{decode, io_error, EncodedBlob, Error};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

type Result<T> = std::result::Result<T, Error>;

const MAGIC: &[u8; 8] = b"BASICSES";
const MAJOR_VERSION: u16 = 1;
const MINOR_VERSION: u16 = 0;
const HEADER_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub program: EncodedBlob,
    pub var: Var,
    pub files: Vec<FileRecord>,
    pub sound: Vec<SoundEvent>,
    #[serde(default)]
    pub play: PlayState,
    #[serde(default = "foreground_default")]
    pub foreground: bool,
    /// Pending keystrokes in the order they will be delivered.
    pub keys: String,
    #[serde(default)]
    pub config: Config,
}

fn foreground_default() -> bool {
    true
}

/// A snapshot that has been through `persist` and `load`. Only this can be
/// resumed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot(SessionSnapshot);

impl LoadedSnapshot {
    pub fn into_inner(self) -> SessionSnapshot {
        self.0
    }
}

impl std::ops::Deref for LoadedSnapshot {
    type Target = SessionSnapshot;
    fn deref(&self) -> &SessionSnapshot {
        &self.0
    }
}

pub fn snapshot(session: &Session) -> Result<SessionSnapshot> {
    let snapshot = SessionSnapshot {
        program: session.resident_program(),
        var: session.var.clone(),
        files: session.files.records()?,
        sound: session.sound.events().cloned().collect(),
        play: session.play_state.clone(),
        foreground: session.foreground,
        keys: session.keys.pending(),
        config: session.config.clone(),
    };
    debug!(
        "captured {} lines, {} variables, {} files, {} sound events, {} keys",
        session.program.len(),
        snapshot.var.len(),
        snapshot.files.len(),
        snapshot.sound.len(),
        snapshot.keys.chars().count()
    );
    Ok(snapshot)
}

/// Write a snapshot to `path`, replacing whatever was there. The file is
/// written beside the target and renamed over it.
pub fn persist<P: AsRef<Path>>(snapshot: &SessionSnapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(snapshot)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(&e))?;
    file.write_all(&bytes).map_err(|e| io_error(&e))?;
    file.as_file().sync_all().map_err(|e| io_error(&e))?;
    file.persist(path).map_err(|e| io_error(&e.error))?;
    info!("saved session to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedSnapshot> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(error!(NoSuchSnapshot; path.display().to_string()))
        }
        Err(e) => return Err(io_error(&e)),
    };
    let snapshot = from_bytes(&bytes)?;
    info!("loaded session from {}", path.display());
    Ok(LoadedSnapshot(snapshot))
}

/// JSON has no NaN or infinity; a snapshot holding one could be written
/// but never read back.
fn check_finite(snapshot: &SessionSnapshot) -> Result<()> {
    let not_finite = |what: &str| Err(error!(Overflow; format!("{} IS NOT A NUMBER", what)));
    for (name, val) in snapshot.var.iter() {
        let finite = match val {
            Val::Single(n) => n.is_finite(),
            Val::Double(n) => n.is_finite(),
            _ => true,
        };
        if !finite {
            return not_finite(name);
        }
    }
    for event in &snapshot.sound {
        if !event.duration.is_finite() || !event.fill.is_finite() {
            return not_finite("SOUND EVENT");
        }
    }
    if !snapshot.config.sound.beep_duration.is_finite() {
        return not_finite("BEEP DURATION");
    }
    Ok(())
}

fn to_bytes(snapshot: &SessionSnapshot) -> Result<Vec<u8>> {
    check_finite(snapshot)?;
    let json = serde_json::to_vec(snapshot).map_err(|e| error!(InternalError; e.to_string()))?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).map_err(|e| io_error(&e))?;
    let payload = encoder.finish().map_err(|e| io_error(&e))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&MAJOR_VERSION.to_le_bytes());
    bytes.extend_from_slice(&MINOR_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&crc::crc32::checksum_ieee(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    debug!("snapshot json {} bytes, compressed {}", json.len(), payload.len());
    Ok(bytes)
}

fn from_bytes(bytes: &[u8]) -> Result<SessionSnapshot> {
    if bytes.len() < HEADER_LEN {
        return Err(error!(CorruptSnapshot; "TRUNCATED HEADER"));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if &header[0..8] != MAGIC {
        return Err(error!(CorruptSnapshot; "NOT A SESSION FILE"));
    }
    let word = |i: usize| u16::from_le_bytes([header[i], header[i + 1]]);
    let dword = |i: usize| u32::from_le_bytes([header[i], header[i + 1], header[i + 2], header[i + 3]]);
    let (major, minor) = (word(8), word(10));
    if major != MAJOR_VERSION {
        return Err(error!(CorruptSnapshot; format!("VERSION {}.{}", major, minor)));
    }
    if dword(12) as usize != payload.len() {
        return Err(error!(CorruptSnapshot; "TRUNCATED"));
    }
    if dword(16) != crc::crc32::checksum_ieee(payload) {
        return Err(error!(CorruptSnapshot; "CHECKSUM"));
    }
    let mut json = vec![];
    ZlibDecoder::new(payload)
        .read_to_end(&mut json)
        .map_err(|e| error!(CorruptSnapshot; e.to_string()))?;
    let snapshot: SessionSnapshot =
        serde_json::from_slice(&json).map_err(|e| error!(CorruptSnapshot; e.to_string()))?;
    if let Err(e) = decode(&snapshot.program) {
        return Err(error!(CorruptSnapshot; e.to_string()));
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{ErrorCode, Format};
    use crate::mach::Val;

    fn sample() -> SessionSnapshot {
        let mut session = Session::default();
        let text = EncodedBlob::from_bytes(b"10 PRINT A\r\n20 GOTO 10\r\n".to_vec()).unwrap();
        session.load_program(&text).unwrap();
        session.var_mut().store("A", Val::Single(1.5)).unwrap();
        session.var_mut().store("N$", Val::String("HELLO".into())).unwrap();
        session.keys_mut().push_str("RUN\r");
        snapshot(&session).unwrap()
    }

    #[test]
    fn test_capture() {
        let snapshot = sample();
        assert_eq!(snapshot.program.format(), Format::Tokenised);
        assert_eq!(snapshot.var.len(), 2);
        assert_eq!(snapshot.keys, "RUN\r");
        assert!(snapshot.files.is_empty());
        assert!(snapshot.foreground);
    }

    #[test]
    fn test_bytes_round_trip() {
        let snapshot = sample();
        let bytes = to_bytes(&snapshot).unwrap();
        assert_eq!(&bytes[..8], MAGIC);
        assert_eq!(from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_corruption_is_detected() {
        let bytes = to_bytes(&sample()).unwrap();
        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0x55;
        let mut version = bytes.clone();
        version[8] = 2;
        let mut magic = bytes.clone();
        magic[0] = b'X';
        for bad in &[flipped, version, magic, bytes[..HEADER_LEN + 3].to_vec(), vec![]] {
            let error = from_bytes(bad).unwrap_err();
            assert_eq!(error.code(), ErrorCode::CorruptSnapshot);
        }
    }

    #[test]
    fn test_newer_minor_version_loads() {
        let snapshot = sample();
        let mut bytes = to_bytes(&snapshot).unwrap();
        bytes[10] = 7;
        assert_eq!(from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_non_finite_numbers_are_refused() {
        let mut snapshot = sample();
        snapshot.sound.push(SoundEvent {
            tone: crate::mach::Tone::Rest,
            duration: f64::NAN,
            fill: 1.0,
            looping: false,
            end: chrono::Utc::now(),
        });
        let error = to_bytes(&snapshot).unwrap_err();
        assert_eq!(error.code(), ErrorCode::Overflow);

        let mut snapshot = sample();
        snapshot.config.sound.beep_duration = f64::INFINITY;
        let error = to_bytes(&snapshot).unwrap_err();
        assert_eq!(error.code(), ErrorCode::Overflow);
    }

    #[test]
    fn test_bad_program_blob() {
        let mut snapshot = sample();
        snapshot.program = EncodedBlob::Tokenised(vec![0xFF, 0x76, 0x12]);
        let bytes = to_bytes(&snapshot).unwrap();
        let error = from_bytes(&bytes).unwrap_err();
        assert_eq!(error.code(), ErrorCode::CorruptSnapshot);
    }
}
