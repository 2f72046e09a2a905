use super::{Tone, Val, Var};
use crate::error;
use crate::lang::Error;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Music macro language
///
/// The string argument of PLAY. Settings made by one PLAY statement carry
/// over to the next through `PlayState`.

const MAX_EXPANSIONS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Articulation {
    Normal,
    Legato,
    Staccato,
}

impl Articulation {
    pub fn fill(self) -> f64 {
        match self {
            Articulation::Normal => 7.0 / 8.0,
            Articulation::Legato => 1.0,
            Articulation::Staccato => 3.0 / 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayState {
    /// 0 to 6.
    pub octave: u8,
    /// Note length as a fraction of a whole note: 4 is a quarter note.
    pub length: u8,
    /// Quarter notes per minute.
    pub tempo: u8,
    pub articulation: Articulation,
}

impl Default for PlayState {
    fn default() -> Self {
        PlayState {
            octave: 4,
            length: 4,
            tempo: 120,
            articulation: Articulation::Normal,
        }
    }
}

impl PlayState {
    /// Seconds for a note of length `1/length` with `dots` dots.
    fn seconds(&self, length: u8, dots: i32) -> f64 {
        240.0 / self.tempo as f64 / length as f64 * 1.5f64.powi(dots)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Note { tone: Tone, duration: f64, fill: f64 },
    /// MF or MB.
    Foreground(bool),
}

/// Frequency of note `n` counting semitones from C in octave 0.
pub fn note_frequency(n: u8) -> u32 {
    (440.0 * 2f64.powf((n as f64 - 33.0) / 12.0)).round() as u32
}

fn semitone(letter: u8) -> i32 {
    match letter {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        _ => 11,
    }
}

/// Reads commands out of a PLAY string. `X` splices the contents of a
/// string variable into the rest of the string.
pub struct Mml {
    buf: Vec<u8>,
    pos: usize,
    expansions: usize,
}

impl Mml {
    pub fn new(mml: &str) -> Mml {
        Mml {
            buf: mml.bytes().map(|c| c.to_ascii_uppercase()).collect(),
            pos: 0,
            expansions: 0,
        }
    }

    /// The next note or mode change. Settings are applied to `state` as
    /// they are read.
    pub fn next(&mut self, state: &mut PlayState, var: &Var) -> Result<Option<Command>> {
        loop {
            let c = match self.skip_blanks() {
                Some(c) => c,
                None => return Ok(None),
            };
            self.pos += 1;
            match c {
                b';' => {}
                b'X' => {
                    let name = self.name()?;
                    let sub = match var.fetch(&name) {
                        Val::String(s) => s,
                        _ => return Err(error!(IllegalFunctionCall; "X NEEDS A STRING")),
                    };
                    self.expansions += 1;
                    if self.expansions > MAX_EXPANSIONS {
                        return Err(error!(OutOfMemory));
                    }
                    let rest = self.buf.split_off(self.pos);
                    self.buf.extend(sub.bytes().map(|c| c.to_ascii_uppercase()));
                    self.buf.extend(rest);
                }
                b'N' => {
                    let n = self.value(var)?;
                    let dots = self.dots();
                    let duration = state.seconds(state.length, dots);
                    let fill = state.articulation.fill();
                    let tone = match n {
                        0 => Tone::Rest,
                        1..=84 => Tone::Frequency(note_frequency(n as u8 - 1)),
                        _ => return Err(error!(IllegalFunctionCall; "NOTE OUT OF RANGE")),
                    };
                    return Ok(Some(Command::Note {
                        tone,
                        duration,
                        fill,
                    }));
                }
                b'L' => state.length = self.ranged(var, 1, 64)?,
                b'T' => state.tempo = self.ranged(var, 32, 255)?,
                b'O' => state.octave = self.value(var)?.max(0).min(6) as u8,
                b'>' => state.octave = (state.octave + 1).min(6),
                b'<' => state.octave = state.octave.saturating_sub(1),
                b'A'..=b'G' | b'P' => return self.note(c, state).map(Some),
                b'M' => {
                    let mode = self.skip_blanks();
                    self.pos += 1;
                    match mode {
                        Some(b'N') => state.articulation = Articulation::Normal,
                        Some(b'L') => state.articulation = Articulation::Legato,
                        Some(b'S') => state.articulation = Articulation::Staccato,
                        Some(b'F') => return Ok(Some(Command::Foreground(true))),
                        Some(b'B') => return Ok(Some(Command::Foreground(false))),
                        _ => return Err(error!(IllegalFunctionCall; "UNKNOWN MUSIC MODE")),
                    }
                }
                _ => return Err(error!(IllegalFunctionCall; format!("UNKNOWN COMMAND {}", c as char))),
            }
        }
    }

    fn note(&mut self, letter: u8, state: &PlayState) -> Result<Command> {
        let mut length = state.length;
        let mut dots = 0;
        let mut offset = 0;
        loop {
            match self.skip_blanks() {
                Some(b'.') => {
                    self.pos += 1;
                    dots += 1;
                }
                Some(b'#') | Some(b'+') => {
                    self.pos += 1;
                    offset += 1;
                }
                Some(b'-') => {
                    self.pos += 1;
                    offset -= 1;
                }
                Some(c) if c.is_ascii_digit() => {
                    length = match self.digits() {
                        Some(n) if (1..=64).contains(&n) => n as u8,
                        _ => return Err(error!(IllegalFunctionCall; "BAD NOTE LENGTH")),
                    };
                }
                _ => break,
            }
        }
        let duration = state.seconds(length, dots);
        let fill = state.articulation.fill();
        if letter == b'P' {
            return Ok(Command::Note {
                tone: Tone::Rest,
                duration,
                fill,
            });
        }
        let n = state.octave as i32 * 12 + semitone(letter) + offset;
        if n < 0 || n >= 84 {
            return Err(error!(IllegalFunctionCall; "NOTE OUT OF RANGE"));
        }
        Ok(Command::Note {
            tone: Tone::Frequency(note_frequency(n as u8)),
            duration,
            fill,
        })
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn skip_blanks(&mut self) -> Option<u8> {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
        self.peek()
    }

    fn dots(&mut self) -> i32 {
        let mut dots = 0;
        while self.skip_blanks() == Some(b'.') {
            self.pos += 1;
            dots += 1;
        }
        dots
    }

    /// Decimal digits, blanks between them allowed.
    fn digits(&mut self) -> Option<i32> {
        let mut value: Option<i32> = None;
        while let Some(c) = self.skip_blanks() {
            if !c.is_ascii_digit() {
                break;
            }
            self.pos += 1;
            let d = (c - b'0') as i32;
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d));
        }
        value
    }

    /// A number, or `=NAME;` for the value of a variable.
    fn value(&mut self, var: &Var) -> Result<i32> {
        let negative = match self.skip_blanks() {
            Some(b'-') => true,
            Some(b'+') => false,
            _ => {
                return self.unsigned(var);
            }
        };
        self.pos += 1;
        let n = self.unsigned(var)?;
        Ok(if negative { -n } else { n })
    }

    fn unsigned(&mut self, var: &Var) -> Result<i32> {
        if self.skip_blanks() == Some(b'=') {
            self.pos += 1;
            let name = self.name()?;
            return Ok(i16::try_from(var.fetch(&name))? as i32);
        }
        match self.digits() {
            Some(n) if n > i16::max_value() as i32 => Err(error!(Overflow)),
            Some(n) => Ok(n),
            None => Err(error!(IllegalFunctionCall; "MISSING NUMBER")),
        }
    }

    fn ranged(&mut self, var: &Var, min: i32, max: i32) -> Result<u8> {
        let n = self.value(var)?;
        if n < min || n > max {
            Err(error!(IllegalFunctionCall; format!("{} IS OUT OF RANGE", n)))
        } else {
            Ok(n as u8)
        }
    }

    /// A variable name terminated by `;`.
    fn name(&mut self) -> Result<String> {
        let start = match self.skip_blanks() {
            Some(c) if c.is_ascii_alphabetic() => self.pos,
            _ => return Err(error!(IllegalFunctionCall; "MISSING VARIABLE")),
        };
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == b'.') {
                break;
            }
            self.pos += 1;
        }
        if let Some(b'$') | Some(b'%') | Some(b'!') | Some(b'#') = self.peek() {
            self.pos += 1;
        }
        let name = String::from_utf8_lossy(&self.buf[start..self.pos]).into_owned();
        if self.skip_blanks() != Some(b';') {
            return Err(error!(IllegalFunctionCall; "MISSING ;"));
        }
        self.pos += 1;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    fn run(mml: &str, state: &mut PlayState, var: &Var) -> Result<Vec<Command>> {
        let mut mml = Mml::new(mml);
        let mut commands = vec![];
        while let Some(command) = mml.next(state, var)? {
            commands.push(command);
        }
        Ok(commands)
    }

    fn tones(commands: &[Command]) -> Vec<Tone> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Note { tone, .. } => Some(*tone),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frequencies() {
        assert_eq!(note_frequency(33), 440);
        assert_eq!(note_frequency(45), 880);
        assert_eq!(note_frequency(21), 220);
        assert_eq!(note_frequency(36), 523);
    }

    #[test]
    fn test_notes_and_lengths() {
        let mut state = PlayState::default();
        let commands = run("o2 c e g8 a. p4", &mut state, &Var::new()).unwrap();
        assert_eq!(
            tones(&commands),
            vec![
                Tone::Frequency(262),
                Tone::Frequency(330),
                Tone::Frequency(392),
                Tone::Frequency(440),
                Tone::Rest,
            ]
        );
        let durations: Vec<f64> = commands
            .iter()
            .map(|c| match c {
                Command::Note { duration, .. } => *duration,
                _ => 0.0,
            })
            .collect();
        assert_eq!(durations, vec![0.5, 0.5, 0.25, 0.75, 0.5]);
        assert_eq!(state.octave, 2);
    }

    #[test]
    fn test_accidentals_and_octaves() {
        let mut state = PlayState::default();
        let commands = run("O2A#B-A+>A<<A", &mut state, &Var::new()).unwrap();
        assert_eq!(
            tones(&commands),
            vec![
                Tone::Frequency(466),
                Tone::Frequency(466),
                Tone::Frequency(466),
                Tone::Frequency(880),
                Tone::Frequency(220),
            ]
        );
        assert_eq!(state.octave, 1);
        run("O9>>", &mut state, &Var::new()).unwrap();
        assert_eq!(state.octave, 6);
    }

    #[test]
    fn test_settings_carry_over() {
        let mut state = PlayState::default();
        run("T240 L8 MS", &mut state, &Var::new()).unwrap();
        let commands = run("N34", &mut state, &Var::new()).unwrap();
        assert_eq!(
            commands,
            vec![Command::Note {
                tone: Tone::Frequency(440),
                duration: 0.125,
                fill: 0.75,
            }]
        );
        assert_eq!(
            run("N0 MB MF", &mut state, &Var::new()).unwrap()[1..],
            [Command::Foreground(false), Command::Foreground(true)]
        );
    }

    #[test]
    fn test_variables() {
        let mut var = Var::new();
        var.store("TUNE$", Val::String("cde".into())).unwrap();
        var.store("N%", Val::Integer(16)).unwrap();
        let mut state = PlayState::default();
        let commands = run("XTUNE$;L=N%;G", &mut state, &var).unwrap();
        assert_eq!(commands.len(), 4);
        assert_eq!(state.length, 16);
        let error = run("XN%;", &mut state, &var).unwrap_err();
        assert_eq!(error.code(), ErrorCode::IllegalFunctionCall);
        var.store("LOOP$", Val::String("XLOOP$;".into())).unwrap();
        let error = run("XLOOP$;", &mut state, &var).unwrap_err();
        assert_eq!(error.code(), ErrorCode::OutOfMemory);
    }

    #[test]
    fn test_errors() {
        let var = Var::new();
        for mml in &["L0", "L65", "T31", "N85", "C65", "MX", "Z", "O0C-", "O6B#", "L"] {
            let mut state = PlayState::default();
            let error = run(mml, &mut state, &var).unwrap_err();
            assert_eq!(error.code(), ErrorCode::IllegalFunctionCall, "{}", mml);
        }
        let error = run("T99999", &mut PlayState::default(), &var).unwrap_err();
        assert_eq!(error.code(), ErrorCode::Overflow);
    }
}
