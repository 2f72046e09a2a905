use std::collections::VecDeque;

/// Anything that accepts a sequence of keystrokes ahead of live input.
pub trait KeystrokeSink {
    fn inject(&mut self, keys: &str);
}

/// ## Pending keystrokes
///
/// Injected keys wait in the replay queue and are always delivered before
/// anything typed live.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBuffer {
    replay: VecDeque<char>,
    live: VecDeque<char>,
}

impl KeyBuffer {
    pub fn new() -> KeyBuffer {
        KeyBuffer::default()
    }

    /// A key typed by the user.
    pub fn push(&mut self, c: char) {
        self.live.push_back(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.live.extend(s.chars());
    }

    pub fn next(&mut self) -> Option<char> {
        match self.replay.pop_front() {
            Some(c) => Some(c),
            None => self.live.pop_front(),
        }
    }

    /// Keys up to the next CR or LF, which is consumed. `None` when no
    /// complete line is waiting.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.iter().position(|c| c == '\r' || c == '\n')?;
        let mut line = String::with_capacity(end);
        for _ in 0..end {
            line.extend(self.next());
        }
        self.next();
        Some(line)
    }

    pub fn len(&self) -> usize {
        self.replay.len() + self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replay.is_empty() && self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.replay.clear();
        self.live.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.replay.iter().chain(self.live.iter()).copied()
    }

    /// Everything waiting, in delivery order.
    pub fn pending(&self) -> String {
        self.iter().collect()
    }
}

impl KeystrokeSink for KeyBuffer {
    fn inject(&mut self, keys: &str) {
        self.replay.extend(keys.chars());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_before_live() {
        let mut keys = KeyBuffer::new();
        keys.push_str("ab");
        keys.inject("XY");
        assert_eq!(keys.pending(), "XYab");
        assert_eq!(keys.next(), Some('X'));
        keys.inject("Z");
        assert_eq!(keys.next(), Some('Y'));
        assert_eq!(keys.next(), Some('Z'));
        assert_eq!(keys.next(), Some('a'));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_next_line() {
        let mut keys = KeyBuffer::new();
        keys.inject("PRINT 1\rCLS");
        assert_eq!(keys.next_line().unwrap(), "PRINT 1");
        assert_eq!(keys.next_line(), None);
        keys.push('\n');
        assert_eq!(keys.next_line().unwrap(), "CLS");
        assert!(keys.is_empty());
    }
}
