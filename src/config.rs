/*!
## Engine configuration

Settings a session is created with. They travel inside snapshots so a
resumed session behaves the way it did when it was saved.

```
use basic::config::Config;
let config = Config::from_json(r#"{"max_files": 8, "sound": {"backlog": 4}}"#).unwrap();
assert_eq!(config.max_files, 8);
assert_eq!(config.sound.backlog, 4);
assert_eq!(config.sound.beep_frequency, 800);
```

*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Highest file number OPEN accepts.
    pub max_files: u8,
    /// Record length for RANDOM files opened without LEN.
    pub record_len: u16,
    pub sound: SoundConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub beep_frequency: u32,
    /// Seconds.
    pub beep_duration: f64,
    /// Notes PLAY lets pile up in the background before it waits.
    pub backlog: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_files: 3,
            record_len: 128,
            sound: SoundConfig::default(),
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        SoundConfig {
            beep_frequency: 800,
            beep_duration: 0.25,
            backlog: 15,
        }
    }
}

impl Config {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
