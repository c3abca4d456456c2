//! Host command lines.
//!
//! Grammar, whitespace separated and case-insensitive:
//!
//! ```text
//! start [rate=<hz>|samplerate=<hz>] [save=<s>|saveinterval=<s>]
//! stop
//! ```
use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// Parameters of a `start` request. `None` means "use the configured value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartRequest {
    pub rate_hz: Option<u32>,
    pub save_interval_s: Option<u32>,
}

impl StartRequest {
    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz: Some(rate_hz),
            save_interval_s: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start(StartRequest),
    Stop,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?;
        match verb.to_ascii_lowercase().as_str() {
            "start" => {
                let mut req = StartRequest::default();
                for word in words {
                    let (key, value) = word
                        .split_once('=')
                        .ok_or_else(|| CommandError::MissingValue(word.to_string()))?;
                    let key = key.to_ascii_lowercase();
                    let slot = match key.as_str() {
                        "rate" | "samplerate" => &mut req.rate_hz,
                        "save" | "saveinterval" => &mut req.save_interval_s,
                        _ => return Err(CommandError::UnknownKey(key)),
                    };
                    if value.is_empty() {
                        return Err(CommandError::MissingValue(key));
                    }
                    let parsed = value.parse::<u32>().map_err(|_| CommandError::BadValue {
                        key: key.clone(),
                        value: value.to_string(),
                    })?;
                    *slot = Some(parsed);
                }
                Ok(Command::Start(req))
            }
            "stop" => match words.next() {
                None => Ok(Command::Stop),
                Some(extra) => Err(CommandError::UnknownKey(extra.to_string())),
            },
            other => Err(CommandError::UnknownVerb(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Stop => f.write_str("stop"),
            Command::Start(req) => {
                f.write_str("start")?;
                if let Some(r) = req.rate_hz {
                    write!(f, " rate={r}")?;
                }
                if let Some(s) = req.save_interval_s {
                    write!(f, " save={s}")?;
                }
                Ok(())
            }
        }
    }
}
