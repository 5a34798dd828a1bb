use std::str::FromStr;

/// How mismatched keystrokes are handled during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
pub enum TypingPolicy {
    /// Wrong keys are silently dropped; the session never ends from them.
    Strict,
    /// The first wrong key ends the session; nothing is persisted.
    AbortOnError,
    /// Wrong keys pile up in an error buffer and must be erased before
    /// typing can resume.
    BufferedCorrection,
}

impl FromStr for TypingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Strict" => Ok(TypingPolicy::Strict),
            "AbortOnError" => Ok(TypingPolicy::AbortOnError),
            "BufferedCorrection" => Ok(TypingPolicy::BufferedCorrection),
            other => Err(format!("unknown typing policy: {other}")),
        }
    }
}
