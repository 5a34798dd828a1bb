use crate::typing_policy::TypingPolicy;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Live counters for a single training session.
///
/// Counters only ever grow. Once `freeze` has been called the elapsed time
/// is pinned forever, so rate queries on a finished session keep returning
/// the same numbers.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub user: String,
    pub text_tag: String,
    pub policy: TypingPolicy,
    pub word_count: usize,
    pub character_count: usize,
    pub error_count: usize,
    pub timeout_secs: f64,
    started_at: Instant,
    frozen: Option<Duration>,
}

impl SessionStats {
    pub fn new(user: String, text_tag: String, policy: TypingPolicy, timeout_secs: f64) -> Self {
        Self {
            user,
            text_tag,
            policy,
            word_count: 0,
            character_count: 0,
            error_count: 0,
            timeout_secs,
            started_at: Instant::now(),
            frozen: None,
        }
    }

    /// Credits a fully and correctly typed word. The caller guarantees the
    /// word was completed; no validation happens here.
    pub fn record_word(&mut self, word: &str) {
        self.word_count += 1;
        self.character_count += word.chars().count();
    }

    pub fn elapsed(&self) -> Duration {
        self.frozen.unwrap_or_else(|| self.started_at.elapsed())
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Pins elapsed time at the moment of the call. Later calls are no-ops.
    pub fn freeze(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.started_at.elapsed());
        }
    }

    /// Pins elapsed time to an explicit duration. Same first-call-wins rule
    /// as `freeze`.
    pub fn freeze_at(&mut self, elapsed: Duration) {
        if self.frozen.is_none() {
            self.frozen = Some(elapsed);
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Words per minute. Must not be called at zero elapsed time.
    pub fn wpm(&self) -> f64 {
        60.0 * self.word_count as f64 / self.elapsed_secs()
    }

    /// Characters per minute. Must not be called at zero elapsed time.
    pub fn cpm(&self) -> f64 {
        60.0 * self.character_count as f64 / self.elapsed_secs()
    }

    /// Appends this session as one `;`-delimited line, creating the file
    /// and its parent directory if needed.
    pub fn append_to_log(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut log_file = OpenOptions::new().append(true).create(true).open(path)?;

        writeln!(
            log_file,
            "{};{};{};{};{};{};{};{}",
            self.user,
            self.text_tag,
            self.policy,
            self.word_count,
            self.character_count,
            self.elapsed().as_nanos(),
            self.timeout_secs,
            self.error_count,
        )
    }
}
