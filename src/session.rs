use crate::overseer::{Fatal, Key, KeyOutcome, Overseer};
use crate::stats::SessionStats;
use crate::text_source::{FileText, RandomText, TextSource};
use crate::typing_policy::TypingPolicy;
use std::io;
use std::path::PathBuf;

/// How many context words a snapshot carries on each side of the current
/// word.
const CONTEXT_WORDS: usize = 6;

/// Which text source a session draws from.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Fixed word sequence from a text file.
    File(PathBuf),
    /// Unbounded random draws from a vocabulary file.
    Random { vocab: PathBuf, half_window: usize },
}

impl SourceSpec {
    fn build(&self) -> io::Result<Box<dyn TextSource>> {
        match self {
            SourceSpec::File(path) => Ok(Box::new(FileText::from_file(path)?)),
            SourceSpec::Random { vocab, half_window } => {
                Ok(Box::new(RandomText::from_file(vocab, *half_window)?))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user: String,
    pub policy: TypingPolicy,
    pub source: SourceSpec,
    /// Seconds until the session times out; 0 means unbounded.
    pub timeout_secs: f64,
    pub log_path: PathBuf,
}

/// How a finished session ended. `Completed` and `TimedOut` persist their
/// statistics; `Aborted` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    TimedOut,
    Aborted,
}

impl SessionOutcome {
    pub fn persists(&self) -> bool {
        !matches!(self, SessionOutcome::Aborted)
    }
}

enum Phase {
    Configuring,
    Running {
        overseer: Overseer,
        stats: SessionStats,
    },
    Ended {
        outcome: SessionOutcome,
        stats: SessionStats,
    },
}

/// Everything the renderer needs for one frame of a running session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub current_word: String,
    pub input: String,
    pub errors: String,
    pub elapsed_secs: f64,
    pub timeout_secs: f64,
    pub word_count: usize,
    pub error_count: usize,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// The session state machine: Configuring until `start`, Running while
/// keystrokes flow, Ended once a fatal condition or the timeout fires.
pub struct Session {
    config: SessionConfig,
    phase: Phase,
    needs_redraw: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::Configuring,
            needs_redraw: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended { .. })
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match &self.phase {
            Phase::Ended { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    /// Statistics of the running or ended session.
    pub fn stats(&self) -> Option<&SessionStats> {
        match &self.phase {
            Phase::Configuring => None,
            Phase::Running { stats, .. } => Some(stats),
            Phase::Ended { stats, .. } => Some(stats),
        }
    }

    /// Builds the text source and enters Running. Unreadable or empty
    /// source files surface here as configuration errors; the clock starts
    /// on success.
    pub fn start(&mut self) -> io::Result<()> {
        let source = self.config.source.build()?;
        let tag = source.tag().to_string();
        let overseer = Overseer::new(source).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "text source contains no words")
        })?;
        let stats = SessionStats::new(
            self.config.user.clone(),
            tag,
            self.config.policy,
            self.config.timeout_secs,
        );
        self.phase = Phase::Running { overseer, stats };
        self.needs_redraw = true;
        Ok(())
    }

    /// Re-enters Configuring and starts again with the same parameters.
    pub fn restart(&mut self) -> io::Result<()> {
        self.phase = Phase::Configuring;
        self.start()
    }

    /// Forwards one keystroke to the overseer and resolves its fatal
    /// conditions into end-state transitions. Log-write failures from the
    /// persistence step propagate.
    pub fn handle_key(&mut self, key: Key) -> io::Result<()> {
        let Phase::Running { overseer, stats } = &mut self.phase else {
            return Ok(());
        };

        match overseer.handle_key(key, self.config.policy, stats) {
            Ok(KeyOutcome::Accepted) => {
                self.needs_redraw = true;
                Ok(())
            }
            Ok(KeyOutcome::Ignored) => Ok(()),
            Err(Fatal::EndOfStream) => self.end(SessionOutcome::Completed),
            Err(Fatal::WrongCharacter) => self.end(SessionOutcome::Aborted),
        }
    }

    /// Clock poll: ends the session once the configured timeout is
    /// exceeded. Does not request a redraw except on the timeout
    /// transition itself.
    pub fn tick(&mut self) -> io::Result<()> {
        let Phase::Running { stats, .. } = &self.phase else {
            return Ok(());
        };
        if self.config.timeout_secs > 0.0 && stats.elapsed_secs() > self.config.timeout_secs {
            self.end(SessionOutcome::TimedOut)?;
        }
        Ok(())
    }

    fn end(&mut self, outcome: SessionOutcome) -> io::Result<()> {
        let Phase::Running { stats, .. } = &mut self.phase else {
            return Ok(());
        };
        stats.freeze();
        let result = if outcome.persists() {
            stats.append_to_log(&self.config.log_path)
        } else {
            Ok(())
        };
        let stats = stats.clone();
        self.phase = Phase::Ended { outcome, stats };
        self.needs_redraw = true;
        result
    }

    /// True once since the last state change that left the display stale.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let Phase::Running {
            overseer, stats, ..
        } = &self.phase
        else {
            return None;
        };
        Some(SessionSnapshot {
            current_word: overseer.current_word().to_string(),
            input: overseer.input().to_string(),
            errors: overseer.errors().to_string(),
            elapsed_secs: stats.elapsed_secs(),
            timeout_secs: self.config.timeout_secs,
            word_count: stats.word_count,
            error_count: stats.error_count,
            context_before: overseer.words_before(CONTEXT_WORDS),
            context_after: overseer.words_after(CONTEXT_WORDS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;
    use std::thread;
    use std::time::Duration;

    struct Fixture {
        _dir: tempfile::TempDir,
        log_path: PathBuf,
        text_path: PathBuf,
    }

    fn fixture(text: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("sample.txt");
        let mut file = std::fs::File::create(&text_path).unwrap();
        write!(file, "{text}").unwrap();
        Fixture {
            log_path: dir.path().join("train.log"),
            text_path,
            _dir: dir,
        }
    }

    fn config(fx: &Fixture, policy: TypingPolicy, timeout_secs: f64) -> SessionConfig {
        SessionConfig {
            user: "tester".to_string(),
            policy,
            source: SourceSpec::File(fx.text_path.clone()),
            timeout_secs,
            log_path: fx.log_path.clone(),
        }
    }

    fn type_str(session: &mut Session, text: &str) -> io::Result<()> {
        for c in text.chars() {
            session.handle_key(Key::Char(c))?;
        }
        Ok(())
    }

    #[test]
    fn test_configuring_until_start() {
        let fx = fixture("Lorem ipsum");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));

        assert!(!session.is_running());
        assert!(session.snapshot().is_none());
        assert!(session.stats().is_none());

        session.start().unwrap();
        assert!(session.is_running());
        assert!(session.take_redraw());
        assert!(!session.take_redraw());
    }

    #[test]
    fn test_start_fails_on_missing_file() {
        let fx = fixture("Lorem");
        let mut cfg = config(&fx, TypingPolicy::Strict, 0.0);
        cfg.source = SourceSpec::File(fx.text_path.with_extension("missing"));
        assert!(Session::new(cfg).start().is_err());
    }

    #[test]
    fn test_start_fails_on_empty_file() {
        let fx = fixture("   ");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));
        assert_matches!(session.start(), Err(e) if e.kind() == io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_completion_persists_and_ends_normal() {
        let fx = fixture("Lorem ipsum");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));
        session.start().unwrap();

        type_str(&mut session, "Lorem ipsum").unwrap();

        assert!(session.is_ended());
        assert_eq!(session.outcome(), Some(SessionOutcome::Completed));
        let stats = session.stats().unwrap();
        assert_eq!(stats.word_count, 2);
        assert!(stats.is_frozen());

        let log = std::fs::read_to_string(&fx.log_path).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.starts_with("tester;"));
    }

    #[test]
    fn test_abort_discards_statistics() {
        let fx = fixture("Lorem ipsum");
        let mut session = Session::new(config(&fx, TypingPolicy::AbortOnError, 0.0));
        session.start().unwrap();

        type_str(&mut session, "Lox").unwrap();

        assert_eq!(session.outcome(), Some(SessionOutcome::Aborted));
        assert!(session.stats().unwrap().is_frozen());
        assert!(!fx.log_path.exists());
    }

    #[test]
    fn test_keys_after_end_are_ignored() {
        let fx = fixture("hi");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));
        session.start().unwrap();

        type_str(&mut session, "hi").unwrap();
        assert!(session.is_ended());

        let words = session.stats().unwrap().word_count;
        type_str(&mut session, "more keys").unwrap();
        assert_eq!(session.stats().unwrap().word_count, words);
    }

    #[test]
    fn test_timeout_ends_normal_with_partial_counts() {
        let fx = fixture("Lorem ipsum dolor");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.05));
        session.start().unwrap();

        type_str(&mut session, "Lorem").unwrap();
        session.tick().unwrap();
        assert!(session.is_running());

        thread::sleep(Duration::from_millis(80));
        session.tick().unwrap();

        assert_eq!(session.outcome(), Some(SessionOutcome::TimedOut));
        let stats = session.stats().unwrap();
        assert_eq!(stats.word_count, 1);

        let log = std::fs::read_to_string(&fx.log_path).unwrap();
        let fields: Vec<&str> = log.trim().split(';').collect();
        assert_eq!(fields[3], "1");
        assert_eq!(fields[6], "0.05");
    }

    #[test]
    fn test_zero_timeout_never_fires() {
        let fx = fixture("Lorem");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));
        session.start().unwrap();

        thread::sleep(Duration::from_millis(20));
        session.tick().unwrap();
        assert!(session.is_running());
    }

    #[test]
    fn test_redraw_flag_tracks_accepted_keys() {
        let fx = fixture("Lorem");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));
        session.start().unwrap();
        session.take_redraw();

        // Strict policy drops the wrong key without a redraw
        session.handle_key(Key::Char('x')).unwrap();
        assert!(!session.take_redraw());

        session.handle_key(Key::Char('L')).unwrap();
        assert!(session.take_redraw());

        // A plain tick does not request one either
        session.tick().unwrap();
        assert!(!session.take_redraw());
    }

    #[test]
    fn test_snapshot_reflects_buffers() {
        let fx = fixture("Lorem ipsum dolor sit");
        let mut session = Session::new(config(&fx, TypingPolicy::BufferedCorrection, 30.0));
        session.start().unwrap();

        type_str(&mut session, "Lorem zz").unwrap();

        let snap = session.snapshot().unwrap();
        assert_eq!(snap.current_word, " ipsum");
        assert_eq!(snap.input, " ");
        assert_eq!(snap.errors, "zz");
        assert_eq!(snap.word_count, 1);
        assert_eq!(snap.error_count, 2);
        assert_eq!(snap.timeout_secs, 30.0);
        assert_eq!(snap.context_before, vec!["Lorem"]);
        assert_eq!(snap.context_after, vec!["dolor", "sit"]);
    }

    #[test]
    fn test_restart_resets_counters_and_keeps_config() {
        let fx = fixture("hi ho");
        let mut session = Session::new(config(&fx, TypingPolicy::Strict, 0.0));
        session.start().unwrap();
        type_str(&mut session, "hi ho").unwrap();
        assert!(session.is_ended());

        session.restart().unwrap();
        assert!(session.is_running());
        let stats = session.stats().unwrap();
        assert_eq!(stats.word_count, 0);
        assert!(!stats.is_frozen());

        // Completing again appends a second record
        type_str(&mut session, "hi ho").unwrap();
        let log = std::fs::read_to_string(&fx.log_path).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[test]
    fn test_random_source_session_runs() {
        let dir = tempfile::tempdir().unwrap();
        let vocab_path = dir.path().join("vocab.txt");
        std::fs::write(&vocab_path, "aa").unwrap();

        let mut session = Session::new(SessionConfig {
            user: "tester".to_string(),
            policy: TypingPolicy::Strict,
            source: SourceSpec::Random {
                vocab: vocab_path.clone(),
                half_window: 3,
            },
            timeout_secs: 0.0,
            log_path: dir.path().join("train.log"),
        });
        session.start().unwrap();

        assert_eq!(
            session.stats().unwrap().text_tag,
            format!("RANDOM.{}", vocab_path.display())
        );

        // Single-word vocabulary: every word is "aa", stream never ends
        type_str(&mut session, "aa aa aa").unwrap();
        assert!(session.is_running());
        assert_eq!(session.stats().unwrap().word_count, 3);
    }
}
