use crate::typing_policy::TypingPolicy;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to read log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed log line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// One parsed session record from the log file.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub user: String,
    pub text_tag: String,
    pub policy: TypingPolicy,
    pub word_count: u64,
    pub character_count: u64,
    pub elapsed_ns: u128,
    pub timeout_secs: f64,
    pub error_count: u64,
}

impl LogEntry {
    /// Words per minute over the whole recorded session.
    pub fn wpm(&self) -> f64 {
        60.0 * 1_000_000_000.0 * self.word_count as f64 / self.elapsed_ns as f64
    }

    pub fn cpm(&self) -> f64 {
        60.0 * 1_000_000_000.0 * self.character_count as f64 / self.elapsed_ns as f64
    }

    fn parse(line_no: usize, line: &str) -> Result<Self, HistoryError> {
        let malformed = |reason: String| HistoryError::Malformed {
            line: line_no,
            reason,
        };

        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != 8 {
            return Err(malformed(format!(
                "expected 8 fields, found {}",
                fields.len()
            )));
        }

        // A zero elapsed time would poison every rate query downstream
        let elapsed_ns: u128 = fields[5]
            .parse()
            .map_err(|_| malformed(format!("bad elapsed time: {}", fields[5])))?;
        if elapsed_ns == 0 {
            return Err(malformed("zero elapsed time".to_string()));
        }

        Ok(LogEntry {
            user: fields[0].to_string(),
            text_tag: fields[1].to_string(),
            policy: fields[2]
                .parse()
                .map_err(|e: String| malformed(e))?,
            word_count: fields[3]
                .parse()
                .map_err(|_| malformed(format!("bad word count: {}", fields[3])))?,
            character_count: fields[4]
                .parse()
                .map_err(|_| malformed(format!("bad character count: {}", fields[4])))?,
            elapsed_ns,
            timeout_secs: fields[6]
                .parse()
                .map_err(|_| malformed(format!("bad timeout: {}", fields[6])))?,
            error_count: fields[7]
                .parse()
                .map_err(|_| malformed(format!("bad error count: {}", fields[7])))?,
        })
    }
}

/// All session records loaded from one or more log files, grouped for the
/// best-run queries. A single malformed line fails the whole load; nothing
/// from that file is merged.
#[derive(Debug, Default)]
pub struct TrainingLog {
    pub entries: Vec<LogEntry>,
    by_user: HashMap<String, Vec<LogEntry>>,
    by_text_tag: HashMap<String, Vec<LogEntry>>,
}

impl TrainingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let mut log = Self::new();
        log.add_file(path)?;
        Ok(log)
    }

    /// Parses and merges every record from `path`. All lines are parsed
    /// before any of them is merged, so a parse failure leaves the log
    /// untouched.
    pub fn add_file(&mut self, path: &Path) -> Result<(), HistoryError> {
        let contents = fs::read_to_string(path)?;
        let new_entries = contents
            .lines()
            .enumerate()
            .map(|(idx, line)| LogEntry::parse(idx + 1, line))
            .collect::<Result<Vec<_>, _>>()?;

        for entry in &new_entries {
            self.by_user
                .entry(entry.user.clone())
                .or_default()
                .push(entry.clone());
            self.by_text_tag
                .entry(entry.text_tag.clone())
                .or_default()
                .push(entry.clone());
        }
        self.entries.extend(new_entries);

        for runs in self.by_text_tag.values_mut() {
            runs.sort_by(|a, b| b.wpm().partial_cmp(&a.wpm()).unwrap_or(std::cmp::Ordering::Equal));
        }
        Ok(())
    }

    pub fn for_user(&self, user: &str) -> &[LogEntry] {
        self.by_user.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Best run per text tag for one user, ranked by wpm.
    pub fn user_best(&self, user: &str) -> HashMap<String, LogEntry> {
        let mut out: HashMap<String, LogEntry> = HashMap::new();
        for entry in self.for_user(user) {
            match out.get(&entry.text_tag) {
                Some(best) if best.wpm() >= entry.wpm() => {}
                _ => {
                    out.insert(entry.text_tag.clone(), entry.clone());
                }
            }
        }
        out
    }

    /// Top `n` runs for one text tag, best wpm first.
    pub fn text_best(&self, tag: &str, n: usize) -> Vec<LogEntry> {
        self.by_text_tag
            .get(tag)
            .map(|runs| runs.iter().take(n).cloned().collect())
            .unwrap_or_default()
    }
}
