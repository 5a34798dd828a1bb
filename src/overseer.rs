use crate::stats::SessionStats;
use crate::text_source::TextSource;
use crate::typing_policy::TypingPolicy;

/// A keystroke as the core sees it. The runtime layer maps terminal events
/// onto this: Backspace/Delete become `Erase`, any other non-printable
/// sequence becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Erase,
    Other,
}

/// Conditions that end the session mid-keystroke. `EndOfStream` is the
/// normal ending of a finite text and persists statistics; `WrongCharacter`
/// (abort-on-error policy only) discards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    EndOfStream,
    WrongCharacter,
}

/// Whether a non-fatal keystroke changed any visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Accepted,
    Ignored,
}

/// Validates the keystroke stream against the current word.
///
/// Holds the text source, the word being typed (prefixed with a separator
/// space for every word after the first), the correctly typed prefix, and
/// the error buffer used by the buffered-correction policy.
#[derive(Debug)]
pub struct Overseer {
    source: Box<dyn TextSource>,
    current_word: String,
    input: String,
    errors: String,
}

impl Overseer {
    /// Draws the first word from the source. Fails if the source is
    /// already exhausted (an empty text file).
    pub fn new(mut source: Box<dyn TextSource>) -> Result<Self, Fatal> {
        let current_word = source.advance().map_err(|_| Fatal::EndOfStream)?;
        Ok(Self {
            source,
            current_word,
            input: String::new(),
            errors: String::new(),
        })
    }

    pub fn current_word(&self) -> &str {
        &self.current_word
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn errors(&self) -> &str {
        &self.errors
    }

    pub fn source_tag(&self) -> &str {
        self.source.tag()
    }

    /// Completed words for display, oldest first. The source cursor sits
    /// one past the word being typed, so the in-flight word is dropped
    /// from the window.
    pub fn words_before(&self, num_words: usize) -> Vec<String> {
        let mut words = self.source.words_before(num_words + 1);
        words.pop();
        words
    }

    /// Upcoming words for display, nearest first. The source window
    /// already starts at its cursor, which is the word right after the
    /// one in flight.
    pub fn words_after(&self, num_words: usize) -> Vec<String> {
        self.source.words_after(num_words)
    }

    /// Feeds one keystroke through the policy rules.
    pub fn handle_key(
        &mut self,
        key: Key,
        policy: TypingPolicy,
        stats: &mut SessionStats,
    ) -> Result<KeyOutcome, Fatal> {
        let c = match key {
            // Deletion only ever erases buffered mistakes, never the input
            Key::Erase => {
                return Ok(if self.errors.pop().is_some() {
                    KeyOutcome::Accepted
                } else {
                    KeyOutcome::Ignored
                });
            }
            Key::Other => return Ok(KeyOutcome::Ignored),
            Key::Char(c) => c,
        };

        match policy {
            TypingPolicy::Strict => {
                if self.try_add(c, stats)? {
                    Ok(KeyOutcome::Accepted)
                } else {
                    // Wrong key silently dropped, no error recorded
                    Ok(KeyOutcome::Ignored)
                }
            }
            TypingPolicy::AbortOnError => {
                if self.try_add(c, stats)? {
                    Ok(KeyOutcome::Accepted)
                } else {
                    stats.error_count += 1;
                    Err(Fatal::WrongCharacter)
                }
            }
            TypingPolicy::BufferedCorrection => {
                // Once a mistake is buffered, everything lands in the
                // buffer until it is erased back to empty
                if !self.errors.is_empty() || !self.try_add(c, stats)? {
                    self.errors.push(c);
                    stats.error_count += 1;
                }
                Ok(KeyOutcome::Accepted)
            }
        }
    }

    /// Appends `c` to the input if it matches the expected character,
    /// completing the word when the input covers it. Returns whether the
    /// character matched.
    fn try_add(&mut self, c: char, stats: &mut SessionStats) -> Result<bool, Fatal> {
        let expected = self.current_word.chars().nth(self.input.chars().count());
        if expected != Some(c) {
            return Ok(false);
        }

        self.input.push(c);
        if self.input == self.current_word {
            self.complete_word(stats)?;
        }
        Ok(true)
    }

    /// The word is recorded before the source advances, so a completion
    /// that exhausts the stream still counts.
    fn complete_word(&mut self, stats: &mut SessionStats) -> Result<(), Fatal> {
        stats.record_word(&self.current_word);
        self.input.clear();
        self.errors.clear();

        let next = self.source.advance().map_err(|_| Fatal::EndOfStream)?;
        self.current_word = format!(" {next}");
        Ok(())
    }
}
