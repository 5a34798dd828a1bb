use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;

/// Returned by `advance` when a finite source has no word left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfStream;

/// Produces the word sequence for a training session.
///
/// `advance` hands out the word at the cursor and moves the cursor one
/// position forward. The lookback/lookahead queries never move the cursor
/// and clip to however many words actually exist on that side;
/// `words_after` starts with the word the next `advance` will hand out.
pub trait TextSource: std::fmt::Debug {
    fn advance(&mut self) -> Result<String, EndOfStream>;
    fn words_before(&self, num_words: usize) -> Vec<String>;
    fn words_after(&self, num_words: usize) -> Vec<String>;
    /// Identifier recorded in log entries for sessions using this source.
    fn tag(&self) -> &str;
}

/// Finite source backed by a text file, split on whitespace once at load.
#[derive(Debug)]
pub struct FileText {
    words: Vec<String>,
    index: usize,
    tag: String,
}

impl FileText {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(Self::from_text(path.to_string_lossy().into_owned(), &raw))
    }

    pub fn from_text(tag: String, raw: &str) -> Self {
        Self {
            words: raw.split_whitespace().map(str::to_owned).collect(),
            index: 0,
            tag,
        }
    }

    /// Non-advancing peek at the word the cursor sits on.
    pub fn current(&self) -> Option<&str> {
        self.words.get(self.index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl TextSource for FileText {
    fn advance(&mut self) -> Result<String, EndOfStream> {
        let word = self.words.get(self.index).cloned().ok_or(EndOfStream)?;
        self.index += 1;
        Ok(word)
    }

    fn words_before(&self, num_words: usize) -> Vec<String> {
        let take = num_words.min(self.index);
        self.words[self.index - take..self.index].to_vec()
    }

    fn words_after(&self, num_words: usize) -> Vec<String> {
        let take = num_words.min(self.words.len().saturating_sub(self.index));
        self.words[self.index..self.index + take].to_vec()
    }

    fn tag(&self) -> &str {
        &self.tag
    }
}

/// Infinite source drawing uniformly from a vocabulary file.
///
/// Keeps a sliding pool of `2k - 1` drawn words (k = `half_window`),
/// pre-filled with k draws. The pool entry k positions from the end is the
/// one `advance` hands out next; the entries around it feed the
/// lookback/lookahead queries.
#[derive(Debug)]
pub struct RandomText {
    vocab: Vec<String>,
    pool: VecDeque<String>,
    half_window: usize,
    tag: String,
}

impl RandomText {
    pub fn from_file(path: &Path, half_window: usize) -> io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let vocab: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
        let tag = format!("RANDOM.{}", path.to_string_lossy());
        Self::from_vocab(tag, vocab, half_window)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "empty vocabulary"))
    }

    /// Returns None for an empty vocabulary or a zero half-window.
    pub fn from_vocab(tag: String, vocab: Vec<String>, half_window: usize) -> Option<Self> {
        if vocab.is_empty() || half_window == 0 {
            return None;
        }
        let mut pool = VecDeque::with_capacity(2 * half_window - 1);
        let rng = &mut rand::thread_rng();
        for _ in 0..half_window {
            pool.push_back(vocab.choose(rng).cloned()?);
        }
        Some(Self {
            vocab,
            pool,
            half_window,
            tag,
        })
    }

    fn pool_cap(&self) -> usize {
        2 * self.half_window - 1
    }

    // Pool index of the entry the next advance() returns.
    fn cursor(&self) -> usize {
        self.pool.len() - self.half_window
    }
}

impl TextSource for RandomText {
    fn advance(&mut self) -> Result<String, EndOfStream> {
        let word = self.pool[self.cursor()].clone();

        let rng = &mut rand::thread_rng();
        if let Some(draw) = self.vocab.choose(rng).cloned() {
            self.pool.push_back(draw);
        }
        if self.pool.len() > self.pool_cap() {
            self.pool.pop_front();
        }

        Ok(word)
    }

    fn words_before(&self, num_words: usize) -> Vec<String> {
        let cursor = self.cursor();
        let take = num_words.min(cursor);
        self.pool
            .iter()
            .skip(cursor - take)
            .take(take)
            .cloned()
            .collect()
    }

    fn words_after(&self, num_words: usize) -> Vec<String> {
        let take = num_words.min(self.pool_cap() / 2);
        self.pool
            .iter()
            .skip(self.cursor())
            .take(take)
            .cloned()
            .collect()
    }

    fn tag(&self) -> &str {
        &self.tag
    }
}
