//! FILENAME: interpreter/src/reader.rs
//! PURPOSE: Index-based cursor over source text plus the two parse caches.
//! CONTEXT: The reader is the first stage of the pipeline. It scans names,
//! numerals, and operator tokens character by character, and it carries the
//! memoization that makes backtracking affordable:
//!
//! - position cache: one entry per start position recording the best
//!   successful parse found there (priority, node, end position). An entry
//!   is reusable under any requested ceiling at or above its priority.
//! - token cache: memoized low-level scans keyed by (kind, position), so
//!   repeated speculative attempts at one position never re-scan characters.
//!
//! Both caches live in a `ReaderCache` shared through an `Arc`: every
//! reader built over an equal source string reuses the same cache, which is
//! what lets a re-interpreted expression skip parsing entirely. Concurrent
//! parses of the same text may race on commits; the commit predicate makes
//! that benign (a losing writer just discards its duplicate node).

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::process::Process;

/// Whitespace that separates tokens but carries no meaning.
fn is_insignificant(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\r' || ch == '\n'
}

/// Operator tokens the reader recognizes, two-character tokens first so a
/// scan always takes the longest match (`<=` never scans as `<` then `=`).
const OPERATORS: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||",
    "+", "-", "*", "/", "%", "<", ">", "&", "|", "^", "=",
];

/// The three memoized scan families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanKind {
    Name,
    Number,
    Operator,
}

/// A successful scan: the matched text and the position just past it.
/// Scans never move the reader; callers jump with `set_position(scan.end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub text: String,
    pub end: usize,
}

#[derive(Clone)]
struct CachedParse {
    priority: u32,
    node: Arc<dyn Process>,
    end: usize,
}

#[derive(Clone)]
struct CachedScan {
    matched: bool,
    text: String,
    end: usize,
}

/// The shared per-source-text cache: parse results by position and token
/// scans by (kind, position).
#[derive(Default)]
pub struct ReaderCache {
    positions: RwLock<FxHashMap<usize, CachedParse>>,
    scans: RwLock<FxHashMap<(ScanKind, usize), CachedScan>>,
}

impl ReaderCache {
    /// Number of positions holding a committed parse. Diagnostic only.
    pub fn cached_positions(&self) -> usize {
        self.positions.read().unwrap().len()
    }
}

/// A position over an immutable source buffer with shared caches.
pub struct Reader {
    source: Arc<str>,
    position: usize,
    cache: Arc<ReaderCache>,
}

impl Reader {
    /// A reader with its own private cache, for standalone scanning.
    pub fn new(source: &str) -> Reader {
        Reader::with_cache(source, Arc::new(ReaderCache::default()))
    }

    /// A reader sharing the cache of every other reader over equal text.
    pub fn with_cache(source: &str, cache: Arc<ReaderCache>) -> Reader {
        Reader {
            source: Arc::from(source),
            position: 0,
            cache,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn rest(&self) -> &str {
        &self.source[self.position..]
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !is_insignificant(ch) {
                break;
            }
            self.position += ch.len_utf8();
        }
    }

    /// Consumes `expected` (after whitespace) if it is the next character.
    pub fn eat_char(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes `token` (after whitespace) only when the longest operator
    /// scan at this position is exactly `token`.
    pub fn eat_operator(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        match self.scan_operator() {
            Some(scan) if scan.text == token => {
                self.position = scan.end;
                true
            }
            _ => false,
        }
    }

    /// Scans an identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn scan_name(&self) -> Option<Scan> {
        self.cached_scan(ScanKind::Name, |rest| {
            let bytes = rest.as_bytes();
            if bytes.is_empty() || !(bytes[0].is_ascii_alphabetic() || bytes[0] == b'_') {
                return None;
            }
            let mut len = 1;
            while len < bytes.len() && (bytes[len].is_ascii_alphanumeric() || bytes[len] == b'_') {
                len += 1;
            }
            Some(len)
        })
    }

    /// Scans a maximal numeral: optional sign (only directly before a digit
    /// or decimal point), digits, optional fraction, optional exponent; or
    /// a `0x`/`0b` radix-prefixed integer.
    pub fn scan_number(&self) -> Option<Scan> {
        self.cached_scan(ScanKind::Number, scan_raw_number)
    }

    /// Scans the longest known operator token at this position.
    pub fn scan_operator(&self) -> Option<Scan> {
        self.cached_scan(ScanKind::Operator, |rest| {
            OPERATORS
                .iter()
                .find(|op| rest.starts_with(**op))
                .map(|op| op.len())
        })
    }

    fn cached_scan(&self, kind: ScanKind, scan: impl FnOnce(&str) -> Option<usize>) -> Option<Scan> {
        let key = (kind, self.position);
        if let Some(hit) = self.cache.scans.read().unwrap().get(&key) {
            return hit.matched.then(|| Scan {
                text: hit.text.clone(),
                end: hit.end,
            });
        }
        let result = scan(self.rest()).map(|len| Scan {
            text: self.rest()[..len].to_string(),
            end: self.position + len,
        });
        let entry = match &result {
            Some(scan) => CachedScan {
                matched: true,
                text: scan.text.clone(),
                end: scan.end,
            },
            None => CachedScan {
                matched: false,
                text: String::new(),
                end: self.position,
            },
        };
        self.cache.scans.write().unwrap().insert(key, entry);
        result
    }

    /// Adopts the cached parse at the current position if one exists with
    /// priority at or below `ceiling`, jumping the reader to its end.
    pub(crate) fn adopt(&mut self, ceiling: u32) -> Option<Arc<dyn Process>> {
        let hit = self.cache.positions.read().unwrap().get(&self.position).cloned()?;
        if hit.priority > ceiling {
            return None;
        }
        self.position = hit.end;
        Some(hit.node)
    }

    /// Commits a parse result at `start`. The commit succeeds unless an
    /// entry with a numerically larger (looser) priority is already there:
    /// an established looser chain is never displaced by a tighter
    /// re-derivation, while equal priority overwrites so a continuation
    /// rule can extend its own chain in place.
    pub(crate) fn commit(&self, start: usize, priority: u32, node: Arc<dyn Process>, end: usize) -> bool {
        let mut positions = self.cache.positions.write().unwrap();
        match positions.get(&start) {
            Some(existing) if existing.priority > priority => false,
            _ => {
                positions.insert(start, CachedParse { priority, node, end });
                true
            }
        }
    }
}

fn scan_raw_number(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let after_sign = i;

    // Radix-prefixed integers: 0x1F, 0b1010
    if i + 1 < bytes.len() && bytes[i] == b'0' && matches!(bytes[i + 1] | 32, b'x' | b'b') {
        let hex = (bytes[i + 1] | 32) == b'x';
        let mut j = i + 2;
        while j < bytes.len() && (if hex { bytes[j].is_ascii_hexdigit() } else { matches!(bytes[j], b'0' | b'1') }) {
            j += 1;
        }
        if j > i + 2 {
            return Some(j);
        }
        // a bare "0x" scans as the plain digit "0" below
    }

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let integer_digits = i - after_sign;

    // Fraction, only when a digit actually follows the point
    let mut has_fraction = false;
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        has_fraction = true;
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    if integer_digits == 0 && !has_fraction {
        return None;
    }

    // Exponent, only when it carries at least one digit
    if i < bytes.len() && (bytes[i] | 32) == b'e' {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > digits_start {
            i = j;
        }
    }

    Some(i)
}
