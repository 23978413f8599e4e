//! FILENAME: interpreter/src/engine.rs
//! PURPOSE: The rule engine: registry, dispatch, and backtracking.
//! CONTEXT: The engine owns two read-mostly tables built at construction:
//! the rule registry (grammar rules bucketed by first character, each
//! bucket sorted loosest to tightest) and the text-level cache mapping a
//! literal source string to the reader cache shared by every parse of that
//! exact text. A process-wide default instance serves the free functions
//! in program.rs; hosts with custom rules build their own instance.
//!
//! DISPATCH (per interpret call):
//! 1. skip whitespace; fail at end of input
//! 2. adopt a cached parse at this position when its priority fits the
//!    requested ceiling
//! 3. otherwise mark the position and try each candidate rule registered
//!    for the lookahead character, loosest first, strictly below the
//!    ceiling; commit successes into the position cache, retrying
//!    continuation rules at the mark until they stop extending
//! 4. restore the mark unconditionally and re-consult the cache, which
//!    adopts whatever ultimately won (with its correct end position)

use std::sync::{Arc, RwLock};

use log::trace;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::process::Process;
use crate::reader::{Reader, ReaderCache};
use crate::syntax::{default_rules, Syntax};

/// The process-wide default engine used by the crate-level free functions.
pub(crate) static DEFAULT: Lazy<Interpreter> = Lazy::new(Interpreter::new);

/// A rule engine with an immutable rule set and a shared text-level cache.
pub struct Interpreter {
    rules: FxHashMap<char, Vec<Arc<dyn Syntax>>>,
    texts: RwLock<FxHashMap<String, Arc<ReaderCache>>>,
}

impl Interpreter {
    /// An engine with the default rule library.
    pub fn new() -> Interpreter {
        Interpreter::with_rules(Vec::new())
    }

    /// An engine with the default library plus host-registered rules.
    ///
    /// The rule set is fixed for the engine's lifetime; cached parses are
    /// only valid for the rule set that produced them, which is why each
    /// engine owns its own text-level cache.
    pub fn with_rules(extra: Vec<Arc<dyn Syntax>>) -> Interpreter {
        let mut all = default_rules();
        all.extend(extra);
        let mut rules: FxHashMap<char, Vec<Arc<dyn Syntax>>> = FxHashMap::default();
        for rule in all {
            for ch in rule.begin_chars() {
                rules.entry(ch).or_default().push(rule.clone());
            }
        }
        for bucket in rules.values_mut() {
            // Loosest first; the sort is stable, so rules of equal priority
            // keep registration order and the first-registered one wins ties
            bucket.sort_by_key(|rule| std::cmp::Reverse(rule.priority()));
        }
        Interpreter {
            rules,
            texts: RwLock::new(FxHashMap::default()),
        }
    }

    /// The shared reader cache for this exact source text, created on
    /// first use. Lookups of already-cached text take only the read lock.
    pub(crate) fn reader_cache(&self, source: &str) -> Arc<ReaderCache> {
        if let Some(cache) = self.texts.read().unwrap().get(source) {
            return cache.clone();
        }
        let mut texts = self.texts.write().unwrap();
        texts.entry(source.to_string()).or_default().clone()
    }

    /// Produces one executable node at the loosest priority the ceiling
    /// admits, or `None` when no rule matches here. Failure is non-fatal;
    /// the caller decides whether it is a syntax error.
    pub fn interpret(&self, reader: &mut Reader, ceiling: u32) -> Option<Arc<dyn Process>> {
        reader.skip_whitespace();
        if reader.at_end() {
            return None;
        }
        if let Some(node) = reader.adopt(ceiling) {
            trace!("adopted cached parse at {}", reader.position());
            return Some(node);
        }

        let mark = reader.position();
        let first = reader.peek()?;
        if let Some(bucket) = self.rules.get(&first) {
            for rule in bucket {
                if rule.priority() >= ceiling {
                    continue;
                }
                reader.set_position(mark);
                let mut matched = false;
                loop {
                    let Some(node) = rule.try_interpret(self, reader, ceiling) else {
                        break;
                    };
                    let end = reader.position();
                    let committed = reader.commit(mark, rule.priority(), node, end);
                    trace!(
                        "rule (priority {}) matched {}..{}, committed: {}",
                        rule.priority(),
                        mark,
                        end,
                        committed
                    );
                    matched = true;
                    if !(committed && rule.is_continuation()) {
                        break;
                    }
                    // Retry the same rule at the mark: it re-adopts its own
                    // cached result as the left operand and extends the chain
                    reader.set_position(mark);
                }
                if matched {
                    break;
                }
            }
        }

        reader.set_position(mark);
        reader.adopt(ceiling)
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}
