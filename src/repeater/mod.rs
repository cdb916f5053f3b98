//! The counter/repeater engine.
//!
//! A [`Repeater`] expands one parameterized constraint template into many
//! concrete constraints by enumerating the Cartesian product of its declared
//! counters in row-major order (the first-declared counter varies slowest,
//! exactly like a nest of loops). Repeater state is created for one
//! constraint's expansion pass and discarded afterwards.

mod substitute;

pub use substitute::substitute;

use crate::{
    error::{Error, Result},
    language::ast::{CounterPolicy, ExpanderDecl, LimitExpr},
    model::Model,
};

/// A counter bound, resolved against the model at construction time.
///
/// `size(entity)` limits become literals here; a reference to an earlier
/// counter stays live and is read at iteration time, so one counter's bound
/// can follow another counter through the enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Limit {
    Literal(i64),
    /// Index of an earlier counter in the same repeater.
    Counter(usize),
}

impl Limit {
    fn value(self, earlier: &[Counter]) -> i64 {
        match self {
            Limit::Literal(n) => n,
            Limit::Counter(index) => earlier[index].current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Iterates `1..=bound`.
    Count(Limit),
    /// Iterates `start..=end` inclusive.
    Range(Limit, Limit),
}

#[derive(Debug, Clone)]
struct Counter {
    name: String,
    policy: Policy,
    /// The value most recently produced; `start - 1` right after a reset.
    current: i64,
}

impl Counter {
    fn start(&self, earlier: &[Counter]) -> i64 {
        match self.policy {
            Policy::Count(_) => 1,
            Policy::Range(start, _) => start.value(earlier),
        }
    }

    fn end(&self, earlier: &[Counter]) -> i64 {
        match self.policy {
            Policy::Count(bound) => bound.value(earlier),
            Policy::Range(_, end) => end.value(earlier),
        }
    }

    fn reset(&mut self, earlier: &[Counter]) {
        self.current = self.start(earlier) - 1;
    }

    /// Advances to the next value. Returns `false` at exhaustion, which on a
    /// freshly reset counter means the range is empty (a legitimate
    /// zero-iterations outcome).
    fn advance(&mut self, earlier: &[Counter]) -> bool {
        if self.current + 1 > self.end(earlier) {
            false
        } else {
            self.current += 1;
            true
        }
    }
}

/// Enumerates the Cartesian product of an expander's counters as a
/// mixed-radix odometer, last counter fastest.
#[derive(Debug, Clone)]
pub struct Repeater {
    counters: Vec<Counter>,
    started: bool,
}

impl Repeater {
    /// Builds a repeater from an expander declaration, resolving `size()`
    /// bounds against the model. Counter references must point at earlier
    /// counters; validation guarantees that, so a dangling reference here is
    /// a defect.
    pub fn new(expander: &ExpanderDecl, model: &Model) -> Result<Self> {
        let mut counters: Vec<Counter> = Vec::with_capacity(expander.counters.len());

        for decl in &expander.counters {
            let resolve = |limit: &LimitExpr| -> Result<Limit> {
                match limit {
                    LimitExpr::Literal(n) => Ok(Limit::Literal(*n)),
                    LimitExpr::Counter(name) => counters
                        .iter()
                        .position(|c| c.name == *name)
                        .map(Limit::Counter)
                        .ok_or_else(|| {
                            Error::UnsupportedConstruct(format!(
                                "counter bound references undeclared counter {:?}",
                                name
                            ))
                        }),
                    LimitExpr::Size(entity) => model
                        .size_of(entity)
                        .map(Limit::Literal)
                        .ok_or_else(|| Error::UnknownVariable(entity.clone())),
                }
            };

            let policy = match &decl.policy {
                CounterPolicy::Count(bound) => Policy::Count(resolve(bound)?),
                CounterPolicy::Range(start, end) => Policy::Range(resolve(start)?, resolve(end)?),
            };
            counters.push(Counter {
                name: decl.name.clone(),
                policy,
                current: 0,
            });
        }

        Ok(Self {
            counters,
            started: false,
        })
    }

    /// Advances to the next combination. Returns `false` once the product is
    /// exhausted (or was empty to begin with).
    pub fn next(&mut self) -> bool {
        if self.counters.is_empty() {
            return false;
        }
        if !self.started {
            self.started = true;
            return self.init_suffix(0);
        }

        // Scan right to left for the first counter that can still advance;
        // everything to its right is reset and re-advanced.
        let mut position = self.counters.len();
        loop {
            if position == 0 {
                return false;
            }
            position -= 1;
            if self.advance_at(position) {
                return self.init_suffix(position + 1);
            }
        }
    }

    /// The current `(name, value)` binding of every counter, declaration
    /// order.
    pub fn bindings(&self) -> Vec<(&str, i64)> {
        self.counters
            .iter()
            .map(|c| (c.name.as_str(), c.current))
            .collect()
    }

    /// Initializes counters `from..` left to right. When a counter's range
    /// turns out empty, the initialization unwinds one position to the left,
    /// advances it, and retries, so empty ranges skip combinations without
    /// corrupting sibling counters. Returns `false` only when the whole
    /// enumeration is exhausted.
    fn init_suffix(&mut self, from: usize) -> bool {
        let mut position = from;
        loop {
            if position == self.counters.len() {
                return true;
            }
            self.reset_at(position);
            if self.advance_at(position) {
                position += 1;
                continue;
            }
            loop {
                if position == 0 {
                    return false;
                }
                position -= 1;
                if self.advance_at(position) {
                    position += 1;
                    break;
                }
            }
        }
    }

    fn reset_at(&mut self, position: usize) {
        let (earlier, rest) = self.counters.split_at_mut(position);
        rest[0].reset(earlier);
    }

    fn advance_at(&mut self, position: usize) -> bool {
        let (earlier, rest) = self.counters.split_at_mut(position);
        rest[0].advance(earlier)
    }
}
