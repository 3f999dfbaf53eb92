//! Global execution state.
//!
//! [`MutableState`] is the scratch copy one branch mutates while executing a
//! block. [`GlobalState`] is its frozen projection: program counters and
//! variables are stored sorted by key, so two states with the same logical
//! content are equal and hash identically regardless of insertion order.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::types::{BlockId, ThreadId, Value};

/// Working state of a single branch.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MutableState {
    /// Current block per thread; `None` once the thread has terminated.
    pub pcs: HashMap<ThreadId, Option<BlockId>>,
    pub variables: HashMap<String, Value>,
    /// Global input stream shared by all threads, consumed from the front.
    pub input_remaining: VecDeque<i64>,
    pub output: Vec<Value>,
    pub depth: usize,
}

impl MutableState {
    /// Value of a variable; never-written variables read as 0.
    pub fn get(&self, var: &str) -> Value {
        self.variables.get(var).copied().unwrap_or(0)
    }

    pub fn set(&mut self, var: &str, value: Value) {
        match self.variables.get_mut(var) {
            Some(v) => *v = value,
            None => {
                self.variables.insert(var.to_string(), value);
            }
        }
    }

    pub fn pc(&self, thread: ThreadId) -> Option<BlockId> {
        self.pcs.get(&thread).copied().flatten()
    }

    pub fn freeze(&self) -> GlobalState {
        let mut pcs: Vec<(ThreadId, Option<BlockId>)> = self.pcs.iter().map(|(&t, &pc)| (t, pc)).collect();
        pcs.sort_unstable_by_key(|&(t, _)| t);

        let mut variables: Vec<(String, Value)> = self.variables.iter().map(|(k, &v)| (k.clone(), v)).collect();
        variables.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        GlobalState {
            pcs,
            variables,
            input_remaining: self.input_remaining.iter().copied().collect(),
            output: self.output.clone(),
            depth: self.depth,
        }
    }
}

/// Immutable, hashable snapshot of a [`MutableState`].
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct GlobalState {
    /// `(thread, pc)` pairs sorted by thread id.
    pub pcs: Vec<(ThreadId, Option<BlockId>)>,
    /// `(name, value)` pairs sorted by name.
    pub variables: Vec<(String, Value)>,
    pub input_remaining: Vec<i64>,
    pub output: Vec<Value>,
    pub depth: usize,
}

impl GlobalState {
    pub fn thaw(&self) -> MutableState {
        MutableState {
            pcs: self.pcs.iter().copied().collect(),
            variables: self.variables.iter().cloned().collect(),
            input_remaining: self.input_remaining.iter().copied().collect(),
            output: self.output.clone(),
            depth: self.depth,
        }
    }

    pub fn pc(&self, thread: ThreadId) -> Option<BlockId> {
        self.pcs
            .binary_search_by_key(&thread, |&(t, _)| t)
            .ok()
            .and_then(|i| self.pcs[i].1)
    }

    pub fn get(&self, var: &str) -> Value {
        self.variables
            .binary_search_by(|(name, _)| name.as_str().cmp(var))
            .map(|i| self.variables[i].1)
            .unwrap_or(0)
    }
}

impl fmt::Display for GlobalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "depth={} pcs={{", self.depth)?;
        for (i, (t, pc)) in self.pcs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match pc {
                Some(b) => write!(f, "{}:{}", t, b)?,
                None => write!(f, "{}:done", t)?,
            }
        }
        write!(f, "}} vars={{")?;
        for (i, (name, value)) in self.variables.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}} input={:?} output={:?}", self.input_remaining, self.output)
    }
}
