//! Breadth-first search over thread interleavings.
//!
//! # Model
//!
//! Every [`GlobalState`] is a node. Each thread that can run at a node
//! contributes one outgoing edge: clone the node, execute that thread's
//! current block, freeze the result. Identical states reached through
//! different interleavings are merged by the visited set.
//!
//! # Checking
//!
//! The program is correct for a given input if every reachable output is a
//! prefix of the expected output, and every finished run printed exactly the
//! expected output. The check is eager: a state is rejected as soon as its
//! output diverges, before the threads get a chance to finish.
//!
//! ```
//! use flowcheck::block::Block;
//! use flowcheck::program::Program;
//! use flowcheck::search::{Outcome, Search};
//! use flowcheck::thread::Thread;
//!
//! let mut program = Program::new("demo");
//! program.declare_variable("x");
//! let thread = Thread::from_blocks(
//!     1,
//!     [
//!         Block::start(0, 1),
//!         Block::assign_const(1, "x", 10, 2),
//!         Block::print(2, "x", 3),
//!         Block::end(3),
//!     ],
//! )
//! .unwrap();
//! program.add_thread(thread).unwrap();
//!
//! let mut search = Search::new(&program, vec![], vec![10]);
//! assert_eq!(search.run(), Outcome::Verified);
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, trace, warn};

use crate::interpreter::Interpreter;
use crate::program::Program;
use crate::state::{GlobalState, MutableState};
use crate::types::{ThreadId, Value};

/// Result of [`Search::run`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    /// Every reachable state was checked and none diverged.
    Verified,
    /// A diverging state was found; see [`Search::counterexample`].
    Counterexample,
    /// The stop flag was raised before the search finished. Nothing was disproven so far.
    Stopped,
}

impl Outcome {
    /// `true` unless a counterexample was found.
    pub fn is_success(self) -> bool {
        !matches!(self, Outcome::Counterexample)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Verified => write!(f, "verified"),
            Outcome::Counterexample => write!(f, "counterexample found"),
            Outcome::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a state was reported.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mismatch {
    /// The output so far is not a prefix of the expected output.
    Prefix,
    /// All threads finished, but the output is not exactly the expected one.
    Final,
}

/// One scheduling decision: `thread` executed a block, producing `state`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TraceStep {
    pub thread: ThreadId,
    pub state: Rc<GlobalState>,
}

/// A reachable state whose output disagrees with the expected output.
#[derive(Debug, Clone)]
pub struct Counterexample {
    pub state: Rc<GlobalState>,
    pub reason: Mismatch,
    /// Schedule leading from the initial state to `state`.
    pub trace: Vec<TraceStep>,
}

impl Counterexample {
    /// Threads in the order they were scheduled.
    pub fn schedule(&self) -> Vec<ThreadId> {
        self.trace.iter().map(|step| step.thread).collect()
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            Mismatch::Prefix => "output diverges from expected prefix",
            Mismatch::Final => "final output differs from expected",
        };
        writeln!(f, "Counterexample ({}) after {} steps:", reason, self.trace.len())?;
        for (i, step) in self.trace.iter().enumerate() {
            writeln!(f, "  {:>3}. {} -> {}", i + 1, step.thread, step.state)?;
        }
        write!(f, "  final: {}", self.state)
    }
}

type Parents = HashMap<Rc<GlobalState>, Option<(Rc<GlobalState>, ThreadId)>>;

pub struct Search<'a> {
    program: &'a Program,
    interpreter: Interpreter<'a>,
    expected: Vec<Value>,
    initial: Rc<GlobalState>,
    stop_flag: Arc<AtomicBool>,
    /// Number of dequeued states per depth, for coverage.
    depth_counts: Vec<usize>,
    visited: usize,
    counterexample: Option<Counterexample>,
}

impl<'a> Search<'a> {
    /// Prepares a search: every thread at its START block, registered variables at 0.
    pub fn new(program: &'a Program, input: Vec<i64>, expected: Vec<Value>) -> Self {
        let mut initial = MutableState::default();
        for thread in program.threads() {
            initial.pcs.insert(thread.id(), thread.start_block_id());
        }
        for var in program.variables() {
            initial.set(var, 0);
        }
        initial.input_remaining = input.into();

        Self {
            program,
            interpreter: Interpreter::new(program),
            expected,
            initial: Rc::new(initial.freeze()),
            stop_flag: Arc::new(AtomicBool::new(false)),
            depth_counts: Vec::new(),
            visited: 0,
            counterexample: None,
        }
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn initial_state(&self) -> &GlobalState {
        &self.initial
    }

    pub fn expected(&self) -> &[Value] {
        &self.expected
    }

    /// Shared flag that cancels a running search when set to `true`.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Replaces the stop flag with an externally owned one.
    pub fn set_stop_flag(&mut self, flag: Arc<AtomicBool>) {
        self.stop_flag = flag;
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Threads that may execute their current block, in ascending id order.
    ///
    /// A thread blocked on INPUT with an empty input stream is not runnable.
    pub fn runnable_threads(&self, state: &GlobalState) -> Vec<ThreadId> {
        state
            .pcs
            .iter()
            .filter_map(|&(tid, pc)| {
                let block = self.program.thread(tid)?.block(pc?)?;
                if block.is_input() && state.input_remaining.is_empty() {
                    return None;
                }
                Some(tid)
            })
            .collect()
    }

    /// `true` if every thread has terminated.
    pub fn is_complete(&self, state: &GlobalState) -> bool {
        state.pcs.iter().all(|(_, pc)| pc.is_none())
    }

    /// `true` if the output so far agrees with the expected output.
    pub fn check_output_prefix(&self, state: &GlobalState) -> bool {
        self.expected.starts_with(&state.output)
    }

    /// All successors of `state`, one per runnable thread.
    pub fn successors(&self, state: &GlobalState) -> Vec<(ThreadId, GlobalState)> {
        let runnable = self.runnable_threads(state);
        if runnable.is_empty() {
            return Vec::new();
        }
        let base = state.thaw();
        runnable
            .into_iter()
            .map(|tid| {
                let mut branch = base.clone();
                self.interpreter.execute_step(&mut branch, tid);
                (tid, branch.freeze())
            })
            .collect()
    }

    /// Explores all interleavings, stopping at the first counterexample.
    ///
    /// Statistics from a previous run are discarded, so repeated runs give identical results.
    pub fn run(&mut self) -> Outcome {
        info!(
            "run(threads = {}, input = {:?}, expected = {:?})",
            self.program.num_threads(),
            self.initial.input_remaining,
            self.expected
        );

        self.depth_counts.clear();
        self.counterexample = None;

        let mut queue = VecDeque::from([Rc::clone(&self.initial)]);
        let mut parents: Parents = HashMap::new();
        parents.insert(Rc::clone(&self.initial), None);

        let outcome = loop {
            if self.is_stopped() {
                warn!("Search stopped after {} states", self.explored_count());
                break Outcome::Stopped;
            }
            let Some(state) = queue.pop_front() else {
                break Outcome::Verified;
            };
            trace!("dequeue {}", state);

            if self.depth_counts.len() <= state.depth {
                self.depth_counts.resize(state.depth + 1, 0);
            }
            self.depth_counts[state.depth] += 1;

            if !self.check_output_prefix(&state) {
                self.report(&parents, state, Mismatch::Prefix);
                break Outcome::Counterexample;
            }

            if self.is_complete(&state) {
                if state.output != self.expected {
                    self.report(&parents, state, Mismatch::Final);
                    break Outcome::Counterexample;
                }
                continue;
            }

            for (tid, next) in self.successors(&state) {
                let next = Rc::new(next);
                if let Entry::Vacant(e) = parents.entry(Rc::clone(&next)) {
                    e.insert(Some((Rc::clone(&state), tid)));
                    queue.push_back(next);
                }
            }
        };

        self.visited = parents.len();
        info!(
            "Search {}: explored {} states, visited {}",
            outcome,
            self.explored_count(),
            self.visited
        );
        outcome
    }

    fn report(&mut self, parents: &Parents, state: Rc<GlobalState>, reason: Mismatch) {
        debug!("counterexample ({:?}): {}", reason, state);

        let mut trace = Vec::new();
        let mut current = Rc::clone(&state);
        while let Some(Some((parent, tid))) = parents.get(&current) {
            trace.push(TraceStep {
                thread: *tid,
                state: Rc::clone(&current),
            });
            current = Rc::clone(parent);
        }
        trace.reverse();

        self.counterexample = Some(Counterexample { state, reason, trace });
    }

    /// The offending state of the last run, if one was found.
    pub fn counterexample(&self) -> Option<&Counterexample> {
        self.counterexample.as_ref()
    }

    /// Number of distinct states discovered (queued or dequeued) by the last run.
    pub fn visited_count(&self) -> usize {
        self.visited
    }

    /// Number of states dequeued and checked by the last run.
    pub fn explored_count(&self) -> usize {
        self.depth_counts.iter().sum()
    }

    pub(crate) fn depth_counts(&self) -> &[usize] {
        &self.depth_counts
    }

    pub(crate) fn initial_rc(&self) -> Rc<GlobalState> {
        Rc::clone(&self.initial)
    }
}
