//! # flowcheck: interleaving checker for flowchart programs
//!
//! **`flowcheck`** verifies that a multi-threaded *flowchart program* prints the
//! same output no matter how its threads are scheduled.
//!
//! ## The model
//!
//! A [`Program`][crate::program::Program] is a set of threads, each a control-flow
//! graph of blocks (START, END, ASSIGN, INPUT, PRINT, DECISION), plus a registry of
//! shared variables holding 32-bit unsigned values. All threads read one global
//! input stream and write one global output stream.
//!
//! Concurrency is simulated, not executed: at every point any runnable thread
//! may take the next step. The [`Search`][crate::search::Search] engine explores
//! all those choices breadth-first, merges identical states, and stops at the
//! first state whose output is not a prefix of the expected output.
//!
//! ## Basic Usage
//!
//! ```rust
//! use flowcheck::block::Block;
//! use flowcheck::program::Program;
//! use flowcheck::search::{Outcome, Search};
//! use flowcheck::thread::Thread;
//!
//! // Two threads print different constants: the order is up to the scheduler.
//! let mut program = Program::new("two printers");
//! for (id, var, value) in [(1, "a", 1), (2, "b", 2)] {
//!     program.declare_variable(var);
//!     let thread = Thread::from_blocks(id, [
//!         Block::start(0, 1),
//!         Block::assign_const(1, var, value, 2),
//!         Block::print(2, var, 3),
//!         Block::end(3),
//!     ]).unwrap();
//!     program.add_thread(thread).unwrap();
//! }
//! assert!(program.validate().is_ok());
//!
//! let mut search = Search::new(&program, vec![], vec![1, 2]);
//! assert_eq!(search.run(), Outcome::Counterexample);
//!
//! let cex = search.counterexample().unwrap();
//! assert_eq!(cex.state.output, vec![2]);
//! println!("{}", cex);
//!
//! // How much of the interleaving space was checked before the search stopped?
//! println!("{}", search.coverage(8));
//! ```
//!
//! ## Core Components
//!
//! - **[`interpreter`]**: executes one block of one thread.
//! - **[`state`]**: mutable working state and its frozen, hashable snapshot.
//! - **[`search`]**: BFS over interleavings with output-prefix pruning.
//! - **[`coverage`]**: how much of the space up to depth `K` was checked.
//! - **[`validate`]**: structural checks an editor runs before searching.

pub mod block;
pub mod coverage;
pub mod error;
pub mod interpreter;
pub mod program;
pub mod search;
pub mod state;
pub mod thread;
pub mod types;
pub mod validate;
