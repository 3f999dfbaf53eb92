//! Structural validation of a [`Program`].
//!
//! The interpreter and the search assume a well-formed program and panic on
//! dangling references. Editors and loaders call [`Program::validate`] first
//! to get every problem at once, each tagged with its thread and block.

use std::collections::BTreeSet;
use std::fmt;

use crate::block::{BlockKind, Source};
use crate::program::Program;
use crate::thread::Thread;
use crate::types::{BlockId, ThreadId};

pub const MAX_THREADS: usize = 100;
pub const MAX_VARIABLES: usize = 100;
pub const MAX_BLOCKS: usize = 100;
/// Largest constant accepted in ASSIGN and DECISION blocks.
pub const MAX_CONSTANT: u64 = (1 << 31) - 1;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ValidationError {
    pub thread: Option<ThreadId>,
    pub block: Option<BlockId>,
    pub message: String,
}

impl ValidationError {
    fn program(message: impl Into<String>) -> Self {
        Self {
            thread: None,
            block: None,
            message: message.into(),
        }
    }

    fn thread(thread: ThreadId, message: impl Into<String>) -> Self {
        Self {
            thread: Some(thread),
            block: None,
            message: message.into(),
        }
    }

    fn block(thread: ThreadId, block: BlockId, message: impl Into<String>) -> Self {
        Self {
            thread: Some(thread),
            block: Some(block),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.thread, self.block) {
            (Some(t), Some(b)) => write!(f, "[{}, {}] {}", t, b, self.message),
            (Some(t), None) => write!(f, "[{}] {}", t, self.message),
            (None, Some(b)) => write!(f, "[{}] {}", b, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Program {
    /// Checks the program and returns all problems found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let n = self.num_threads();
        if !(1..=MAX_THREADS).contains(&n) {
            errors.push(ValidationError::program(format!(
                "Program must have 1-{} threads (current: {})",
                MAX_THREADS, n
            )));
        }
        if self.variables().len() > MAX_VARIABLES {
            errors.push(ValidationError::program(format!(
                "Too many shared variables: {} (max: {})",
                self.variables().len(),
                MAX_VARIABLES
            )));
        }

        for thread in self.threads() {
            validate_thread(self, thread, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_thread(program: &Program, thread: &Thread, errors: &mut Vec<ValidationError>) {
    let tid = thread.id();

    if thread.is_empty() {
        errors.push(ValidationError::thread(tid, "Thread is empty"));
        return;
    }
    if thread.len() > MAX_BLOCKS {
        errors.push(ValidationError::thread(
            tid,
            format!("Thread exceeds {} blocks limit", MAX_BLOCKS),
        ));
    }

    let starts = thread
        .blocks()
        .filter(|b| matches!(b.kind, BlockKind::Start { .. }))
        .count();
    if starts != 1 {
        errors.push(ValidationError::thread(
            tid,
            format!("Thread must have exactly 1 START block (found: {})", starts),
        ));
    }
    if !thread.blocks().any(|b| matches!(b.kind, BlockKind::End)) {
        errors.push(ValidationError::thread(tid, "Thread must have at least 1 END block"));
    }

    let ids: BTreeSet<BlockId> = thread.blocks().map(|b| b.id).collect();

    for block in thread.blocks() {
        for var in block.variables() {
            if !program.is_declared(var) {
                errors.push(ValidationError::block(
                    tid,
                    block.id,
                    format!("Variable '{}' is not registered in shared memory", var),
                ));
            }
        }

        match &block.kind {
            BlockKind::Assign {
                source: Source::Const(c),
                ..
            } if *c > MAX_CONSTANT => {
                errors.push(ValidationError::block(
                    tid,
                    block.id,
                    format!("Value {} is out of range [0, 2^31-1]", c),
                ));
            }
            BlockKind::Decision { condition, .. } if condition.constant as u64 > MAX_CONSTANT => {
                errors.push(ValidationError::block(
                    tid,
                    block.id,
                    format!("Value {} is out of range [0, 2^31-1]", condition.constant),
                ));
            }
            _ => {}
        }

        match &block.kind {
            BlockKind::Decision { on_true, on_false, .. } => {
                if !ids.contains(on_true) {
                    errors.push(ValidationError::block(
                        tid,
                        block.id,
                        format!("Branch 'True' points to non-existent block {}", on_true),
                    ));
                }
                if !ids.contains(on_false) {
                    errors.push(ValidationError::block(
                        tid,
                        block.id,
                        format!("Branch 'False' points to non-existent block {}", on_false),
                    ));
                }
            }
            _ => {
                for next in block.successors() {
                    if !ids.contains(&next) {
                        errors.push(ValidationError::block(
                            tid,
                            block.id,
                            format!("Block points to non-existent next block {}", next),
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::block::{Block, CmpOp, Condition};

    fn program_with(blocks: Vec<Block>) -> Program {
        let mut program = Program::new("test");
        program.declare_variable("x");
        program.add_thread(Thread::from_blocks(1, blocks).unwrap()).unwrap();
        program
    }

    #[test]
    fn test_valid_program() {
        let program = program_with(vec![
            Block::start(0, 1),
            Block::assign_const(1, "x", 10, 2),
            Block::print(2, "x", 3),
            Block::end(3),
        ]);
        assert_eq!(program.validate(), Ok(()));
    }

    #[test]
    fn test_empty_program() {
        let errors = Program::default().validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("1-100 threads"));
    }

    #[test]
    fn test_empty_thread() {
        let mut program = Program::default();
        program.add_thread(Thread::new(4)).unwrap();
        let errors = program.validate().unwrap_err();
        assert_eq!(errors, vec![ValidationError::thread(ThreadId::new(4), "Thread is empty")]);
    }

    #[test]
    fn test_missing_start_and_end() {
        let program = program_with(vec![Block::print(1, "x", 1)]);
        let errors = program.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.message.contains("START")));
        assert!(errors.iter().any(|e| e.message.contains("END")));
    }

    #[test]
    fn test_dangling_successors() {
        let program = program_with(vec![
            Block::start(0, 1),
            Block::decision(1, Condition::new("x", CmpOp::Eq, 0), 7, 8),
            Block::end(2),
        ]);
        let errors = program.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.block == Some(BlockId::new(1))));
        assert_eq!(
            errors[0].to_string(),
            "[T1, B1] Branch 'True' points to non-existent block B7"
        );
    }

    #[test]
    fn test_unregistered_variable() {
        let program = program_with(vec![Block::start(0, 1), Block::print(1, "y", 2), Block::end(2)]);
        let errors = program.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[T1, B1] Variable 'y' is not registered in shared memory"
        );
    }

    #[test]
    fn test_constant_range() {
        let program = program_with(vec![
            Block::start(0, 1),
            Block::assign_const(1, "x", 1 << 31, 2),
            Block::decision(2, Condition::new("x", CmpOp::Lt, u32::MAX), 3, 3),
            Block::end(3),
        ]);
        let errors = program.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message.contains("out of range")));
    }
}
