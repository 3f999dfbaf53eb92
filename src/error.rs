use std::fmt;

use crate::types::{BlockId, ThreadId};

/// Errors raised while editing a program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ModelError {
    /// A block with this id already exists in the thread.
    DuplicateBlock { thread: ThreadId, block: BlockId },
    /// The thread already has a START block.
    DuplicateStart { thread: ThreadId, existing: BlockId },
    /// A thread with this id already exists in the program.
    DuplicateThread(ThreadId),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::DuplicateBlock { thread, block } => {
                write!(f, "Block with id {} already exists in thread {}", block, thread)
            }
            ModelError::DuplicateStart { thread, existing } => {
                write!(f, "Thread {} already has a START block ({})", thread, existing)
            }
            ModelError::DuplicateThread(thread) => {
                write!(f, "Thread with id {} already exists", thread)
            }
        }
    }
}

impl std::error::Error for ModelError {}
