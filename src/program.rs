use std::collections::BTreeMap;

use crate::error::ModelError;
use crate::thread::Thread;
use crate::types::ThreadId;

/// A concurrent flowchart program: threads plus the shared variable registry.
///
/// The program is read-only input to the interpreter and the search.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Program {
    name: String,
    threads: BTreeMap<ThreadId, Thread>,
    variables: Vec<String>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            threads: BTreeMap::new(),
            variables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_thread(&mut self, thread: Thread) -> Result<(), ModelError> {
        if self.threads.contains_key(&thread.id()) {
            return Err(ModelError::DuplicateThread(thread.id()));
        }
        self.threads.insert(thread.id(), thread);
        Ok(())
    }

    pub fn remove_thread(&mut self, id: ThreadId) -> Option<Thread> {
        self.threads.remove(&id)
    }

    pub fn thread(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.get(&id)
    }

    /// Threads in ascending id order.
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn thread_ids(&self) -> impl Iterator<Item = ThreadId> + '_ {
        self.threads.keys().copied()
    }

    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    /// Registers a shared variable. Declaring the same name twice is a no-op.
    pub fn declare_variable(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.variables.contains(&name) {
            self.variables.push(name);
        }
    }

    /// Registered shared variables, in declaration order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }
}
