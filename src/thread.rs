use std::collections::BTreeMap;

use log::debug;

use crate::block::{Block, BlockKind};
use crate::error::ModelError;
use crate::types::{BlockId, ThreadId};

/// One flowchart: an id-indexed arena of blocks plus the cached START id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Thread {
    id: ThreadId,
    name: String,
    blocks: BTreeMap<BlockId, Block>,
    start: Option<BlockId>,
}

impl Thread {
    pub fn new(id: u32) -> Self {
        let id = ThreadId::new(id);
        Self {
            id,
            name: format!("Thread {}", id.id()),
            blocks: BTreeMap::new(),
            start: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds a thread from a list of blocks.
    pub fn from_blocks(id: u32, blocks: impl IntoIterator<Item = Block>) -> Result<Self, ModelError> {
        let mut thread = Thread::new(id);
        for block in blocks {
            thread.add_block(block)?;
        }
        Ok(thread)
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the START block, if the thread has one.
    pub fn start_block_id(&self) -> Option<BlockId> {
        self.start
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Blocks in ascending id order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Adds a block, remembering it as the entry point if it is a START block.
    pub fn add_block(&mut self, block: Block) -> Result<(), ModelError> {
        debug!("add_block(thread = {}, block = {})", self.id, block);

        if self.blocks.contains_key(&block.id) {
            return Err(ModelError::DuplicateBlock {
                thread: self.id,
                block: block.id,
            });
        }
        if let BlockKind::Start { .. } = block.kind {
            if let Some(existing) = self.start {
                return Err(ModelError::DuplicateStart { thread: self.id, existing });
            }
            self.start = Some(block.id);
        }
        self.blocks.insert(block.id, block);
        Ok(())
    }

    /// Replaces an existing block (or inserts a new one), returning the previous block.
    pub fn replace_block(&mut self, block: Block) -> Result<Option<Block>, ModelError> {
        let old = self.blocks.remove(&block.id);
        if let Some(old) = &old {
            if self.start == Some(old.id) {
                self.start = None;
            }
        }
        match self.add_block(block) {
            Ok(()) => Ok(old),
            Err(e) => {
                // Restore the previous block so a failed edit leaves the thread intact.
                if let Some(old) = old {
                    if matches!(old.kind, BlockKind::Start { .. }) {
                        self.start = Some(old.id);
                    }
                    self.blocks.insert(old.id, old);
                }
                Err(e)
            }
        }
    }

    /// Removes a block. Dangling references to it are left for the validator to report.
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        let block = self.blocks.remove(&id)?;
        if self.start == Some(id) {
            self.start = None;
        }
        Some(block)
    }
}
