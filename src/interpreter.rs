//! Single-step block interpreter.
//!
//! [`Interpreter::execute_step`] advances one thread by exactly one block.
//! It is only called for threads the search considers runnable, so a missing
//! thread or a dangling block id means the program is malformed and the call
//! panics instead of returning an error.

use log::trace;

use crate::block::{Block, BlockKind, Source};
use crate::program::Program;
use crate::state::MutableState;
use crate::thread::Thread;
use crate::types::{wrap_i64, wrap_u64, BlockId, ThreadId};

#[derive(Debug, Copy, Clone)]
pub struct Interpreter<'a> {
    program: &'a Program,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    fn thread(&self, id: ThreadId) -> &'a Thread {
        match self.program.thread(id) {
            Some(thread) => thread,
            None => panic!("Thread {} not found", id),
        }
    }

    fn block(&self, thread: &'a Thread, id: BlockId) -> &'a Block {
        match thread.block(id) {
            Some(block) => block,
            None => panic!("Block {} not found in thread {}", id, thread.id()),
        }
    }

    /// Executes the current block of `thread_id` in place.
    ///
    /// INPUT must only be executed while the input stream is non-empty; otherwise
    /// the thread keeps its program counter. The depth grows by one in every case.
    pub fn execute_step(&self, state: &mut MutableState, thread_id: ThreadId) {
        let thread = self.thread(thread_id);
        let pc = match state.pcs.get(&thread_id) {
            Some(&pc) => pc,
            None => panic!("Thread {} has no program counter", thread_id),
        };
        let Some(pc) = pc else {
            // Terminated threads have no block to execute.
            return;
        };
        let block = self.block(thread, pc);
        trace!("execute_step(thread = {}, block = {})", thread_id, block);

        let next_pc = match &block.kind {
            BlockKind::Start { next } => Some(*next),
            BlockKind::End => None,
            BlockKind::Assign { target, source, next } => {
                let value = match source {
                    Source::Const(c) => wrap_u64(*c),
                    Source::Var(name) => state.get(name),
                };
                state.set(target, value);
                Some(*next)
            }
            BlockKind::Input { var, next } => match state.input_remaining.pop_front() {
                Some(value) => {
                    state.set(var, wrap_i64(value));
                    Some(*next)
                }
                None => Some(pc),
            },
            BlockKind::Print { var, next } => {
                let value = state.get(var);
                state.output.push(value);
                Some(*next)
            }
            BlockKind::Decision {
                condition,
                on_true,
                on_false,
            } => {
                let value = state.get(&condition.var);
                if condition.op.eval(value, condition.constant) {
                    Some(*on_true)
                } else {
                    Some(*on_false)
                }
            }
        };

        state.pcs.insert(thread_id, next_pc);
        state.depth += 1;
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::block::{CmpOp, Condition};

    fn single(blocks: Vec<Block>) -> Program {
        let mut program = Program::new("test");
        program.add_thread(Thread::from_blocks(1, blocks).unwrap()).unwrap();
        program
    }

    fn state_at(pc: u32) -> MutableState {
        let mut state = MutableState::default();
        state.pcs.insert(ThreadId::new(1), Some(BlockId::new(pc)));
        state
    }

    const T1: ThreadId = ThreadId::new(1);

    #[test]
    fn test_start_and_end() {
        let program = single(vec![Block::start(0, 1), Block::end(1)]);
        let interp = Interpreter::new(&program);
        let mut state = state_at(0);

        interp.execute_step(&mut state, T1);
        assert_eq!(state.pc(T1), Some(BlockId::new(1)));
        assert_eq!(state.depth, 1);

        interp.execute_step(&mut state, T1);
        assert_eq!(state.pcs[&T1], None);
        assert_eq!(state.depth, 2);
        assert!(state.variables.is_empty());
        assert!(state.output.is_empty());
    }

    #[test]
    fn test_assign_wraps() {
        let program = single(vec![Block::assign_const(1, "x", (1 << 32) + 5, 2), Block::end(2)]);
        let mut state = state_at(1);
        Interpreter::new(&program).execute_step(&mut state, T1);
        assert_eq!(state.get("x"), 5);
        assert_eq!(state.pc(T1), Some(BlockId::new(2)));
    }

    #[test]
    fn test_assign_from_missing_var() {
        let program = single(vec![Block::assign_var(1, "x", "missing_var", 2), Block::end(2)]);
        let mut state = state_at(1);
        state.set("x", 77);
        Interpreter::new(&program).execute_step(&mut state, T1);
        assert_eq!(state.get("x"), 0);
    }

    #[test]
    fn test_assign_copies_var() {
        let program = single(vec![Block::assign_var(1, "x", "y", 2), Block::end(2)]);
        let mut state = state_at(1);
        state.set("y", 42);
        Interpreter::new(&program).execute_step(&mut state, T1);
        assert_eq!(state.get("x"), 42);
    }

    #[test]
    fn test_print() {
        let program = single(vec![Block::print(1, "x", 2), Block::print(2, "y", 3), Block::end(3)]);
        let interp = Interpreter::new(&program);
        let mut state = state_at(1);
        state.set("x", 3);
        interp.execute_step(&mut state, T1);
        interp.execute_step(&mut state, T1);
        assert_eq!(state.output, vec![3, 0]);
        assert_eq!(state.pc(T1), Some(BlockId::new(3)));
    }

    #[test]
    fn test_decision() {
        let program = single(vec![
            Block::decision(1, Condition::new("x", CmpOp::Lt, 10), 2, 3),
            Block::end(2),
            Block::end(3),
        ]);
        let interp = Interpreter::new(&program);

        let mut state = state_at(1);
        state.set("x", 9);
        interp.execute_step(&mut state, T1);
        assert_eq!(state.pc(T1), Some(BlockId::new(2)));

        let mut state = state_at(1);
        state.set("x", 10);
        interp.execute_step(&mut state, T1);
        assert_eq!(state.pc(T1), Some(BlockId::new(3)));
    }

    #[test]
    fn test_decision_default_zero() {
        let program = single(vec![
            Block::decision(1, Condition::new("x", CmpOp::Eq, 0), 2, 3),
            Block::end(2),
            Block::end(3),
        ]);
        let mut state = state_at(1);
        Interpreter::new(&program).execute_step(&mut state, T1);
        assert_eq!(state.pc(T1), Some(BlockId::new(2)));
    }

    #[test]
    fn test_input_consumes_in_order() {
        let program = single(vec![Block::input(1, "x", 2), Block::input(2, "y", 3), Block::end(3)]);
        let interp = Interpreter::new(&program);
        let mut state = state_at(1);
        state.input_remaining.extend([-1, 7]);

        interp.execute_step(&mut state, T1);
        assert_eq!(state.get("x"), u32::MAX);
        interp.execute_step(&mut state, T1);
        assert_eq!(state.get("y"), 7);
        assert!(state.input_remaining.is_empty());
        assert_eq!(state.pc(T1), Some(BlockId::new(3)));
    }

    #[test]
    fn test_input_empty_stalls() {
        let program = single(vec![Block::input(1, "x", 2), Block::end(2)]);
        let mut state = state_at(1);
        Interpreter::new(&program).execute_step(&mut state, T1);
        assert_eq!(state.pc(T1), Some(BlockId::new(1)));
        assert_eq!(state.depth, 1);
        assert!(state.variables.is_empty());
    }

    #[test]
    fn test_terminated_thread_is_noop() {
        let program = single(vec![Block::end(1)]);
        let mut state = MutableState::default();
        state.pcs.insert(T1, None);
        let before = state.clone();
        Interpreter::new(&program).execute_step(&mut state, T1);
        assert_eq!(state, before);
    }

    #[test]
    #[should_panic(expected = "Thread T9 not found")]
    fn test_unknown_thread_panics() {
        let program = single(vec![Block::end(1)]);
        let mut state = state_at(1);
        Interpreter::new(&program).execute_step(&mut state, ThreadId::new(9));
    }

    #[test]
    #[should_panic(expected = "Block B5 not found in thread T1")]
    fn test_dangling_block_panics() {
        let program = single(vec![Block::end(1)]);
        let mut state = state_at(5);
        Interpreter::new(&program).execute_step(&mut state, T1);
    }
}
