//! Coverage of the interleaving space up to a depth bound.
//!
//! A run of [`Search::run`] may stop early (counterexample or stop flag) and
//! prunes every branch whose output diverges. Coverage compares the states it
//! actually checked against the full reachable space, which is recomputed
//! here by a separate BFS without pruning.
//!
//! All counts are over *states* at depth `<= k`. The number of distinct
//! schedules reaching them grows much faster and is available separately as
//! [`Search::schedules_up_to_k`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use log::debug;
use num_bigint::BigUint;

use crate::search::Search;
use crate::state::GlobalState;

/// Coverage summary for one depth bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub k: usize,
    /// States at depth `<= k` checked by the last run.
    pub checked: usize,
    /// States at depth `<= k` reachable at all.
    pub total: usize,
    pub percent: f64,
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "K={}: checked {} of {} states ({:.2}%)",
            self.k, self.checked, self.total, self.percent
        )
    }
}

impl Search<'_> {
    /// Number of states at depth `<= k` dequeued by the last [`run`][Search::run].
    pub fn checked_paths_up_to_k(&self, k: usize) -> usize {
        self.depth_counts().iter().take(k.saturating_add(1)).sum()
    }

    /// Number of reachable states at depth `<= k`, ignoring the expected output.
    ///
    /// States at depth exactly `k` are counted but not expanded.
    pub fn total_paths_up_to_k(&self, k: usize) -> usize {
        let initial = self.initial_rc();
        let mut queue = VecDeque::from([Rc::clone(&initial)]);
        let mut visited: HashSet<Rc<GlobalState>> = HashSet::from([initial]);
        let mut total = 0;

        while let Some(state) = queue.pop_front() {
            if state.depth > k {
                continue;
            }
            total += 1;
            if state.depth == k {
                continue;
            }
            for (_, next) in self.successors(&state) {
                let next = Rc::new(next);
                if visited.insert(Rc::clone(&next)) {
                    queue.push_back(next);
                }
            }
        }

        debug!("total_paths_up_to_k(k = {}) = {} (visited {})", k, total, visited.len());
        total
    }

    /// `100 * checked / total`, or 100 when there is nothing to cover.
    pub fn coverage_percent(&self, k: usize) -> f64 {
        let checked = self.checked_paths_up_to_k(k);
        let total = self.total_paths_up_to_k(k);
        percent(checked, total)
    }

    pub fn coverage(&self, k: usize) -> Coverage {
        let checked = self.checked_paths_up_to_k(k);
        let total = self.total_paths_up_to_k(k);
        Coverage {
            k,
            checked,
            total,
            percent: percent(checked, total),
        }
    }

    /// Number of distinct schedules (sequences of thread choices) of length `<= k`.
    ///
    /// Computed level by level: every state carries the number of schedules
    /// reaching it, and each successor inherits the sum over its predecessors.
    pub fn schedules_up_to_k(&self, k: usize) -> BigUint {
        let mut layer: HashMap<Rc<GlobalState>, BigUint> = HashMap::from([(self.initial_rc(), BigUint::from(1u32))]);
        let mut total = BigUint::ZERO;

        for depth in 0..=k {
            for count in layer.values() {
                total += count;
            }
            if depth == k {
                break;
            }

            let mut next_layer: HashMap<Rc<GlobalState>, BigUint> = HashMap::new();
            for (state, count) in &layer {
                for (_, next) in self.successors(state) {
                    *next_layer.entry(Rc::new(next)).or_insert(BigUint::ZERO) += count;
                }
            }
            if next_layer.is_empty() {
                break;
            }
            layer = next_layer;
        }

        debug!("schedules_up_to_k(k = {}) = {}", k, total);
        total
    }
}

fn percent(checked: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    checked as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::block::Block;
    use crate::program::Program;
    use crate::search::Outcome;
    use crate::thread::Thread;

    fn printers(n: u32) -> Program {
        let mut program = Program::new("printers");
        for id in 1..=n {
            let var = format!("v{}", id);
            program.declare_variable(var.clone());
            let thread = Thread::from_blocks(
                id,
                [
                    Block::start(0, 1),
                    Block::assign_const(1, var.clone(), id as u64, 2),
                    Block::print(2, var, 3),
                    Block::end(3),
                ],
            )
            .unwrap();
            program.add_thread(thread).unwrap();
        }
        program
    }

    #[test]
    fn test_single_thread_counts() {
        let program = printers(1);
        let mut search = Search::new(&program, vec![], vec![1]);
        assert_eq!(search.run(), Outcome::Verified);

        // START, ASSIGN, PRINT, END, done: one state per depth 0..=4.
        for k in 0..=4 {
            assert_eq!(search.total_paths_up_to_k(k), k + 1);
            assert_eq!(search.checked_paths_up_to_k(k), k + 1);
            assert_eq!(search.coverage_percent(k), 100.0);
        }
        assert_eq!(search.total_paths_up_to_k(100), 5);
        assert_eq!(search.checked_paths_up_to_k(usize::MAX), 5);
    }

    #[test]
    fn test_two_threads_grid() {
        // Two independent 4-step threads: states are pairs (i, j) with 0 <= i, j <= 4,
        // except that once both have printed (i, j >= 3) the output order splits the state.
        let program = printers(2);
        let search = Search::new(&program, vec![], vec![]);
        assert_eq!(search.total_paths_up_to_k(0), 1);
        assert_eq!(search.total_paths_up_to_k(1), 3);
        assert_eq!(search.total_paths_up_to_k(2), 6);
        assert_eq!(search.total_paths_up_to_k(5), 19);
        assert_eq!(search.total_paths_up_to_k(8), 29);
    }

    #[test]
    fn test_pruned_run_coverage() {
        let program = printers(2);
        let mut search = Search::new(&program, vec![], vec![1, 2]);
        assert_eq!(search.run(), Outcome::Counterexample);

        for k in 0..10 {
            let cov = search.coverage(k);
            assert!(cov.checked <= cov.total, "{}", cov);
            assert!((0.0..=100.0).contains(&cov.percent), "{}", cov);
        }
        assert!(search.coverage_percent(8) < 100.0);
    }

    #[test]
    fn test_coverage_without_run() {
        let program = printers(2);
        let search = Search::new(&program, vec![], vec![]);
        assert_eq!(search.checked_paths_up_to_k(5), 0);
        assert_eq!(search.coverage_percent(5), 0.0);
    }

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 100.0);
        assert_eq!(percent(1, 4), 25.0);
    }

    #[test]
    fn test_schedules() {
        let program = printers(2);
        let search = Search::new(&program, vec![], vec![]);
        // Prefixes of length d over two 4-step threads: sum of C(d, i) with i, d - i <= 4.
        assert_eq!(search.schedules_up_to_k(0), BigUint::from(1u32));
        assert_eq!(search.schedules_up_to_k(1), BigUint::from(3u32));
        assert_eq!(search.schedules_up_to_k(2), BigUint::from(7u32));
        // Full schedules: C(8, 4) = 70.
        let full = search.schedules_up_to_k(8) - search.schedules_up_to_k(7);
        assert_eq!(full, BigUint::from(70u32));
    }

    #[test]
    fn test_display() {
        let cov = Coverage {
            k: 3,
            checked: 1,
            total: 4,
            percent: 25.0,
        };
        assert_eq!(cov.to_string(), "K=3: checked 1 of 4 states (25.00%)");
    }
}
