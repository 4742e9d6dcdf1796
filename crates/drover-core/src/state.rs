//! Transient per-run agent state
//!
//! Carried between loop iterations and discarded on process exit:
//! per-task last-action timestamps for cooldown gating, a FIFO queue of
//! pending items to react to, and a monotonically growing set of
//! already-handled identifiers. Single-writer: the scheduler owns the
//! state and mutates it through `&mut`, so there is no synchronization
//! here.

use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct AgentState {
    last_action: HashMap<String, Instant>,
    queue: VecDeque<Value>,
    handled: HashSet<String>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `task` just executed successfully
    pub fn record_action(&mut self, task: &str) {
        self.last_action.insert(task.to_string(), Instant::now());
    }

    /// Backdate a task's last execution; used to exercise cooldown
    /// boundaries without waiting
    pub(crate) fn record_action_at(&mut self, task: &str, at: Instant) {
        self.last_action.insert(task.to_string(), at);
    }

    /// Time left before `task` may run again, or `None` when the
    /// cooldown has elapsed (or the task never ran)
    pub fn cooldown_remaining(&self, task: &str, interval: Duration) -> Option<Duration> {
        let last = self.last_action.get(task)?;
        let elapsed = last.elapsed();
        if elapsed >= interval {
            None
        } else {
            Some(interval - elapsed)
        }
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Append freshly fetched items to the back of the queue
    pub fn refill_queue(&mut self, items: impl IntoIterator<Item = Value>) {
        self.queue.extend(items);
    }

    /// Take the oldest pending item
    pub fn pop_queue(&mut self) -> Option<Value> {
        self.queue.pop_front()
    }

    /// Whether `id` was already acted upon this run
    pub fn is_handled(&self, id: &str) -> bool {
        self.handled.contains(id)
    }

    /// Mark `id` as acted upon; returns false if it already was. The
    /// set only ever grows for the life of the process.
    pub fn mark_handled(&mut self, id: &str) -> bool {
        self.handled.insert(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cooldown_boundaries() {
        let mut state = AgentState::new();
        let interval = Duration::from_secs(100);

        // Never ran: no cooldown
        assert!(state.cooldown_remaining("post", interval).is_none());

        // One second short of the interval: still cooling down
        state.record_action_at("post", Instant::now() - Duration::from_secs(99));
        let remaining = state.cooldown_remaining("post", interval).unwrap();
        assert!(remaining <= Duration::from_secs(1));

        // One second past the interval: free to run
        state.record_action_at("post", Instant::now() - Duration::from_secs(101));
        assert!(state.cooldown_remaining("post", interval).is_none());

        // A fresh execution restarts the clock
        state.record_action("post");
        assert!(state.cooldown_remaining("post", interval).is_some());
    }

    #[test]
    fn queue_is_fifo() {
        let mut state = AgentState::new();
        assert!(state.queue_is_empty());
        assert!(state.pop_queue().is_none());

        state.refill_queue(vec![json!({"id": "a"}), json!({"id": "b"})]);
        assert_eq!(state.queue_len(), 2);
        assert_eq!(state.pop_queue().unwrap()["id"], "a");
        assert_eq!(state.pop_queue().unwrap()["id"], "b");
        assert!(state.queue_is_empty());
    }

    #[test]
    fn handled_set_is_monotonic() {
        let mut state = AgentState::new();
        assert!(!state.is_handled("msg-1"));
        assert!(state.mark_handled("msg-1"));
        assert!(state.is_handled("msg-1"));

        // Re-marking reports the duplicate and changes nothing
        assert!(!state.mark_handled("msg-1"));
        assert!(state.is_handled("msg-1"));
    }
}
