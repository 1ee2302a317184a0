use std::time::Duration;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(u64);

struct Entry<T> {
    id: u64,
    due: Duration,
    task: T,
}

/// Deferred tasks over a virtual clock.
///
/// Time only moves through [`Scheduler::advance`], so the event loop feeds it
/// wall-clock deltas while tests step it explicitly. Tasks falling due in the
/// same advance fire by deadline, then by registration order.
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(Entry {
            id,
            due: self.now + delay,
            task,
        });
        TaskHandle(id)
    }

    /// Returns false when the task already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.id != handle.0);
        self.pending.len() != before
    }

    #[cfg(test)]
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|e| e.id == handle.0)
    }

    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let now = self.now;
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|e| e.due <= now);
        self.pending = rest;
        due.sort_by_key(|e| (e.due, e.id));
        due.into_iter().map(|e| e.task).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_when_due() {
        let mut sched = Scheduler::default();
        sched.schedule(Duration::from_millis(800), "refilter");

        assert!(sched.advance(Duration::from_millis(799)).is_empty());
        assert_eq!(sched.advance(Duration::from_millis(1)), vec!["refilter"]);
        assert!(sched.advance(Duration::from_secs(10)).is_empty());
        assert_eq!(sched.len(), 0);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut sched = Scheduler::default();
        let handle = sched.schedule(Duration::from_millis(100), 1);
        sched.schedule(Duration::from_millis(100), 2);

        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        assert!(!sched.is_pending(handle));
        assert_eq!(sched.advance(Duration::from_millis(100)), vec![2]);
    }

    #[test]
    fn same_deadline_fires_in_registration_order() {
        let mut sched = Scheduler::default();
        sched.schedule(Duration::from_millis(50), "b");
        sched.schedule(Duration::from_millis(20), "a");
        sched.schedule(Duration::from_millis(50), "c");

        assert_eq!(sched.advance(Duration::from_millis(60)), vec!["a", "b", "c"]);
    }

    #[test]
    fn delay_is_relative_to_current_virtual_time() {
        let mut sched = Scheduler::default();
        sched.advance(Duration::from_secs(5));
        let handle = sched.schedule(Duration::from_millis(10), ());
        assert!(sched.is_pending(handle));
        assert_eq!(sched.advance(Duration::from_millis(10)).len(), 1);
    }
}
