use std::{
    thread,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

pub type Task = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

pub trait Scheduler: Send + Sync {
    fn call_later(&self, delay: Duration, task: Task) -> TimerId;
    fn cancel(&self, id: TimerId) -> bool;
}

struct Entry {
    id: TimerId,
    deadline: Instant,
    task: Task,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

/// One-shot timers run cooperatively by whoever owns the loop.
///
/// Nothing fires on its own thread: callbacks run inside [`TimerQueue::run_due`]
/// on the caller's thread. Dropping the queue discards anything still pending.
#[derive(Default)]
pub struct TimerQueue {
    inner: Mutex<Inner>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.lock().entries.iter().map(|e| e.deadline).min()
    }

    /// Run every timer whose deadline is at or before `now`, earliest first.
    /// Returns how many ran.
    pub fn run_due(&self, now: Instant) -> usize {
        let mut due: Vec<Entry> = {
            let mut inner = self.inner.lock();
            let (due, rest) = std::mem::take(&mut inner.entries)
                .into_iter()
                .partition(|e| e.deadline <= now);
            inner.entries = rest;
            due
        };
        due.sort_by_key(|e| (e.deadline, e.id.0));

        let count = due.len();
        for entry in due {
            log::debug!("timer {} fired", entry.id.0);
            (entry.task)();
        }
        count
    }

    /// Block until every pending timer has fired.
    pub fn run_until_idle(&self) {
        while let Some(deadline) = self.next_deadline() {
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            }
            self.run_due(Instant::now());
        }
    }
}

impl Scheduler for TimerQueue {
    fn call_later(&self, delay: Duration, task: Task) -> TimerId {
        let mut inner = self.inner.lock();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            deadline: Instant::now() + delay,
            task,
        });
        id
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.id != id);
        inner.entries.len() != before
    }
}
