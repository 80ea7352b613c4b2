//! Deferred restoration scheduling on the tick clock.
//!
//! Restores are not threads or callbacks: each is a task keyed by
//! coordinate that becomes due at a tick. The owner drains due tasks with
//! [`TimerService::poll_due`] on the tick thread.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Tick};
use crate::voxel::coord::VoxelCoord;

/// Opaque handle to one scheduled restore
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Lifecycle of a scheduled task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Fired,
    Cancelled,
}

/// A restore whose delay has elapsed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DueRestore {
    pub handle: TimerHandle,
    pub coord: VoxelCoord,
    pub due: Tick,
}

/// Cooperative deferred-invocation service
pub trait TimerService {
    /// Schedule a restore of `coord` after `delay` ticks
    fn schedule(&mut self, delay: Tick, coord: VoxelCoord) -> Result<TimerHandle>;

    /// Cancel a pending task. Returns false (and does nothing) when the
    /// task already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Advance to `now` and return every task due at or before it, in due order
    fn poll_due(&mut self, now: Tick) -> Vec<DueRestore>;

    /// State of a task, or None for handles the service no longer tracks
    fn state(&self, handle: TimerHandle) -> Option<TaskState>;

    /// Number of pending tasks
    fn pending(&self) -> usize;

    /// Change the pending-task limit. Services without one return false.
    fn set_capacity(&mut self, _capacity: usize) -> bool {
        false
    }
}

/// Heaps shorter than this are never compacted
const COMPACT_MIN: usize = 64;

/// Heap entry, ordered so the earliest due task is popped first
#[derive(Clone, Copy, Debug)]
struct ScheduledTask {
    due: Tick,
    handle: TimerHandle,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for ScheduledTask {}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so earlier due (then earlier handle) wins
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// In-process timer service driven by the tick clock.
///
/// Cancelled tasks stay in the heap and are skipped when popped, until
/// they outnumber the pending ones and the heap is compacted. The heap
/// stays within about `max(2 * pending, 64)` entries. Terminal
/// states are remembered for the most recent `capacity` tasks.
pub struct TickScheduler {
    heap: BinaryHeap<ScheduledTask>,
    pending: HashMap<TimerHandle, (Tick, VoxelCoord)>,
    finished: HashMap<TimerHandle, TaskState>,
    finished_order: VecDeque<TimerHandle>,
    capacity: usize,
    next_id: u64,
    now: Tick,
}

impl TickScheduler {
    /// Create a scheduler holding at most `capacity` pending tasks
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            finished: HashMap::new(),
            finished_order: VecDeque::new(),
            capacity,
            next_id: 1,
            now: 0,
        }
    }

    /// Tick the scheduler last advanced to
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Heap entries, including cancelled tasks not yet dropped
    pub fn queued(&self) -> usize {
        self.heap.len()
    }

    /// Drop cancelled entries once they dominate the heap
    fn compact(&mut self) {
        if self.heap.len() <= self.pending.len().saturating_mul(2).max(COMPACT_MIN) {
            return;
        }
        let pending = &self.pending;
        self.heap.retain(|task| pending.contains_key(&task.handle));
        log::trace!("Compacted restore queue to {} tasks", self.heap.len());
    }

    /// Due tick of a pending task
    pub fn due_at(&self, handle: TimerHandle) -> Option<Tick> {
        self.pending.get(&handle).map(|&(due, _)| due)
    }

    fn finish(&mut self, handle: TimerHandle, state: TaskState) {
        self.finished.insert(handle, state);
        self.finished_order.push_back(handle);
        while self.finished_order.len() > self.capacity.max(1) {
            if let Some(old) = self.finished_order.pop_front() {
                self.finished.remove(&old);
            }
        }
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(65_536)
    }
}

impl TimerService for TickScheduler {
    fn schedule(&mut self, delay: Tick, coord: VoxelCoord) -> Result<TimerHandle> {
        if self.pending.len() >= self.capacity {
            return Err(Error::SchedulingFailure(format!(
                "{} restores already pending",
                self.pending.len()
            )));
        }

        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let due = self.now.saturating_add(delay);
        self.pending.insert(handle, (due, coord));
        self.heap.push(ScheduledTask { due, handle });
        Ok(handle)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.pending.remove(&handle).is_some() {
            self.finish(handle, TaskState::Cancelled);
            self.compact();
            true
        } else {
            false
        }
    }

    fn poll_due(&mut self, now: Tick) -> Vec<DueRestore> {
        self.now = self.now.max(now);
        let mut due = Vec::new();

        while let Some(task) = self.heap.peek() {
            if task.due > self.now {
                break;
            }
            let task = *task;
            self.heap.pop();
            if let Some((at, coord)) = self.pending.remove(&task.handle) {
                self.finish(task.handle, TaskState::Fired);
                due.push(DueRestore { handle: task.handle, coord, due: at });
            }
        }
        due
    }

    fn state(&self, handle: TimerHandle) -> Option<TaskState> {
        if self.pending.contains_key(&handle) {
            Some(TaskState::Pending)
        } else {
            self.finished.get(&handle).copied()
        }
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }

    fn set_capacity(&mut self, capacity: usize) -> bool {
        self.capacity = capacity;
        true
    }
}
