use std::collections::VecDeque;

use serde::Serialize;

use crate::runtime::task::{Task, TaskId, TaskState};

#[derive(Debug)]
enum TaskSlot {
    Live(Box<Task>),
    Free { next: Option<TaskId> },
}

/// An error that ended a task nobody was holding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFault {
    pub task: u32,
    pub message: String,
}

/// Task slots plus a FIFO ready queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    slots: Vec<TaskSlot>,
    free_head: Option<TaskId>,
    ready: VecDeque<TaskId>,
    current: Option<TaskId>,
    live: usize,
    faults: Vec<TaskFault>,
}

impl Scheduler {
    pub fn insert(&mut self, task: Task) -> TaskId {
        self.live += 1;
        let task = Box::new(task);
        match self.free_head {
            Some(id) => {
                if let TaskSlot::Free { next } = self.slots[id.index()] {
                    self.free_head = next;
                }
                self.slots[id.index()] = TaskSlot::Live(task);
                id
            }
            None => {
                self.slots.push(TaskSlot::Live(task));
                TaskId((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Empties the slot, handing the task back to the caller.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let slot = self.slots.get_mut(id.index())?;
        if !matches!(slot, TaskSlot::Live(_)) {
            return None;
        }
        let previous = std::mem::replace(
            slot,
            TaskSlot::Free {
                next: self.free_head,
            },
        );
        self.free_head = Some(id);
        self.live -= 1;
        self.ready.retain(|&queued| queued != id);
        if self.current == Some(id) {
            self.current = None;
        }
        match previous {
            TaskSlot::Live(task) => Some(*task),
            TaskSlot::Free { .. } => None,
        }
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        match self.slots.get(id.index()) {
            Some(TaskSlot::Live(task)) => Some(task),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        match self.slots.get_mut(id.index()) {
            Some(TaskSlot::Live(task)) => Some(task),
            _ => None,
        }
    }

    /// Appends `id` to the ready queue unless it is already queued.
    pub fn enqueue(&mut self, id: TaskId) {
        if !self.ready.contains(&id) {
            self.ready.push_back(id);
        }
    }

    /// Moves `id` to the front of the ready queue.
    pub fn enqueue_front(&mut self, id: TaskId) {
        self.ready.retain(|&queued| queued != id);
        self.ready.push_front(id);
    }

    /// Pops the next task that is still ready to run.
    pub fn next_ready(&mut self) -> Option<TaskId> {
        while let Some(id) = self.ready.pop_front() {
            if self
                .get(id)
                .is_some_and(|task| task.state == TaskState::Ready)
            {
                return Some(id);
            }
        }
        None
    }

    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub fn set_current(&mut self, id: Option<TaskId>) {
        self.current = id;
    }

    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, TaskSlot::Live(_)))
            .map(|(index, _)| TaskId(index as u32))
    }

    pub fn record_fault(&mut self, fault: TaskFault) {
        self.faults.push(fault);
    }

    pub fn faults(&self) -> &[TaskFault] {
        &self.faults
    }

    pub fn take_faults(&mut self) -> Vec<TaskFault> {
        std::mem::take(&mut self.faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{activation::ActivationPool, dictionary::Dictionaries};

    fn task() -> Task {
        let acts = ActivationPool::new();
        Task::new(None, acts.root(), 1, 8, Dictionaries::default())
    }

    #[test]
    fn ready_queue_is_fifo() {
        let mut scheduler = Scheduler::default();
        let a = scheduler.insert(task());
        let b = scheduler.insert(task());
        scheduler.enqueue(a);
        scheduler.enqueue(b);
        scheduler.enqueue(a);
        assert_eq!(scheduler.ready_len(), 2);
        assert_eq!(scheduler.next_ready(), Some(a));
        assert_eq!(scheduler.next_ready(), Some(b));
        assert_eq!(scheduler.next_ready(), None);
    }

    #[test]
    fn next_ready_skips_tasks_that_are_not_ready() {
        let mut scheduler = Scheduler::default();
        let a = scheduler.insert(task());
        let b = scheduler.insert(task());
        scheduler.enqueue(a);
        scheduler.enqueue(b);
        scheduler.get_mut(a).unwrap().state = TaskState::Terminated;
        assert_eq!(scheduler.next_ready(), Some(b));
    }

    #[test]
    fn removed_slots_are_reused_and_dequeued() {
        let mut scheduler = Scheduler::default();
        let a = scheduler.insert(task());
        scheduler.enqueue(a);
        assert!(scheduler.remove(a).is_some());
        assert!(scheduler.remove(a).is_none());
        assert_eq!(scheduler.ready_len(), 0);
        assert_eq!(scheduler.insert(task()), a);
        assert_eq!(scheduler.live_count(), 1);
    }
}
