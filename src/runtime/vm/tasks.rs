use crate::{
    error::{Result, VmError},
    runtime::{
        cell::{Cell, CellIndex},
        scheduler::TaskFault,
        task::{Task, TaskId, TaskState},
    },
};

use super::Vm;

impl Vm {
    /// Creates a ready task starting at `entry`.
    ///
    /// A child task inherits its parent's dictionaries and gets a fresh
    /// activation under the parent's; a top-level task starts from the
    /// default dictionaries under the root activation.
    pub fn spawn_task(&mut self, entry: CellIndex, parent: Option<TaskId>) -> TaskId {
        let id = self.create_task(entry, parent);
        self.scheduler.enqueue(id);
        id
    }

    /// Like [`Vm::spawn_task`] but the task is kept after it terminates so
    /// the host can read its stack. The host must reclaim it.
    pub fn spawn_held_task(&mut self, entry: CellIndex) -> TaskId {
        let id = self.create_held_task(entry);
        self.scheduler.enqueue(id);
        id
    }

    pub(crate) fn create_held_task(&mut self, entry: CellIndex) -> TaskId {
        let id = self.create_task(entry, None);
        if let Some(task) = self.scheduler.get_mut(id) {
            task.held = true;
        }
        id
    }

    pub(crate) fn create_task(&mut self, entry: CellIndex, parent: Option<TaskId>) -> TaskId {
        let (scope, dictionaries) = match parent.and_then(|p| self.scheduler.get(p)) {
            Some(task) => (task.act, task.dictionaries.clone()),
            None => (self.acts.root(), self.defaults.clone()),
        };
        let act = self.acts.create(scope);
        let task = Task::new(parent, act, entry, self.config.stack_slots, dictionaries);
        let id = self.scheduler.insert(task);
        tracing::debug!(task = id.raw(), entry, "spawn");
        id
    }

    /// Runs ready tasks in FIFO order until none is left.
    ///
    /// An error ends only the task that raised it, except heap corruption,
    /// which stops the scheduler and is returned.
    pub fn run(&mut self) -> Result<()> {
        while let Some(id) = self.scheduler.next_ready() {
            self.scheduler.set_current(Some(id));
            if let Some(task) = self.scheduler.get_mut(id) {
                task.state = TaskState::Running;
            }
            let outcome = self.run_slice(id);
            self.scheduler.set_current(None);
            match outcome {
                Ok(()) => self.end_slice(id),
                Err(err) if err.is_task_fatal() => self.fail_task(id, err),
                Err(err) => {
                    tracing::error!(task = id.raw(), error = %err, "scheduler stopped");
                    self.fail_task(id, err.clone());
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn run_slice(&mut self, id: TaskId) -> Result<()> {
        while self
            .scheduler
            .get(id)
            .is_some_and(|task| task.state == TaskState::Running)
        {
            self.step()?;
        }
        Ok(())
    }

    fn end_slice(&mut self, id: TaskId) {
        let Some(task) = self.scheduler.get_mut(id) else {
            return;
        };
        match task.state {
            TaskState::Suspended | TaskState::Ready => {
                task.state = TaskState::Ready;
                tracing::debug!(task = id.raw(), "suspend");
                self.scheduler.enqueue(id);
            }
            TaskState::Terminated => {
                tracing::debug!(task = id.raw(), "terminate");
                if !task.held {
                    self.reclaim_task(id);
                }
            }
            TaskState::Running => {}
        }
    }

    fn fail_task(&mut self, id: TaskId, err: VmError) {
        tracing::warn!(task = id.raw(), error = %err, "task failed");
        let Some(task) = self.scheduler.get_mut(id) else {
            return;
        };
        if task.held {
            task.state = TaskState::Terminated;
            task.fault = Some(err);
            return;
        }
        self.reclaim_task(id);
        self.scheduler.record_fault(TaskFault {
            task: id.raw(),
            message: err.to_string(),
        });
    }

    /// Ends a task: a running task stops at its next dispatch, any other is
    /// reclaimed at once. Held tasks stay inspectable.
    pub fn cancel_task(&mut self, id: TaskId) -> Result<()> {
        let running = self.scheduler.current() == Some(id);
        let task = self
            .scheduler
            .get_mut(id)
            .ok_or(VmError::UnknownTask(id.raw()))?;
        tracing::debug!(task = id.raw(), "cancel");
        if running || task.held {
            task.state = TaskState::Terminated;
            return Ok(());
        }
        self.reclaim_task(id);
        Ok(())
    }

    /// Removes a task, releasing both stacks and its activation.
    pub fn reclaim_task(&mut self, id: TaskId) -> bool {
        let Some(mut task) = self.scheduler.remove(id) else {
            return false;
        };
        for cell in task.stacks.drain() {
            self.release(cell);
        }
        self.acts.deref(task.act, &mut self.cells, &mut self.heap);
        true
    }

    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        self.scheduler.get(id).map(|task| task.state)
    }

    /// Operand stack of a live task, bottom first.
    pub fn task_operands(&self, id: TaskId) -> Option<&[Cell]> {
        self.scheduler.get(id).map(|task| task.stacks.operands())
    }

    /// Errors that ended tasks nobody was holding.
    pub fn task_faults(&self) -> &[TaskFault] {
        self.scheduler.faults()
    }

    pub fn take_task_faults(&mut self) -> Vec<TaskFault> {
        self.scheduler.take_faults()
    }

    /// Resolves a task handle pushed by `spawn` or `self`.
    pub(crate) fn task_id_from(&self, raw: i32) -> Result<TaskId> {
        let id = TaskId(raw as u32);
        match self.scheduler.get(id) {
            Some(_) if raw >= 0 => Ok(id),
            _ => Err(VmError::UnknownTask(raw as u32)),
        }
    }
}
