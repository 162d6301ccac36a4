use graphedit_core::ElementId;
use std::collections::VecDeque;

/// Work that has to wait until the host has drawn the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredTask {
    /// Collapse then expand a group so the renderer re-measures it after a
    /// child was removed.
    RoundTripGroup(ElementId),
    /// Collapse groups that a batch restyle had to open.
    Recollapse(Vec<ElementId>),
}

#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    tasks: VecDeque<DeferredTask>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a task unless an identical one is already waiting.
    pub fn schedule(&mut self, task: DeferredTask) {
        if !self.tasks.contains(&task) {
            self.tasks.push_back(task);
        }
    }

    pub fn take_all(&mut self) -> Vec<DeferredTask> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_once_and_drains_in_order() {
        let mut queue = FrameQueue::new();
        queue.schedule(DeferredTask::RoundTripGroup("g1".into()));
        queue.schedule(DeferredTask::RoundTripGroup("g1".into()));
        queue.schedule(DeferredTask::Recollapse(vec!["g2".into()]));
        assert_eq!(queue.len(), 2);

        let tasks = queue.take_all();
        assert_eq!(tasks[0], DeferredTask::RoundTripGroup("g1".into()));
        assert!(queue.is_empty());
    }
}
