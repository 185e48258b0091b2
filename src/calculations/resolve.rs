use crate::dates::ScheduleDate;
use crate::ids::TaskId;
use crate::task::Task;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Following `dependency_id` from `task_id` came back to `repeated`.
    CyclicDependency { task_id: TaskId, repeated: TaskId },
    DateOutOfRange { task_id: TaskId },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::CyclicDependency { task_id, repeated } => write!(
                f,
                "dependency chain of task {task_id} loops back to task {repeated}"
            ),
            ResolveError::DateOutOfRange { task_id } => {
                write!(f, "resolved date of task {task_id} is out of range")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolves effective start/end dates over one task collection.
///
/// Build once per view; lookups go through an id index instead of scanning
/// the collection for every link of every chain.
pub struct DateResolver<'a> {
    task_to_idx: HashMap<&'a TaskId, usize>,
    tasks: &'a [Task],
}

impl<'a> DateResolver<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        let mut task_to_idx = HashMap::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            task_to_idx.entry(&task.id).or_insert(idx);
        }
        Self { task_to_idx, tasks }
    }

    fn find(&self, id: &TaskId) -> Option<&'a Task> {
        self.task_to_idx.get(id).map(|&idx| &self.tasks[idx])
    }

    /// Explicit start date if set, otherwise the resolved end date of the
    /// dependency. `None` when the chain ends without an explicit date or
    /// points at a task that does not exist.
    ///
    /// The chain is walked iteratively: the start of `task` is the first
    /// explicit start found up the chain plus the durations of every
    /// dependency passed on the way.
    pub fn start_date(&self, task: &Task) -> Result<Option<ScheduleDate>, ResolveError> {
        let mut visited: HashSet<&TaskId> = HashSet::new();
        visited.insert(&task.id);
        let mut offset_days: u64 = 0;
        let mut current = task;

        loop {
            if let Some(start) = current.start_date {
                return Self::shift(start, offset_days, &task.id).map(Some);
            }
            let Some(dependency_id) = current.dependency_id.as_ref() else {
                return Ok(None);
            };
            let Some(dependency) = self.find(dependency_id) else {
                return Ok(None);
            };
            if !visited.insert(&dependency.id) {
                return Err(ResolveError::CyclicDependency {
                    task_id: task.id.clone(),
                    repeated: dependency.id.clone(),
                });
            }
            offset_days += u64::from(dependency.duration);
            current = dependency;
        }
    }

    /// Resolved start plus `task.duration` days.
    pub fn end_date(&self, task: &Task) -> Result<Option<ScheduleDate>, ResolveError> {
        match self.start_date(task)? {
            Some(start) => Self::shift(start, u64::from(task.duration), &task.id).map(Some),
            None => Ok(None),
        }
    }

    fn shift(start: ScheduleDate, days: u64, task_id: &TaskId) -> Result<ScheduleDate, ResolveError> {
        u32::try_from(days)
            .ok()
            .and_then(|days| start.checked_add_days(days))
            .ok_or_else(|| ResolveError::DateOutOfRange {
                task_id: task_id.clone(),
            })
    }
}
