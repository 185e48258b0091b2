use crate::graph::DependencyGraph;
use crate::member::TeamMember;
use crate::task::Task;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(&task.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        if task.dependency_id.as_ref() == Some(&task.id) {
            return Err(TaskValidationError::new(format!(
                "task {} depends on itself",
                task.id
            )));
        }
    }

    if let Some(task_id) = DependencyGraph::build(tasks).find_cycle() {
        return Err(TaskValidationError::new(format!(
            "task {task_id} is part of a dependency cycle"
        )));
    }
    Ok(())
}

pub fn validate_member_collection(members: &[TeamMember]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(members.len());
    for member in members {
        if !seen_ids.insert(&member.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate team member id {}",
                member.id
            )));
        }
    }
    Ok(())
}
