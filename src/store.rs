use crate::calculations::{DateResolver, ResolveError};
use crate::config::StoreConfig;
use crate::dates::ScheduleDate;
use crate::graph::DependencyGraph;
use crate::ids::{IdGenerator, MemberId, TaskId, UuidGenerator};
use crate::member::{MemberDraft, MemberPatch, TeamMember};
use crate::persistence::{DynStore, KeyValueStore, PersistenceError, ScheduleSnapshot};
use crate::task::{Task, TaskDraft, TaskPatch};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Persistence(PersistenceError),
    Resolve(ResolveError),
    /// Rejected `update_task`: `task_id` depending on `dependency_id` would close a loop.
    DependencyCycle {
        task_id: TaskId,
        dependency_id: TaskId,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Persistence(err) => write!(f, "persistence error: {err}"),
            StoreError::Resolve(err) => write!(f, "date resolution error: {err}"),
            StoreError::DependencyCycle {
                task_id,
                dependency_id,
            } => write!(
                f,
                "task {task_id} cannot depend on task {dependency_id}: that would create a dependency cycle"
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Persistence(err) => Some(err),
            StoreError::Resolve(err) => Some(err),
            StoreError::DependencyCycle { .. } => None,
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<ResolveError> for StoreError {
    fn from(value: ResolveError) -> Self {
        Self::Resolve(value)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A task together with its resolved dates, as drawn on the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "resolvedStartDate")]
    pub start: Option<ScheduleDate>,
    #[serde(rename = "resolvedEndDate")]
    pub end: Option<ScheduleDate>,
    /// Name of the assigned member, when the assignment points at one that exists.
    #[serde(rename = "teamMemberName")]
    pub team_member: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    tasks: &'a [Task],
    team_members: &'a [TeamMember],
}

/// Authoritative tasks and team members, committed to storage after every
/// change.
///
/// Mutations that change state write the whole snapshot before returning.
/// When that write fails the in-memory change is kept and the error is
/// returned, so the caller can retry with [`GanttStore::commit`].
pub struct GanttStore<S: KeyValueStore> {
    tasks: Vec<Task>,
    team_members: Vec<TeamMember>,
    storage: S,
    storage_key: String,
    ids: Box<dyn IdGenerator>,
}

impl GanttStore<DynStore> {
    /// Opens the backend named by the config.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let storage = config.open_storage()?;
        Self::open(storage, config.storage_key.clone())
    }
}

impl<S: KeyValueStore> GanttStore<S> {
    /// Reads the snapshot under `storage_key` once.
    ///
    /// A missing, unparsable or invalid snapshot starts the store empty. A
    /// failing read is returned, since writing over data that could not be
    /// read would lose it.
    pub fn open(storage: S, storage_key: impl Into<String>) -> StoreResult<Self> {
        let storage_key = storage_key.into();
        let snapshot = match storage.get(&storage_key)? {
            None => ScheduleSnapshot::default(),
            Some(json) => match ScheduleSnapshot::from_json(&json) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(
                        "event=snapshot_discarded key={} reason=\"{}\"",
                        storage_key, err
                    );
                    ScheduleSnapshot::default()
                }
            },
        };
        debug!(
            "event=store_open key={} tasks={} team_members={}",
            storage_key,
            snapshot.tasks.len(),
            snapshot.team_members.len()
        );

        Ok(Self {
            tasks: snapshot.tasks,
            team_members: snapshot.team_members,
            storage,
            storage_key,
            ids: Box::new(UuidGenerator),
        })
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn team_members(&self) -> &[TeamMember] {
        &self.team_members
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn team_member(&self, id: &MemberId) -> Option<&TeamMember> {
        self.team_members.iter().find(|m| &m.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Writes the full snapshot under the storage key, replacing the previous one.
    pub fn commit(&self) -> StoreResult<()> {
        let json = serde_json::to_string(&SnapshotRef {
            tasks: &self.tasks,
            team_members: &self.team_members,
        })
        .map_err(PersistenceError::from)?;
        self.storage.set(&self.storage_key, &json)?;
        debug!(
            "event=commit key={} tasks={} team_members={} bytes={}",
            self.storage_key,
            self.tasks.len(),
            self.team_members.len(),
            json.len()
        );
        Ok(())
    }

    /// Skips ids already taken and ids a task still points at, so a new
    /// member never inherits a stale assignment.
    fn fresh_member_id(&self) -> MemberId {
        loop {
            let id = MemberId::new(self.ids.next_id());
            let referenced = self
                .tasks
                .iter()
                .any(|t| t.team_member_id.as_ref() == Some(&id));
            if self.team_member(&id).is_none() && !referenced {
                return id;
            }
        }
    }

    /// Skips ids already taken and ids named by a dangling `dependency_id`.
    /// Handing out such an id would link the new task into an existing chain
    /// without the cycle check `update_task` does.
    fn fresh_task_id(&self) -> TaskId {
        loop {
            let id = TaskId::new(self.ids.next_id());
            let referenced = self
                .tasks
                .iter()
                .any(|t| t.dependency_id.as_ref() == Some(&id));
            if self.task(&id).is_none() && !referenced {
                return id;
            }
        }
    }

    pub fn add_team_member(&mut self, draft: MemberDraft) -> StoreResult<MemberId> {
        let id = self.fresh_member_id();
        self.team_members
            .push(TeamMember::from_draft(id.clone(), draft));
        self.commit()?;
        Ok(id)
    }

    /// `Ok(false)` when no member has this id; nothing is written then.
    pub fn update_team_member(&mut self, id: &MemberId, patch: MemberPatch) -> StoreResult<bool> {
        let Some(member) = self.team_members.iter_mut().find(|m| &m.id == id) else {
            debug!("event=update_team_member status=not_found id={id}");
            return Ok(false);
        };
        if member.apply(patch) {
            self.commit()?;
        }
        Ok(true)
    }

    /// Also unassigns every task assigned to the member.
    pub fn delete_team_member(&mut self, id: &MemberId) -> StoreResult<bool> {
        let Some(index) = self.team_members.iter().position(|m| &m.id == id) else {
            debug!("event=delete_team_member status=not_found id={id}");
            return Ok(false);
        };
        self.team_members.remove(index);
        for task in &mut self.tasks {
            if task.team_member_id.as_ref() == Some(id) {
                task.team_member_id = None;
            }
        }
        self.commit()?;
        Ok(true)
    }

    pub fn add_task(&mut self, draft: TaskDraft) -> StoreResult<TaskId> {
        let id = self.fresh_task_id();
        self.tasks.push(Task::from_draft(id.clone(), draft));
        self.commit()?;
        Ok(id)
    }

    /// `Ok(false)` when no task has this id; nothing is written then.
    ///
    /// A patch that points the task at a dependency reaching back to it is
    /// rejected with [`StoreError::DependencyCycle`] and leaves the task as it was.
    pub fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> StoreResult<bool> {
        let Some(index) = self.tasks.iter().position(|t| &t.id == id) else {
            debug!("event=update_task status=not_found id={id}");
            return Ok(false);
        };
        if let Some(Some(dependency_id)) = patch.dependency_id.as_ref() {
            if DependencyGraph::build(&self.tasks).would_close_cycle(id, dependency_id) {
                return Err(StoreError::DependencyCycle {
                    task_id: id.clone(),
                    dependency_id: dependency_id.clone(),
                });
            }
        }
        if self.tasks[index].apply(patch) {
            self.commit()?;
        }
        Ok(true)
    }

    /// Also clears the dependency of every task that waited on it.
    pub fn delete_task(&mut self, id: &TaskId) -> StoreResult<bool> {
        let Some(index) = self.tasks.iter().position(|t| &t.id == id) else {
            debug!("event=delete_task status=not_found id={id}");
            return Ok(false);
        };
        self.tasks.remove(index);
        for task in &mut self.tasks {
            if task.dependency_id.as_ref() == Some(id) {
                task.dependency_id = None;
            }
        }
        self.commit()?;
        Ok(true)
    }

    /// Replaces both collections (import). Invalid snapshots are rejected
    /// and leave the store untouched.
    pub fn load_data(&mut self, snapshot: ScheduleSnapshot) -> StoreResult<()> {
        snapshot.validate()?;
        info!(
            "event=import tasks={} team_members={}",
            snapshot.tasks.len(),
            snapshot.team_members.len()
        );
        self.tasks = snapshot.tasks;
        self.team_members = snapshot.team_members;
        self.commit()
    }

    pub fn export_data(&self) -> ScheduleSnapshot {
        ScheduleSnapshot::new(self.tasks.clone(), self.team_members.clone())
    }

    pub fn resolver(&self) -> DateResolver<'_> {
        DateResolver::new(&self.tasks)
    }

    /// Resolved against the tasks currently in the store.
    pub fn get_task_start_date(&self, task: &Task) -> Result<Option<ScheduleDate>, ResolveError> {
        self.resolver().start_date(task)
    }

    pub fn get_task_end_date(&self, task: &Task) -> Result<Option<ScheduleDate>, ResolveError> {
        self.resolver().end_date(task)
    }

    /// Tasks waiting directly on `id`.
    pub fn dependents_of(&self, id: &TaskId) -> Vec<&Task> {
        DependencyGraph::build(&self.tasks)
            .dependents(id)
            .iter()
            .filter_map(|dependent| self.task(dependent))
            .collect()
    }

    fn starts(&self) -> Result<Vec<(Option<ScheduleDate>, &Task)>, ResolveError> {
        let resolver = self.resolver();
        self.tasks
            .iter()
            .map(|task| Ok((resolver.start_date(task)?, task)))
            .collect()
    }

    /// Ascending by resolved start date. Unscheduled tasks come after every
    /// scheduled one; ties keep insertion order.
    ///
    /// The browser build compares unscheduled tasks as equal to everything,
    /// which leaves them wherever they were inserted. That relation is not a
    /// total order, so this ordering differs from it on purpose.
    pub fn sorted_tasks(&self) -> Result<Vec<&Task>, ResolveError> {
        let mut starts = self.starts()?;
        starts.sort_by_key(|(start, _)| (start.is_none(), *start));
        Ok(starts.into_iter().map(|(_, task)| task).collect())
    }

    /// Earliest resolved start, if any task has one.
    pub fn earliest_start_date(&self) -> Result<Option<ScheduleDate>, ResolveError> {
        Ok(self.starts()?.into_iter().filter_map(|(start, _)| start).min())
    }

    /// Earliest resolved start, or now when nothing is scheduled.
    pub fn timeline_start_date(&self) -> Result<ScheduleDate, ResolveError> {
        Ok(self.earliest_start_date()?.unwrap_or_else(ScheduleDate::now))
    }

    /// Latest resolved end, if any task has one.
    pub fn timeline_end_date(&self) -> Result<Option<ScheduleDate>, ResolveError> {
        let resolver = self.resolver();
        let mut latest = None;
        for task in &self.tasks {
            latest = latest.max(resolver.end_date(task)?);
        }
        Ok(latest)
    }

    /// Every task with its resolved dates, in [`GanttStore::sorted_tasks`] order.
    pub fn timeline(&self) -> Result<Vec<ScheduledTask>, ResolveError> {
        let resolver = self.resolver();
        self.sorted_tasks()?
            .into_iter()
            .map(|task| {
                let start = resolver.start_date(task)?;
                let end = resolver.end_date(task)?;
                let team_member = task
                    .team_member_id
                    .as_ref()
                    .and_then(|id| self.team_member(id))
                    .map(|m| m.name.clone());
                Ok(ScheduledTask {
                    task: task.clone(),
                    start,
                    end,
                    team_member,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::persistence::MemoryStore;

    fn store() -> GanttStore<MemoryStore> {
        GanttStore::open(MemoryStore::new(), "ganttData")
            .unwrap()
            .with_id_generator(SequentialIds::new("id"))
    }

    #[test]
    fn opens_empty_when_nothing_is_stored() {
        let store = store();
        assert!(store.tasks().is_empty());
        assert!(store.team_members().is_empty());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn generated_ids_skip_ones_already_taken() {
        let mut store = store();
        store
            .load_data(ScheduleSnapshot::new(vec![Task::new("id-1", "Imported", 1)], vec![]))
            .unwrap();
        let id = store.add_task(TaskDraft::new("New", 1)).unwrap();
        assert_eq!(id.as_str(), "id-2");
    }

    #[test]
    fn no_op_update_does_not_write() {
        let storage = MemoryStore::new();
        let mut store = GanttStore::open(storage.clone(), "ganttData").unwrap();
        assert!(!store.update_task(&"missing".into(), TaskPatch::duration(2)).unwrap());
        assert!(!store.delete_team_member(&"missing".into()).unwrap());
        assert_eq!(storage.get("ganttData").unwrap(), None);
    }

    #[test]
    fn sort_key_puts_unscheduled_last() {
        let mut store = store();
        let loose = store.add_task(TaskDraft::new("Loose", 1)).unwrap();
        let late = store
            .add_task(TaskDraft::new("Late", 1).starting(ScheduleDate::from_ymd(2024, 3, 1).unwrap()))
            .unwrap();
        let early = store
            .add_task(TaskDraft::new("Early", 1).starting(ScheduleDate::from_ymd(2024, 1, 1).unwrap()))
            .unwrap();
        let order: Vec<&TaskId> = store.sorted_tasks().unwrap().into_iter().map(|t| &t.id).collect();
        assert_eq!(order, vec![&early, &late, &loose]);
    }

    #[test]
    fn store_error_messages_name_both_tasks() {
        let err = StoreError::DependencyCycle {
            task_id: "a".into(),
            dependency_id: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "task a cannot depend on task b: that would create a dependency cycle"
        );
    }
}
