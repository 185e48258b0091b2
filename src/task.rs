use crate::dates::ScheduleDate;
use crate::ids::{MemberId, TaskId};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Whole calendar days.
    pub duration: u32,
    pub start_date: Option<ScheduleDate>,
    pub dependency_id: Option<TaskId>,
    pub team_member_id: Option<MemberId>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>, duration: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration,
            start_date: None,
            dependency_id: None,
            team_member_id: None,
        }
    }

    pub(crate) fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            name: draft.name,
            duration: draft.duration,
            start_date: draft.start_date,
            dependency_id: draft.dependency_id,
            team_member_id: draft.team_member_id,
        }
    }

    /// Overwrites every field the patch carries. Returns whether anything changed.
    pub fn apply(&mut self, patch: TaskPatch) -> bool {
        let before = self.clone();
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(dependency_id) = patch.dependency_id {
            self.dependency_id = dependency_id;
        }
        if let Some(team_member_id) = patch.team_member_id {
            self.team_member_id = team_member_id;
        }
        *self != before
    }
}

/// Fields of a task before the store assigns it an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub name: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub start_date: Option<ScheduleDate>,
    #[serde(default)]
    pub dependency_id: Option<TaskId>,
    #[serde(default)]
    pub team_member_id: Option<MemberId>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, duration: u32) -> Self {
        Self {
            name: name.into(),
            duration,
            ..Self::default()
        }
    }

    pub fn starting(mut self, date: ScheduleDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn after(mut self, dependency: TaskId) -> Self {
        self.dependency_id = Some(dependency);
        self
    }

    pub fn assigned_to(mut self, member: MemberId) -> Self {
        self.team_member_id = Some(member);
        self
    }
}

/// Partial update for a [`Task`].
///
/// The outer `Option` means "leave unchanged" when `None`. For the nullable
/// fields the inner `Option` is the new value, so `Some(None)` clears it. In
/// JSON an absent key leaves the field alone and an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<ScheduleDate>>,
    #[serde(default, deserialize_with = "present")]
    pub dependency_id: Option<Option<TaskId>>,
    #[serde(default, deserialize_with = "present")]
    pub team_member_id: Option<Option<MemberId>>,
}

impl TaskPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn duration(days: u32) -> Self {
        Self {
            duration: Some(days),
            ..Self::default()
        }
    }

    pub fn start_date(date: Option<ScheduleDate>) -> Self {
        Self {
            start_date: Some(date),
            ..Self::default()
        }
    }

    pub fn dependency(dependency: Option<TaskId>) -> Self {
        Self {
            dependency_id: Some(dependency),
            ..Self::default()
        }
    }

    pub fn team_member(member: Option<MemberId>) -> Self {
        Self {
            team_member_id: Some(member),
            ..Self::default()
        }
    }
}

/// Marks a key that was present in the payload, even when its value is `null`.
pub(crate) fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> ScheduleDate {
        ScheduleDate::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn serializes_absent_fields_as_null() {
        let task = Task::new("t1", "Design", 3);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "t1",
                "name": "Design",
                "duration": 3,
                "startDate": null,
                "dependencyId": null,
                "teamMemberId": null
            })
        );
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut task = Task::new("t1", "Design", 3);
        task.start_date = Some(d(2024, 1, 1));
        task.team_member_id = Some(MemberId::from("m1"));

        assert!(task.apply(TaskPatch::duration(5)));
        assert_eq!(task.duration, 5);
        assert_eq!(task.name, "Design");
        assert_eq!(task.start_date, Some(d(2024, 1, 1)));
        assert_eq!(task.team_member_id, Some(MemberId::from("m1")));
    }

    #[test]
    fn patch_with_same_values_reports_no_change() {
        let mut task = Task::new("t1", "Design", 3);
        assert!(!task.apply(TaskPatch::name("Design")));
        assert!(!task.apply(TaskPatch::default()));
    }

    #[test]
    fn json_patch_distinguishes_null_from_absent() {
        let clear: TaskPatch = serde_json::from_str(r#"{"startDate": null}"#).unwrap();
        assert_eq!(clear.start_date, Some(None));
        assert_eq!(clear.dependency_id, None);

        let set: TaskPatch =
            serde_json::from_str(r#"{"startDate": "2024-01-01", "dependencyId": "t0"}"#).unwrap();
        assert_eq!(set.start_date, Some(Some(d(2024, 1, 1))));
        assert_eq!(set.dependency_id, Some(Some(TaskId::from("t0"))));
    }

    #[test]
    fn json_patch_rejects_id_changes() {
        assert!(serde_json::from_str::<TaskPatch>(r#"{"id": "other"}"#).is_err());
    }
}
