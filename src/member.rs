use crate::ids::MemberId;
use serde::{Deserialize, Serialize};

/// A person tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Assigned by the store, never changed afterwards.
    pub id: MemberId,
    /// Display name shown next to the member's bars.
    pub name: String,
    /// Display color token, e.g. `#4f46e5` or `teal`. Not interpreted by the store.
    pub color: String,
}

impl TeamMember {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }

    pub(crate) fn from_draft(id: MemberId, draft: MemberDraft) -> Self {
        Self {
            id,
            name: draft.name,
            color: draft.color,
        }
    }

    /// Returns whether anything changed.
    pub fn apply(&mut self, patch: MemberPatch) -> bool {
        let mut changed = false;
        if let Some(name) = patch.name {
            changed |= self.name != name;
            self.name = name;
        }
        if let Some(color) = patch.color {
            changed |= self.color != color;
            self.color = color;
        }
        changed
    }
}

/// Fields of a team member before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub name: String,
    pub color: String,
}

impl MemberDraft {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Partial update for a [`TeamMember`]; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl MemberPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: None,
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            name: None,
            color: Some(color.into()),
        }
    }
}
