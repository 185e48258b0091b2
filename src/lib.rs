pub mod calculations;
pub mod config;
pub mod dates;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod ids;
#[cfg(any(feature = "cli_api", feature = "http_api"))]
pub mod logging;
pub mod member;
pub mod persistence;
pub mod store;
pub mod task;
pub(crate) mod task_validation;

pub use calculations::{DateResolver, ResolveError};
pub use config::{StorageBackend, StoreConfig};
pub use dates::ScheduleDate;
pub use graph::DependencyGraph;
pub use ids::{IdGenerator, MemberId, SequentialIds, TaskId, UuidGenerator};
pub use member::{MemberDraft, MemberPatch, TeamMember};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteStore;
pub use persistence::{
    DynStore, FileStore, KeyValueStore, MemoryStore, PersistenceError, ScheduleSnapshot,
    load_snapshot_from_json, save_snapshot_to_json, save_timeline_to_csv, write_timeline_csv,
};
pub use store::{GanttStore, ScheduledTask, StoreError, StoreResult};
pub use task::{Task, TaskDraft, TaskPatch};
