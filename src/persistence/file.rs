use super::{KeyValueStore, PersistenceError, PersistenceResult, ScheduleSnapshot};
use crate::store::ScheduledTask;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One JSON file per key inside a directory.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// reader sees either the previous snapshot or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PersistenceResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::InvalidData(format!(
                "storage key '{key}' is not usable as a file name"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &ScheduleSnapshot,
    path: P,
) -> PersistenceResult<()> {
    snapshot.validate()?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ScheduleSnapshot> {
    let file = File::open(path)?;
    let snapshot: ScheduleSnapshot = serde_json::from_reader(io::BufReader::new(file))?;
    snapshot.validate()?;
    Ok(snapshot)
}

#[derive(Serialize, Deserialize)]
struct TimelineCsvRecord {
    id: String,
    name: String,
    duration: u32,
    start_date: String,
    end_date: String,
    dependency_id: String,
    team_member_id: String,
    team_member: String,
}

impl From<&ScheduledTask> for TimelineCsvRecord {
    fn from(row: &ScheduledTask) -> Self {
        let task = &row.task;
        Self {
            id: task.id.to_string(),
            name: task.name.clone(),
            duration: task.duration,
            start_date: row.start.map(|d| d.to_iso_string()).unwrap_or_default(),
            end_date: row.end.map(|d| d.to_iso_string()).unwrap_or_default(),
            dependency_id: task
                .dependency_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            team_member_id: task
                .team_member_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            team_member: row.team_member.clone().unwrap_or_default(),
        }
    }
}

/// Writes one row per task; unresolved dates are empty cells.
pub fn write_timeline_csv<W: Write>(rows: &[ScheduledTask], writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(TimelineCsvRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_timeline_to_csv<P: AsRef<Path>>(
    rows: &[ScheduledTask],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_timeline_csv(rows, file)
}
