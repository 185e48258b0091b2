use gantt_store::{
    GanttStore, MemberDraft, MemoryStore, PersistenceError, ScheduleDate, ScheduleSnapshot,
    SequentialIds, StoreError, Task, TaskDraft, TeamMember, load_snapshot_from_json,
    save_snapshot_to_json, save_timeline_to_csv, write_timeline_csv,
};

fn date(s: &str) -> ScheduleDate {
    ScheduleDate::parse(s).unwrap()
}

fn populated_store() -> GanttStore<MemoryStore> {
    let mut store = GanttStore::open(MemoryStore::new(), "ganttData")
        .unwrap()
        .with_id_generator(SequentialIds::new("t"));
    let ada = store.add_team_member(MemberDraft::new("Ada", "teal")).unwrap();
    let a = store
        .add_task(
            TaskDraft::new("Design", 2)
                .starting(date("2024-01-01"))
                .assigned_to(ada),
        )
        .unwrap();
    store.add_task(TaskDraft::new("Build", 4).after(a)).unwrap();
    store.add_task(TaskDraft::new("Someday", 1)).unwrap();
    store
}

#[test]
fn export_then_load_is_lossless() {
    let source = populated_store();
    let exported = source.export_data();

    let mut target = GanttStore::open(MemoryStore::new(), "ganttData").unwrap();
    target.add_task(TaskDraft::new("Overwritten", 1)).unwrap();
    target.load_data(exported.clone()).unwrap();

    assert_eq!(target.export_data(), exported);
    assert_eq!(target.tasks(), source.tasks());
    assert_eq!(target.team_members(), source.team_members());
}

#[test]
fn export_is_a_copy() {
    let mut store = populated_store();
    let exported = store.export_data();
    store.add_task(TaskDraft::new("Later", 1)).unwrap();
    assert_eq!(exported.tasks.len(), 3);
    assert_eq!(store.tasks().len(), 4);
}

#[test]
fn load_data_persists_the_imported_state() {
    let storage = MemoryStore::new();
    let mut store = GanttStore::open(storage.clone(), "ganttData").unwrap();
    store.load_data(populated_store().export_data()).unwrap();

    let reopened = GanttStore::open(storage, "ganttData").unwrap();
    assert_eq!(reopened.tasks().len(), 3);
    assert_eq!(reopened.team_members().len(), 1);
}

#[test]
fn invalid_imports_leave_the_store_untouched() {
    let mut store = populated_store();
    let before = store.export_data();

    let mut a = Task::new("a", "A", 1);
    a.dependency_id = Some("b".into());
    let mut b = Task::new("b", "B", 1);
    b.dependency_id = Some("a".into());
    let cyclic = ScheduleSnapshot::new(vec![a, b], vec![]);

    let duplicate = ScheduleSnapshot::new(
        vec![Task::new("x", "X", 1), Task::new("x", "Again", 2)],
        vec![],
    );

    let mut selfish = Task::new("s", "Self", 1);
    selfish.dependency_id = Some("s".into());
    let self_dependent = ScheduleSnapshot::new(vec![selfish], vec![]);

    let duplicate_members = ScheduleSnapshot::new(
        vec![],
        vec![
            TeamMember::new("m", "Ada", "teal"),
            TeamMember::new("m", "Bob", "red"),
        ],
    );

    for snapshot in [cyclic, duplicate, self_dependent, duplicate_members] {
        let err = store.load_data(snapshot).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Persistence(PersistenceError::InvalidData(_))
        ));
        assert_eq!(store.export_data(), before);
    }
}

#[test]
fn dangling_references_are_accepted_on_import() {
    let mut orphan = Task::new("o", "Orphan", 1);
    orphan.dependency_id = Some("gone".into());
    orphan.team_member_id = Some("nobody".into());

    let mut store = GanttStore::open(MemoryStore::new(), "ganttData").unwrap();
    store
        .load_data(ScheduleSnapshot::new(vec![orphan], vec![]))
        .unwrap();
    let task = store.task(&"o".into()).unwrap();
    assert_eq!(store.get_task_start_date(task).unwrap(), None);
}

#[test]
fn json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let store = populated_store();

    save_snapshot_to_json(&store.export_data(), &path).unwrap();
    let loaded = load_snapshot_from_json(&path).unwrap();
    assert_eq!(loaded, store.export_data());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"teamMembers\""));
    assert!(text.contains("\"dependencyId\": null"));
}

#[test]
fn loading_a_cyclic_json_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cyclic.json");
    std::fs::write(
        &path,
        r#"{"tasks":[
            {"id":"a","name":"A","duration":1,"startDate":null,"dependencyId":"b","teamMemberId":null},
            {"id":"b","name":"B","duration":1,"startDate":null,"dependencyId":"a","teamMemberId":null}
        ],"teamMembers":[]}"#,
    )
    .unwrap();
    assert!(matches!(
        load_snapshot_from_json(&path),
        Err(PersistenceError::InvalidData(_))
    ));
}

#[test]
fn timeline_csv_has_resolved_dates() {
    let store = populated_store();
    let rows = store.timeline().unwrap();

    let mut buf = Vec::new();
    write_timeline_csv(&rows, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "id,name,duration,start_date,end_date,dependency_id,team_member_id,team_member"
    );
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[1],
        "t-2,Design,2,2024-01-01T00:00:00.000Z,2024-01-03T00:00:00.000Z,,t-1,Ada"
    );
    assert_eq!(
        lines[2],
        "t-3,Build,4,2024-01-03T00:00:00.000Z,2024-01-07T00:00:00.000Z,t-2,,"
    );
    assert_eq!(lines[3], "t-4,Someday,1,,,,,");
}

#[test]
fn timeline_csv_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timeline.csv");
    let store = populated_store();
    save_timeline_to_csv(&store.timeline().unwrap(), &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.records().count(), 3);
}
