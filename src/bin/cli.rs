use gantt_store::{
    DynStore, GanttStore, MemberDraft, MemberId, MemberPatch, ScheduleDate, ScheduledTask,
    StoreConfig, TaskDraft, TaskId, TaskPatch, load_snapshot_from_json, logging,
    save_snapshot_to_json, save_timeline_to_csv,
};
use std::io::{self, Write};

type Store = GanttStore<DynStore>;

fn render_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_rows_as_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    // Build horizontal separator
    let mut sep = String::new();
    sep.push('+');
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_line(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn day(date: Option<ScheduleDate>) -> String {
    date.map(|d| d.date_naive().to_string()).unwrap_or_default()
}

fn render_timeline(store: &Store) -> String {
    let rows: Vec<ScheduledTask> = match store.timeline() {
        Ok(rows) => rows,
        Err(e) => return format!("Cannot resolve dates: {e}\n"),
    };
    let position = |id: &TaskId| {
        store
            .tasks()
            .iter()
            .position(|t| &t.id == id)
            .map(|i| format!("#{}", i + 1))
            .unwrap_or_default()
    };
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                position(&row.task.id),
                row.task.name.clone(),
                row.task.duration.to_string(),
                day(row.start),
                day(row.end),
                row.task
                    .dependency_id
                    .as_ref()
                    .map(|dep| position(dep))
                    .unwrap_or_default(),
                row.team_member.clone().unwrap_or_default(),
                row.task.id.to_string(),
            ]
        })
        .collect();
    render_rows_as_text_table(
        &["#", "name", "days", "start", "end", "after", "member", "id"],
        &table,
    )
}

fn render_members(store: &Store) -> String {
    let table: Vec<Vec<String>> = store
        .team_members()
        .iter()
        .enumerate()
        .map(|(i, m)| {
            vec![
                format!("#{}", i + 1),
                m.name.clone(),
                m.color.clone(),
                m.id.to_string(),
            ]
        })
        .collect();
    render_rows_as_text_table(&["#", "name", "color", "id"], &table)
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show tasks with resolved dates\n  members                            Show team members\n  add <days> <name...>               Append a task\n  name     <task> <text...>          Rename a task\n  duration <task> <days>             Set duration in days\n  start    <task> <YYYY-MM-DD|none>  Set or clear the explicit start date\n  dep      <task> <task|none>        Set or clear the dependency\n  assign   <task> <member|none>      Assign or unassign a team member\n  delete   <task>                    Delete a task and clear dependencies on it\n  member add <color> <name...>       Add a team member\n  member rename <member> <name...>   Rename a team member\n  member color <member> <color>      Change a member's color\n  member delete <member>             Delete a member and unassign their tasks\n  export <path>                      Write the snapshot as JSON\n  import <path>                      Replace everything with a JSON snapshot\n  csv <path>                         Write the timeline as CSV\n  quit|exit                          Exit\n\n<task> and <member> are a full id or #N (position in the list)."
    );
}

/// `#N` picks by 1-based position, anything else is taken as a full id.
fn task_ref(store: &Store, input: &str) -> Option<TaskId> {
    if let Some(n) = input.strip_prefix('#') {
        let n: usize = n.parse().ok()?;
        return store.tasks().get(n.checked_sub(1)?).map(|t| t.id.clone());
    }
    let id = TaskId::from(input);
    store.task(&id).map(|t| t.id.clone())
}

fn member_ref(store: &Store, input: &str) -> Option<MemberId> {
    if let Some(n) = input.strip_prefix('#') {
        let n: usize = n.parse().ok()?;
        return store
            .team_members()
            .get(n.checked_sub(1)?)
            .map(|m| m.id.clone());
    }
    let id = MemberId::from(input);
    store.team_member(&id).map(|m| m.id.clone())
}

fn apply_task_patch(store: &mut Store, id: &TaskId, patch: TaskPatch, what: &str) {
    match store.update_task(id, patch) {
        Ok(true) => {
            println!("{what} set.");
            println!("{}", render_timeline(store));
        }
        Ok(false) => println!("Task {id} not found."),
        Err(e) => println!("Error: {e}"),
    }
}

fn member_command<'a>(store: &mut Store, mut parts: impl Iterator<Item = &'a str>) {
    match parts.next() {
        Some("add") => {
            let color = parts.next();
            let rest: Vec<&str> = parts.collect();
            match (color, rest.is_empty()) {
                (Some(color), false) => {
                    match store.add_team_member(MemberDraft::new(rest.join(" "), color)) {
                        Ok(id) => {
                            println!("Added team member {id}.");
                            println!("{}", render_members(store));
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: member add <color> <name...>"),
            }
        }
        Some(cmd @ ("rename" | "color")) => {
            let member_s = parts.next();
            let rest: Vec<&str> = parts.collect();
            let (Some(member_s), false) = (member_s, rest.is_empty()) else {
                println!("Usage: member {cmd} <member> <value>");
                return;
            };
            let Some(id) = member_ref(store, member_s) else {
                println!("Team member {member_s} not found.");
                return;
            };
            let value = rest.join(" ");
            let patch = if cmd == "rename" {
                MemberPatch::name(value)
            } else {
                MemberPatch::color(value)
            };
            match store.update_team_member(&id, patch) {
                Ok(_) => {
                    println!("Team member updated.");
                    println!("{}", render_members(store));
                }
                Err(e) => println!("Error: {e}"),
            }
        }
        Some("delete") => match parts.next() {
            Some(member_s) => match member_ref(store, member_s) {
                Some(id) => match store.delete_team_member(&id) {
                    Ok(_) => {
                        println!("Deleted team member {id}.");
                        println!("{}", render_members(store));
                    }
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Team member {member_s} not found."),
            },
            None => println!("Usage: member delete <member>"),
        },
        Some(other) => {
            println!("Unknown member command '{other}'.");
            println!("Usage: member add|rename|color|delete ...");
        }
        None => println!("{}", render_members(store)),
    }
}

fn main() {
    let _logger = match logging::init_logging(logging::DEFAULT_LOG_SPEC) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading config: {e}");
            std::process::exit(1);
        }
    };
    let mut store = match GanttStore::from_config(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening store: {e}");
            std::process::exit(1);
        }
    };

    println!("Gantt Store (CLI) - type 'help' for commands\n");
    println!("{}", render_timeline(&store));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_timeline(&store)),
            "members" => println!("{}", render_members(&store)),
            "member" => member_command(&mut store, parts),
            "add" => {
                let dur_s = parts.next();
                let rest: Vec<&str> = parts.collect();
                match (dur_s, rest.is_empty()) {
                    (Some(dur_s), false) => {
                        let duration: u32 = match dur_s.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid duration (whole days)");
                                continue;
                            }
                        };
                        match store.add_task(TaskDraft::new(rest.join(" "), duration)) {
                            Ok(id) => {
                                println!("Added task {id}.");
                                println!("{}", render_timeline(&store));
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: add <days> <name...>"),
                }
            }
            "name" | "duration" | "start" | "dep" | "assign" => {
                let task_s = parts.next();
                let rest: Vec<&str> = parts.collect();
                let (Some(task_s), false) = (task_s, rest.is_empty()) else {
                    println!("Usage: {cmd} <task> <value>");
                    continue;
                };
                let Some(id) = task_ref(&store, task_s) else {
                    println!("Task {task_s} not found.");
                    continue;
                };
                let value = rest.join(" ");
                let clear = value.eq_ignore_ascii_case("none");
                let patch = match cmd {
                    "name" => TaskPatch::name(value),
                    "duration" => match value.parse::<u32>() {
                        Ok(days) => TaskPatch::duration(days),
                        Err(_) => {
                            println!("Invalid duration (whole days)");
                            continue;
                        }
                    },
                    "start" if clear => TaskPatch::start_date(None),
                    "start" => match ScheduleDate::parse(&value) {
                        Ok(date) => TaskPatch::start_date(Some(date)),
                        Err(_) => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    "dep" if clear => TaskPatch::dependency(None),
                    "dep" => match task_ref(&store, &value) {
                        Some(dep) => TaskPatch::dependency(Some(dep)),
                        None => {
                            println!("Task {value} not found.");
                            continue;
                        }
                    },
                    _ if clear => TaskPatch::team_member(None),
                    _ => match member_ref(&store, &value) {
                        Some(member) => TaskPatch::team_member(Some(member)),
                        None => {
                            println!("Team member {value} not found.");
                            continue;
                        }
                    },
                };
                apply_task_patch(&mut store, &id, patch, cmd);
            }
            "delete" => match parts.next() {
                Some(task_s) => match task_ref(&store, task_s) {
                    Some(id) => match store.delete_task(&id) {
                        Ok(_) => {
                            println!("Deleted task {id}.");
                            println!("{}", render_timeline(&store));
                        }
                        Err(e) => println!("Error deleting task: {e}"),
                    },
                    None => println!("Task {task_s} not found."),
                },
                None => println!("Usage: delete <task>"),
            },
            "export" => match parts.next() {
                Some(path) => match save_snapshot_to_json(&store.export_data(), path) {
                    Ok(_) => println!("Snapshot saved to {path}."),
                    Err(e) => println!("Error saving snapshot: {e}"),
                },
                None => println!("Usage: export <path>"),
            },
            "import" => match parts.next() {
                Some(path) => match load_snapshot_from_json(path) {
                    Ok(snapshot) => match store.load_data(snapshot) {
                        Ok(_) => {
                            println!("Snapshot loaded from {path}.");
                            println!("{}", render_timeline(&store));
                        }
                        Err(e) => println!("Error loading snapshot: {e}"),
                    },
                    Err(e) => println!("Error loading snapshot: {e}"),
                },
                None => println!("Usage: import <path>"),
            },
            "csv" => match parts.next() {
                Some(path) => match store.timeline() {
                    Ok(rows) => match save_timeline_to_csv(&rows, path) {
                        Ok(_) => println!("Timeline saved to {path}."),
                        Err(e) => println!("Error saving timeline: {e}"),
                    },
                    Err(e) => println!("Cannot resolve dates: {e}"),
                },
                None => println!("Usage: csv <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
