use std::io::{self, BufRead, Write};

use color_eyre::Result;
use daybook_core::{
    clock::{Clock, SystemClock},
    storage::KeyValueStore,
    tasks::{Filter, TaskId},
    view::DisplayMode,
};

use crate::{
    cli::TaskCommand,
    config,
    storage::{self, Tasks},
};

/// Execute a task subcommand against the file store.
pub fn handle(cmd: TaskCommand, config: &config::Config) -> Result<()> {
    let mut tasks = storage::open_tasks(storage::store_from_config(config)?, SystemClock);
    let stdin = io::stdin();
    run(cmd, &mut tasks, &mut stdin.lock(), &mut io::stdout())
}

pub fn run<S, C, R, W>(
    cmd: TaskCommand,
    tasks: &mut Tasks<S, C>,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    S: KeyValueStore,
    C: Clock,
    R: BufRead,
    W: Write,
{
    match cmd {
        TaskCommand::List { category } => {
            if let Some(category) = category {
                tasks.set_filter(Filter::parse(&category));
            }
            let view = tasks.view();
            if view.mode == DisplayMode::Empty {
                if view.counts.total == 0 {
                    writeln!(out, "No tasks yet. Add one with `daybook task add <text>`.")?;
                } else {
                    writeln!(out, "No tasks in {}.", tasks.filter())?;
                }
            }
            for row in &view.rows {
                let task = row.task;
                writeln!(
                    out,
                    "{} [{}] {} ({})",
                    task.id,
                    if task.completed { "x" } else { " " },
                    task.text,
                    task.category
                )?;
            }
            writeln!(
                out,
                "{} total, {} completed, {} pending",
                view.counts.total, view.counts.completed, view.counts.pending
            )?;
        }
        TaskCommand::Add { text, category } => match tasks.create(&text.join(" "), &category) {
            Some(id) => {
                let text = tasks.get(&id).map(|t| t.text.as_str()).unwrap_or_default();
                writeln!(out, "Created task {id}: {text}")?;
            }
            None => writeln!(out, "Nothing added: task text is blank.")?,
        },
        TaskCommand::Toggle { id } => {
            let Some(id) = resolve_id(tasks, &id, out)? else {
                return Ok(());
            };
            tasks.toggle(&id);
            if let Some(task) = tasks.get(&id) {
                let label = if task.completed { "done" } else { "not done" };
                writeln!(out, "Marked {label}: {}", task.text)?;
            }
        }
        TaskCommand::Edit { id, text } => {
            let Some(id) = resolve_id(tasks, &id, out)? else {
                return Ok(());
            };
            tasks.begin_edit(&id);
            if tasks.commit_edit(&id, &text.join(" ")) {
                let text = tasks.get(&id).map(|t| t.text.as_str()).unwrap_or_default();
                writeln!(out, "Updated: {text}")?;
            } else {
                writeln!(out, "Unchanged: task text cannot be blank.")?;
            }
        }
        TaskCommand::Delete { id, yes } => {
            let Some(id) = resolve_id(tasks, &id, out)? else {
                return Ok(());
            };
            if yes || confirm("Delete this task?", input, out)? {
                tasks.delete(&id);
                writeln!(out, "Deleted {id}.")?;
            }
        }
        TaskCommand::ClearCompleted { yes } => {
            if yes || confirm("Clear all completed tasks?", input, out)? {
                let removed = tasks.clear_completed();
                writeln!(out, "Removed {removed} completed task(s).")?;
            }
        }
        TaskCommand::ClearAll { yes } => {
            if yes || confirm("Clear ALL tasks? This cannot be undone.", input, out)? {
                let removed = tasks.clear_all();
                writeln!(out, "Removed {removed} task(s).")?;
            }
        }
    }

    Ok(())
}

/// Exact id, or a prefix matching exactly one task.
fn resolve_id<S, C, W>(tasks: &Tasks<S, C>, raw: &str, out: &mut W) -> Result<Option<TaskId>>
where
    S: KeyValueStore,
    C: Clock,
    W: Write,
{
    let raw = raw.trim();
    if let Some(task) = tasks.get(&TaskId::from(raw)) {
        return Ok(Some(task.id.clone()));
    }
    let matches: Vec<&TaskId> = tasks
        .tasks()
        .iter()
        .map(|t| &t.id)
        .filter(|id| !raw.is_empty() && id.as_str().starts_with(raw))
        .collect();
    match matches.as_slice() {
        [id] => Ok(Some((*id).clone())),
        [] => {
            writeln!(out, "No task with id {raw}.")?;
            Ok(None)
        }
        _ => {
            writeln!(out, "Id prefix {raw} matches {} tasks.", matches.len())?;
            Ok(None)
        }
    }
}

fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
    if !confirmed {
        writeln!(out, "Cancelled.")?;
    }
    Ok(confirmed)
}
