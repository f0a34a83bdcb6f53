//! Implementation of the `geodispatch tasks` commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::output::{output, table, truncate, CommandOutput};
use crate::cli::App;
use crate::domain::models::{TaskRecord, TaskStatus};
use crate::domain::ports::TaskRecordFilter;

#[derive(Subcommand, Debug)]
pub enum TasksCommands {
    /// List task records, oldest first
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only records of this area
    #[arg(long)]
    pub area: Option<String>,

    /// Only records of this map
    #[arg(long)]
    pub map: Option<String>,

    /// Only records in this status (created, running, done, error, stopped)
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,

    /// Only CREATED and RUNNING records
    #[arg(long, conflicts_with = "status")]
    pub active: bool,

    /// Maximum number of records to show
    #[arg(long, default_value_t = 50)]
    pub limit: i64,
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_str(s).ok_or_else(|| format!("unknown task status '{s}'"))
}

#[derive(Debug, serde::Serialize)]
pub struct TaskListOutput {
    pub tasks: Vec<TaskRecord>,
}

impl CommandOutput for TaskListOutput {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No task records found.".to_string();
        }
        let mut t = table(&["Job", "Area", "Map", "Kind", "Reference date", "Status", "Started"]);
        for task in &self.tasks {
            t.add_row(vec![
                truncate(&task.id, 24),
                task.area_id.clone(),
                task.map_id.clone(),
                task.payload.discriminator(),
                task.reference_date.clone(),
                task.status.as_str().to_string(),
                task.started_at.format("%Y-%m-%d %H:%M").to_string(),
            ]);
        }
        format!("{t}\n{} record(s)", self.tasks.len())
    }
}

pub async fn execute(cmd: TasksCommands, app: App, json_mode: bool) -> Result<()> {
    match cmd {
        TasksCommands::List(args) => {
            let filter = TaskRecordFilter {
                area_id: args.area,
                map_id: args.map,
                status: args.status,
                active_only: args.active,
                limit: Some(args.limit.max(1)),
                ..Default::default()
            };
            let tasks = app.repos.tasks.list(filter).await?;
            output(&TaskListOutput { tasks }, json_mode);
        }
    }
    Ok(())
}
