//! Implementation of the `geodispatch areas` commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::output::{output, table, CommandOutput};
use crate::cli::App;
use crate::domain::models::Area;

#[derive(Subcommand, Debug)]
pub enum AreasCommands {
    /// List monitored areas with their subscriptions and archive window
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Include inactive areas
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct AreaListOutput {
    pub areas: Vec<Area>,
}

impl CommandOutput for AreaListOutput {
    fn to_human(&self) -> String {
        if self.areas.is_empty() {
            return "No areas found.".to_string();
        }
        let mut t = table(&["ID", "Name", "Plugins", "Archive start", "Archive end", "Active"]);
        for area in &self.areas {
            let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
            t.add_row(vec![
                area.id.clone(),
                area.name.clone(),
                area.plugins.join(", "),
                date(area.archive_start_date),
                date(area.archive_end_date),
                if area.active { "yes" } else { "no" }.to_string(),
            ]);
        }
        t.to_string()
    }
}

pub async fn execute(cmd: AreasCommands, app: App, json_mode: bool) -> Result<()> {
    match cmd {
        AreasCommands::List(args) => {
            let areas = app.repos.areas.list(!args.all).await?;
            output(&AreaListOutput { areas }, json_mode);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_human_output_shows_window() {
        let mut area = Area::new("A1", "Delta").with_plugin("flood");
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        area.widen_archive_window(start, end);
        let rendered = AreaListOutput { areas: vec![area] }.to_human();
        assert!(rendered.contains("flood"));
        assert!(rendered.contains("2024-05-01"));
        assert!(rendered.contains("2024-05-07"));
    }
}
