use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use serde_json::Value;

use pbiq_common::types::{ResultSet, Session};
use pbiq_discovery::{resolver, selector};
use pbiq_engine::bridge::AdomdBridge;
use pbiq_engine::dispatcher;

use crate::commands::{Cli, Command};

pub fn process_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::ListSessions { title } => list_sessions(title.as_deref()),
        Command::ListTables {
            title,
            include_hidden,
        } => list_tables(title.as_deref(), include_hidden),
        Command::ReadTable { table, title } => read_table(&table, title.as_deref()),
    }
}

fn list_sessions(title: Option<&str>) -> Result<()> {
    let sessions = resolver::discover_sessions(title)?;
    if sessions.is_empty() {
        println!("{}", "No Power BI Desktop sessions found.".yellow());
        return Ok(());
    }

    println!("{:<8} {:<40} {}", "PID", "TITLE", "DATA SOURCE");
    for session in &sessions {
        print_session_row(session);
    }
    Ok(())
}

fn print_session_row(session: &Session) {
    println!(
        "{:<8} {:<40} {}",
        session.pid,
        session.title,
        session.data_source.as_deref().unwrap_or("-")
    );
}

fn list_tables(title: Option<&str>, include_hidden: bool) -> Result<()> {
    let session = selector::select_session(title)?;
    let bridge = AdomdBridge::locate()?;
    let tables = dispatcher::list_tables(&bridge, &session, include_hidden)?;

    for table in &tables {
        println!(
            "{:<32} {}",
            table.name,
            table.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn read_table(table: &str, title: Option<&str>) -> Result<()> {
    let session = selector::select_session(title)?;
    let bridge = AdomdBridge::locate()?;
    let result = dispatcher::read_table(&bridge, &session, table)?;

    print_result_set(&result);
    Ok(())
}

fn print_result_set(result: &ResultSet) {
    println!("{}", result.columns.join("\t"));
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(render_cell).collect();
        println!("{}", cells.join("\t"));
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
