//! Command dispatch against a selected session: one connection per request,
//! command text passed through verbatim, first result table returned.

use serde_json::Value;
use tracing::debug;

use pbiq_common::error::EngineError;
use pbiq_common::types::{ResultSet, Session, TableInfo};

use crate::client::{AnalysisConnector, ClientError};

/// Introspection query for the model's table-metadata view.
pub const TABLES_QUERY: &str =
    "SELECT [Name], [Description], [IsHidden] FROM $SYSTEM.TMSCHEMA_TABLES";

/// Executes `command` against `session`'s engine and returns the first
/// rectangular result table.
///
/// The command is sent verbatim: no escaping, no parameterization. Entity
/// names interpolated into a command by a caller must already be quoted; a
/// name containing the quote character is unsafe here.
pub fn execute(
    connector: &dyn AnalysisConnector,
    session: &Session,
    command: &str,
) -> Result<ResultSet, EngineError> {
    let Some(data_source) = session.data_source.as_deref() else {
        return Err(EngineError::Connection {
            data_source: String::new(),
            title: session.title.clone(),
            message: "engine not ready: no loopback port discovered for this session".to_string(),
        });
    };

    debug!(%data_source, title = %session.title, "executing engine command");

    let mut connection =
        connector
            .connect(data_source)
            .map_err(|error| EngineError::Connection {
                data_source: data_source.to_string(),
                title: session.title.clone(),
                message: error.to_string(),
            })?;

    // Close before returning on success and on execute failure alike.
    let outcome = connection.execute(command);
    connection.close();

    match outcome {
        Ok(table) => Ok(table),
        Err(ClientError::Connect { message }) => Err(EngineError::Connection {
            data_source: data_source.to_string(),
            title: session.title.clone(),
            message,
        }),
        Err(ClientError::Command { message }) => Err(EngineError::Command {
            command: command.to_string(),
            message,
        }),
    }
}

/// Lists the model's tables. Rows the engine flags as hidden are dropped
/// unless `include_hidden` is set.
pub fn list_tables(
    connector: &dyn AnalysisConnector,
    session: &Session,
    include_hidden: bool,
) -> Result<Vec<TableInfo>, EngineError> {
    let table = execute(connector, session, TABLES_QUERY)?;

    let names = column_index(&table, "Name");
    let descriptions = column_index(&table, "Description");
    let hidden = column_index(&table, "IsHidden");

    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        if !include_hidden {
            let is_hidden = hidden
                .and_then(|i| row.get(i))
                .map(is_truthy)
                .unwrap_or(false);
            if is_hidden {
                continue;
            }
        }
        let name = names
            .and_then(|i| row.get(i))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let description = descriptions
            .and_then(|i| row.get(i))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        out.push(TableInfo { name, description });
    }
    Ok(out)
}

/// Evaluates a whole table. The name goes into the command verbatim; callers
/// must pre-escape by doubling any `'` the name contains.
pub fn read_table(
    connector: &dyn AnalysisConnector,
    session: &Session,
    table_name: &str,
) -> Result<ResultSet, EngineError> {
    execute(connector, session, &format!("EVALUATE ('{}')", table_name))
}

fn column_index(table: &ResultSet, name: &str) -> Option<usize> {
    table
        .columns
        .iter()
        .position(|column| column.trim_matches(&['[', ']'][..]).eq_ignore_ascii_case(name))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    }
}
