//! The connection resolver: joins the process snapshot against the TCP
//! snapshot to find each Power BI Desktop instance's private engine port.
//!
//! The heuristic: the embedded Analysis Services engine shows up as an
//! established loopback connection whose local address equals its own remote
//! address, owned by the desktop process. The remote port of that row is the
//! port the engine listens on.

use anyhow::Result;
use itertools::Itertools;
use tracing::warn;

use pbiq_common::constants::DESKTOP_PROCESS_NAME;
use pbiq_common::types::Session;

use crate::pattern;
use crate::snapshot::{self, ProcessRow, TcpRow};

/// Discovers the Power BI Desktop sessions currently running on this
/// machine, optionally narrowed by a glob-style title filter.
pub fn discover_sessions(filter: Option<&str>) -> Result<Vec<Session>> {
    let processes = snapshot::process_table();

    let pids: Vec<u32> = processes
        .iter()
        .filter(|row| row.name == DESKTOP_PROCESS_NAME)
        .map(|row| row.pid)
        .collect();
    let connections = if pids.is_empty() {
        Vec::new()
    } else {
        snapshot::tcp_table(&pids)?
    };

    resolve_sessions(&processes, &connections, filter)
}

/// Pure core of [`discover_sessions`]: filter/join/project over the two
/// snapshots. Output order follows the process snapshot; no sort is imposed.
pub fn resolve_sessions(
    processes: &[ProcessRow],
    connections: &[TcpRow],
    filter: Option<&str>,
) -> Result<Vec<Session>> {
    // Processes without a visible window are not addressable sessions.
    let desktops: Vec<&ProcessRow> = processes
        .iter()
        .filter(|row| row.name == DESKTOP_PROCESS_NAME && !row.window_title.is_empty())
        .collect();

    let loopback: Vec<&TcpRow> = connections
        .iter()
        .filter(|conn| {
            conn.local_addr == conn.remote_addr && desktops.iter().any(|p| p.pid == conn.pid)
        })
        .unique_by(|conn| (conn.pid, conn.remote_addr.clone(), conn.remote_port))
        .collect();

    let matcher = filter.map(pattern::compile_wildcard).transpose()?;

    let mut sessions = Vec::with_capacity(desktops.len());
    for process in desktops {
        let candidates: Vec<&&TcpRow> =
            loopback.iter().filter(|c| c.pid == process.pid).collect();
        if candidates.len() > 1 {
            let ports: Vec<u16> = candidates.iter().map(|c| c.remote_port).collect();
            warn!(
                pid = process.pid,
                ?ports,
                "multiple loopback self-connections for one process; using the first"
            );
        }
        let endpoint = candidates
            .first()
            .map(|c| (c.remote_addr.clone(), c.remote_port));

        let session = Session::new(process.pid, &process.window_title, endpoint);
        if let Some(matcher) = &matcher {
            if !matcher.is_match(&session.title) {
                continue;
            }
        }
        sessions.push(session);
    }
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop(pid: u32, title: &str) -> ProcessRow {
        ProcessRow {
            pid,
            name: DESKTOP_PROCESS_NAME.to_string(),
            window_title: title.to_string(),
        }
    }

    fn loopback(pid: u32, addr: &str, port: u16) -> TcpRow {
        TcpRow {
            pid,
            local_addr: addr.to_string(),
            remote_addr: addr.to_string(),
            remote_port: port,
        }
    }

    #[test]
    fn end_to_end_two_sessions_in_process_order() {
        let processes = vec![
            desktop(84096, "Fabrikam Processes - Power BI Desktop"),
            desktop(84664, "Northwind Sales Monitoring - Power BI Desktop"),
        ];
        let connections = vec![loopback(84096, "::1", 51125), loopback(84664, "::1", 61248)];

        let sessions = resolve_sessions(&processes, &connections, None).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].pid, 84096);
        assert_eq!(sessions[0].title, "Fabrikam Processes");
        assert_eq!(sessions[0].data_source.as_deref(), Some("localhost:51125"));
        assert_eq!(sessions[1].pid, 84664);
        assert_eq!(sessions[1].data_source.as_deref(), Some("localhost:61248"));
    }

    #[test]
    fn process_without_loopback_row_yields_not_ready_session() {
        let processes = vec![desktop(100, "Starting Up - Power BI Desktop")];
        let sessions = resolve_sessions(&processes, &[], None).unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].port, None);
        assert_eq!(sessions[0].address, None);
        assert_eq!(sessions[0].data_source, None);
    }

    #[test]
    fn process_without_window_title_is_skipped() {
        let processes = vec![ProcessRow {
            pid: 5,
            name: DESKTOP_PROCESS_NAME.to_string(),
            window_title: String::new(),
        }];
        let sessions = resolve_sessions(&processes, &[], None).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn unrelated_process_names_are_skipped() {
        let processes = vec![ProcessRow {
            pid: 6,
            name: "msedge.exe".to_string(),
            window_title: "Report - Power BI Desktop".to_string(),
        }];
        let connections = vec![loopback(6, "::1", 4242)];
        let sessions = resolve_sessions(&processes, &connections, None).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn duplicate_tcp_rows_collapse_to_one_session() {
        let processes = vec![desktop(84096, "Fabrikam Processes - Power BI Desktop")];
        let connections = vec![loopback(84096, "::1", 51125), loopback(84096, "::1", 51125)];

        let sessions = resolve_sessions(&processes, &connections, None).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].port, Some(51125));
    }

    #[test]
    fn multiple_distinct_ports_take_the_first_in_table_order() {
        let processes = vec![desktop(84096, "Fabrikam Processes - Power BI Desktop")];
        let connections = vec![loopback(84096, "::1", 51125), loopback(84096, "::1", 51200)];

        let sessions = resolve_sessions(&processes, &connections, None).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].port, Some(51125));
    }

    #[test]
    fn non_loopback_rows_are_ignored() {
        let processes = vec![desktop(84096, "Fabrikam Processes - Power BI Desktop")];
        let connections = vec![TcpRow {
            pid: 84096,
            local_addr: "192.168.1.20".to_string(),
            remote_addr: "40.79.189.59".to_string(),
            remote_port: 443,
        }];

        let sessions = resolve_sessions(&processes, &connections, None).unwrap();
        assert_eq!(sessions[0].port, None);
    }

    #[test]
    fn filter_narrows_by_derived_title() {
        let processes = vec![
            desktop(84096, "Fabrikam Processes - Power BI Desktop"),
            desktop(84664, "Northwind Sales Monitoring - Power BI Desktop"),
        ];
        let connections = vec![loopback(84096, "::1", 51125), loopback(84664, "::1", 61248)];

        let sessions = resolve_sessions(&processes, &connections, Some("Fab*")).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "Fabrikam Processes");

        let sessions = resolve_sessions(&processes, &connections, Some("fab*")).unwrap();
        assert_eq!(sessions.len(), 1, "filter is case-insensitive");
    }

    #[test]
    fn absent_filter_and_empty_filter_are_distinct() {
        let processes = vec![desktop(84096, "Fabrikam Processes - Power BI Desktop")];
        let connections = vec![loopback(84096, "::1", 51125)];

        let all = resolve_sessions(&processes, &connections, None).unwrap();
        assert_eq!(all.len(), 1);

        let none = resolve_sessions(&processes, &connections, Some("")).unwrap();
        assert!(none.is_empty(), "empty pattern matches only empty titles");
    }
}
