use anyhow::Result;

use pbiq_common::error::DiscoveryError;
use pbiq_common::types::Session;

use crate::resolver;

/// Reduces discovery to exactly one session, or fails with a condition that
/// tells the caller how to proceed.
pub fn select_session(filter: Option<&str>) -> Result<Session> {
    let sessions = resolver::discover_sessions(filter)?;
    Ok(select_from(sessions, filter)?)
}

pub fn select_from(
    mut sessions: Vec<Session>,
    filter: Option<&str>,
) -> Result<Session, DiscoveryError> {
    match sessions.len() {
        0 => Err(DiscoveryError::NoSessionFound {
            filter: filter.map(str::to_string),
        }),
        1 => Ok(sessions.remove(0)),
        _ => Err(DiscoveryError::AmbiguousSession {
            candidates: sessions,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(pid: u32, title: &str, port: u16) -> Session {
        Session::new(
            pid,
            &format!("{} - Power BI Desktop", title),
            Some(("::1".to_string(), port)),
        )
    }

    #[test]
    fn zero_without_filter_reports_no_sessions_at_all() {
        let error = select_from(vec![], None).unwrap_err();
        assert_eq!(
            error,
            DiscoveryError::NoSessionFound { filter: None },
        );
    }

    #[test]
    fn zero_with_filter_names_the_filter() {
        let error = select_from(vec![], Some("Fab*")).unwrap_err();
        assert_eq!(
            error,
            DiscoveryError::NoSessionFound {
                filter: Some("Fab*".to_string()),
            },
        );
    }

    #[test]
    fn exactly_one_is_returned() {
        let only = session(84096, "Fabrikam Processes", 51125);
        let selected = select_from(vec![only.clone()], None).unwrap();
        assert_eq!(selected, only);
    }

    #[test]
    fn two_or_more_is_ambiguous_and_lists_both() {
        let first = session(84096, "Fabrikam Processes", 51125);
        let second = session(84664, "Northwind Sales Monitoring", 61248);

        let error = select_from(vec![first.clone(), second.clone()], None).unwrap_err();
        assert_eq!(
            error,
            DiscoveryError::AmbiguousSession {
                candidates: vec![first, second],
            },
        );
    }
}
