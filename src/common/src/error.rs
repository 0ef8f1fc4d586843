use std::error::Error;
use std::fmt;

use crate::types::Session;

/// Failures of session discovery and selection. Terminal, never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    NoSessionFound { filter: Option<String> },
    AmbiguousSession { candidates: Vec<Session> },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiscoveryError::NoSessionFound { filter: None } => {
                write!(f, "no Power BI Desktop sessions found")
            }
            DiscoveryError::NoSessionFound {
                filter: Some(filter),
            } => {
                write!(f, "no session matches filter `{}`", filter)
            }
            DiscoveryError::AmbiguousSession { candidates } => {
                writeln!(
                    f,
                    "{} sessions match; narrow the title filter to exactly one:",
                    candidates.len()
                )?;
                for session in candidates {
                    writeln!(
                        f,
                        "  pid {:<8} {:<40} {}",
                        session.pid,
                        session.title,
                        session.data_source.as_deref().unwrap_or("-")
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl Error for DiscoveryError {}

/// Failures of command dispatch against a selected session's engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The vendor client helper could not be located at startup.
    ClientLibraryMissing { program: String },
    Connection {
        data_source: String,
        title: String,
        message: String,
    },
    Command { command: String, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::ClientLibraryMissing { program } => {
                write!(
                    f,
                    "analytics client helper `{}` not found on PATH",
                    program
                )
            }
            EngineError::Connection {
                data_source,
                title,
                message,
            } => {
                write!(
                    f,
                    "failed to connect to `{}` (session \"{}\"): {}",
                    data_source, title, message
                )
            }
            EngineError::Command { command, message } => {
                write!(f, "command failed: {}\ncommand text: {}", message, command)
            }
        }
    }
}

impl Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_session_messages_distinguish_filter_presence() {
        let bare = DiscoveryError::NoSessionFound { filter: None };
        assert_eq!(bare.to_string(), "no Power BI Desktop sessions found");

        let filtered = DiscoveryError::NoSessionFound {
            filter: Some("Fab*".to_string()),
        };
        assert_eq!(filtered.to_string(), "no session matches filter `Fab*`");
    }

    #[test]
    fn ambiguous_session_lists_candidates() {
        let candidates = vec![
            Session::new(
                84096,
                "Fabrikam Processes - Power BI Desktop",
                Some(("::1".to_string(), 51125)),
            ),
            Session::new(
                84664,
                "Northwind Sales Monitoring - Power BI Desktop",
                Some(("::1".to_string(), 61248)),
            ),
        ];
        let message = DiscoveryError::AmbiguousSession { candidates }.to_string();
        assert!(message.contains("84096"));
        assert!(message.contains("Fabrikam Processes"));
        assert!(message.contains("localhost:51125"));
        assert!(message.contains("84664"));
        assert!(message.contains("localhost:61248"));
        assert!(message.contains("narrow the title filter"));
    }

    #[test]
    fn command_error_carries_the_command_text() {
        let error = EngineError::Command {
            command: "EVALUATE ('Sales')".to_string(),
            message: "table not found".to_string(),
        };
        assert!(error.to_string().contains("EVALUATE ('Sales')"));
    }
}
