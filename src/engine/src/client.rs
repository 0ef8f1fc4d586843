//! Narrow seam around the external Analysis Services client so the
//! dispatcher can be exercised with a fake implementation.

use std::error::Error;
use std::fmt;

use pbiq_common::types::ResultSet;

/// Transport-level failure of one request, before the dispatcher attaches
/// session context to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The engine endpoint could not be reached.
    Connect { message: String },
    /// The engine rejected the command.
    Command { message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClientError::Connect { message } => write!(f, "{}", message),
            ClientError::Command { message } => write!(f, "{}", message),
        }
    }
}

impl Error for ClientError {}

/// One open engine connection. Lifetime is exactly one request; the
/// dispatcher closes it before returning.
pub trait AnalysisConnection {
    /// Executes one command verbatim and returns the first table of the
    /// result. No escaping, no parameterization.
    fn execute(&mut self, command: &str) -> Result<ResultSet, ClientError>;

    /// Releases whatever the connection holds. Idempotent.
    fn close(&mut self);
}

pub trait AnalysisConnector {
    fn connect(&self, data_source: &str) -> Result<Box<dyn AnalysisConnection>, ClientError>;
}
