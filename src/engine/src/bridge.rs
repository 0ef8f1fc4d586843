//! Production connector: drives the `pbi-adomd-bridge` helper executable,
//! a thin wrapper around the vendor ADOMD.NET client. One helper invocation
//! per request; the command text goes to its stdin, one JSON document comes
//! back on its stdout.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use pbiq_common::constants::BRIDGE_PROGRAM;
use pbiq_common::error::EngineError;
use pbiq_common::types::ResultSet;

use crate::client::{AnalysisConnection, AnalysisConnector, ClientError};

#[derive(Debug)]
pub struct AdomdBridge {
    program: PathBuf,
}

impl AdomdBridge {
    /// Locates the helper on PATH. Fails with `ClientLibraryMissing` when it
    /// is not installed.
    pub fn locate() -> Result<Self, EngineError> {
        let program = which::which(BRIDGE_PROGRAM).map_err(|_| EngineError::ClientLibraryMissing {
            program: BRIDGE_PROGRAM.to_string(),
        })?;
        debug!(program = %program.display(), "located analytics client helper");
        Ok(AdomdBridge { program })
    }

    /// Uses a specific helper executable instead of searching PATH.
    pub fn with_program(program: PathBuf) -> Self {
        AdomdBridge { program }
    }
}

impl AnalysisConnector for AdomdBridge {
    fn connect(&self, data_source: &str) -> Result<Box<dyn AnalysisConnection>, ClientError> {
        // The helper opens and closes the engine connection itself, once per
        // request; connect failures therefore surface on execute, staged as
        // `connect` in the reply.
        Ok(Box::new(BridgeConnection {
            program: self.program.clone(),
            data_source: data_source.to_string(),
        }))
    }
}

struct BridgeConnection {
    program: PathBuf,
    data_source: String,
}

#[derive(Deserialize)]
struct BridgeReply {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
    error: Option<BridgeFailure>,
}

#[derive(Deserialize)]
struct BridgeFailure {
    stage: String,
    message: String,
}

impl AnalysisConnection for BridgeConnection {
    fn execute(&mut self, command: &str) -> Result<ResultSet, ClientError> {
        debug!(data_source = %self.data_source, "dispatching command to bridge helper");

        let mut child = Command::new(&self.program)
            .arg("--data-source")
            .arg(&self.data_source)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ClientError::Connect {
                message: format!("failed to start {}: {}", self.program.display(), e),
            })?;

        // stdin handle must drop before waiting, or the helper never sees EOF
        {
            let mut stdin = child.stdin.take().ok_or_else(|| ClientError::Connect {
                message: "bridge helper stdin unavailable".to_string(),
            })?;
            stdin
                .write_all(command.as_bytes())
                .map_err(|e| ClientError::Connect {
                    message: format!("failed to send command to bridge helper: {}", e),
                })?;
        }

        let output = child.wait_with_output().map_err(|e| ClientError::Connect {
            message: format!("bridge helper did not finish: {}", e),
        })?;

        let reply: BridgeReply =
            serde_json::from_slice(&output.stdout).map_err(|e| ClientError::Connect {
                message: format!("unreadable bridge helper reply: {}", e),
            })?;

        if let Some(failure) = reply.error {
            return Err(match failure.stage.as_str() {
                "connect" => ClientError::Connect {
                    message: failure.message,
                },
                _ => ClientError::Command {
                    message: failure.message,
                },
            });
        }

        Ok(ResultSet {
            columns: reply.columns,
            rows: reply.rows,
        })
    }

    fn close(&mut self) {
        // Nothing held open between requests; the helper exits per call.
    }
}
