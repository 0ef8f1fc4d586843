use serde::{Deserialize, Serialize};

use crate::constants::{ENGINE_HOST, WINDOW_TITLE_SUFFIX};

/// A discovered, addressable Power BI Desktop instance. Valid only while the
/// underlying process is alive; recomputed fresh on every discovery call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub pid: u32,
    /// Window title with the ` - Power BI Desktop` decoration stripped.
    pub title: String,
    /// Loopback address of the engine's self-connection, when one was found.
    pub address: Option<String>,
    /// Ephemeral TCP port the embedded engine listens on.
    pub port: Option<u16>,
    /// `localhost:<port>` connection string; `None` while the engine has no
    /// discovered port yet ("not ready").
    pub data_source: Option<String>,
}

impl Session {
    pub fn new(pid: u32, raw_title: &str, endpoint: Option<(String, u16)>) -> Self {
        let title = raw_title
            .strip_suffix(WINDOW_TITLE_SUFFIX)
            .unwrap_or(raw_title)
            .to_string();
        let (address, port) = match endpoint {
            Some((address, port)) => (Some(address), Some(port)),
            None => (None, None),
        };
        let data_source = port.map(|port| format!("{}:{}", ENGINE_HOST, port));

        Session {
            pid,
            title,
            address,
            port,
            data_source,
        }
    }
}

/// One rectangular table returned by the engine: ordered named columns and
/// ordered rows. Owned by the caller, discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Row of the model's table-metadata view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub description: Option<String>,
}
