/// Executable name of Power BI Desktop as reported by the OS process table.
pub const DESKTOP_PROCESS_NAME: &str = "PBIDesktop.exe";

/// Decoration Power BI Desktop appends to every window title.
pub const WINDOW_TITLE_SUFFIX: &str = " - Power BI Desktop";

/// Host literal used when composing a data source string. The ADOMD client
/// rejects raw loopback literals such as `::1` as a host component.
pub const ENGINE_HOST: &str = "localhost";

/// Helper executable that wraps the vendor ADOMD.NET client. Looked up on
/// PATH at connector construction.
pub const BRIDGE_PROGRAM: &str = "pbi-adomd-bridge";
