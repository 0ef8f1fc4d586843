use anyhow::{Context, Result};
use regex::Regex;

/// Compiles a glob-style title filter: `*` matches any run of characters,
/// `?` any single character, everything else is literal. The whole title must
/// match, case-insensitively.
pub fn compile_wildcard(pattern: &str) -> Result<Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");

    Regex::new(&format!("(?i)^{}$", escaped))
        .with_context(|| format!("invalid title filter `{}`", pattern))
}
