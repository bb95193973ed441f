//! `.marlin.env` secrets and `${env:VAR}` references in the resolver config.

use std::collections::BTreeMap;
use std::path::Path;

use marlin_util::errors::{MarlinError, MarlinResult};

const ENV_PREFIX: &str = "${env:";

/// Read a `.marlin.env` file of `KEY=value` lines.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is
/// accepted, and values wrapped in matching single or double quotes are
/// unwrapped. A missing file is an empty map; a line without `=` is a
/// config error.
pub fn load_env_file(path: &Path) -> MarlinResult<BTreeMap<String, String>> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let mut vars = BTreeMap::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (key, value) = line.split_once('=').ok_or_else(|| MarlinError::Config {
            message: format!("{}:{}: expected KEY=value", path.display(), number + 1),
        })?;
        vars.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }
    tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Replace `${env:VAR}` references, preferring `vars` over the process
/// environment. Unset variables become empty; substituted text is not
/// scanned again.
pub fn interpolate(input: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(ENV_PREFIX) {
        let after = &rest[start + ENV_PREFIX.len()..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &after[..end];
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&std::env::var(name).unwrap_or_default()),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
