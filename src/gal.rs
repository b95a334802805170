//! Helpers for GAL models returned by the simulator's synchronous `/process`.

use crate::backend::types::Assignment;
use std::fs;
use std::path::Path;

/// Names of the `int` variables declared by a GAL model, in declaration order.
///
/// `int l0 = 1;` yields `l0`.
pub fn declared_variables(gal_code: &str) -> Vec<String> {
    gal_code
        .lines()
        .filter_map(|line| line.trim().strip_prefix("int "))
        .filter_map(|declaration| {
            let name = declaration
                .split(['=', ';'])
                .next()
                .unwrap_or("")
                .trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// A target with every declared variable at 0, the starting point for a search.
pub fn default_target(gal_code: &str) -> Assignment {
    declared_variables(gal_code)
        .into_iter()
        .map(|name| (name, 0))
        .collect()
}

/// Write the model to `path`, creating parent directories.
pub fn save(gal_code: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, gal_code)
}
