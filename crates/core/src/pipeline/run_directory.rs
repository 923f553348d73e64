use std::path::{Path, PathBuf};

/// Picks the directory a detection run writes into.
///
/// `project/name` when it is free or `exist_ok` is set, otherwise the first
/// free `project/name2`, `project/name3`, ...
pub fn resolve_run_dir(project: &Path, name: &str, exist_ok: bool) -> PathBuf {
    let base = project.join(name);
    if exist_ok || !base.exists() {
        return base;
    }
    (2..)
        .map(|n| project.join(format!("{name}{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(base)
}
