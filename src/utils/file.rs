use std::path::{Path, PathBuf};

/// Return `dir/<stem>.<extension>`, or the first `dir/<stem>_<n>.<extension>` that does not exist yet.
pub fn next_available_path(dir: impl AsRef<Path>, stem: &str, extension: &str) -> PathBuf {
    let dir = dir.as_ref();
    let candidate = dir.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1usize;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
