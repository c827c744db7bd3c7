use std::path::PathBuf;

/// Expand a leading tilde in a path (e.g. `~/partboard/db.sqlite`).
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        let expanded = expand_tilde("~/partboard/db.sqlite");
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.is_absolute());
    }

    #[test]
    fn leaves_absolute_paths_alone() {
        assert_eq!(
            expand_tilde("/var/lib/partboard"),
            PathBuf::from("/var/lib/partboard")
        );
    }
}
