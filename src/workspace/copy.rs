use super::WorkspaceError;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Recursively copy `from` into `to`, including `.git`.
///
/// Existing files at the destination are overwritten. Symlinks are recreated
/// as links on unix instead of being followed. File permissions travel with
/// `fs::copy`.
pub fn copy_tree(from: &Path, to: &Path) -> Result<(), WorkspaceError> {
    let io_err = |path: &Path, source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    };

    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|source| WorkspaceError::Walk {
            root: from.to_path_buf(),
            source,
        })?;

        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| io_err(&dest, e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| io_err(&dest, e))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), WorkspaceError> {
    let io_err = |path: &Path, source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let link_target = fs::read_link(src).map_err(|e| io_err(src, e))?;
    if fs::symlink_metadata(dest).is_ok() {
        fs::remove_file(dest).map_err(|e| io_err(dest, e))?;
    }
    std::os::unix::fs::symlink(link_target, dest).map_err(|e| io_err(dest, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), WorkspaceError> {
    if src.is_dir() {
        copy_tree(src, dest)
    } else {
        fs::copy(src, dest)
            .map(|_| ())
            .map_err(|source| WorkspaceError::Io {
                path: dest.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_nested_tree_with_git_metadata() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join(".git/refs/heads")).unwrap();
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join(".git/HEAD"), "ref: refs/heads/master\n").unwrap();
        fs::write(src.join("a/b/Deep.v"), "deep").unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();

        let dest = dir.path().join("dest");
        copy_tree(&src, &dest).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join(".git/HEAD")).unwrap(),
            "ref: refs/heads/master\n"
        );
        assert_eq!(fs::read_to_string(dest.join("a/b/Deep.v")).unwrap(), "deep");
        assert!(dest.join(".git/refs/heads").is_dir());
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn test_copy_overwrites_existing_files() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("Foo.v"), "new").unwrap();
        fs::write(dest.join("Foo.v"), "old").unwrap();

        copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("Foo.v")).unwrap(), "new");
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinks_are_recreated_not_followed() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Real.v"), "real").unwrap();
        std::os::unix::fs::symlink("Real.v", src.join("Alias.v")).unwrap();

        let dest = dir.path().join("dest");
        copy_tree(&src, &dest).unwrap();

        let meta = fs::symlink_metadata(dest.join("Alias.v")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(dest.join("Alias.v")).unwrap(),
            Path::new("Real.v")
        );
    }
}
