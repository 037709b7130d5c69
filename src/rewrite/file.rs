use super::RewriteError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read a source file as UTF-8.
///
/// Returns `Ok(None)` when the file is not valid UTF-8; such files are left
/// alone rather than failing the whole tree.
pub fn read_source(path: &Path) -> Result<Option<String>, RewriteError> {
    let bytes = fs::read(path).map_err(|source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8(bytes).ok())
}

/// Replace a file's content atomically and bump its mtime.
///
/// Uses a tempfile in the same directory, fsync, then rename. The original
/// permissions are carried over to the new inode.
pub fn write_source(path: &Path, content: &str) -> Result<(), RewriteError> {
    let io_err = |source| RewriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .ok_or_else(|| RewriteError::NoParent(path.to_path_buf()))?;
    let permissions = fs::metadata(path).map_err(io_err)?.permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(content.as_bytes()).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.as_file().set_permissions(permissions).map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    filetime::set_file_mtime(path, filetime::FileTime::now()).map_err(io_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Foo.v");
        fs::write(&file_path, "original").unwrap();

        write_source(&file_path, "updated").unwrap();

        assert_eq!(read_source(&file_path).unwrap().as_deref(), Some("updated"));
    }

    #[test]
    fn test_non_utf8_reads_as_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("blob.v");
        fs::write(&file_path, [0xff, 0xfe, 0x00]).unwrap();

        assert_eq!(read_source(&file_path).unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = read_source(&temp_dir.path().join("absent.v"));
        assert!(matches!(result, Err(RewriteError::Io { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_write_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("script.v");
        fs::write(&file_path, "x").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o640)).unwrap();

        write_source(&file_path, "y").unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
