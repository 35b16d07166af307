//! Repository file enumeration

use super::FileRef;
use crate::config::SourceConfig;
use crate::error::Result;
use ignore::WalkBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes inspected when sniffing for binary content
pub const BINARY_SNIFF_BYTES: usize = 8192;

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "psd", "pdf", "zip", "gz", "tgz",
    "bz2", "xz", "7z", "rar", "tar", "jar", "war", "class", "o", "a", "so", "dylib", "dll", "exe",
    "bin", "obj", "lib", "pyc", "pyo", "wasm", "rlib", "woff", "woff2", "ttf", "otf", "eot",
    "mp3", "mp4", "wav", "ogg", "avi", "mov", "mkv", "flac", "sqlite", "db", "parquet",
];

/// Walk `root` honouring ignore files, returning files sorted by relative path
pub fn scan_repository(root: &Path, options: &SourceConfig) -> Result<Vec<FileRef>> {
    let exclude_dirs = options.exclude_dirs.clone();
    let walker = WalkBuilder::new(root)
        .hidden(options.exclude_hidden)
        .git_ignore(true)
        .git_exclude(true)
        .git_global(false)
        .ignore(true)
        .parents(false)
        .require_git(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy();
            !(is_dir && entry.depth() > 0 && exclude_dirs.iter().any(|d| name == d.as_str()))
        })
        .build();

    // An unreadable root fails the scan; anything below it is skipped
    std::fs::read_dir(root)?;

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let relative_path = relative_path(root, path);
        let size_bytes = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!(path = %relative_path, error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if size_bytes > options.max_file_bytes {
            tracing::debug!(path = %relative_path, size_bytes, "Skipping large file");
            continue;
        }
        if has_binary_extension(path) {
            tracing::debug!(path = %relative_path, "Skipping binary file");
            continue;
        }
        // Files that cannot be sniffed are kept so ingestion records them as failed
        match sniff_binary(path) {
            Ok(true) => {
                tracing::debug!(path = %relative_path, "Skipping binary file");
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %relative_path, error = %e, "Cannot sniff file");
            }
        }

        files.push(FileRef {
            absolute_path: path.to_path_buf(),
            relative_path,
            size_bytes,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

/// Forward-slash path of `path` below `root`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// A NUL byte in the first [`BINARY_SNIFF_BYTES`] marks a file as binary
pub fn sniff_binary(path: &Path) -> Result<bool> {
    let mut buf = vec![0u8; BINARY_SNIFF_BYTES];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(buf[..filled].contains(&0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn relative(files: &[FileRef]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn test_gitignore_without_git_checkout() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", b"/build\n/generated\n*.log\n");
        write(dir.path(), "src/main.rs", b"fn main() {}\n");
        write(dir.path(), "build/out.rs", b"fn gen() {}\n");
        write(dir.path(), "generated/api.rs", b"fn api() {}\n");
        write(dir.path(), "debug.log", b"noise\n");

        let files = scan_repository(dir.path(), &SourceConfig::default()).unwrap();
        assert_eq!(relative(&files), vec!["src/main.rs"]);
    }

    #[test]
    fn test_excluded_and_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "node_modules/x/index.js", b"x\n");
        write(dir.path(), "target/debug/a.rs", b"x\n");
        write(dir.path(), ".cache/c.py", b"x\n");
        write(dir.path(), "lib/a.py", b"x\n");
        write(dir.path(), "README.md", b"# hi\n");

        let files = scan_repository(dir.path(), &SourceConfig::default()).unwrap();
        assert_eq!(relative(&files), vec!["README.md", "lib/a.py"]);
    }

    #[test]
    fn test_binary_and_large_files_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "logo.png", b"not really png");
        write(dir.path(), "blob.dat", b"abc\0def");
        write(dir.path(), "big.txt", &vec![b'a'; 2048]);
        write(dir.path(), "ok.txt", b"fine\n");

        let options = SourceConfig {
            max_file_bytes: 1024,
            ..SourceConfig::default()
        };
        let files = scan_repository(dir.path(), &options).unwrap();
        assert_eq!(relative(&files), vec!["ok.txt"]);
        assert_eq!(files[0].size_bytes, 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_do_not_abort_scan() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.py", b"x = 1\n");
        write(dir.path(), "secret.py", b"y = 2\n");
        write(dir.path(), "locked/inner.py", b"z = 3\n");
        let secret = dir.path().join("secret.py");
        let locked = dir.path().join("locked");
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users can still read everything
        let dir_readable = fs::read_dir(&locked).is_ok();

        let result = scan_repository(dir.path(), &SourceConfig::default());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();

        let files = result.unwrap();
        let mut expected = vec!["good.py"];
        if dir_readable {
            expected.push("locked/inner.py");
        }
        expected.push("secret.py");
        assert_eq!(relative(&files), expected);
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        assert!(scan_repository(&dir.path().join("absent"), &SourceConfig::default()).is_err());
    }

    #[test]
    fn test_results_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["z.rs", "a.rs", "m/b.rs"] {
            write(dir.path(), name, b"//\n");
        }
        let files = scan_repository(dir.path(), &SourceConfig::default()).unwrap();
        assert_eq!(relative(&files), vec!["a.rs", "m/b.rs", "z.rs"]);
    }
}
