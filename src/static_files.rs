use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Serves files below a base directory.
///
/// URL paths are mapped component by component; anything other than plain
/// names (`..`, roots, prefixes) is rejected so requests cannot escape the
/// base directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let url_path = url_path.trim_start_matches('/');
        // Backslashes are separators on Windows; never accept them in URLs.
        if url_path.contains('\\') {
            return None;
        }
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// Content type for a file, chosen by extension.
    #[must_use]
    pub fn content_type(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain; charset=utf-8",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "ico" => "image/x-icon",
            _ => "application/octet-stream",
        }
    }

    /// Read the file for `url_path` and return its bytes and content type.
    ///
    /// # Errors
    ///
    /// `NotFound` when the path escapes the base directory, does not exist or
    /// is not a regular file; other I/O errors are passed through.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        debug!(path = %path.display(), size_bytes = bytes.len(), "Static file served");
        Ok((bytes, Self::content_type(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("tests/staticdata");
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("css/../../Cargo.toml").is_none());
        assert!(sf.map_path("..\\Cargo.toml").is_none());
        assert_eq!(
            sf.map_path("/./hello.txt"),
            Some(PathBuf::from("tests/staticdata/hello.txt"))
        );
    }

    #[test]
    fn test_load_plain_file() {
        let sf = StaticFiles::new("tests/staticdata");
        let (bytes, ct) = sf.load("hello.txt").unwrap();
        assert_eq!(ct, "text/plain; charset=utf-8");
        assert_eq!(String::from_utf8(bytes).unwrap(), "Hello\n");
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let sf = StaticFiles::new("tests");
        let err = sf.load("staticdata").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(StaticFiles::content_type(Path::new("a.CSS")), "text/css");
        assert_eq!(StaticFiles::content_type(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(
            StaticFiles::content_type(Path::new("noext")),
            "application/octet-stream"
        );
    }
}
