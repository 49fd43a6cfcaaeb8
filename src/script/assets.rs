// Asset resolution
// Maps a step's audio reference to a playable location

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("empty asset reference")]
    Empty,
    #[error("invalid asset path: {0}")]
    InvalidPath(String),
}

/// Resolves an `audio_ref` to a location on disk
pub trait AssetResolver {
    fn resolve(&self, reference: &str) -> Result<PathBuf, AssetError>;
}

/// Resolves references relative to a content directory
#[derive(Debug, Clone)]
pub struct DirResolver {
    base_path: PathBuf,
}

impl DirResolver {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl AssetResolver for DirResolver {
    fn resolve(&self, reference: &str) -> Result<PathBuf, AssetError> {
        if reference.trim().is_empty() {
            return Err(AssetError::Empty);
        }

        let relative = Path::new(reference);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(AssetError::InvalidPath(format!(
                "reference must stay inside the content directory: {}",
                reference
            )));
        }

        let full_path = self.base_path.join(relative);

        // Symlinks may still point outside
        if let (Ok(base), Ok(full)) = (self.base_path.canonicalize(), full_path.canonicalize()) {
            if !full.starts_with(&base) {
                return Err(AssetError::InvalidPath(format!(
                    "path escapes content directory: {}",
                    reference
                )));
            }
        }

        Ok(full_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_joins_base() {
        let resolver = DirResolver::new("/content");
        assert_eq!(
            resolver.resolve("voice/a.mp3").unwrap(),
            PathBuf::from("/content/voice/a.mp3")
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let resolver = DirResolver::new("/content");
        assert!(matches!(
            resolver.resolve("../secret.wav"),
            Err(AssetError::InvalidPath(_))
        ));
        assert!(matches!(
            resolver.resolve("voice/../../x.wav"),
            Err(AssetError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_absolute() {
        let resolver = DirResolver::new("/content");
        assert!(matches!(
            resolver.resolve("/etc/passwd"),
            Err(AssetError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_rejects_empty() {
        let resolver = DirResolver::new("/content");
        assert_eq!(resolver.resolve("  "), Err(AssetError::Empty));
    }

    #[test]
    fn test_resolve_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.wav"), b"RIFF").unwrap();

        let resolver = DirResolver::new(dir.path());
        let path = resolver.resolve("a.wav").unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("x.wav"), b"RIFF").unwrap();
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("x.wav"), dir.path().join("x.wav"))
            .unwrap();

        let resolver = DirResolver::new(dir.path());
        assert!(matches!(
            resolver.resolve("x.wav"),
            Err(AssetError::InvalidPath(_))
        ));
    }
}
