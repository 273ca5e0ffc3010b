use crate::error::{CueMixError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Resolves a logical, resource-relative path to the bytes of an encoded audio file.
///
/// The registry never touches the filesystem itself; it goes through a loader so the
/// embedding application decides where assets live (a data directory, bytes baked into
/// the binary, an archive, ...).
///
/// # Example
///
/// ```ignore
/// use cuemix::audio_data::ResourceLoader;
/// use cuemix::error::Result;
///
/// struct PakLoader { /* ... */ }
///
/// impl ResourceLoader for PakLoader {
///     fn load(&self, path: &str) -> Result<Vec<u8>> {
///         todo!()
///     }
/// }
/// ```
pub trait ResourceLoader {
    /// Returns the raw bytes stored under `path`.
    ///
    /// # Errors
    ///
    /// `CueMixError::ResourceNotFound` when nothing is stored under `path`,
    /// `CueMixError::Io` when the resource exists but cannot be read.
    fn load(&self, path: &str) -> Result<Vec<u8>>;
}

/// Loads resources from files below a root directory.
///
/// Paths are always relative to the root; absolute paths and `..` segments are
/// treated as not found so a sound name table cannot escape the asset directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Default for DirectoryLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self
            .resolve(path)
            .ok_or_else(|| CueMixError::ResourceNotFound(path.to_string()))?;

        match std::fs::read(&full_path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CueMixError::ResourceNotFound(path.to_string()))
            }
            Err(e) => Err(CueMixError::Io(e)),
        }
    }
}

/// In-memory resources, typically filled with `include_bytes!`.
#[derive(Debug, Default, Clone)]
pub struct EmbeddedLoader {
    entries: HashMap<String, Cow<'static, [u8]>>,
}

impl EmbeddedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) {
        self.entries.insert(path.into(), bytes.into());
    }

    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Cow<'static, [u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

impl ResourceLoader for EmbeddedLoader {
    fn load(&self, path: &str) -> Result<Vec<u8>> {
        self.entries
            .get(path)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| CueMixError::ResourceNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cuemix-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(dir.join("sounds")).unwrap();
        dir
    }

    #[test]
    fn directory_loader_reads_relative_paths() {
        let root = scratch_dir("read");
        std::fs::write(root.join("sounds/laser.wav"), b"RIFF").unwrap();

        let loader = DirectoryLoader::new(&root);
        assert_eq!(loader.load("sounds/laser.wav").unwrap(), b"RIFF");
        assert_eq!(loader.load("./sounds/laser.wav").unwrap(), b"RIFF");

        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn directory_loader_reports_missing_files() {
        let root = scratch_dir("missing");
        let loader = DirectoryLoader::new(&root);
        assert!(matches!(
            loader.load("bad/path.wav"),
            Err(CueMixError::ResourceNotFound(p)) if p == "bad/path.wav"
        ));
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn directory_loader_refuses_to_escape_root() {
        let loader = DirectoryLoader::new("assets");
        for path in ["../secret.wav", "sounds/../../x.wav", "/etc/passwd", ""] {
            assert!(
                matches!(loader.load(path), Err(CueMixError::ResourceNotFound(_))),
                "{path} should not resolve"
            );
        }
    }

    #[test]
    fn embedded_loader_serves_static_and_owned_bytes() {
        static BEEP: &[u8] = b"beep";
        let loader = EmbeddedLoader::new()
            .with("beep.wav", BEEP)
            .with("boop.wav", b"boop".to_vec());

        assert!(loader.contains("beep.wav"));
        assert_eq!(loader.load("beep.wav").unwrap(), b"beep");
        assert_eq!(loader.load("boop.wav").unwrap(), b"boop");
        assert!(matches!(
            loader.load("nope.wav"),
            Err(CueMixError::ResourceNotFound(_))
        ));
    }
}
