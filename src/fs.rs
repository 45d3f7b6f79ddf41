//! Filesystem access behind a trait so loaders and snapshots can be tested
//! without touching disk.

use std::io;
use std::path::Path;

pub trait FileSystem: Send + Sync {
    /// Read raw bytes. Source files are not guaranteed to be valid UTF-8.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write content to a file, creating it if it doesn't exist.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation using std::fs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// In-memory filesystem for testing.
    #[derive(Debug, Default)]
    pub struct MockFs {
        files: RwLock<HashMap<String, Vec<u8>>>,
    }

    impl MockFs {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populate the mock filesystem with files.
        pub fn with_files<I, P, C>(files: I) -> Self
        where
            I: IntoIterator<Item = (P, C)>,
            P: AsRef<Path>,
            C: Into<Vec<u8>>,
        {
            let map: HashMap<String, Vec<u8>> = files
                .into_iter()
                .map(|(p, c)| (p.as_ref().to_string_lossy().to_string(), c.into()))
                .collect();
            Self {
                files: RwLock::new(map),
            }
        }

        fn key(path: &Path) -> String {
            path.to_string_lossy().to_string()
        }
    }

    impl FileSystem for MockFs {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            let key = Self::key(path);
            self.files
                .read()
                .unwrap()
                .get(&key)
                .cloned()
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("file not found: {}", key))
                })
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            String::from_utf8(self.read(path)?)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }

        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            self.files
                .write()
                .unwrap()
                .insert(Self::key(path), content.as_bytes().to_vec());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.read().unwrap().contains_key(&Self::key(path))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_fs_read_write() {
            let fs = MockFs::new();
            let path = Path::new("/test/snapshot.json");

            assert!(!fs.exists(path));
            assert!(fs.read_to_string(path).is_err());

            fs.write(path, "{}").unwrap();
            assert!(fs.exists(path));
            assert_eq!(fs.read_to_string(path).unwrap(), "{}");
        }

        #[test]
        fn test_mock_fs_keeps_invalid_utf8() {
            let fs = MockFs::with_files([(Path::new("/pkg/mod.py"), vec![b'#', 0xff])]);

            assert_eq!(fs.read(Path::new("/pkg/mod.py")).unwrap(), vec![b'#', 0xff]);
            assert!(fs.read_to_string(Path::new("/pkg/mod.py")).is_err());
        }
    }
}
