//! Loading file-backed transforms.
//!
//! A [`FileTransform`](crate::FileTransform) only names a file; turning the
//! file into operations is the job of a [`FileLoader`]. The config resolves
//! the path through its context and hands the existing file to the loader.
//! [`NullFileLoader`] rejects every file; hosts install a real loader with
//! [`Config::set_file_loader`](crate::Config::set_file_loader).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{OcioError, OcioResult};
use crate::processor::ProcessorOp;
use crate::transform::{Interpolation, TransformDirection};

/// Turns a resolved file into processor operations.
pub trait FileLoader: Send + Sync + fmt::Debug {
    /// Loads `path` as operations applied in `direction`.
    fn load(
        &self,
        path: &Path,
        interpolation: Interpolation,
        direction: TransformDirection,
    ) -> OcioResult<Vec<ProcessorOp>>;

    /// Drops any cached file content.
    fn clear_cache(&self) {}
}

/// Loader that supports no file formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFileLoader;

impl FileLoader for NullFileLoader {
    fn load(
        &self,
        path: &Path,
        _interpolation: Interpolation,
        _direction: TransformDirection,
    ) -> OcioResult<Vec<ProcessorOp>> {
        Err(OcioError::UnsupportedFile {
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    interpolation: Interpolation,
    direction: TransformDirection,
}

/// Memoizing wrapper around another loader.
///
/// Entries are keyed by path and modification time, so an edited file is
/// reloaded on the next request.
#[derive(Debug, Default)]
pub struct CachedFileLoader<L> {
    inner: L,
    cache: RwLock<HashMap<CacheKey, Arc<Vec<ProcessorOp>>>>,
}

impl<L: FileLoader> CachedFileLoader<L> {
    /// Wraps `inner`.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: FileLoader> FileLoader for CachedFileLoader<L> {
    fn load(
        &self,
        path: &Path,
        interpolation: Interpolation,
        direction: TransformDirection,
    ) -> OcioResult<Vec<ProcessorOp>> {
        let key = CacheKey {
            path: path.to_path_buf(),
            modified: std::fs::metadata(path).and_then(|m| m.modified()).ok(),
            interpolation,
            direction,
        };

        if let Some(ops) = self.cache.read().get(&key) {
            trace!(path = %path.display(), "file cache hit");
            return Ok(ops.as_ref().clone());
        }

        let ops = self.inner.load(path, interpolation, direction)?;
        self.cache.write().insert(key, Arc::new(ops.clone()));
        Ok(ops)
    }

    fn clear_cache(&self) {
        self.cache.write().clear();
        self.inner.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingLoader {
        calls: AtomicUsize,
    }

    impl FileLoader for CountingLoader {
        fn load(
            &self,
            _path: &Path,
            _interpolation: Interpolation,
            _direction: TransformDirection,
        ) -> OcioResult<Vec<ProcessorOp>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ProcessorOp::Exponent { value: [2.0; 3] }])
        }
    }

    #[test]
    fn null_loader_rejects() {
        let err = NullFileLoader
            .load(Path::new("/tmp/x.spi1d"), Interpolation::Linear, TransformDirection::Forward)
            .unwrap_err();
        assert!(matches!(err, OcioError::UnsupportedFile { .. }));
    }

    #[test]
    fn cache_hit_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lg10.spi1d");
        fs::write(&path, "").unwrap();

        let loader = CachedFileLoader::new(CountingLoader::default());
        for _ in 0..3 {
            loader.load(&path, Interpolation::Linear, TransformDirection::Forward).unwrap();
        }
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.len(), 1);

        loader.load(&path, Interpolation::Linear, TransformDirection::Inverse).unwrap();
        assert_eq!(loader.len(), 2);

        loader.clear_cache();
        assert!(loader.is_empty());
        loader.load(&path, Interpolation::Linear, TransformDirection::Forward).unwrap();
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 3);
    }
}
