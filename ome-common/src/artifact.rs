//! Path-addressed artifact store
//!
//! **Purpose:** Memoize expensive pipeline stages on the filesystem. An
//! artifact is computed only when its file (or one of its companion files) is
//! missing; otherwise it is deserialized from disk.
//!
//! There is no invalidation, versioning or staleness check: once written, an
//! artifact is reused even if the inputs it was derived from have changed.
//! Delete the file to force recomputation.
//!
//! Every file is written through a temporary sibling and renamed into place,
//! so an interrupted write never leaves a truncated file that would count as
//! a cache hit. Artifacts with companions write the main file last.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A value that can be persisted to and restored from a file
pub trait Artifact: Sized {
    /// Read the artifact stored at `path`
    fn load(path: &Path) -> Result<Self>;

    /// Write the artifact to `path` (and its companions)
    fn save(&self, path: &Path) -> Result<()>;

    /// Extra files that must exist next to `path` for a cache hit
    fn companions(_path: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// JSON-encoded artifact wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Artifact for Json<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let value: T = serde_json::from_reader(BufReader::new(file))?;
        Ok(Json(value))
    }

    fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |writer| -> Result<()> {
            serde_json::to_writer_pretty(writer, &self.0)?;
            Ok(())
        })
    }
}

/// Write `path` through a temporary sibling that is renamed into place
///
/// A failed write removes the temporary file and leaves `path` untouched.
pub fn write_atomic<E, F>(path: &Path, write: F) -> std::result::Result<(), E>
where
    E: From<Error>,
    F: FnOnce(&mut BufWriter<File>) -> std::result::Result<(), E>,
{
    let tmp = temp_sibling(path);
    let written = (|| -> std::result::Result<(), E> {
        let mut writer = BufWriter::new(File::create(&tmp).map_err(Error::from)?);
        write(&mut writer)?;
        writer.flush().map_err(Error::from)?;
        writer.get_ref().sync_all().map_err(Error::from)?;
        Ok(())
    })();

    match written {
        Ok(()) => {
            std::fs::rename(&tmp, path).map_err(Error::from)?;
            Ok(())
        }
        Err(err) => {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                warn!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            Err(err)
        }
    }
}

/// `dir/.name.tmp` for `dir/name`
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Filesystem store rooted at a data directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// True when the artifact for `key` and all its companions exist
    pub fn contains<A: Artifact>(&self, key: &str) -> bool {
        let path = self.path_for(key);
        path.is_file() && A::companions(&path).iter().all(|p| p.is_file())
    }

    /// Load the artifact for `key`, computing and saving it if absent
    ///
    /// `compute` runs at most once and only on a cache miss. A failed
    /// computation or a failed save leaves no file that counts as a hit.
    pub fn get_or_compute<A, E, F>(&self, key: &str, compute: F) -> std::result::Result<A, E>
    where
        A: Artifact,
        E: From<Error>,
        F: FnOnce() -> std::result::Result<A, E>,
    {
        let path = self.path_for(key);

        if self.contains::<A>(key) {
            info!("Cache hit: {}", path.display());
            return Ok(A::load(&path)?);
        }

        info!("Cache miss: {} (computing)", path.display());
        let artifact = compute()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::from)?;
        }
        artifact.save(&path)?;
        info!("Saved artifact: {}", path.display());

        Ok(artifact)
    }
}

/// Path with `suffix` appended to the file stem (`a/b.csv` → `a/b_ref.csv`)
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Scores {
        name: String,
        values: Vec<f64>,
    }

    /// Two-file artifact used to exercise companion handling
    #[derive(Debug, Clone, PartialEq)]
    struct Pair(String, String);

    impl Artifact for Pair {
        fn load(path: &Path) -> Result<Self> {
            let a = std::fs::read_to_string(path)?;
            let b = std::fs::read_to_string(sibling_with_suffix(path, "_ref"))?;
            Ok(Pair(a, b))
        }

        fn save(&self, path: &Path) -> Result<()> {
            std::fs::write(path, &self.0)?;
            std::fs::write(sibling_with_suffix(path, "_ref"), &self.1)?;
            Ok(())
        }

        fn companions(path: &Path) -> Vec<PathBuf> {
            vec![sibling_with_suffix(path, "_ref")]
        }
    }

    #[test]
    fn test_computes_once_then_loads() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let calls = Cell::new(0);

        let compute = || -> Result<Json<Scores>> {
            calls.set(calls.get() + 1);
            Ok(Json(Scores {
                name: "knn".to_string(),
                values: vec![0.5, 0.75],
            }))
        };

        let first = store.get_or_compute("scores.json", compute).unwrap();
        let second = store
            .get_or_compute("scores.json", || -> Result<Json<Scores>> {
                calls.set(calls.get() + 1);
                Err(Error::Internal("should not run".to_string()))
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_compute_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let result = store.get_or_compute("broken.json", || -> Result<Json<Scores>> {
            Err(Error::InvalidInput("bad".to_string()))
        });

        assert!(result.is_err());
        assert!(!store.path_for("broken.json").exists());
    }

    #[test]
    fn test_missing_companion_forces_recompute() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        store
            .get_or_compute("df.csv", || -> Result<Pair> {
                Ok(Pair("data".to_string(), "ref".to_string()))
            })
            .unwrap();
        assert!(store.contains::<Pair>("df.csv"));

        std::fs::remove_file(dir.path().join("df_ref.csv")).unwrap();
        assert!(!store.contains::<Pair>("df.csv"));

        let rebuilt = store
            .get_or_compute("df.csv", || -> Result<Pair> {
                Ok(Pair("data2".to_string(), "ref2".to_string()))
            })
            .unwrap();
        assert_eq!(rebuilt, Pair("data2".to_string(), "ref2".to_string()));
    }

    #[test]
    fn test_stale_artifact_is_reused() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        store
            .get_or_compute("v.json", || -> Result<Json<u32>> { Ok(Json(1)) })
            .unwrap();
        let reused = store
            .get_or_compute("v.json", || -> Result<Json<u32>> { Ok(Json(2)) })
            .unwrap();

        assert_eq!(reused.into_inner(), 1);
    }

    #[test]
    fn test_floats_survive_reload_exactly() {
        use rand::Rng;

        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut rng = crate::Seed::new(17).rng(0);
        let mut values = vec![0.09828548969395995, 0.1 + 0.2, 1.0 / 3.0, 5e-324, 1.7976931348623157e308];
        values.extend((0..20_000).map(|_| rng.gen::<f64>() * 10f64.powi(rng.gen_range(-12..12))));
        let scores = Scores {
            name: "std".to_string(),
            values,
        };

        let saved = store
            .get_or_compute("floats.json", || -> Result<Json<Scores>> { Ok(Json(scores.clone())) })
            .unwrap();
        let loaded: Json<Scores> = Json::load(&store.path_for("floats.json")).unwrap();

        assert_eq!(saved.0, scores);
        assert_eq!(loaded.0, scores);
    }

    /// Serializes a few bytes, then fails
    struct Unwritable;

    impl Serialize for Unwritable {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            use serde::ser::{Error as _, SerializeSeq};
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&1)?;
            Err(S::Error::custom("disk full"))
        }
    }

    impl<'de> Deserialize<'de> for Unwritable {
        fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
            Vec::<u8>::deserialize(deserializer).map(|_| Unwritable)
        }
    }

    #[test]
    fn test_failed_save_leaves_no_cache_entry() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let result = store.get_or_compute("partial.json", || -> Result<Json<Unwritable>> {
            Ok(Json(Unwritable))
        });

        assert!(result.is_err());
        assert!(!store.contains::<Json<Unwritable>>("partial.json"));
        assert!(!dir.path().join(".partial.json.tmp").exists());
    }

    #[test]
    fn test_write_atomic_replaces_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "old").unwrap();

        let failed = write_atomic(&path, |w| -> Result<()> {
            w.write_all(b"half a ro")?;
            Err(Error::Internal("interrupted".to_string()))
        });
        assert!(failed.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");

        write_atomic(&path, |w| -> Result<()> {
            w.write_all(b"new")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_sibling_with_suffix() {
        assert_eq!(
            sibling_with_suffix(Path::new("data/df_an.csv"), "_ref"),
            PathBuf::from("data/df_an_ref.csv")
        );
        assert_eq!(
            sibling_with_suffix(Path::new("plain"), "_ref"),
            PathBuf::from("plain_ref")
        );
    }

    #[test]
    fn test_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested").join("cache"));

        store
            .get_or_compute("x.json", || -> Result<Json<Vec<u8>>> { Ok(Json(vec![1, 0, 1])) })
            .unwrap();

        assert!(dir.path().join("nested/cache/x.json").is_file());
    }
}
