//! # Metadata Cache
//!
//! One slot per directory, keyed by the directory's canonical URI. Each slot
//! has its own mutex, held across generation: concurrent readers of the same
//! directory wait for a single scan, readers of different directories never
//! wait on each other.
//!
//! Slots are created by [`MetadataCache::get`] and never removed, only
//! emptied. [`MetadataCache::invalidate`] takes the slot lock, so it cannot
//! interleave with a generation in progress; a reader that arrives after an
//! invalidation always rescans.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use depot_core::ArtifactLocation;
use parking_lot::Mutex;

use crate::checksum::ChecksumKind;
use crate::error::MetadataError;
use crate::generator::{FsGenerator, MetadataGenerator};

/// A rendered index document.
#[derive(Debug)]
pub struct MetadataDocument {
    /// Canonical URI of the described directory.
    pub directory: String,
    /// Serialized XML.
    pub bytes: Arc<[u8]>,
    /// How many times this directory's document has been built.
    pub generation: u64,
    /// When the directory was scanned.
    pub generated_at: DateTime<Utc>,
}

impl MetadataDocument {
    /// Lowercase hex digest of the document bytes.
    pub fn checksum(&self, kind: ChecksumKind) -> String {
        kind.hex_digest(&self.bytes)
    }
}

#[derive(Debug, Default)]
struct Slot {
    document: Option<Arc<MetadataDocument>>,
    generation: u64,
}

/// Per-directory cache of generated index documents.
pub struct MetadataCache<G = FsGenerator> {
    entries: DashMap<String, Arc<Mutex<Slot>>>,
    generator: G,
}

impl Default for MetadataCache<FsGenerator> {
    fn default() -> Self {
        Self::new(FsGenerator)
    }
}

impl<G: MetadataGenerator> MetadataCache<G> {
    /// An empty cache that builds documents with `generator`.
    pub fn new(generator: G) -> Self {
        Self {
            entries: DashMap::new(),
            generator,
        }
    }

    /// Return the cached document for `directory`, generating it if absent.
    ///
    /// Blocks while another caller generates the same directory.
    pub fn get(&self, directory: &ArtifactLocation) -> Result<Arc<MetadataDocument>, MetadataError> {
        let key = directory.uri();
        let slot = Arc::clone(self.entries.entry(key.clone()).or_default().value());
        let mut slot = slot.lock();
        if let Some(document) = &slot.document {
            return Ok(Arc::clone(document));
        }

        let xml = self.generator.generate(directory)?.to_xml()?;
        slot.generation += 1;
        let document = Arc::new(MetadataDocument {
            directory: key,
            bytes: Arc::from(xml.into_bytes()),
            generation: slot.generation,
            generated_at: Utc::now(),
        });
        tracing::debug!(
            directory = %document.directory,
            generation = document.generation,
            "generated metadata document"
        );
        slot.document = Some(Arc::clone(&document));
        Ok(document)
    }

    /// Discard the cached document for `directory`. Returns whether one was cached.
    pub fn invalidate(&self, directory: &ArtifactLocation) -> bool {
        let key = directory.uri();
        let Some(slot) = self.entries.get(&key).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        let dropped = slot.lock().document.take().is_some();
        if dropped {
            tracing::debug!(directory = %key, "invalidated metadata document");
        }
        dropped
    }

    /// Number of directories with a cached document.
    pub fn len(&self) -> usize {
        self.slots()
            .iter()
            .filter(|slot| slot.lock().document.is_some())
            .count()
    }

    /// Whether no directory has a cached document.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard every cached document.
    pub fn clear(&self) {
        for slot in self.slots() {
            slot.lock().document = None;
        }
    }

    fn slots(&self) -> Vec<Arc<Mutex<Slot>>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

impl<G> std::fmt::Debug for MetadataCache<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("directories", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    use depot_core::RepositoryResolver;

    use crate::document::MavenMetadata;
    use crate::version::Version;

    /// Lists one version: the number of times it has been called.
    #[derive(Default)]
    struct CountingGenerator {
        calls: Arc<AtomicUsize>,
        gate: Arc<Mutex<()>>,
        entered_slow: Arc<AtomicBool>,
    }

    impl MetadataGenerator for CountingGenerator {
        fn generate(&self, directory: &ArtifactLocation) -> Result<MavenMetadata, MetadataError> {
            if directory.file_name() == Some("slow") {
                self.entered_slow.store(true, Ordering::SeqCst);
                drop(self.gate.lock());
            }
            if directory.file_name() == Some("empty") {
                return Err(MetadataError::NotFound(directory.uri()));
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            MavenMetadata::from_listing(directory, vec![Version::parse(&n.to_string())])
        }
    }

    fn dir(path: &str) -> ArtifactLocation {
        RepositoryResolver::new("/srv").resolve(path).unwrap()
    }

    #[test]
    fn repeated_gets_return_identical_bytes() {
        let cache = MetadataCache::new(CountingGenerator::default());
        let a = cache.get(&dir("/g/a")).unwrap();
        let b = cache.get(&dir("/g/a/")).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.generation, 1);
        assert_eq!(b.generation, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_forces_regeneration() {
        let cache = MetadataCache::new(CountingGenerator::default());
        let first = cache.get(&dir("/g/a")).unwrap();
        assert!(cache.invalidate(&dir("/g/a")));
        assert!(!cache.invalidate(&dir("/g/a")));
        let second = cache.get(&dir("/g/a")).unwrap();
        assert_eq!(second.generation, 2);
        assert_ne!(first.bytes, second.bytes);
    }

    #[test]
    fn invalidating_an_unknown_directory_is_a_no_op() {
        let cache = MetadataCache::new(CountingGenerator::default());
        assert!(!cache.invalidate(&dir("/never/seen")));
        assert!(cache.is_empty());
    }

    #[test]
    fn generation_errors_are_not_cached() {
        let cache = MetadataCache::new(CountingGenerator::default());
        assert!(matches!(
            cache.get(&dir("/g/empty")),
            Err(MetadataError::NotFound(_))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_readers_share_one_generation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(MetadataCache::new(CountingGenerator {
            calls: Arc::clone(&calls),
            ..Default::default()
        }));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get(&dir("/g/a")).unwrap().bytes.clone())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn different_directories_do_not_block_each_other() {
        let gate = Arc::new(Mutex::new(()));
        let entered = Arc::new(AtomicBool::new(false));
        let cache = Arc::new(MetadataCache::new(CountingGenerator {
            gate: Arc::clone(&gate),
            entered_slow: Arc::clone(&entered),
            ..Default::default()
        }));

        let held = gate.lock();
        let slow = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get(&dir("/g/slow")).map(|d| d.generation))
        };
        while !entered.load(Ordering::SeqCst) {
            thread::yield_now();
        }

        let fast = cache.get(&dir("/g/fast")).unwrap();
        assert_eq!(fast.directory, "/g/fast");

        drop(held);
        assert_eq!(slow.join().unwrap().unwrap(), 1);
    }

    #[test]
    fn clear_empties_every_slot() {
        let cache = MetadataCache::new(CountingGenerator::default());
        cache.get(&dir("/g/a")).unwrap();
        cache.get(&dir("/g/b")).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&dir("/g/a")).unwrap().generation, 2);
    }

    #[test]
    fn checksums_cover_the_cached_bytes() {
        let cache = MetadataCache::new(CountingGenerator::default());
        let doc = cache.get(&dir("/g/a")).unwrap();
        assert_eq!(
            doc.checksum(ChecksumKind::Sha256),
            ChecksumKind::Sha256.hex_digest(&doc.bytes)
        );
    }

    #[test]
    fn filesystem_listing_change_is_visible_after_invalidation() {
        let tmp = tempfile::tempdir().unwrap();
        let resolver = RepositoryResolver::new(tmp.path());
        std::fs::create_dir_all(tmp.path().join("g/a/1.0")).unwrap();
        std::fs::write(tmp.path().join("g/a/1.0/a-1.0.jar"), b"x").unwrap();

        let cache = MetadataCache::<FsGenerator>::default();
        let directory = resolver.resolve("/g/a/").unwrap();
        let before = cache.get(&directory).unwrap();
        assert!(!String::from_utf8_lossy(&before.bytes).contains("2.0"));

        std::fs::create_dir_all(tmp.path().join("g/a/2.0")).unwrap();
        std::fs::write(tmp.path().join("g/a/2.0/a-2.0.jar"), b"x").unwrap();
        let stale = cache.get(&directory).unwrap();
        assert_eq!(stale.bytes, before.bytes);

        cache.invalidate(&directory);
        let after = cache.get(&directory).unwrap();
        assert!(String::from_utf8_lossy(&after.bytes).contains("<version>2.0</version>"));
    }
}
