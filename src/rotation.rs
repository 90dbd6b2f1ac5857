//! Round-robin catalog rotation with a persisted cursor.
//!
//! Each catalog carries a single integer cursor persisted to disk.
//! Every cycle takes the next contiguous window of the catalog,
//! wrapping to the front when it runs off the end, and advances the
//! cursor immediately — rotation position depends only on what was
//! dispatched this cycle, never on submission outcomes. An absent or
//! unreadable cursor means "start of catalog" and is never an error.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::catalog::CatalogItem;

// ---------------------------------------------------------------------------
// Cursor store
// ---------------------------------------------------------------------------

/// Durable storage for one rotation cursor.
pub trait CursorStore {
    /// Load the cursor. `None` when absent or unreadable.
    fn load(&self) -> Option<usize>;

    /// Persist the cursor.
    fn store(&self, cursor: usize) -> std::io::Result<()>;
}

/// Cursor persisted as a single base-10 integer in a plain text file.
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> Option<usize> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        match contents.trim().parse() {
            Ok(cursor) => Some(cursor),
            Err(_) => {
                warn!(path = %self.path.display(), "Corrupt cursor file, resetting to start");
                None
            }
        }
    }

    fn store(&self, cursor: usize) -> std::io::Result<()> {
        std::fs::write(&self.path, cursor.to_string())
    }
}

// ---------------------------------------------------------------------------
// Slice selection
// ---------------------------------------------------------------------------

/// Select the next rotation window of `window_size` items and advance
/// the persisted cursor.
///
/// The window starts at the stored cursor (0 when absent). A cursor at
/// or past the end of the catalog wraps to the front. A window that
/// runs off the end from a mid-catalog start is filled from the front,
/// and the cursor lands at the wrap point. The cursor is persisted
/// before returning, regardless of what later happens to the items; a
/// failed write is logged and the slice is returned anyway, so the
/// worst case repeats items rather than skipping them.
pub fn select_slice(
    catalog: &[CatalogItem],
    window_size: usize,
    store: &dyn CursorStore,
) -> Vec<CatalogItem> {
    if catalog.is_empty() || window_size == 0 {
        return Vec::new();
    }

    let mut start = store.load().unwrap_or(0);
    if start >= catalog.len() {
        start = 0;
    }
    let end = (start + window_size).min(catalog.len());

    let mut items: Vec<CatalogItem> = catalog[start..end].to_vec();
    // Clamp to the catalog end: a cursor equal to the catalog size is
    // the "wrapped, restart next time" marker.
    let mut new_cursor = (start + window_size).min(catalog.len());

    // Ran off the end mid-catalog: fill from the front and leave the
    // cursor at the wrap point.
    if items.len() < window_size && start > 0 {
        let remaining = (window_size - items.len()).min(catalog.len());
        items.extend_from_slice(&catalog[..remaining]);
        new_cursor = remaining;
    }

    if let Err(e) = store.store(new_cursor) {
        warn!(error = %e, new_cursor, "Failed to persist rotation cursor");
    }
    debug!(start, new_cursor, selected = items.len(), "Rotation slice selected");

    items
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemKind;
    use std::cell::Cell;

    /// In-memory cursor store for algorithm tests.
    struct MemStore {
        cursor: Cell<Option<usize>>,
        fail_writes: bool,
    }

    impl MemStore {
        fn new(initial: Option<usize>) -> Self {
            Self {
                cursor: Cell::new(initial),
                fail_writes: false,
            }
        }
    }

    impl CursorStore for MemStore {
        fn load(&self) -> Option<usize> {
            self.cursor.get()
        }

        fn store(&self, cursor: usize) -> std::io::Result<()> {
            if self.fail_writes {
                return Err(std::io::Error::other("disk full"));
            }
            self.cursor.set(Some(cursor));
            Ok(())
        }
    }

    fn catalog(size: usize) -> Vec<CatalogItem> {
        (0..size)
            .map(|i| CatalogItem::new(&format!("item-{i}"), ItemKind::Model, &format!("url-{i}")))
            .collect()
    }

    fn names(items: &[CatalogItem]) -> Vec<String> {
        items.iter().map(|i| i.name.clone()).collect()
    }

    #[test]
    fn test_wrap_sequence_c5_w3() {
        let cat = catalog(5);
        let store = MemStore::new(None);

        assert_eq!(names(&select_slice(&cat, 3, &store)), ["item-0", "item-1", "item-2"]);
        assert_eq!(store.load(), Some(3));

        assert_eq!(names(&select_slice(&cat, 3, &store)), ["item-3", "item-4", "item-0"]);
        // Wrap-around fill: cursor lands at the wrap point, not at 5.
        assert_eq!(store.load(), Some(1));

        assert_eq!(names(&select_slice(&cat, 3, &store)), ["item-1", "item-2", "item-3"]);
        assert_eq!(store.load(), Some(4));

        assert_eq!(names(&select_slice(&cat, 3, &store)), ["item-4", "item-0", "item-1"]);
        assert_eq!(store.load(), Some(2));
    }

    #[test]
    fn test_missing_cursor_behaves_like_zero() {
        let cat = catalog(4);
        let missing = MemStore::new(None);
        let zero = MemStore::new(Some(0));
        assert_eq!(
            names(&select_slice(&cat, 2, &missing)),
            names(&select_slice(&cat, 2, &zero)),
        );
    }

    #[test]
    fn test_cursor_at_or_past_end_wraps() {
        let cat = catalog(4);

        // cursor == catalogSize is the "wrapped to start next time" marker.
        let store = MemStore::new(Some(4));
        assert_eq!(names(&select_slice(&cat, 2, &store)), ["item-0", "item-1"]);
        assert_eq!(store.load(), Some(2));

        let store = MemStore::new(Some(99));
        assert_eq!(names(&select_slice(&cat, 2, &store)), ["item-0", "item-1"]);
    }

    #[test]
    fn test_small_catalog_from_zero_returns_whole_catalog() {
        // C < W starting at 0: no wrap fill, exactly C items.
        let cat = catalog(2);
        let store = MemStore::new(None);
        let slice = select_slice(&cat, 3, &store);
        assert_eq!(names(&slice), ["item-0", "item-1"]);
        // Cursor parks at the end marker, wrapping on the next call.
        assert_eq!(store.load(), Some(2));
        assert_eq!(names(&select_slice(&cat, 3, &store)), ["item-0", "item-1"]);
    }

    #[test]
    fn test_small_catalog_midstart_duplicates() {
        // C < W from a mid-catalog cursor wraps within the same call.
        let cat = catalog(2);
        let store = MemStore::new(Some(1));
        let slice = select_slice(&cat, 3, &store);
        assert_eq!(names(&slice), ["item-1", "item-0", "item-1"]);
        assert_eq!(store.load(), Some(2));
    }

    #[test]
    fn test_full_traversal_visits_every_index() {
        for (c, w) in [(5usize, 3usize), (7, 2), (6, 6), (10, 4), (3, 1)] {
            let cat = catalog(c);
            let store = MemStore::new(None);
            let calls = c.div_ceil(w);
            let mut seen = std::collections::HashSet::new();
            for _ in 0..calls {
                let slice = select_slice(&cat, w, &store);
                assert_eq!(slice.len(), w.min(c));
                for item in slice {
                    seen.insert(item.name);
                }
            }
            assert_eq!(seen.len(), c, "C={c} W={w} missed some items");
        }
    }

    #[test]
    fn test_store_failure_still_returns_slice() {
        let cat = catalog(5);
        let mut store = MemStore::new(Some(2));
        store.fail_writes = true;
        let slice = select_slice(&cat, 2, &store);
        assert_eq!(names(&slice), ["item-2", "item-3"]);
        // Cursor unchanged: next run repeats rather than skips.
        assert_eq!(store.load(), Some(2));
    }

    #[test]
    fn test_empty_catalog_and_zero_window() {
        let store = MemStore::new(None);
        assert!(select_slice(&[], 3, &store).is_empty());
        assert!(select_slice(&catalog(3), 0, &store).is_empty());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let mut path = std::env::temp_dir();
        path.push(format!("trainer_cursor_{}.txt", uuid::Uuid::new_v4()));
        let store = FileCursorStore::new(&path);

        assert_eq!(store.load(), None);
        store.store(7).unwrap();
        assert_eq!(store.load(), Some(7));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_corrupt_resets() {
        let mut path = std::env::temp_dir();
        path.push(format!("trainer_cursor_{}.txt", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not a number").unwrap();

        let store = FileCursorStore::new(&path);
        assert_eq!(store.load(), None);

        std::fs::remove_file(&path).unwrap();
    }
}
