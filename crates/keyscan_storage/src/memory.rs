//! In-memory ordered store.

use crate::backend::{Cursor, CursorKind, KvStore, StorageTx};
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Bucket = BTreeMap<Vec<u8>, Vec<u8>>;
type Buckets = BTreeMap<Vec<u8>, Bucket>;

/// An in-memory ordered key-value store.
///
/// This store keeps all buckets in memory and is suitable for:
/// - Unit and integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Transactions
///
/// Every transaction starts from an immutable snapshot of the store. Write
/// transactions copy the snapshot on their first modification and publish the
/// copy on commit, so readers never observe partial writes. At most one write
/// transaction is open at any time.
///
/// # Example
///
/// ```rust
/// use keyscan_storage::{InMemoryStore, KvStore};
///
/// let store = InMemoryStore::new();
/// let mut tx = store.begin(true).unwrap();
/// tx.create_bucket(b"b").unwrap();
/// tx.put(b"b", b"key", b"value").unwrap();
/// tx.commit().unwrap();
///
/// let tx = store.begin(false).unwrap();
/// assert_eq!(tx.get(b"b", b"key").unwrap().as_deref(), Some(&b"value"[..]));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Arc<Buckets>>,
    writer: Mutex<()>,
    closed: AtomicBool,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all buckets.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.data.read().keys().cloned().collect()
    }
}

impl KvStore for InMemoryStore {
    fn begin(&self, writable: bool) -> StorageResult<Box<dyn StorageTx + '_>> {
        if self.is_closed() {
            return Err(StorageError::Closed);
        }
        let writer = if writable {
            Some(self.writer.lock())
        } else {
            None
        };
        let snapshot = Arc::clone(&self.data.read());
        Ok(Box::new(MemoryTx {
            store: self,
            snapshot,
            writer,
        }))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Transaction over an [`InMemoryStore`] snapshot.
struct MemoryTx<'s> {
    store: &'s InMemoryStore,
    snapshot: Arc<Buckets>,
    writer: Option<MutexGuard<'s, ()>>,
}

impl MemoryTx<'_> {
    fn bucket(&self, name: &[u8]) -> StorageResult<&Bucket> {
        self.snapshot
            .get(name)
            .ok_or_else(|| StorageError::bucket_not_found(name))
    }

    fn bucket_mut(&mut self, name: &[u8]) -> StorageResult<&mut Bucket> {
        if self.writer.is_none() {
            return Err(StorageError::ReadOnly);
        }
        Arc::make_mut(&mut self.snapshot)
            .get_mut(name)
            .ok_or_else(|| StorageError::bucket_not_found(name))
    }
}

impl StorageTx for MemoryTx<'_> {
    fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    fn create_bucket(&mut self, bucket: &[u8]) -> StorageResult<()> {
        if self.writer.is_none() {
            return Err(StorageError::ReadOnly);
        }
        if !self.snapshot.contains_key(bucket) {
            Arc::make_mut(&mut self.snapshot).insert(bucket.to_vec(), Bucket::new());
        }
        Ok(())
    }

    fn delete_bucket(&mut self, bucket: &[u8]) -> StorageResult<()> {
        if self.writer.is_none() {
            return Err(StorageError::ReadOnly);
        }
        if !self.snapshot.contains_key(bucket) {
            return Err(StorageError::bucket_not_found(bucket));
        }
        Arc::make_mut(&mut self.snapshot).remove(bucket);
        Ok(())
    }

    fn has_bucket(&self, bucket: &[u8]) -> bool {
        self.snapshot.contains_key(bucket)
    }

    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.bucket_mut(bucket)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, bucket: &[u8], key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.bucket(bucket)?.get(key).cloned())
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> StorageResult<bool> {
        Ok(self.bucket_mut(bucket)?.remove(key).is_some())
    }

    fn len(&self, bucket: &[u8]) -> StorageResult<usize> {
        Ok(self.bucket(bucket)?.len())
    }

    fn range<'a>(
        &'a self,
        bucket: &[u8],
        prefix: &[u8],
        kind: CursorKind,
    ) -> StorageResult<Box<dyn Cursor + 'a>> {
        let entries = self.bucket(bucket)?;
        Ok(Box::new(MemoryCursor::new(entries, Some(prefix.to_vec()), kind)))
    }

    fn cursor<'a>(
        &'a self,
        bucket: &[u8],
        kind: CursorKind,
    ) -> StorageResult<Box<dyn Cursor + 'a>> {
        let entries = self.bucket(bucket)?;
        Ok(Box::new(MemoryCursor::new(entries, None, kind)))
    }

    fn commit(self: Box<Self>) -> StorageResult<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        if self.store.is_closed() {
            return Err(StorageError::Closed);
        }
        let this = *self;
        *this.store.data.write() = this.snapshot;
        drop(this.writer);
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

/// Cursor over one bucket of an [`InMemoryStore`] snapshot.
///
/// Each positioning call performs a single ordered lookup in the underlying
/// `BTreeMap`, so the cursor holds no iterator state besides the current
/// entry.
pub struct MemoryCursor<'a> {
    entries: &'a Bucket,
    prefix: Option<Vec<u8>>,
    kind: CursorKind,
    current: Option<(&'a [u8], &'a [u8])>,
}

impl<'a> MemoryCursor<'a> {
    fn new(entries: &'a Bucket, prefix: Option<Vec<u8>>, kind: CursorKind) -> Self {
        Self {
            entries,
            prefix,
            kind,
            current: None,
        }
    }

    fn position(&mut self, lower: Bound<&[u8]>) -> bool {
        let entries: &'a Bucket = self.entries;
        self.current = entries
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.as_slice(), v.as_slice()));

        if let (Some((key, _)), Some(prefix)) = (self.current, self.prefix.as_deref()) {
            if !key.starts_with(prefix) {
                self.current = None;
            }
        }
        self.current.is_some()
    }
}

impl Cursor for MemoryCursor<'_> {
    fn first(&mut self) -> bool {
        match self.prefix.clone() {
            Some(prefix) => self.position(Bound::Included(prefix.as_slice())),
            None => self.position(Bound::Unbounded),
        }
    }

    fn next(&mut self) -> bool {
        match self.current {
            Some((key, _)) => self.position(Bound::Excluded(key)),
            None => false,
        }
    }

    fn seek(&mut self, key: &[u8]) -> bool {
        match self.prefix.clone() {
            // seeking below the prefix lands on its first key
            Some(prefix) if key < prefix.as_slice() => {
                self.position(Bound::Included(prefix.as_slice()))
            }
            _ => self.position(Bound::Included(key)),
        }
    }

    fn key(&self) -> &[u8] {
        match self.current {
            Some((k, _)) => k,
            None => &[],
        }
    }

    fn value(&self) -> &[u8] {
        match (self.kind, self.current) {
            (CursorKind::Forward, Some((_, v))) => v,
            _ => &[],
        }
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(keys: &[&[u8]]) -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut tx = store.begin(true).unwrap();
        tx.create_bucket(b"b").unwrap();
        for key in keys {
            tx.put(b"b", key, b"v").unwrap();
        }
        tx.commit().unwrap();
        store
    }

    fn collect<C: Cursor + ?Sized>(cursor: &mut C) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        let mut ok = cursor.first();
        while ok {
            keys.push(cursor.key().to_vec());
            ok = cursor.next();
        }
        keys
    }

    #[test]
    fn memory_new_has_no_buckets() {
        let store = InMemoryStore::new();
        assert!(store.bucket_names().is_empty());
        let tx = store.begin(false).unwrap();
        assert!(!tx.has_bucket(b"b"));
        assert!(matches!(
            tx.get(b"b", b"k"),
            Err(StorageError::BucketNotFound { .. })
        ));
    }

    #[test]
    fn cursor_iterates_in_ascending_order() {
        let store = seeded(&[b"c", b"a", b"b\xff", b"b"]);
        let tx = store.begin(false).unwrap();
        let mut cursor = tx.cursor(b"b", CursorKind::Forward).unwrap();
        assert_eq!(
            collect(cursor.as_mut()),
            vec![b"a".to_vec(), b"b".to_vec(), b"b\xff".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn range_cursor_respects_prefix() {
        let store = seeded(&[b"\x01\x01", b"\x01\x02", b"\x02\x00", b"\x00\xff"]);
        let tx = store.begin(false).unwrap();
        let mut cursor = tx.range(b"b", b"\x01", CursorKind::KeysOnly).unwrap();
        assert_eq!(
            collect(cursor.as_mut()),
            vec![b"\x01\x01".to_vec(), b"\x01\x02".to_vec()]
        );
    }

    #[test]
    fn seek_positions_at_first_key_not_less() {
        let store = seeded(&[b"a", b"c", b"e"]);
        let tx = store.begin(false).unwrap();
        let mut cursor = tx.cursor(b"b", CursorKind::Forward).unwrap();

        assert!(cursor.seek(b"b"));
        assert_eq!(cursor.key(), b"c");
        assert!(cursor.seek(b"c"));
        assert_eq!(cursor.key(), b"c");
        assert!(!cursor.seek(b"f"));
        assert!(!cursor.is_valid());
    }

    #[test]
    fn seek_below_prefix_lands_on_prefix() {
        let store = seeded(&[b"a1", b"b1", b"b2"]);
        let tx = store.begin(false).unwrap();
        let mut cursor = tx.range(b"b", b"b", CursorKind::Forward).unwrap();
        assert!(cursor.seek(b"a"));
        assert_eq!(cursor.key(), b"b1");
    }

    #[test]
    fn keys_only_cursor_hides_values() {
        let store = seeded(&[b"a"]);
        let tx = store.begin(false).unwrap();
        let mut cursor = tx.cursor(b"b", CursorKind::KeysOnly).unwrap();
        assert!(cursor.first());
        assert!(cursor.value().is_empty());

        let mut cursor = tx.cursor(b"b", CursorKind::Forward).unwrap();
        assert!(cursor.first());
        assert_eq!(cursor.value(), b"v");
    }

    #[test]
    fn read_tx_rejects_writes() {
        let store = seeded(&[]);
        let mut tx = store.begin(false).unwrap();
        assert!(!tx.is_writable());
        assert!(matches!(tx.put(b"b", b"k", b"v"), Err(StorageError::ReadOnly)));
        assert!(matches!(tx.create_bucket(b"x"), Err(StorageError::ReadOnly)));
    }

    #[test]
    fn readers_see_snapshot() {
        let store = seeded(&[b"a"]);
        let reader = store.begin(false).unwrap();

        let mut writer = store.begin(true).unwrap();
        writer.put(b"b", b"z", b"v").unwrap();
        writer.commit().unwrap();

        assert_eq!(reader.len(b"b").unwrap(), 1);
        let fresh = store.begin(false).unwrap();
        assert_eq!(fresh.len(b"b").unwrap(), 2);
    }

    #[test]
    fn rollback_discards_changes() {
        let store = seeded(&[b"a"]);
        let mut tx = store.begin(true).unwrap();
        tx.put(b"b", b"z", b"v").unwrap();
        assert!(tx.delete(b"b", b"a").unwrap());
        tx.rollback();

        let tx = store.begin(false).unwrap();
        assert_eq!(tx.len(b"b").unwrap(), 1);
        assert!(tx.get(b"b", b"a").unwrap().is_some());
    }

    #[test]
    fn delete_bucket_removes_keys() {
        let store = seeded(&[b"a"]);
        let mut tx = store.begin(true).unwrap();
        tx.delete_bucket(b"b").unwrap();
        assert!(tx.delete_bucket(b"b").is_err());
        tx.commit().unwrap();
        assert!(store.bucket_names().is_empty());
    }

    #[test]
    fn closed_store_rejects_transactions() {
        let store = InMemoryStore::new();
        store.close();
        assert!(store.is_closed());
        assert!(matches!(store.begin(false), Err(StorageError::Closed)));
    }

    mod ordering {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Put(Vec<u8>),
            Delete(Vec<u8>),
        }

        fn key() -> impl Strategy<Value = Vec<u8>> {
            prop::collection::vec(prop_oneof![Just(0u8), Just(0xff), 0u8..4], 0..4)
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![3 => key().prop_map(Op::Put), 1 => key().prop_map(Op::Delete)]
        }

        /// Applies `ops` to a fresh store and to a sorted map.
        fn build(ops: &[Op]) -> (InMemoryStore, BTreeMap<Vec<u8>, Vec<u8>>) {
            let store = InMemoryStore::new();
            let mut model = BTreeMap::new();
            let mut tx = store.begin(true).unwrap();
            tx.create_bucket(b"b").unwrap();
            for op in ops {
                match op {
                    Op::Put(k) => {
                        let v: Vec<u8> = k.iter().rev().copied().collect();
                        tx.put(b"b", k, &v).unwrap();
                        model.insert(k.clone(), v);
                    }
                    Op::Delete(k) => {
                        assert_eq!(tx.delete(b"b", k).unwrap(), model.remove(k).is_some());
                    }
                }
            }
            tx.commit().unwrap();
            (store, model)
        }

        /// Entries from the cursor's current position onwards.
        fn rest<C: Cursor + ?Sized>(cursor: &mut C, mut ok: bool) -> Vec<(Vec<u8>, Vec<u8>)> {
            let mut out = Vec::new();
            while ok {
                out.push((cursor.key().to_vec(), cursor.value().to_vec()));
                ok = cursor.next();
            }
            out
        }

        proptest! {
            #[test]
            fn cursor_walks_like_sorted_map(ops in prop::collection::vec(op(), 0..40)) {
                let (store, model) = build(&ops);
                let tx = store.begin(false).unwrap();
                let mut cursor = tx.cursor(b"b", CursorKind::Forward).unwrap();
                let ok = cursor.first();
                let expected: Vec<_> = model.into_iter().collect();
                prop_assert_eq!(rest(cursor.as_mut(), ok), expected);
            }

            #[test]
            fn seek_then_next_matches_sorted_map(
                ops in prop::collection::vec(op(), 0..40),
                target in key(),
            ) {
                let (store, model) = build(&ops);
                let tx = store.begin(false).unwrap();
                let mut cursor = tx.cursor(b"b", CursorKind::KeysOnly).unwrap();
                let ok = cursor.seek(&target);
                let keys: Vec<Vec<u8>> = rest(cursor.as_mut(), ok).into_iter().map(|(k, _)| k).collect();
                let expected: Vec<Vec<u8>> = model.range(target..).map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(keys, expected);
            }

            #[test]
            fn prefix_seek_stays_inside_prefix(
                ops in prop::collection::vec(op(), 0..40),
                prefix in key(),
                target in key(),
            ) {
                let (store, model) = build(&ops);
                let tx = store.begin(false).unwrap();
                let mut cursor = tx.range(b"b", &prefix, CursorKind::KeysOnly).unwrap();

                let ok = cursor.first();
                let keys: Vec<Vec<u8>> = rest(cursor.as_mut(), ok).into_iter().map(|(k, _)| k).collect();
                let inside: Vec<Vec<u8>> = model
                    .keys()
                    .filter(|k| k.starts_with(&prefix))
                    .cloned()
                    .collect();
                prop_assert_eq!(&keys, &inside);

                let ok = cursor.seek(&target);
                let keys: Vec<Vec<u8>> = rest(cursor.as_mut(), ok).into_iter().map(|(k, _)| k).collect();
                let expected: Vec<Vec<u8>> = inside.into_iter().filter(|k| *k >= target).collect();
                prop_assert_eq!(keys, expected);
            }
        }
    }
}
