//! Index scan executors.
//!
//! Every index key ends with the 8-byte big-endian row id. Both executors
//! walk keys in ascending order, recover the row id of each key and collect
//! them into a fresh bitmap. Offset and limit are not applied here; every
//! matching key is visited.

use keyscan_storage::CursorKind;

use crate::bitmap::RowBitmap;
use crate::context::QueryContext;
use crate::error::{CoreError, CoreResult};
use crate::keyrange::KeyRange;
use crate::types::RowId;

/// Width of the row id suffix of every index key.
pub const ROW_ID_LEN: usize = 8;

/// Recovers the row id from the end of an index key.
///
/// # Errors
///
/// Returns [`CoreError::CorruptIndexKey`] for keys shorter than 8 bytes.
pub fn row_id_from_key(index: &str, key: &[u8]) -> CoreResult<RowId> {
    let corrupt = || CoreError::CorruptIndexKey {
        index: index.to_string(),
        len: key.len(),
    };
    let start = key.len().checked_sub(ROW_ID_LEN).ok_or_else(corrupt)?;
    let suffix: [u8; ROW_ID_LEN] = key[start..].try_into().map_err(|_| corrupt())?;
    Ok(RowId::from_be_bytes(suffix))
}

/// Collects the row ids of every key in `bucket` starting with `prefix`.
///
/// Returns the bitmap and the number of keys visited.
///
/// # Errors
///
/// Propagates storage errors, corrupt keys and cancellation.
pub fn scan_prefix(
    ctx: &QueryContext<'_>,
    index: &str,
    bucket: &[u8],
    prefix: &[u8],
) -> CoreResult<(RowBitmap, u64)> {
    let tx = ctx.read_tx()?;
    let mut cursor = tx.range(bucket, prefix, CursorKind::KeysOnly)?;
    let mut bits = RowBitmap::new();
    let mut keys = 0u64;

    let mut valid = cursor.first();
    while valid {
        keys += 1;
        ctx.poll_cancelled(keys)?;
        bits.set(row_id_from_key(index, cursor.key())?);
        valid = cursor.next();
    }
    Ok((bits, keys))
}

/// Collects the row ids of every key in `bucket` inside `range`.
///
/// Returns the bitmap and the number of keys visited.
///
/// # Errors
///
/// Propagates storage errors, corrupt keys and cancellation.
pub fn scan_range(
    ctx: &QueryContext<'_>,
    index: &str,
    bucket: &[u8],
    range: &KeyRange,
) -> CoreResult<(RowBitmap, u64)> {
    let mut bits = RowBitmap::new();
    if range.is_empty() {
        return Ok((bits, 0));
    }
    let tx = ctx.read_tx()?;
    let mut cursor = tx.cursor(bucket, CursorKind::KeysOnly)?;
    let mut keys = 0u64;

    let mut valid = cursor.seek(&range.from);
    while valid && range.below_upper(cursor.key()) {
        keys += 1;
        ctx.poll_cancelled(keys)?;
        bits.set(row_id_from_key(index, cursor.key())?);
        valid = cursor.next();
    }
    Ok((bits, keys))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use crate::context::CancelToken;
    use keyscan_storage::{InMemoryStore, KvStore};

    const BUCKET: &[u8] = b"idx";

    fn key(field: u8, row: u64) -> Vec<u8> {
        let mut k = vec![field];
        k.extend_from_slice(&row.to_be_bytes());
        k
    }

    fn store_with(keys: &[Vec<u8>]) -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut tx = store.begin(true).unwrap();
        tx.create_bucket(BUCKET).unwrap();
        for k in keys {
            tx.put(BUCKET, k, b"").unwrap();
        }
        tx.commit().unwrap();
        store
    }

    #[test]
    fn row_id_suffix() {
        assert_eq!(row_id_from_key("i", &key(9, 77)).unwrap(), 77);
        assert!(matches!(
            row_id_from_key("i", &[1, 2, 3]),
            Err(CoreError::CorruptIndexKey { len: 3, .. })
        ));
    }

    #[test]
    fn prefix_scan_collects_matching_rows() {
        let store = store_with(&[key(1, 10), key(2, 20), key(2, 21), key(3, 30)]);
        let ctx = QueryContext::new(&store);
        let (bits, keys) = scan_prefix(&ctx, "i", BUCKET, &[2]).unwrap();
        assert_eq!(bits.to_vec(), vec![20, 21]);
        assert_eq!(keys, 2);
    }

    #[test]
    fn range_scan_is_half_open() {
        let store = store_with(&[key(1, 10), key(2, 20), key(3, 30), key(4, 40)]);
        let ctx = QueryContext::new(&store);
        let range = KeyRange::new(vec![2], Some(vec![4]));
        let (bits, _) = scan_range(&ctx, "i", BUCKET, &range).unwrap();
        assert_eq!(bits.to_vec(), vec![20, 30]);

        let open = KeyRange::new(vec![3], None);
        let (bits, _) = scan_range(&ctx, "i", BUCKET, &open).unwrap();
        assert_eq!(bits.to_vec(), vec![30, 40]);

        let empty = KeyRange::new(vec![3], Some(vec![3]));
        let (bits, keys) = scan_range(&ctx, "i", BUCKET, &empty).unwrap();
        assert!(bits.is_empty());
        assert_eq!(keys, 0);
    }

    #[test]
    fn short_key_is_corruption() {
        let store = store_with(&[vec![1, 2]]);
        let ctx = QueryContext::new(&store);
        assert!(matches!(
            scan_prefix(&ctx, "i", BUCKET, &[]),
            Err(CoreError::CorruptIndexKey { .. })
        ));
    }

    #[test]
    fn cancelled_scan_stops() {
        let store = store_with(&[key(1, 1), key(1, 2), key(1, 3)]);
        let token = CancelToken::new();
        token.cancel();
        let ctx = QueryContext::new(&store)
            .with_config(QueryConfig::new().cancel_check_interval(2))
            .with_cancel_token(token);
        assert!(matches!(
            scan_prefix(&ctx, "i", BUCKET, &[1]),
            Err(CoreError::Cancelled)
        ));
    }

    #[test]
    fn missing_bucket_is_storage_error() {
        let store = InMemoryStore::new();
        let ctx = QueryContext::new(&store);
        assert!(matches!(
            scan_prefix(&ctx, "i", b"nope", &[]),
            Err(CoreError::Storage(_))
        ));
    }
}
