//! Ordered secondary index.
//!
//! Each index owns one storage bucket. For every row it stores the key
//!
//! ```text
//! encode(field_0) ‖ encode(field_1) ‖ … ‖ encode(field_k) ‖ be_u64(row_id)
//! ```
//!
//! with an empty value. Field encodings are order-preserving and prefix-free,
//! so any condition on a run of leading fields maps onto one contiguous key
//! range.

use std::collections::HashMap;

use keyscan_codec::{encode_value, EncodingConfig, FieldType};
use keyscan_storage::StorageTx;
use tracing::{debug, trace};

use super::bounds::{leaf_bounds, ScanBounds};
use super::scan::{scan_prefix, scan_range};
use super::traits::{IndexScan, IndexSpec, QueryableIndex};
use crate::bitmap::RowBitmap;
use crate::context::QueryContext;
use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, FilterMode, FilterTreeNode, ScanMarks};
use crate::record::RowSource;
use crate::schema::Schema;
use crate::stats::IndexStats;
use crate::types::{FieldId, NodeId, RowId};

/// A field of an ordered index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    /// Field id in the table schema.
    pub id: FieldId,
    /// Field name.
    pub name: String,
    /// Declared type.
    pub ty: FieldType,
}

/// An index over one or more fields, kept in a sorted storage bucket.
#[derive(Debug)]
pub struct OrderedIndex {
    name: String,
    bucket: Vec<u8>,
    fields: Vec<IndexField>,
    stats: IndexStats,
}

impl OrderedIndex {
    /// Creates an index for `schema` from a specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the specification has no fields, repeats a field
    /// or names a field the schema lacks.
    pub fn new(schema: &Schema, spec: &IndexSpec) -> CoreResult<Self> {
        if spec.fields.is_empty() {
            return Err(CoreError::invalid_schema(format!(
                "index {} has no fields",
                spec.name
            )));
        }
        let mut fields: Vec<IndexField> = Vec::with_capacity(spec.fields.len());
        for name in &spec.fields {
            let field = schema.resolve(name)?;
            if fields.iter().any(|f| f.id == field.id) {
                return Err(CoreError::invalid_schema(format!(
                    "index {} repeats field {name}",
                    spec.name
                )));
            }
            fields.push(IndexField {
                id: field.id,
                name: field.name.clone(),
                ty: field.ty,
            });
        }
        Ok(Self {
            bucket: format!("idx:{}:{}", schema.name(), spec.name).into_bytes(),
            name: spec.name.clone(),
            fields,
            stats: IndexStats::new(),
        })
    }

    /// Returns the storage bucket of the index.
    pub fn bucket(&self) -> &[u8] {
        &self.bucket
    }

    /// Returns the indexed fields in key order.
    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    /// Returns the index counters.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Builds the index key of a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row lacks an indexed field or a value does
    /// not encode.
    pub fn key_for<R: RowSource + ?Sized>(&self, row: &R, row_id: RowId) -> CoreResult<Vec<u8>> {
        let cfg = EncodingConfig::ordered();
        let mut key = Vec::new();
        for field in &self.fields {
            let value = row.value(field.id).ok_or_else(|| {
                CoreError::invalid_operation(format!(
                    "row {row_id} lacks field {} of index {}",
                    field.name, self.name
                ))
            })?;
            encode_value(&mut key, field.ty, value, &cfg)?;
        }
        key.extend_from_slice(&row_id.to_be_bytes());
        Ok(key)
    }

    /// Adds a row to the index.
    pub(crate) fn add<R: RowSource + ?Sized>(
        &self,
        tx: &mut dyn StorageTx,
        row: &R,
        row_id: RowId,
    ) -> CoreResult<()> {
        let key = self.key_for(row, row_id)?;
        tx.put(&self.bucket, &key, &[])?;
        Ok(())
    }

    /// Removes a row from the index.
    pub(crate) fn remove<R: RowSource + ?Sized>(
        &self,
        tx: &mut dyn StorageTx,
        row: &R,
        row_id: RowId,
    ) -> CoreResult<()> {
        let key = self.key_for(row, row_id)?;
        tx.delete(&self.bucket, &key)?;
        Ok(())
    }

    /// Returns true if the index's leading field is filtered by a
    /// range-scannable mode.
    fn serves_leading(&self, filter: &Filter) -> bool {
        self.fields.first().is_some_and(|f| f.id == filter.field_id)
            && filter.mode.is_range_scannable()
    }

    fn run(&self, ctx: &QueryContext<'_>, bounds: &ScanBounds) -> CoreResult<RowBitmap> {
        let bits = match bounds {
            ScanBounds::Prefix(prefix) => {
                let (bits, keys) = scan_prefix(ctx, &self.name, &self.bucket, prefix)?;
                self.stats.record_prefix_scan(keys);
                bits
            }
            ScanBounds::Range(range) => {
                let (bits, keys) = scan_range(ctx, &self.name, &self.bucket, range)?;
                self.stats.record_range_scan(keys);
                bits
            }
            ScanBounds::Empty => RowBitmap::new(),
        };
        trace!(index = %self.name, %bounds, rows = bits.count(), "index scan finished");
        Ok(bits)
    }

    fn not_applicable(&self, reason: &str) -> Option<IndexScan> {
        self.stats.record_not_applicable();
        trace!(index = %self.name, reason, "index not applicable");
        None
    }
}

impl QueryableIndex for OrderedIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn field_ids(&self) -> Vec<FieldId> {
        self.fields.iter().map(|f| f.id).collect()
    }

    fn can_match(&self, node: &FilterTreeNode) -> bool {
        match node {
            FilterTreeNode::Leaf { filter, .. } => self.serves_leading(filter),
            FilterTreeNode::Branch { or_kind: true, .. } => false,
            FilterTreeNode::Branch { children, .. } => children
                .iter()
                .filter_map(FilterTreeNode::filter)
                .any(|f| self.serves_leading(f)),
        }
    }

    fn query(
        &self,
        ctx: &QueryContext<'_>,
        node: &FilterTreeNode,
        marks: &mut ScanMarks,
    ) -> CoreResult<Option<IndexScan>> {
        let FilterTreeNode::Leaf { id, filter } = node else {
            return Err(CoreError::invalid_condition("invalid branch node"));
        };
        if self.fields.first().map(|f| f.id) != Some(filter.field_id) {
            return Ok(self.not_applicable("field is not the leading index field"));
        }
        let Some(bounds) = leaf_bounds(&[], filter)? else {
            return Ok(self.not_applicable("mode has no key range"));
        };

        debug!(index = %self.name, leaf = %filter, %bounds, "single field scan");
        let bits = self.run(ctx, &bounds)?;
        marks.mark(*id);
        Ok(Some(IndexScan::exact(bits)))
    }

    fn query_composite(
        &self,
        ctx: &QueryContext<'_>,
        node: &FilterTreeNode,
        marks: &mut ScanMarks,
    ) -> CoreResult<Option<IndexScan>> {
        let FilterTreeNode::Branch {
            or_kind, children, ..
        } = node
        else {
            return Err(CoreError::invalid_condition("invalid leaf node"));
        };
        if *or_kind {
            return Err(CoreError::invalid_condition("invalid OR node condition"));
        }

        // First occurrence per field wins; later duplicates stay unproven.
        let mut eq: HashMap<FieldId, (NodeId, &Filter)> = HashMap::new();
        let mut ex: HashMap<FieldId, (NodeId, &Filter)> = HashMap::new();
        for child in children {
            let FilterTreeNode::Leaf { id, filter } = child else {
                continue;
            };
            let slot = match filter.mode {
                FilterMode::Equal => &mut eq,
                FilterMode::Lt
                | FilterMode::Le
                | FilterMode::Gt
                | FilterMode::Ge
                | FilterMode::Range => &mut ex,
                _ => continue,
            };
            slot.entry(filter.field_id).or_insert((*id, filter));
        }

        let cfg = EncodingConfig::ordered();
        let mut prefix = Vec::new();
        let mut proven = Vec::new();
        let mut extra = None;
        for field in &self.fields {
            if let Some(&(id, filter)) = eq.get(&field.id) {
                let value = filter.value.as_scalar().ok_or_else(|| {
                    CoreError::invalid_condition(format!("equality on {} without operand", filter.name))
                })?;
                encode_value(&mut prefix, field.ty, value, &cfg)?;
                proven.push(id);
                continue;
            }
            extra = ex.get(&field.id).copied();
            break;
        }

        if prefix.is_empty() && extra.is_none() {
            return Ok(self.not_applicable("no condition on the leading field"));
        }

        let bounds = match extra {
            None => ScanBounds::Prefix(prefix),
            Some((id, filter)) => match leaf_bounds(&prefix, filter)? {
                Some(bounds) => {
                    proven.push(id);
                    bounds
                }
                None => ScanBounds::Prefix(prefix),
            },
        };

        debug!(index = %self.name, proven = proven.len(), %bounds, "composite scan");
        let bits = self.run(ctx, &bounds)?;
        for id in proven {
            marks.mark(id);
        }
        Ok(Some(IndexScan::exact(bits)))
    }
}
