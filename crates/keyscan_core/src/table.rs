//! Tables: encoded rows plus the ordered indexes kept in sync with them.
//!
//! A table owns one data bucket, `tbl:{name}`, holding every row under its
//! big-endian primary key, and one bucket per [`OrderedIndex`]. Writes update
//! the data bucket and every index inside a single storage transaction.
//!
//! Queries run inside the [`QueryContext`]'s read transaction and pick one of
//! the [`ExecutionStrategy`] variants:
//!
//! 1. match-all trees walk every row;
//! 2. an unsatisfiable primary key range returns nothing without reading;
//! 3. an exact index plan fetches the candidate rows by id;
//! 4. an inexact plan fetches the candidates and re-checks what the scans
//!    did not prove;
//! 5. otherwise the rows inside the primary key range are scanned and
//!    checked in full.

use keyscan_storage::{CursorKind, KvStore, StorageTx};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::config::QueryOptions;
use crate::context::QueryContext;
use crate::error::{CoreError, CoreResult};
use crate::filter::FilterTree;
use crate::index::{IndexSpec, OrderedIndex, QueryableIndex};
use crate::pk::{pk_range, PkRange};
use crate::plan::{CoveragePlan, IndexPlanner};
use crate::record::{decode_row, encode_row, row_key, Record};
use crate::residual::{match_residual, match_tree};
use crate::schema::Schema;
use crate::stats::{ExecutionStrategy, IndexStatsSnapshot, PlanStats};
use crate::types::{RowId, NO_PK};

/// A table of rows with ordered secondary indexes.
#[derive(Debug)]
pub struct Table {
    schema: Schema,
    data_bucket: Vec<u8>,
    indexes: RwLock<Vec<OrderedIndex>>,
}

impl Table {
    /// Creates the table's data bucket if needed and returns the table.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the bucket cannot be created.
    pub fn create(store: &dyn KvStore, schema: Schema) -> CoreResult<Self> {
        let data_bucket = format!("tbl:{}", schema.name()).into_bytes();
        let mut tx = store.begin(true)?;
        if !tx.has_bucket(&data_bucket) {
            tx.create_bucket(&data_bucket)?;
        }
        tx.commit()?;
        debug!(table = schema.name(), fields = schema.fields().len(), "table created");
        Ok(Self {
            schema,
            data_bucket,
            indexes: RwLock::new(Vec::new()),
        })
    }

    /// Returns the table schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the data bucket name.
    pub fn data_bucket(&self) -> &[u8] {
        &self.data_bucket
    }

    /// Returns the index names in declaration order.
    pub fn index_names(&self) -> Vec<String> {
        self.indexes.read().iter().map(|i| i.name().to_string()).collect()
    }

    /// Returns the counters of an index.
    pub fn index_stats(&self, name: &str) -> Option<IndexStatsSnapshot> {
        self.indexes
            .read()
            .iter()
            .find(|i| i.name() == name)
            .map(|i| i.stats().snapshot())
    }

    /// Declares an index and builds it from the rows already stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, the specification is invalid,
    /// or an existing row lacks an indexed field.
    pub fn add_index(&self, store: &dyn KvStore, spec: IndexSpec) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        if indexes.iter().any(|i| i.name() == spec.name) {
            return Err(CoreError::invalid_schema(format!(
                "index {} already exists on {}",
                spec.name,
                self.schema.name()
            )));
        }
        let index = OrderedIndex::new(&self.schema, &spec)?;

        let mut tx = store.begin(true)?;
        if tx.has_bucket(index.bucket()) {
            tx.delete_bucket(index.bucket())?;
        }
        tx.create_bucket(index.bucket())?;
        let rows = self.load_all(tx.as_ref())?;
        for (row_id, record) in &rows {
            index.add(tx.as_mut(), record, *row_id)?;
        }
        tx.commit()?;

        debug!(table = self.schema.name(), index = %spec.name, rows = rows.len(), "index built");
        indexes.push(index);
        Ok(())
    }

    /// Inserts a new row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateRow`] if the primary key is taken, and
    /// an error if the row lacks its primary key or an indexed field.
    pub fn insert(&self, store: &dyn KvStore, record: Record) -> CoreResult<RowId> {
        let indexes = self.indexes.read();
        let mut tx = store.begin(true)?;
        let row_id = self.insert_in(tx.as_mut(), &indexes, record)?;
        tx.commit()?;
        Ok(row_id)
    }

    /// Inserts several rows in one transaction.
    ///
    /// Nothing is written if any row fails.
    ///
    /// # Errors
    ///
    /// Same as [`Table::insert`].
    pub fn insert_many(
        &self,
        store: &dyn KvStore,
        records: impl IntoIterator<Item = Record>,
    ) -> CoreResult<Vec<RowId>> {
        let indexes = self.indexes.read();
        let mut tx = store.begin(true)?;
        let ids = records
            .into_iter()
            .map(|record| self.insert_in(tx.as_mut(), &indexes, record))
            .collect::<CoreResult<Vec<_>>>()?;
        tx.commit()?;
        debug!(table = self.schema.name(), rows = ids.len(), "rows inserted");
        Ok(ids)
    }

    /// Replaces an existing row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RowNotFound`] if no row has the primary key.
    pub fn update(&self, store: &dyn KvStore, record: Record) -> CoreResult<()> {
        let (row_id, record) = self.normalize(record)?;
        let indexes = self.indexes.read();
        let mut tx = store.begin(true)?;
        let old = self
            .load(tx.as_ref(), row_id)?
            .ok_or(CoreError::RowNotFound { row_id })?;
        for index in indexes.iter() {
            index.remove(tx.as_mut(), &old, row_id)?;
        }
        tx.put(&self.data_bucket, &row_key(row_id), &encode_row(&self.schema, &record)?)?;
        for index in indexes.iter() {
            index.add(tx.as_mut(), &record, row_id)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes a row. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage or decoding error.
    pub fn delete(&self, store: &dyn KvStore, row_id: RowId) -> CoreResult<bool> {
        let indexes = self.indexes.read();
        let mut tx = store.begin(true)?;
        let Some(old) = self.load(tx.as_ref(), row_id)? else {
            return Ok(false);
        };
        for index in indexes.iter() {
            index.remove(tx.as_mut(), &old, row_id)?;
        }
        tx.delete(&self.data_bucket, &row_key(row_id))?;
        tx.commit()?;
        Ok(true)
    }

    /// Reads one row through the context's transaction.
    ///
    /// # Errors
    ///
    /// Returns a storage or decoding error.
    pub fn get(&self, ctx: &QueryContext<'_>, row_id: RowId) -> CoreResult<Option<Record>> {
        self.load(ctx.read_tx()?, row_id)
    }

    /// Returns the rows matching `tree`, in primary key order.
    ///
    /// # Errors
    ///
    /// Propagates storage, decoding and index errors, and cancellation.
    pub fn query(
        &self,
        ctx: &QueryContext<'_>,
        tree: &FilterTree,
        options: QueryOptions,
    ) -> CoreResult<Vec<Record>> {
        self.query_with_stats(ctx, tree, options).map(|(rows, _)| rows)
    }

    /// Like [`Table::query`], also returning how the query ran.
    ///
    /// # Errors
    ///
    /// Same as [`Table::query`].
    pub fn query_with_stats(
        &self,
        ctx: &QueryContext<'_>,
        tree: &FilterTree,
        options: QueryOptions,
    ) -> CoreResult<(Vec<Record>, PlanStats)> {
        if options.limit == Some(0) {
            let stats = PlanStats {
                strategy: ExecutionStrategy::Empty,
                ..PlanStats::default()
            };
            return Ok((Vec::new(), stats));
        }
        let mut rows = Vec::new();
        let mut skipped = 0usize;
        let stats = self.execute(ctx, tree, &mut |record: Record| {
            if options.limit.is_some_and(|limit| rows.len() >= limit) {
                return false;
            }
            if skipped < options.offset {
                skipped += 1;
                return true;
            }
            rows.push(record);
            !options.limit.is_some_and(|limit| rows.len() >= limit)
        })?;
        Ok((rows, stats))
    }

    /// Counts the rows matching `tree`.
    ///
    /// # Errors
    ///
    /// Same as [`Table::query`].
    pub fn count(&self, ctx: &QueryContext<'_>, tree: &FilterTree) -> CoreResult<u64> {
        let stats = self.execute(ctx, tree, &mut |_: Record| true)?;
        Ok(stats.rows_matched)
    }

    /// Plans `tree` against the table's indexes without reading rows.
    ///
    /// The index scans the plan needs do run; their row ids are returned in
    /// the plan.
    ///
    /// # Errors
    ///
    /// Propagates scan errors and cancellation.
    pub fn plan(&self, ctx: &QueryContext<'_>, tree: &FilterTree) -> CoreResult<CoveragePlan> {
        let indexes = self.indexes.read();
        let planner = IndexPlanner::new(indexes.iter().map(|i| i as &dyn QueryableIndex));
        planner.plan(ctx, tree.root())
    }

    /// Runs `tree`, handing each matching row to `visit` in primary key
    /// order until it returns false.
    fn execute(
        &self,
        ctx: &QueryContext<'_>,
        tree: &FilterTree,
        visit: &mut dyn FnMut(Record) -> bool,
    ) -> CoreResult<PlanStats> {
        let mut stats = PlanStats::default();
        let root = tree.root();

        if tree.is_match_all() {
            stats.strategy = ExecutionStrategy::MatchAll;
            self.scan_rows(ctx, PkRange::FULL, &mut stats, &mut |_: &Record| true, visit)?;
            return Ok(stats);
        }

        let pk = pk_range(root, &self.schema);
        if pk.is_empty() {
            debug!(table = self.schema.name(), condition = %tree, "primary key range is empty");
            stats.strategy = ExecutionStrategy::Empty;
            return Ok(stats);
        }

        let plan = self.plan(ctx, tree)?;
        stats.index_scans = plan.index_scans;

        let Some(bits) = plan.bits else {
            debug!(table = self.schema.name(), condition = %tree, %pk, "full scan");
            stats.strategy = ExecutionStrategy::FullScan;
            self.scan_rows(ctx, pk, &mut stats, &mut |record: &Record| match_tree(root, record), visit)?;
            if stats.rows_scanned > ctx.config().scan_warning_threshold {
                warn!(
                    table = self.schema.name(),
                    rows = stats.rows_scanned,
                    condition = %tree,
                    "full scan visited many rows"
                );
            }
            return Ok(stats);
        };

        stats.strategy = if plan.exact {
            ExecutionStrategy::IndexExact
        } else {
            ExecutionStrategy::IndexResidual
        };
        stats.index_hits = bits.count();
        debug!(
            table = self.schema.name(),
            strategy = ?stats.strategy,
            candidates = stats.index_hits,
            "index plan chosen"
        );

        let tx = ctx.read_tx()?;
        for row_id in bits.iter().filter(|id| pk.contains(*id)) {
            stats.rows_scanned += 1;
            ctx.poll_cancelled(stats.rows_scanned)?;
            let Some(record) = self.load(tx, row_id)? else {
                warn!(table = self.schema.name(), row_id, "indexed row is missing");
                continue;
            };
            if !plan.exact && !match_residual(root, &record, &plan.proven) {
                continue;
            }
            stats.rows_matched += 1;
            if !visit(record) {
                break;
            }
        }
        trace!(table = self.schema.name(), matched = stats.rows_matched, "index execution done");
        Ok(stats)
    }

    /// Walks the rows whose primary key lies in `pk`.
    fn scan_rows(
        &self,
        ctx: &QueryContext<'_>,
        pk: PkRange,
        stats: &mut PlanStats,
        keep: &mut dyn FnMut(&Record) -> bool,
        visit: &mut dyn FnMut(Record) -> bool,
    ) -> CoreResult<()> {
        let tx = ctx.read_tx()?;
        let mut cursor = tx.cursor(&self.data_bucket, CursorKind::Forward)?;
        let upper = row_key(pk.max);

        let mut valid = cursor.seek(&row_key(pk.min));
        while valid && cursor.key() <= upper.as_slice() {
            stats.rows_scanned += 1;
            ctx.poll_cancelled(stats.rows_scanned)?;
            let record = decode_row(&self.schema, cursor.value())?;
            if keep(&record) {
                stats.rows_matched += 1;
                if !visit(record) {
                    break;
                }
            }
            valid = cursor.next();
        }
        Ok(())
    }

    fn load(&self, tx: &dyn StorageTx, row_id: RowId) -> CoreResult<Option<Record>> {
        tx.get(&self.data_bucket, &row_key(row_id))?
            .map(|bytes| decode_row(&self.schema, &bytes))
            .transpose()
    }

    fn load_all(&self, tx: &dyn StorageTx) -> CoreResult<Vec<(RowId, Record)>> {
        let mut cursor = tx.cursor(&self.data_bucket, CursorKind::Forward)?;
        let mut rows = Vec::new();
        let mut valid = cursor.first();
        while valid {
            let record = decode_row(&self.schema, cursor.value())?;
            let row_id = record.row_id(&self.schema).ok_or_else(|| {
                CoreError::invalid_operation("stored row lacks its primary key")
            })?;
            rows.push((row_id, record));
            valid = cursor.next();
        }
        Ok(rows)
    }

    fn insert_in(
        &self,
        tx: &mut dyn StorageTx,
        indexes: &[OrderedIndex],
        record: Record,
    ) -> CoreResult<RowId> {
        let (row_id, record) = self.normalize(record)?;
        let key = row_key(row_id);
        if tx.get(&self.data_bucket, &key)?.is_some() {
            return Err(CoreError::DuplicateRow { row_id });
        }
        tx.put(&self.data_bucket, &key, &encode_row(&self.schema, &record)?)?;
        for index in indexes {
            index.add(tx, &record, row_id)?;
        }
        trace!(table = self.schema.name(), row_id, "row inserted");
        Ok(row_id)
    }

    /// Casts every value to its declared type and extracts the row id.
    fn normalize(&self, record: Record) -> CoreResult<(RowId, Record)> {
        let mut normalized = Record::new();
        for (id, value) in record.iter() {
            let field = self
                .schema
                .field(id)
                .ok_or_else(|| CoreError::unknown_field(id.to_string()))?;
            normalized.set(id, field.ty.cast(value)?);
        }
        match normalized.row_id(&self.schema) {
            Some(NO_PK) | None => Err(CoreError::invalid_operation(format!(
                "row for {} needs a non-zero {}",
                self.schema.name(),
                self.schema.primary().name
            ))),
            Some(row_id) => Ok((row_id, normalized)),
        }
    }
}
