//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `affiliates` - Placement tree nodes (key: affiliate_id)
//! - `orders` - Orders with embedded items (key: order_id)
//! - `users` - Login accounts (key: user_id)
//! - `sequences` - Monotonic counters (key: scope string)
//! - `audit` - Append-only audit log (key: UUIDv7, time-ordered)
//! - `indices` - Secondary indices for fast lookups
//!
//! Multi-row mutations stage into a [`WriteTx`] and commit as one RocksDB
//! `WriteBatch`, so an enrollment or payment confirmation is all-or-nothing.
//! The `(parent, side)` placement slot is itself an index key, which is what
//! makes position-taken checks O(1) and slot uniqueness enforceable inside
//! the same batch.

use crate::{
    audit::AuditRecord,
    error::{Error, Result},
    identity::UserAccount,
    types::{AffiliateNode, Order, PlacementSide},
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_AFFILIATES: &str = "affiliates";
const CF_ORDERS: &str = "orders";
const CF_USERS: &str = "users";
const CF_SEQUENCES: &str = "sequences";
const CF_AUDIT: &str = "audit";
const CF_INDICES: &str = "indices";

/// Index key prefixes
const IDX_PLACEMENT: &[u8] = b"p|";
const IDX_AFFILIATE_EMAIL: &[u8] = b"ae|";
const IDX_USER_EMAIL: &[u8] = b"ue|";
const IDX_CODE: &[u8] = b"c|";
const IDX_ORDER_NUMBER: &[u8] = b"on|";
const IDX_AFFILIATE_ORDER: &[u8] = b"ao|";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for write-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_AFFILIATES, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_ORDERS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_USERS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_SEQUENCES, Self::cf_options_sequences()),
            ColumnFamilyDescriptor::new(CF_AUDIT, Self::cf_options_audit()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB for placement ledger");

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_records() -> Options {
        let mut opts = Options::default();
        // Records are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_sequences() -> Options {
        Options::default()
    }

    fn cf_options_audit() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Affiliate operations

    /// Get affiliate by ID, including soft-deleted rows
    pub fn get_affiliate_raw(&self, id: Uuid) -> Result<Option<AffiliateNode>> {
        let cf = self.cf_handle(CF_AFFILIATES)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Get a live (not soft-deleted) affiliate by ID
    pub fn get_affiliate(&self, id: Uuid) -> Result<AffiliateNode> {
        match self.get_affiliate_raw(id)? {
            Some(a) if !a.is_deleted() => Ok(a),
            _ => Err(Error::AffiliateNotFound(id.to_string())),
        }
    }

    /// Look up a live affiliate by code
    pub fn get_affiliate_by_code(&self, code: &str) -> Result<AffiliateNode> {
        let cf = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key(IDX_CODE, code.as_bytes());

        let id = match self.db.get_cf(cf, &key)? {
            Some(bytes) => uuid_from_value(&bytes)?,
            None => return Err(Error::AffiliateNotFound(code.to_string())),
        };

        self.get_affiliate(id)
    }

    /// Whether any live affiliate exists (the first enrollment is the only
    /// sponsor-less one)
    pub fn any_live_affiliate(&self) -> Result<bool> {
        let cf = self.cf_handle(CF_AFFILIATES)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        for item in iter {
            let (_, value) = item?;
            let affiliate: AffiliateNode = bincode::deserialize(&value)?;
            if !affiliate.is_deleted() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Occupant of a `(parent, side)` placement slot.
    ///
    /// A slot, once taken, stays taken; soft delete does not free it.
    pub fn placement_occupant(&self, parent: Uuid, side: PlacementSide) -> Result<Option<Uuid>> {
        let cf = self.cf_handle(CF_INDICES)?;
        let key = Self::placement_key(parent, side);

        match self.db.get_cf(cf, &key)? {
            Some(bytes) => Ok(Some(uuid_from_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Live children of a node, left and right
    pub fn children_of(
        &self,
        parent: Uuid,
    ) -> Result<(Option<AffiliateNode>, Option<AffiliateNode>)> {
        let left = self.child_on(parent, PlacementSide::Left)?;
        let right = self.child_on(parent, PlacementSide::Right)?;
        Ok((left, right))
    }

    fn child_on(&self, parent: Uuid, side: PlacementSide) -> Result<Option<AffiliateNode>> {
        match self.placement_occupant(parent, side)? {
            Some(id) => match self.get_affiliate_raw(id)? {
                Some(a) if !a.is_deleted() => Ok(Some(a)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Whether an email is taken in the user directory or by a live affiliate
    pub fn email_in_use(&self, email: &str) -> Result<bool> {
        let cf = self.cf_handle(CF_INDICES)?;

        let user_key = Self::index_key(IDX_USER_EMAIL, email.as_bytes());
        if self.db.get_cf(cf, &user_key)?.is_some() {
            return Ok(true);
        }

        let affiliate_key = Self::index_key(IDX_AFFILIATE_EMAIL, email.as_bytes());
        if let Some(bytes) = self.db.get_cf(cf, &affiliate_key)? {
            let id = uuid_from_value(&bytes)?;
            if let Some(a) = self.get_affiliate_raw(id)? {
                if !a.is_deleted() {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    // Order operations

    /// Get order by ID
    pub fn get_order(&self, id: Uuid) -> Result<Order> {
        let cf = self.cf_handle(CF_ORDERS)?;
        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::OrderNotFound(id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Orders of one affiliate (via index), insertion order
    pub fn orders_of(&self, affiliate_id: Uuid) -> Result<Vec<Order>> {
        let cf = self.cf_handle(CF_INDICES)?;

        let mut prefix = IDX_AFFILIATE_ORDER.to_vec();
        prefix.extend_from_slice(affiliate_id.as_bytes());

        let iter = self.db.prefix_iterator_cf(cf, &prefix);

        let mut orders = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if key.len() >= prefix.len() + 16 {
                let order_id = uuid_from_value(&key[prefix.len()..prefix.len() + 16])?;
                orders.push(self.get_order(order_id)?);
            }
        }

        Ok(orders)
    }

    // User operations

    /// Get user account by ID
    pub fn get_user(&self, id: Uuid) -> Result<Option<UserAccount>> {
        let cf = self.cf_handle(CF_USERS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Sequence operations

    /// Last committed value for a sequence scope (0 if never allocated)
    pub fn sequence_value(&self, scope: &str) -> Result<u64> {
        let cf = self.cf_handle(CF_SEQUENCES)?;
        match self.db.get_cf(cf, scope.as_bytes())? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage(format!("Corrupt sequence value for {}", scope)))?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    // Audit operations

    /// Newest-first scan of the audit log
    pub fn recent_audit(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        let cf = self.cf_handle(CF_AUDIT)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::End);

        let mut records = Vec::with_capacity(limit);
        for item in iter.take(limit) {
            let (_, value) = item?;
            // Audit records carry serde_json::Value fields, which bincode
            // cannot deserialize; the audit CF is JSON-encoded.
            records.push(
                serde_json::from_slice(&value)
                    .map_err(|e| bincode::Error::from(bincode::ErrorKind::Custom(e.to_string())))?,
            );
        }

        Ok(records)
    }

    // Transactions

    /// Begin a staged write transaction
    pub fn begin(&self) -> WriteTx<'_> {
        WriteTx {
            storage: self,
            batch: WriteBatch::default(),
        }
    }

    /// Commit a staged transaction atomically
    pub fn commit(&self, tx: WriteTx<'_>) -> Result<()> {
        self.db.write(tx.batch)?;
        Ok(())
    }

    // Index key helpers

    fn index_key(prefix: &[u8], rest: &[u8]) -> Vec<u8> {
        let mut key = prefix.to_vec();
        key.extend_from_slice(rest);
        key
    }

    fn placement_key(parent: Uuid, side: PlacementSide) -> Vec<u8> {
        let mut key = IDX_PLACEMENT.to_vec();
        key.extend_from_slice(parent.as_bytes());
        key.push(side.key_byte());
        key
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

fn uuid_from_value(bytes: &[u8]) -> Result<Uuid> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| Error::Storage("Corrupt UUID in index".to_string()))?;
    Ok(Uuid::from_bytes(arr))
}

/// Staged multi-CF write, committed atomically via [`Storage::commit`].
///
/// Dropping a `WriteTx` without committing discards every staged write,
/// which is why a failed enrollment neither persists rows nor burns a
/// sequence number.
pub struct WriteTx<'a> {
    storage: &'a Storage,
    batch: WriteBatch,
}

impl WriteTx<'_> {
    /// Stage an affiliate row plus its code and email indices
    pub fn put_affiliate(&mut self, affiliate: &AffiliateNode) -> Result<()> {
        let cf = self.storage.cf_handle(CF_AFFILIATES)?;
        let value = bincode::serialize(affiliate)?;
        self.batch.put_cf(cf, affiliate.id.as_bytes(), &value);

        let cf_idx = self.storage.cf_handle(CF_INDICES)?;
        let code_key = Storage::index_key(IDX_CODE, affiliate.code.as_str().as_bytes());
        self.batch.put_cf(cf_idx, &code_key, affiliate.id.as_bytes());

        let email_key = Storage::index_key(IDX_AFFILIATE_EMAIL, affiliate.email.as_bytes());
        self.batch.put_cf(cf_idx, &email_key, affiliate.id.as_bytes());

        Ok(())
    }

    /// Stage an updated affiliate row only (indices unchanged)
    pub fn update_affiliate(&mut self, affiliate: &AffiliateNode) -> Result<()> {
        let cf = self.storage.cf_handle(CF_AFFILIATES)?;
        let value = bincode::serialize(affiliate)?;
        self.batch.put_cf(cf, affiliate.id.as_bytes(), &value);
        Ok(())
    }

    /// Stage the placement-slot index entry for a newly placed node
    pub fn put_placement(
        &mut self,
        parent: Uuid,
        side: PlacementSide,
        child: Uuid,
    ) -> Result<()> {
        let cf = self.storage.cf_handle(CF_INDICES)?;
        let key = Storage::placement_key(parent, side);
        self.batch.put_cf(cf, &key, child.as_bytes());
        Ok(())
    }

    /// Stage an order row plus its number and per-affiliate indices
    pub fn put_order(&mut self, order: &Order) -> Result<()> {
        let cf = self.storage.cf_handle(CF_ORDERS)?;
        let value = bincode::serialize(order)?;
        self.batch.put_cf(cf, order.id.as_bytes(), &value);

        let cf_idx = self.storage.cf_handle(CF_INDICES)?;
        let number_key =
            Storage::index_key(IDX_ORDER_NUMBER, order.order_number.as_str().as_bytes());
        self.batch.put_cf(cf_idx, &number_key, order.id.as_bytes());

        let mut ao_key = IDX_AFFILIATE_ORDER.to_vec();
        ao_key.extend_from_slice(order.affiliate_id.as_bytes());
        ao_key.extend_from_slice(order.id.as_bytes());
        self.batch.put_cf(cf_idx, &ao_key, &[]);

        Ok(())
    }

    /// Stage a user account plus its email index
    pub fn put_user(&mut self, user: &UserAccount) -> Result<()> {
        let cf = self.storage.cf_handle(CF_USERS)?;
        let value = bincode::serialize(user)?;
        self.batch.put_cf(cf, user.id.as_bytes(), &value);

        let cf_idx = self.storage.cf_handle(CF_INDICES)?;
        let email_key = Storage::index_key(IDX_USER_EMAIL, user.email.as_bytes());
        self.batch.put_cf(cf_idx, &email_key, user.id.as_bytes());

        Ok(())
    }

    /// Stage a sequence value
    pub fn put_sequence(&mut self, scope: &str, value: u64) -> Result<()> {
        let cf = self.storage.cf_handle(CF_SEQUENCES)?;
        self.batch.put_cf(cf, scope.as_bytes(), value.to_be_bytes());
        Ok(())
    }

    /// Stage an audit record
    pub fn put_audit(&mut self, record: &AuditRecord) -> Result<()> {
        let cf = self.storage.cf_handle(CF_AUDIT)?;
        let value = serde_json::to_vec(record)
            .map_err(|e| bincode::Error::from(bincode::ErrorKind::Custom(e.to_string())))?;
        self.batch.put_cf(cf, record.id.as_bytes(), &value);
        Ok(())
    }
}
