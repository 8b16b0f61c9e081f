//! Game state store.
//!
//! All game state lives in one consolidated JSON record under [`RECORD_KEY`].
//! Older deployments kept one key per field; [`StateStore::migrate`] folds
//! those into the record once at startup, after which only the record is read.
//!
//! Every write is a read-modify-write of the whole record against a store
//! with no compare-and-swap. Two writers racing on the same record can lose
//! an update: whichever writes last wins, even when they touched different
//! fields. [`StateStore::update_object`] narrows the window to one round trip
//! but cannot close it.

use crate::error::Result;
use crate::kv::KvStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key holding the consolidated record.
pub const RECORD_KEY: &str = "state";

/// Current layout version of the consolidated record.
pub const SCHEMA_VERSION: u64 = 1;

/// The durable game state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Last accepted count. `None` until the first submission.
    #[serde(rename = "number", default, skip_serializing_if = "Option::is_none")]
    pub current_count: Option<u64>,

    /// Who submitted `current_count`. `None` means anyone may count next.
    #[serde(default)]
    pub last_counter: Option<String>,

    /// Count recorded by the previous daily report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_daily_count: Option<u64>,
}

impl GameState {
    /// The count to validate against; an unstarted game behaves as zero.
    pub fn effective_count(&self) -> u64 {
        self.current_count.unwrap_or(0)
    }

    /// Merge a patch into this state.
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(count) = patch.current_count {
            self.current_count = Some(count);
        }
        if let Some(counter) = patch.last_counter {
            self.last_counter = counter;
        }
        if let Some(count) = patch.last_daily_count {
            self.last_daily_count = Some(count);
        }
    }
}

/// A partial update: `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    pub current_count: Option<u64>,
    /// `Some(None)` clears the last counter.
    pub last_counter: Option<Option<String>>,
    pub last_daily_count: Option<u64>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_count(mut self, count: u64) -> Self {
        self.current_count = Some(count);
        self
    }

    pub fn last_counter(mut self, counter: impl Into<String>) -> Self {
        self.last_counter = Some(Some(counter.into()));
        self
    }

    pub fn clear_last_counter(mut self) -> Self {
        self.last_counter = Some(None);
        self
    }

    pub fn last_daily_count(mut self, count: u64) -> Self {
        self.last_daily_count = Some(count);
        self
    }
}

/// A single typed field of [`GameState`].
pub trait StateField {
    type Value: Clone + Send;

    /// Field name in the record, also the legacy per-field key.
    const NAME: &'static str;

    fn read(state: &GameState) -> Option<Self::Value>;

    fn patch(value: Self::Value) -> StatePatch;
}

/// `number`: the last accepted count.
pub struct CurrentCount;

/// `lastCounter`: identity of the last accepted submitter.
pub struct LastCounter;

/// `lastDailyCount`: count at the previous daily report.
pub struct LastDailyCount;

impl StateField for CurrentCount {
    type Value = u64;
    const NAME: &'static str = "number";

    fn read(state: &GameState) -> Option<u64> {
        state.current_count
    }

    fn patch(value: u64) -> StatePatch {
        StatePatch::new().current_count(value)
    }
}

impl StateField for LastCounter {
    type Value = String;
    const NAME: &'static str = "lastCounter";

    fn read(state: &GameState) -> Option<String> {
        state.last_counter.clone()
    }

    fn patch(value: String) -> StatePatch {
        StatePatch::new().last_counter(value)
    }
}

impl StateField for LastDailyCount {
    type Value = u64;
    const NAME: &'static str = "lastDailyCount";

    fn read(state: &GameState) -> Option<u64> {
        state.last_daily_count
    }

    fn patch(value: u64) -> StatePatch {
        StatePatch::new().last_daily_count(value)
    }
}

/// The record as persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(default)]
    schema_version: u64,

    #[serde(flatten)]
    state: GameState,
}

/// Typed access to the game state, backed by a [`KvStore`].
///
/// Holds no cached state: every call goes to the store.
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn KvStore>,
}

impl StateStore {
    /// Wrap a key-value store.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Read the whole state. Missing record reads as the empty state.
    pub async fn load(&self) -> Result<GameState> {
        Ok(self.load_record().await?.state)
    }

    /// Read one field.
    pub async fn get<F: StateField>(&self) -> Result<Option<F::Value>> {
        Ok(F::read(&self.load().await?))
    }

    /// Write one field by merging it into the record.
    ///
    /// Prefer [`update_object`](Self::update_object) when changing more than
    /// one field: sequential `put`s widen the lost-update window.
    pub async fn put<F: StateField>(&self, value: F::Value) -> Result<()> {
        self.update_object(F::patch(value)).await?;
        Ok(())
    }

    /// Merge several fields in a single read-modify-write pass.
    ///
    /// Returns the state as written.
    pub async fn update_object(&self, patch: StatePatch) -> Result<GameState> {
        let mut record = self.load_record().await?;
        record.state.apply(patch);
        self.store_record(&record).await?;
        Ok(record.state)
    }

    /// Fold legacy per-field keys into the consolidated record.
    ///
    /// Fields already present in the record (even as `null`) win over legacy
    /// keys. Returns `true` if the record was rewritten; a second call is a
    /// no-op.
    pub async fn migrate(&self) -> Result<bool> {
        let mut fields = match self.kv.get(RECORD_KEY).await? {
            Some(raw) => serde_json::from_str::<Map<String, Value>>(&raw)?,
            None => Map::new(),
        };

        let version = fields
            .get("schemaVersion")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if version >= SCHEMA_VERSION {
            return Ok(false);
        }

        for (name, numeric) in [
            (CurrentCount::NAME, true),
            (LastCounter::NAME, false),
            (LastDailyCount::NAME, true),
        ] {
            if fields.contains_key(name) {
                continue;
            }
            let Some(raw) = self.kv.get(name).await? else {
                continue;
            };
            if let Some(value) = legacy_value(name, &raw, numeric) {
                tracing::info!(field = name, "Migrating legacy state key");
                fields.insert(name.to_string(), value);
            }
        }

        fields.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));

        // Round-trip through the typed record so a bad legacy value fails here.
        let record: StoredRecord = serde_json::from_value(Value::Object(fields))?;
        self.store_record(&record).await?;
        tracing::info!(version = SCHEMA_VERSION, "State record migrated");
        Ok(true)
    }

    async fn load_record(&self) -> Result<StoredRecord> {
        match self.kv.get(RECORD_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(StoredRecord::default()),
        }
    }

    async fn store_record(&self, record: &StoredRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.kv.put(RECORD_KEY, raw).await
    }
}

/// Interpret a legacy per-field value. Empty values count as unset.
fn legacy_value(name: &str, raw: &str, numeric: bool) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if !numeric {
        return Some(Value::from(raw));
    }
    match raw.parse::<u64>() {
        Ok(n) => Some(Value::from(n)),
        Err(e) => {
            tracing::warn!(field = name, value = raw, "Skipping unparseable legacy value: {}", e);
            None
        }
    }
}
