//! Concurrent first-write-wins person store.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::record::PersonRecord;

/// Concurrent mapping from person name to [`PersonRecord`].
///
/// Synchronization is internal (sharded locks), so every method takes `&self`
/// and the directory is meant to be shared behind an `Arc`. Inserts never
/// overwrite: the first record stored under a name wins.
#[derive(Debug, Default)]
pub struct Directory {
    records: DashMap<String, PersonRecord>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under its name unless that name is already taken.
    ///
    /// Returns `true` once the name is present, whether this call stored the
    /// record or an earlier one did. A duplicate name is not an error; the
    /// later record is discarded.
    pub fn insert(&self, record: PersonRecord) -> bool {
        match self.records.entry(record.name.clone()) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    name = %existing.key(),
                    "name already present, keeping first record"
                );
            }
            Entry::Vacant(slot) => {
                tracing::debug!(name = %slot.key(), id = record.id, "stored person");
                slot.insert(record);
            }
        }
        true
    }

    /// Look up the record stored under `name`.
    pub fn lookup(&self, name: &str) -> Option<PersonRecord> {
        self.records.get(name).map(|entry| entry.value().clone())
    }

    /// Iterate over every stored record in no particular order.
    ///
    /// The iteration is weakly consistent: records inserted while it runs may
    /// or may not be yielded. The iterator holds shard read guards while it is
    /// alive, so it must be drained before the next `.await`.
    pub fn scan(&self) -> impl Iterator<Item = PersonRecord> + '_ {
        self.records.iter().map(|entry| entry.value().clone())
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the directory holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
