use crate::config::ReconciliationConfig;
use crate::schema::{DailyEntry, DataOrigin};
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Date-keyed reconciliation of daily entries from several sources.
///
/// For each date a field is taken from the first batch, in priority order,
/// whose value for that field is non-zero and non-null. Imported batches
/// rank ahead of allocated ones; batches of equal origin keep push order.
pub struct CanonicalMerger<'a> {
    config: &'a ReconciliationConfig,
    batches: Vec<(DataOrigin, BTreeMap<NaiveDate, DailyEntry>)>,
}

impl<'a> CanonicalMerger<'a> {
    pub fn new(config: &'a ReconciliationConfig) -> Self {
        Self {
            config,
            batches: Vec::new(),
        }
    }

    /// Adds one source's entries. Within a batch the last entry for a date wins.
    pub fn push(&mut self, origin: DataOrigin, entries: Vec<DailyEntry>) -> &mut Self {
        let mut by_date = BTreeMap::new();
        for entry in entries {
            by_date.insert(entry.date, entry);
        }
        self.batches.push((origin, by_date));
        self
    }

    /// Merged entries, strictly ascending by date.
    pub fn finish(self) -> Vec<DailyEntry> {
        let mut batches = self.batches;
        batches.sort_by_key(|(origin, _)| *origin);

        let mut merged: BTreeMap<NaiveDate, DailyEntry> = BTreeMap::new();
        let mut dropped = 0usize;

        for (_, entries) in batches {
            for (date, entry) in entries {
                if !self.config.allows(date) {
                    dropped += 1;
                    continue;
                }
                match merged.get_mut(&date) {
                    Some(existing) => existing.fill_missing_from(&entry),
                    None => {
                        merged.insert(date, entry);
                    }
                }
            }
        }

        debug!(
            "Merged {} dates ({} entries before the earliest period dropped)",
            merged.len(),
            dropped
        );
        merged.into_values().collect()
    }
}

/// Merges `(origin, entries)` batches in one call.
pub fn merge_entries(
    config: &ReconciliationConfig,
    batches: Vec<(DataOrigin, Vec<DailyEntry>)>,
) -> Vec<DailyEntry> {
    let mut merger = CanonicalMerger::new(config);
    for (origin, entries) in batches {
        merger.push(origin, entries);
    }
    merger.finish()
}
