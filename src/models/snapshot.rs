// One complete tick of results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{MetricResult, MetricValue, SampleFailure};

/// Immutable, complete set of per-source results for one tick.
///
/// Every registered key has exactly one entry; built only through [`Snapshot::assemble`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    sequence: u64,
    /// Wall-clock start of the tick, milliseconds since the Unix epoch.
    timestamp: u64,
    entries: BTreeMap<String, MetricResult>,
}

impl Snapshot {
    /// Join collected results against the registered key set.
    ///
    /// Keys without a result are filled with a source failure; results for keys that are not
    /// registered are dropped. The returned snapshot always holds exactly `keys`.
    pub fn assemble<K, I>(sequence: u64, timestamp: u64, keys: K, results: I) -> Self
    where
        K: IntoIterator,
        K::Item: AsRef<str>,
        I: IntoIterator<Item = (String, MetricResult)>,
    {
        let mut collected: BTreeMap<String, MetricResult> = results.into_iter().collect();
        let entries = keys
            .into_iter()
            .map(|k| {
                let key = k.as_ref().to_string();
                let result = collected.remove(&key).unwrap_or_else(|| {
                    MetricResult::Failed(SampleFailure::Source("no result collected".into()))
                });
                (key, result)
            })
            .collect();
        if !collected.is_empty() {
            tracing::debug!(
                unexpected = collected.len(),
                "dropping results for unregistered keys"
            );
        }
        Self {
            sequence,
            timestamp,
            entries,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MetricResult> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricResult)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Successful value for `key`, if any.
    pub fn value(&self, key: &str) -> Option<&MetricValue> {
        self.get(key).and_then(MetricResult::value)
    }

    /// Number of entries that failed this tick.
    pub fn failed_count(&self) -> usize {
        self.entries.values().filter(|r| !r.is_ok()).count()
    }
}
