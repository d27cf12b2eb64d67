use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use serde::Serialize;

use super::record::ExecutionRecord;
use crate::types::Category;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total: u64,
    pub successful: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub average_latency_ms: f64,
    pub per_category: BTreeMap<Category, CategoryStats>,
}

#[derive(Default)]
struct Totals {
    total: u64,
    successful: u64,
    latency_ms_sum: u64,
    per_category: BTreeMap<Category, (u64, u64)>,
}

struct Inner {
    records: VecDeque<ExecutionRecord>,
    totals: Totals,
}

/// Bounded ring of recent records plus running statistics. Statistics cover
/// every record ever appended, not only the retained ones.
pub struct ExecutionHistory {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                records: VecDeque::with_capacity(capacity),
                totals: Totals::default(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&self, records: &[ExecutionRecord]) {
        let mut inner = self.lock();
        for record in records {
            let t = &mut inner.totals;
            t.total += 1;
            t.latency_ms_sum += record.execution_time_ms;
            let cat = t.per_category.entry(record.category).or_default();
            cat.0 += 1;
            if record.success {
                t.successful += 1;
                cat.1 += 1;
            }
            if inner.records.len() == self.capacity {
                inner.records.pop_front();
            }
            inner.records.push_back(record.clone());
        }
    }

    /// Newest `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ExecutionRecord> {
        let inner = self.lock();
        let skip = inner.records.len().saturating_sub(n);
        inner.records.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ExecutionStats {
        let inner = self.lock();
        let t = &inner.totals;
        let ratio = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        ExecutionStats {
            total: t.total,
            successful: t.successful,
            failed: t.total - t.successful,
            success_rate: ratio(t.successful, t.total),
            average_latency_ms: ratio(t.latency_ms_sum, t.total),
            per_category: t
                .per_category
                .iter()
                .map(|(c, (total, ok))| {
                    (
                        *c,
                        CategoryStats {
                            total: *total,
                            successful: *ok,
                            success_rate: ratio(*ok, *total),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.records.clear();
        inner.totals = Totals::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
