use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::domain::{Category, SalaryInput};
use super::estimator::round_to;

/// One successful prediction as retained in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    pub timestamp: String,
    #[serde(rename = "input_data")]
    pub input: SalaryInput,
    pub predicted_salary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_predictions: usize,
    pub average_salary: f64,
    pub most_common_job: String,
    pub salary_range: SalaryRange,
}

impl StatisticsSummary {
    fn empty() -> Self {
        Self {
            total_predictions: 0,
            average_salary: 0.0,
            most_common_job: "N/A".to_string(),
            salary_range: SalaryRange { min: 0.0, max: 0.0 },
        }
    }
}

/// Append-only prediction log. Volatile and unbounded.
///
/// Ids are assigned under the same lock as the append, so concurrent callers
/// always observe `1..=n` without gaps or duplicates.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: Mutex<Vec<PredictionRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Vec<PredictionRecord>> {
        // A panic while holding the lock cannot leave a half-written record.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(
        &self,
        input: SalaryInput,
        predicted_salary: f64,
        timestamp: String,
    ) -> PredictionRecord {
        let mut records = self.records();
        let record = PredictionRecord {
            id: records.len() as u64 + 1,
            timestamp,
            input,
            predicted_salary,
        };
        records.push(record.clone());
        record
    }

    /// Up to `limit` most recent records, oldest first.
    pub fn recent(&self, limit: i64) -> Vec<PredictionRecord> {
        if limit <= 0 {
            return Vec::new();
        }
        let records = self.records();
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let start = records.len().saturating_sub(limit);
        records[start..].to_vec()
    }

    pub fn clear(&self) {
        self.records().clear();
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> StatisticsSummary {
        let records = self.records();
        if records.is_empty() {
            return StatisticsSummary::empty();
        }

        let salaries = records.iter().map(|record| record.predicted_salary);
        let total: f64 = salaries.clone().sum();
        let min = salaries.clone().fold(f64::INFINITY, f64::min);
        let max = salaries.fold(f64::NEG_INFINITY, f64::max);

        StatisticsSummary {
            total_predictions: records.len(),
            average_salary: round_to(total / records.len() as f64, 2),
            most_common_job: most_common_job(&records),
            salary_range: SalaryRange { min, max },
        }
    }
}

/// Ties go to the title that was seen first.
fn most_common_job(records: &[PredictionRecord]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for record in records {
        let title = record.input.job_title.label();
        match counts.iter_mut().find(|(seen, _)| *seen == title) {
            Some((_, count)) => *count += 1,
            None => counts.push((title, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (title, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((title, count));
        }
    }
    best.map_or_else(|| "N/A".to_string(), |(title, _)| title.to_string())
}
