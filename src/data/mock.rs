// Synthetic search analytics data for offline demos
// Author: Gabriel Demetrios Lafis

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::{DataError, DimensionName, MetricRecord, RecordSet, RecordSource, SourceType};

const QUERIES: [&str; 13] = [
    "how to build a website",
    "best web development frameworks",
    "python tutorial",
    "javascript for beginners",
    "css tricks",
    "react vs angular",
    "node.js tutorial",
    "api development best practices",
    "streamlit dashboard examples",
    "data visualization tools",
    "google search console api",
    "python pandas tutorial",
    "web analytics dashboard",
];

const PAGES: [&str; 10] = [
    "/",
    "/blog",
    "/tutorials",
    "/about",
    "/contact",
    "/blog/python-tips",
    "/blog/web-development",
    "/tutorials/javascript",
    "/tutorials/python",
    "/products",
];

const COUNTRIES: [&str; 10] = [
    "United States",
    "India",
    "United Kingdom",
    "Germany",
    "Canada",
    "Australia",
    "France",
    "Brazil",
    "Japan",
    "Spain",
];

const DEVICES: [&str; 3] = ["MOBILE", "DESKTOP", "TABLET"];

/// Generator for records shaped like a live fetch
pub struct MockGenerator {
    rng: StdRng,
}

impl MockGenerator {
    /// Create a generator seeded from entropy
    pub fn new() -> Self {
        MockGenerator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a deterministic generator
    pub fn with_seed(seed: u64) -> Self {
        MockGenerator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate records for every day in `start..=end`
    ///
    /// Each day gets a totals row plus query, page, country and device
    /// breakdown rows, each carrying only its own dimension and the date.
    pub fn generate(&mut self, start: NaiveDate, end: NaiveDate) -> Vec<MetricRecord> {
        let mut records = Vec::new();
        let mut day = start;

        while day <= end {
            let date = day.format("%Y-%m-%d").to_string();
            let base_clicks: u64 = self.rng.gen_range(50..200);
            let base_impressions = base_clicks * self.rng.gen_range(10..30);

            records.push(
                MetricRecord::new(
                    base_clicks,
                    base_impressions,
                    ctr(base_clicks, base_impressions),
                    self.rng.gen_range(1.0..20.0),
                )
                .with_dimension(DimensionName::Date, date.clone()),
            );

            let base = base_clicks as f64;
            self.breakdown(&mut records, &date, DimensionName::Query, &QUERIES, 5, (base / 10.0, base / 30.0), (5, 15), 20.0);
            self.breakdown(&mut records, &date, DimensionName::Page, &PAGES, 3, (base / 8.0, base / 25.0), (4, 12), 15.0);
            self.breakdown(&mut records, &date, DimensionName::Country, &COUNTRIES, 5, (base / 12.0, base / 35.0), (5, 18), 25.0);
            self.breakdown(&mut records, &date, DimensionName::Device, &DEVICES, 3, (base / 3.0, base / 10.0), (5, 15), 20.0);

            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        records
    }

    fn breakdown(
        &mut self,
        records: &mut Vec<MetricRecord>,
        date: &str,
        dimension: DimensionName,
        values: &[&str],
        count: usize,
        clicks: (f64, f64),
        multiplier: (u64, u64),
        max_position: f64,
    ) {
        let picked: Vec<&str> = values
            .choose_multiple(&mut self.rng, count.min(values.len()))
            .copied()
            .collect();

        for value in picked {
            let sampled = Normal::new(clicks.0, clicks.1)
                .map(|normal| normal.sample(&mut self.rng))
                .unwrap_or(clicks.0);
            let c = (sampled as i64).max(1) as u64;
            let i = (c * self.rng.gen_range(multiplier.0..multiplier.1)).max(c);

            records.push(
                MetricRecord::new(c, i, ctr(c, i), self.rng.gen_range(1.0..max_position))
                    .with_dimension(DimensionName::Date, date)
                    .with_dimension(dimension, value),
            );
        }
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn ctr(clicks: u64, impressions: u64) -> f64 {
    if impressions == 0 {
        0.0
    } else {
        clicks as f64 / impressions as f64 * 100.0
    }
}

/// Record source backed by the synthetic generator
pub struct MockSource {
    start: NaiveDate,
    end: NaiveDate,
    seed: Option<u64>,
}

impl MockSource {
    /// Create a new synthetic source for a date window
    pub fn new(start: NaiveDate, end: NaiveDate, seed: Option<u64>) -> Self {
        MockSource { start, end, seed }
    }
}

impl RecordSource for MockSource {
    fn read(&self) -> Result<RecordSet, DataError> {
        if self.start > self.end {
            return Err(DataError::ValidationError(format!(
                "Start date {} is after end date {}",
                self.start, self.end
            )));
        }

        let mut generator = match self.seed {
            Some(seed) => MockGenerator::with_seed(seed),
            None => MockGenerator::new(),
        };

        let mut set = RecordSet::from_records(generator.generate(self.start, self.end));
        set.metadata.add("source".to_string(), "mock".to_string());

        Ok(set)
    }

    fn name(&self) -> &str {
        "synthetic"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Synthetic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_generate_rows_per_day() {
        let records = MockGenerator::with_seed(7).generate(date("2024-01-01"), date("2024-01-03"));

        // 1 total + 5 queries + 3 pages + 5 countries + 3 devices
        assert_eq!(records.len(), 3 * 17);
        for record in &records {
            assert!(record.clicks >= 1);
            assert!(record.impressions >= record.clicks);
            assert!(record.ctr > 0.0 && record.ctr <= 100.0);
            assert!(record.dimension(DimensionName::Date).is_some());
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = MockGenerator::with_seed(42).generate(date("2024-02-01"), date("2024-02-02"));
        let b = MockGenerator::with_seed(42).generate(date("2024-02-01"), date("2024-02-02"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let source = MockSource::new(date("2024-02-02"), date("2024-02-01"), Some(1));
        assert!(source.read().is_err());
    }
}
