//! Synthetic data provider for development and benchmarks.
//!
//! Produces a deterministic random walk from a starting price of 100.0, one
//! record per weekday. The seed comes from the symbol name (BLAKE3) mixed with an
//! optional user seed, so the same request always yields the same records.

use super::provider::{DataError, RawRecord, TickProvider};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider {
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        for (byte, extra) in seed.iter_mut().zip(self.seed.to_le_bytes()) {
            *byte ^= extra;
        }
        StdRng::from_seed(seed)
    }
}

impl TickProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawRecord>, DataError> {
        let mut rng = self.rng_for(symbol);
        let mut records = Vec::new();
        let mut price = 100.0_f64;
        let mut current = start;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }

            let gap: f64 = rng.gen_range(-0.005..0.005);
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price * (1.0 + gap);
            let close = open * (1.0 + daily_return);
            let volume = rng.gen_range(500_000..5_000_000u64);

            if let Some(timestamp) = current.and_hms_opt(0, 0, 0) {
                records.push(RawRecord {
                    timestamp,
                    open,
                    close,
                    volume,
                });
            }

            price = close;
            current += Duration::days(1);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    #[test]
    fn deterministic_per_symbol_and_seed() {
        let (start, end) = span();
        let a = SyntheticProvider::new(7).fetch("SPY", start, end).unwrap();
        let b = SyntheticProvider::new(7).fetch("SPY", start, end).unwrap();
        let c = SyntheticProvider::new(8).fetch("SPY", start, end).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn skips_weekends_and_stays_positive() {
        let (start, end) = span();
        let records = SyntheticProvider::default().fetch("QQQ", start, end).unwrap();
        assert!(!records.is_empty());
        for r in &records {
            let wd = r.timestamp.date().weekday();
            assert!(wd != Weekday::Sat && wd != Weekday::Sun);
            assert!(r.open > 0.0 && r.close > 0.0);
        }
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn empty_range_yields_nothing() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(); // Saturday
        let records = SyntheticProvider::default().fetch("SPY", day, day).unwrap();
        assert!(records.is_empty());
    }
}
