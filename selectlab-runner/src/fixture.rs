//! Seeded synthetic market data for offline runs and tests.
//!
//! All randomness flows from the configured seed through a `StdRng`, so the
//! same seed always produces the same series — synthetic runs are as
//! reproducible as replayed ones.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use selectlab_core::domain::Bar;
use selectlab_core::market::{MarketSeries, SeriesError};

/// Default start date for generated series.
const DEFAULT_START: (i32, u32, u32) = (2023, 1, 2);

/// Generate a random-walk daily series per symbol.
///
/// Prices drift mildly upward with ±2% daily noise; each symbol starts at a
/// different base price derived from its position in the universe. Weekends
/// are skipped so the series has a realistic trading calendar.
pub fn synthetic_series(
    universe: &[String],
    seed: u64,
    days: usize,
) -> Result<MarketSeries, SeriesError> {
    let (y, m, d) = DEFAULT_START;
    let start = NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture start date");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(universe.len() * days);

    for (idx, symbol) in universe.iter().enumerate() {
        let mut price = 20.0 + 15.0 * idx as f64;
        let mut date = start;
        let mut generated = 0;

        while generated < days {
            // Skip weekends.
            if matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
                date = date.succ_opt().expect("date range bounded");
                continue;
            }

            let drift = 0.0003;
            let noise: f64 = rng.gen_range(-0.02..0.02);
            price = (price * (1.0 + drift + noise)).max(1.0);

            let open = price * (1.0 + rng.gen_range(-0.005..0.005));
            let close = price;
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));

            bars.push(Bar {
                symbol: symbol.clone(),
                date,
                open,
                high,
                low,
                close,
                volume: rng.gen_range(100_000..5_000_000),
            });

            generated += 1;
            date = date.succ_opt().expect("date range bounded");
        }
    }

    MarketSeries::from_bars(bars)
}
