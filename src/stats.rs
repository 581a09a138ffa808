//! Derived price statistics over daily candles.
//!
//! All functions assume candles are ordered by ascending date; the order is
//! not checked.

use crate::models::{Candle, PriceChange};

/// Augment each candle with its close-to-close change.
///
/// For row `i > 0` with previous close `p` and close `c`:
/// `abs_price_diff = c - p`, `pct_price_diff = c / p - 1` and
/// `pct_log_price_value = ln(1 + pct_price_diff)`. The first row has no
/// previous close, so all three are `None`.
pub fn get_diff_prices(candles: &[Candle]) -> Vec<PriceChange> {
    let mut out = Vec::with_capacity(candles.len());
    let mut prev_close: Option<f64> = None;

    for candle in candles {
        let abs = prev_close.map(|p| candle.close - p);
        let pct = prev_close.and_then(|p| pct_change(p, candle.close));
        let log_pct = pct.and_then(log_return);

        out.push(PriceChange {
            candle: candle.clone(),
            abs_price_diff: abs,
            pct_price_diff: pct,
            pct_log_price_value: log_pct,
        });
        prev_close = Some(candle.close);
    }

    out
}

/// Relative position of the latest close between the window's min and max
/// closes: 0 at the minimum, 1 at the maximum.
///
/// Returns `None` for an empty window and for a flat one (`max == min`),
/// where the position is undefined.
pub fn get_minmax_position(candles: &[Candle]) -> Option<f64> {
    let latest = candles.last()?.close;
    let (min, max) = candles
        .iter()
        .map(|c| c.close)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return None;
    }
    Some((latest - min) / range)
}

fn pct_change(prev: f64, close: f64) -> Option<f64> {
    if prev == 0.0 {
        return None;
    }
    Some(close / prev - 1.0)
}

fn log_return(pct: f64) -> Option<f64> {
    let growth = 1.0 + pct;
    if growth <= 0.0 {
        return None;
    }
    Some(growth.ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candles(closes: &[f64]) -> Vec<Candle> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                date: start + chrono::Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect()
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be present");
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn diff_prices_on_three_closes() {
        let rows = get_diff_prices(&candles(&[100.0, 110.0, 99.0]));
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].abs_price_diff, None);
        assert_eq!(rows[0].pct_price_diff, None);
        assert_eq!(rows[0].pct_log_price_value, None);

        assert_close(rows[1].abs_price_diff, 10.0);
        assert_close(rows[1].pct_price_diff, 0.10);
        assert_close(rows[1].pct_log_price_value, 1.10f64.ln());

        assert_close(rows[2].abs_price_diff, -11.0);
        assert_close(rows[2].pct_price_diff, -0.10);
        assert_close(rows[2].pct_log_price_value, 0.90f64.ln());
    }

    #[test]
    fn diff_prices_copies_input_candles() {
        let input = candles(&[5.0, 6.0]);
        let rows = get_diff_prices(&input);
        assert_eq!(rows[0].candle, input[0]);
        assert_eq!(rows[1].candle, input[1]);
    }

    #[test]
    fn diff_prices_on_empty_input() {
        assert!(get_diff_prices(&[]).is_empty());
    }

    #[test]
    fn log_value_missing_when_price_goes_to_zero() {
        let rows = get_diff_prices(&candles(&[50.0, 0.0, 10.0]));
        assert_close(rows[1].pct_price_diff, -1.0);
        assert_eq!(rows[1].pct_log_price_value, None);
        // previous close of zero leaves the percentage undefined
        assert_close(rows[2].abs_price_diff, 10.0);
        assert_eq!(rows[2].pct_price_diff, None);
        assert_eq!(rows[2].pct_log_price_value, None);
    }

    #[test]
    fn minmax_position_mid_window() {
        assert_close(get_minmax_position(&candles(&[10.0, 20.0, 15.0])), 0.5);
    }

    #[test]
    fn minmax_position_at_extremes() {
        assert_close(get_minmax_position(&candles(&[10.0, 20.0, 10.0])), 0.0);
        assert_close(get_minmax_position(&candles(&[10.0, 15.0, 20.0])), 1.0);
    }

    #[test]
    fn minmax_position_undefined_for_flat_or_empty_window() {
        assert_eq!(get_minmax_position(&candles(&[42.0, 42.0, 42.0])), None);
        assert_eq!(get_minmax_position(&candles(&[42.0])), None);
        assert_eq!(get_minmax_position(&[]), None);
    }
}
