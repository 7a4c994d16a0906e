//! Aggregation core
//!
//! Pure functions over price data that has already been fetched: input
//! validation, the arithmetic mean, time alignment of two histories and
//! Pearson correlation. Nothing here performs I/O.

use stock_core::{CorrelationResult, PriceHistory, PricePoint, StockError, StockResult};

/// Supported aggregation methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    #[default]
    Average,
}

impl Aggregation {
    /// Parse the optional `aggregation` request parameter
    pub fn parse(raw: Option<&str>) -> StockResult<Self> {
        match raw {
            None | Some("average") => Ok(Aggregation::Average),
            Some(other) => Err(StockError::validation(format!(
                "Only \"average\" aggregation is currently supported, got \"{}\"",
                other
            ))),
        }
    }
}

/// Reject tickers that are empty or whitespace only
pub fn validate_ticker(ticker: &str) -> StockResult<()> {
    if ticker.trim().is_empty() {
        return Err(StockError::validation("Invalid ticker parameter"));
    }
    Ok(())
}

/// Parse a window length in minutes. Zero and negatives are rejected, not clamped.
pub fn parse_window(raw: &str) -> StockResult<u32> {
    let minutes: i64 = raw.trim().parse().map_err(|_| {
        StockError::validation(format!(
            "Minutes parameter must be a positive number, got \"{}\"",
            raw
        ))
    })?;

    if minutes <= 0 {
        return Err(StockError::validation(format!(
            "Minutes parameter must be a positive number, got {}",
            minutes
        )));
    }

    u32::try_from(minutes)
        .map_err(|_| StockError::validation(format!("Minutes parameter too large: {}", minutes)))
}

/// Arithmetic mean. An empty sequence yields 0 rather than an error.
pub fn average(prices: &[f64]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    prices.iter().sum::<f64>() / prices.len() as f64
}

/// Two price sequences restricted to the overlapping time window
///
/// Positions are paired by index, not by exact timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedSeries {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl AlignedSeries {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Restrict two histories to their common time window
///
/// Both histories are sorted by timestamp internally, so the input order of
/// the quotes does not affect the result. Histories that do not overlap (or
/// are empty) produce an empty pair.
pub fn align_series(a: &PriceHistory, b: &PriceHistory) -> AlignedSeries {
    let sorted_a = a.sorted_by_time();
    let sorted_b = b.sorted_by_time();

    let (Some(first_a), Some(last_a)) = (sorted_a.first(), sorted_a.last()) else {
        return AlignedSeries::default();
    };
    let (Some(first_b), Some(last_b)) = (sorted_b.first(), sorted_b.last()) else {
        return AlignedSeries::default();
    };

    let start = first_a.last_updated_at.max(first_b.last_updated_at);
    let end = last_a.last_updated_at.min(last_b.last_updated_at);

    if start > end {
        return AlignedSeries::default();
    }

    let within = |points: Vec<&PricePoint>| -> Vec<f64> {
        points
            .into_iter()
            .filter(|p| p.last_updated_at >= start && p.last_updated_at <= end)
            .map(|p| p.price)
            .collect()
    };

    AlignedSeries {
        left: within(sorted_a),
        right: within(sorted_b),
    }
}

/// Pearson correlation over the common prefix of two sequences
///
/// Uses sample covariance and sample standard deviations (n - 1 divisor).
/// Fewer than two points or a zero-variance series yields an undefined
/// coefficient instead of NaN.
pub fn correlation(x: &[f64], y: &[f64]) -> CorrelationResult {
    let n = x.len().min(y.len());
    if n < 2 {
        return CorrelationResult::insufficient(n);
    }

    let (x, y) = (&x[..n], &y[..n]);
    let x_mean = average(x);
    let y_mean = average(y);

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    let mut y_variance = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let x_diff = xi - x_mean;
        let y_diff = yi - y_mean;
        covariance += x_diff * y_diff;
        x_variance += x_diff * x_diff;
        y_variance += y_diff * y_diff;
    }

    let divisor = (n - 1) as f64;
    let covariance = covariance / divisor;
    let x_std_dev = (x_variance / divisor).sqrt();
    let y_std_dev = (y_variance / divisor).sqrt();

    if x_std_dev == 0.0 || y_std_dev == 0.0 {
        return CorrelationResult::insufficient(n);
    }

    let coefficient = covariance / (x_std_dev * y_std_dev);
    if !coefficient.is_finite() {
        return CorrelationResult::insufficient(n);
    }

    CorrelationResult {
        // Floating error can land a hair outside [-1, 1]
        coefficient: Some(coefficient.clamp(-1.0, 1.0)),
        sample_size: n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 8, 4, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn history(points: &[(i64, f64)]) -> PriceHistory {
        PriceHistory::new(
            points
                .iter()
                .map(|(minute, price)| PricePoint::new(*price, at(*minute)))
                .collect(),
        )
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[5.0]), 5.0);
        assert_eq!(average(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_validate_ticker() {
        assert!(validate_ticker("NVDA").is_ok());
        assert!(validate_ticker("").is_err());
        assert!(matches!(
            validate_ticker("   "),
            Err(StockError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("50").unwrap(), 50);
        assert_eq!(parse_window(" 60 ").unwrap(), 60);
        assert!(parse_window("0").is_err());
        assert!(parse_window("-5").is_err());
        assert!(parse_window("abc").is_err());
        assert!(parse_window("").is_err());
        assert!(parse_window("1.5").is_err());
        assert!(parse_window("99999999999").is_err());
    }

    #[test]
    fn test_aggregation_parse() {
        assert_eq!(Aggregation::parse(None).unwrap(), Aggregation::Average);
        assert_eq!(Aggregation::parse(Some("average")).unwrap(), Aggregation::Average);
        assert!(Aggregation::parse(Some("median")).is_err());
        assert!(Aggregation::parse(Some("AVERAGE")).is_err());
    }

    #[test]
    fn test_identical_series_correlate_perfectly() {
        let x = [10.0, 12.5, 11.0, 15.0, 14.2];
        let result = correlation(&x, &x);
        assert_eq!(result.rounded(), Some(1.0));
        assert_eq!(result.sample_size, 5);
    }

    #[test]
    fn test_negative_linear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| -2.0 * v + 7.0).collect();
        assert_eq!(correlation(&x, &y).rounded(), Some(-1.0));
    }

    #[test]
    fn test_positive_linear_relation_with_offset() {
        let x = [3.0, 1.0, 4.0, 1.5, 9.0, 2.6];
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v + 100.0).collect();
        assert_eq!(correlation(&x, &y).rounded(), Some(1.0));
    }

    #[test]
    fn test_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 1.0, 4.0, 3.0];
        // cov = 1, sx = sy = sqrt(5/3) => r = 0.6
        let result = correlation(&x, &y);
        assert!((result.coefficient.unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_data_is_undefined() {
        assert_eq!(correlation(&[], &[]).coefficient, None);
        assert_eq!(correlation(&[1.0], &[2.0]).coefficient, None);
        assert_eq!(correlation(&[1.0, 2.0, 3.0], &[2.0]).coefficient, None);
    }

    #[test]
    fn test_zero_variance_is_undefined() {
        let result = correlation(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]);
        assert_eq!(result.coefficient, None);
        assert_eq!(result.rounded(), None);
        assert_eq!(correlation(&[1.0, 2.0], &[7.0, 7.0]).coefficient, None);
    }

    #[test]
    fn test_uses_common_length() {
        let x = [1.0, 2.0, 3.0, 100.0, -50.0];
        let y = [2.0, 4.0, 6.0];
        let result = correlation(&x, &y);
        assert_eq!(result.sample_size, 3);
        assert_eq!(result.rounded(), Some(1.0));
    }

    #[test]
    fn test_means_use_only_paired_values() {
        // Averaging all of x (26.5) would give roughly 0.03 here
        let result = correlation(&[1.0, 2.0, 3.0, 100.0], &[1.0, 2.0, 3.0]);
        assert_eq!(result.sample_size, 3);
        assert_eq!(result.rounded(), Some(1.0));
    }

    #[test]
    fn test_align_restricts_to_overlap() {
        let a = history(&[(0, 1.0), (5, 2.0), (10, 3.0), (15, 4.0)]);
        let b = history(&[(5, 20.0), (12, 30.0), (20, 40.0)]);

        // Overlap is [5, 15], inclusive at both ends
        let aligned = align_series(&a, &b);
        assert_eq!(aligned.left, vec![2.0, 3.0, 4.0]);
        assert_eq!(aligned.right, vec![20.0, 30.0]);
    }

    #[test]
    fn test_align_without_overlap_is_empty() {
        let a = history(&[(0, 1.0), (5, 2.0)]);
        let b = history(&[(10, 3.0), (15, 4.0)]);
        assert!(align_series(&a, &b).is_empty());
    }

    #[test]
    fn test_align_with_empty_history_is_empty() {
        let a = history(&[(0, 1.0), (5, 2.0)]);
        assert!(align_series(&a, &PriceHistory::default()).is_empty());
        assert!(align_series(&PriceHistory::default(), &a).is_empty());
    }

    #[test]
    fn test_align_ignores_input_order() {
        let a = history(&[(0, 1.0), (3, 2.0), (6, 3.0), (9, 4.0), (12, 5.0)]);
        let b = history(&[(2, 10.0), (4, 11.0), (8, 12.0), (11, 13.0)]);

        let shuffled_a = history(&[(9, 4.0), (0, 1.0), (12, 5.0), (6, 3.0), (3, 2.0)]);
        let shuffled_b = history(&[(8, 12.0), (11, 13.0), (2, 10.0), (4, 11.0)]);

        let expected = align_series(&a, &b);
        assert_eq!(expected.left, vec![2.0, 3.0, 4.0]);
        assert_eq!(expected.right, vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(align_series(&shuffled_a, &shuffled_b), expected);
    }

    #[test]
    fn test_align_with_shared_timestamps_ignores_input_order() {
        let a = history(&[(0, 1.0), (0, 9.0), (1, 2.0)]);
        let swapped_a = history(&[(0, 9.0), (0, 1.0), (1, 2.0)]);
        let b = history(&[(0, 4.0), (1, 5.0), (1, 7.0)]);
        let swapped_b = history(&[(1, 7.0), (0, 4.0), (1, 5.0)]);

        let expected = align_series(&a, &b);
        let reordered = align_series(&swapped_a, &swapped_b);
        assert_eq!(expected.left, vec![1.0, 9.0, 2.0]);
        assert_eq!(reordered, expected);
        assert_eq!(
            correlation(&reordered.left, &reordered.right),
            correlation(&expected.left, &expected.right)
        );
    }
}
