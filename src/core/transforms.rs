//! Sweep-cycle windowing for cyclic voltammetry series.
//!
//! A repeated CV sweep returns to the same vertex potential at the start of
//! each cycle, so the last complete cycle is taken as the span between the
//! last two samples sitting at the maximum potential. This only holds when
//! the instrument samples the same potential grid every cycle.

use log::debug;
use thiserror::Error;

use super::loaders::CvSeries;

/// Diagnostic emitted when two peak samples bound the last cycle.
pub const LAST_ROUND_FOUND: &str = "last round found!";

/// Diagnostic emitted when the whole series is kept.
pub const SINGLE_ROUND: &str = "There is only one round in the file!";

/// Errors that can occur while locating the last cycle.
#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("Cannot locate a voltage peak in a series of {samples} samples (need at least 2)")]
    PeakNotFound { samples: usize },

    #[error("Invalid peak tolerance: {0}")]
    InvalidTolerance(f64),
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Inclusive index range `[lo, hi]` into a `CvSeries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundWindow {
    pub lo: usize,
    pub hi: usize,
}

impl RoundWindow {
    /// Number of samples covered by the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.hi - self.lo + 1
    }

    /// Always false; a window covers at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Outcome of windowing a series.
#[derive(Debug, Clone, PartialEq)]
pub struct LastRound {
    /// Selected sample range.
    pub window: RoundWindow,
    /// Maximum potential in the input series.
    pub peak_voltage: f64,
    /// True if two peak samples were found; false when the series is kept whole.
    pub complete_round: bool,
    /// Potential step between the first two samples.
    pub sample_interval: f64,
    /// Human-readable status lines, in emission order.
    pub diagnostics: Vec<String>,
}

/// Format a float in fixed notation with a decimal point (`2.0`, `0.00005`).
///
/// Output never uses an exponent, so written rows always match the numeric
/// row pattern the loader uses to find the end of the header.
pub fn format_value(value: f64) -> String {
    let repr = value.to_string();
    if !value.is_finite() || repr.contains('.') {
        repr
    } else {
        format!("{}.0", repr)
    }
}

/// Find the last complete sweep cycle in a series.
///
/// Scans from the end towards the start for samples at the maximum
/// potential. With two or more, the window spans the second-last to the last
/// of them; otherwise it spans the whole series.
///
/// Index 0 takes part in the scan, so a series that starts on a peak can
/// yield a window beginning at 0. The lab's earlier script stopped at index 1.
///
/// # Arguments
///
/// * `series` - Input CV samples
/// * `tolerance` - Absolute potential tolerance for peak matching; `0.0`
///   requires exact equality
///
/// # Errors
///
/// Returns `TransformError::PeakNotFound` for series shorter than two
/// samples and `TransformError::InvalidTolerance` for negative or NaN
/// tolerances.
///
/// # Example
///
/// ```
/// use cv_last_round::core::loaders::CvSeries;
/// use cv_last_round::core::transforms::find_last_round;
///
/// let voltage = vec![0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0];
/// let series = CvSeries::from_columns(voltage, vec![0.5; 9]).unwrap();
/// let round = find_last_round(&series, 0.0).unwrap();
/// assert_eq!((round.window.lo, round.window.hi), (2, 6));
/// ```
pub fn find_last_round(series: &CvSeries, tolerance: f64) -> Result<LastRound> {
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(TransformError::InvalidTolerance(tolerance));
    }

    let n = series.len();
    let sample_interval = series
        .sample_interval()
        .ok_or(TransformError::PeakNotFound { samples: n })?;

    let peak_voltage = series
        .voltage
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let is_peak = |v: f64| {
        if tolerance == 0.0 {
            v == peak_voltage
        } else {
            (v - peak_voltage).abs() <= tolerance
        }
    };

    let mut peaks = Vec::with_capacity(2);
    for idx in (0..n).rev() {
        if is_peak(series.voltage[idx]) {
            peaks.push(idx);
            if peaks.len() == 2 {
                break;
            }
        }
    }

    let (window, complete_round) = match peaks.as_slice() {
        [last, second_last] => (
            RoundWindow {
                lo: *second_last,
                hi: *last,
            },
            true,
        ),
        _ => (RoundWindow { lo: 0, hi: n - 1 }, false),
    };

    let status = if complete_round { LAST_ROUND_FOUND } else { SINGLE_ROUND };
    let diagnostics = vec![
        status.to_string(),
        format!("Vpeak = {}", format_value(peak_voltage)),
    ];

    debug!(
        "Peak {} at indices {:?}, window [{}, {}], sample interval {}",
        peak_voltage, peaks, window.lo, window.hi, sample_interval
    );

    Ok(LastRound {
        window,
        peak_voltage,
        complete_round,
        sample_interval,
        diagnostics,
    })
}

/// Copy the samples covered by `window` into a new series.
///
/// The window is clamped to the series bounds.
pub fn slice_window(series: &CvSeries, window: RoundWindow) -> CvSeries {
    if series.is_empty() {
        return CvSeries::new();
    }
    let hi = window.hi.min(series.len() - 1);
    let lo = window.lo.min(hi);

    CvSeries {
        voltage: series.voltage[lo..=hi].to_vec(),
        current: series.current[lo..=hi].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(voltage: &[f64]) -> CvSeries {
        CvSeries::from_columns(voltage.to_vec(), vec![0.5; voltage.len()]).unwrap()
    }

    #[test]
    fn test_two_cycles() {
        let s = series(&[0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0]);
        let round = find_last_round(&s, 0.0).unwrap();

        assert_eq!(round.window, RoundWindow { lo: 2, hi: 6 });
        assert_eq!(round.window.len(), 5);
        assert!(round.complete_round);
        assert_eq!(round.peak_voltage, 2.0);
        assert_eq!(round.diagnostics, vec!["last round found!", "Vpeak = 2.0"]);
    }

    #[test]
    fn test_three_cycles_uses_last_pair() {
        let s = series(&[2.0, 1.0, 2.0, 1.0, 0.0, 2.0, 1.0]);
        let round = find_last_round(&s, 0.0).unwrap();
        assert_eq!(round.window, RoundWindow { lo: 2, hi: 5 });
    }

    #[test]
    fn test_single_peak_keeps_everything() {
        let s = series(&[0.0, 1.0, 2.0, 1.0, 0.0]);
        let round = find_last_round(&s, 0.0).unwrap();

        assert_eq!(round.window, RoundWindow { lo: 0, hi: 4 });
        assert!(!round.complete_round);
        assert_eq!(round.diagnostics[0], SINGLE_ROUND);
        assert_eq!(round.diagnostics[1], "Vpeak = 2.0");
    }

    #[test]
    fn test_peak_at_index_zero_is_matched() {
        let s = series(&[0.8, 0.4, 0.0, 0.4, 0.8, 0.4]);
        let round = find_last_round(&s, 0.0).unwrap();
        assert_eq!(round.window, RoundWindow { lo: 0, hi: 4 });
    }

    #[test]
    fn test_near_duplicate_peak_not_matched_exactly() {
        let s = series(&[0.0, 0.8, 0.0, 0.8 + 1e-12, 0.0]);
        let exact = find_last_round(&s, 0.0).unwrap();
        assert!(!exact.complete_round);

        let tolerant = find_last_round(&s, 1e-9).unwrap();
        assert!(tolerant.complete_round);
        assert_eq!(tolerant.window, RoundWindow { lo: 1, hi: 3 });
    }

    #[test]
    fn test_too_short_series() {
        let s = series(&[1.0]);
        assert_eq!(
            find_last_round(&s, 0.0).unwrap_err(),
            TransformError::PeakNotFound { samples: 1 }
        );
        assert!(find_last_round(&CvSeries::new(), 0.0).is_err());
    }

    #[test]
    fn test_invalid_tolerance() {
        let s = series(&[0.0, 1.0]);
        assert!(matches!(
            find_last_round(&s, -1.0),
            Err(TransformError::InvalidTolerance(_))
        ));
        assert!(find_last_round(&s, f64::NAN).is_err());
    }

    #[test]
    fn test_slice_window() {
        let s = CvSeries::from_columns(vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 11.0, 12.0, 13.0]).unwrap();
        let sliced = slice_window(&s, RoundWindow { lo: 1, hi: 2 });
        assert_eq!(sliced.voltage, vec![1.0, 2.0]);
        assert_eq!(sliced.current, vec![11.0, 12.0]);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.0), "2.0");
        assert_eq!(format_value(-0.25), "-0.25");
        assert_eq!(format_value(1e-7), "0.0000001");
        assert_eq!(format_value(-1.5e-7), "-0.00000015");
        assert_eq!(format_value(5e-5), "0.00005");
        assert_eq!(format_value(1e20), "100000000000000000000.0");
    }
}
