//! Range mapping for parameter normalization.
//!
//! Maps between plain parameter values (in natural units like Hz, dB, ms)
//! and the normalized `[0, 1]` values exchanged with the host.
//!
//! # Available Mappers
//!
//! - [`LinearMapper`] - Simple linear interpolation (most parameters)
//! - [`LogMapper`] - Logarithmic mapping for positive ranges (Hz)
//! - [`PowerMapper`] - Power curve for non-linear UI feel (dB thresholds)
//! - [`IntMapper`] - Integer range, one normalized step per integer
//!
//! [`ParameterRange`] is the closed set of mappers a [`ParameterInfo`]
//! can carry. Every mapper is `const`-constructible so parameter catalogs
//! can live in statics; invalid ranges are reported when the registry is
//! built, not at construction.
//!
//! [`ParameterInfo`]: crate::parameter_info::ParameterInfo
//!
//! # Example
//!
//! ```ignore
//! use splice_core::parameter_range::{ParameterRange, RangeMapper};
//!
//! let cutoff = ParameterRange::log(20.0, 20000.0);
//! // 632 Hz is roughly the geometric mean of 20 and 20000
//! assert!((cutoff.denormalize(0.5) - 632.0).abs() < 1.0);
//! ```

/// Mapping between plain values and normalized values.
pub trait RangeMapper: Send + Sync {
    /// Convert a plain value to normalized (0.0-1.0). Out-of-range values are clamped.
    fn normalize(&self, plain: f64) -> f64;

    /// Convert a normalized value (0.0-1.0) to plain. Out-of-range values are clamped.
    fn denormalize(&self, normalized: f64) -> f64;

    /// Plain value range as (min, max).
    fn range(&self) -> (f64, f64);
}

/// Linear range mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMapper {
    min: f64,
    max: f64,
}

impl LinearMapper {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl RangeMapper for LinearMapper {
    fn normalize(&self, plain: f64) -> f64 {
        if (self.max - self.min).abs() < f64::EPSILON {
            return 0.5;
        }
        ((plain - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        self.min + normalized * (self.max - self.min)
    }

    fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Logarithmic range mapping.
///
/// Suitable for frequency parameters where perceptual response is
/// logarithmic. Both ends of the range must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogMapper {
    min: f64,
    max: f64,
}

impl LogMapper {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl RangeMapper for LogMapper {
    fn normalize(&self, plain: f64) -> f64 {
        let (min_log, max_log) = (self.min.ln(), self.max.ln());
        if (max_log - min_log).abs() < f64::EPSILON {
            return 0.5;
        }
        let plain = plain.max(self.min);
        ((plain.ln() - min_log) / (max_log - min_log)).clamp(0.0, 1.0)
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        let (min_log, max_log) = (self.min.ln(), self.max.ln());
        (min_log + normalized * (max_log - min_log)).exp()
    }

    fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Power curve range mapping.
///
/// - `exponent > 1.0`: more resolution at the maximum
/// - `exponent < 1.0`: more resolution at the minimum
/// - `exponent = 1.0`: linear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerMapper {
    min: f64,
    max: f64,
    exponent: f64,
}

impl PowerMapper {
    pub const fn new(min: f64, max: f64, exponent: f64) -> Self {
        Self { min, max, exponent }
    }
}

impl RangeMapper for PowerMapper {
    fn normalize(&self, plain: f64) -> f64 {
        if (self.max - self.min).abs() < f64::EPSILON {
            return 0.5;
        }
        let linear = ((plain - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        linear.powf(self.exponent)
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        let linear = normalized.powf(1.0 / self.exponent);
        self.min + linear * (self.max - self.min)
    }

    fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

/// Integer range mapping.
///
/// Normalized values snap to the nearest integer; the range has
/// `max - min` steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntMapper {
    min: i64,
    max: i64,
}

impl IntMapper {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub const fn steps(&self) -> u32 {
        if self.max > self.min {
            (self.max - self.min) as u32
        } else {
            0
        }
    }
}

impl RangeMapper for IntMapper {
    fn normalize(&self, plain: f64) -> f64 {
        let steps = self.steps();
        if steps == 0 {
            return 0.0;
        }
        let plain = plain.round().clamp(self.min as f64, self.max as f64);
        (plain - self.min as f64) / steps as f64
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        let normalized = normalized.clamp(0.0, 1.0);
        (self.min as f64 + normalized * self.steps() as f64).round()
    }

    fn range(&self) -> (f64, f64) {
        (self.min as f64, self.max as f64)
    }
}

/// The range a parameter maps its normalized value onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterRange {
    Linear(LinearMapper),
    Log(LogMapper),
    Power(PowerMapper),
    Int(IntMapper),
}

impl ParameterRange {
    pub const fn linear(min: f64, max: f64) -> Self {
        Self::Linear(LinearMapper::new(min, max))
    }

    pub const fn log(min: f64, max: f64) -> Self {
        Self::Log(LogMapper::new(min, max))
    }

    pub const fn power(min: f64, max: f64, exponent: f64) -> Self {
        Self::Power(PowerMapper::new(min, max, exponent))
    }

    pub const fn int(min: i64, max: i64) -> Self {
        Self::Int(IntMapper::new(min, max))
    }

    /// Step count implied by the range (non-zero only for integer ranges).
    pub const fn steps(&self) -> u32 {
        match self {
            Self::Int(mapper) => mapper.steps(),
            _ => 0,
        }
    }

    /// Check the range is usable, returning a description of the problem if not.
    pub fn validate(&self) -> Result<(), String> {
        let (min, max) = self.range();
        if !min.is_finite() || !max.is_finite() {
            return Err(format!("range bounds must be finite, got {}..={}", min, max));
        }
        match self {
            Self::Linear(_) => Ok(()),
            Self::Log(_) if min <= 0.0 || max <= min => Err(format!(
                "log range requires 0 < min < max, got {}..={}",
                min, max
            )),
            Self::Power(PowerMapper { exponent, .. }) if *exponent <= 0.0 || max <= min => {
                Err(format!(
                    "power range requires min < max and a positive exponent, got {}..={} ^{}",
                    min, max, exponent
                ))
            }
            Self::Int(mapper) if mapper.max <= mapper.min => Err(format!(
                "integer range requires min < max, got {}..={}",
                mapper.min, mapper.max
            )),
            _ => Ok(()),
        }
    }
}

impl Default for ParameterRange {
    fn default() -> Self {
        Self::linear(0.0, 1.0)
    }
}

impl RangeMapper for ParameterRange {
    fn normalize(&self, plain: f64) -> f64 {
        match self {
            Self::Linear(m) => m.normalize(plain),
            Self::Log(m) => m.normalize(plain),
            Self::Power(m) => m.normalize(plain),
            Self::Int(m) => m.normalize(plain),
        }
    }

    fn denormalize(&self, normalized: f64) -> f64 {
        match self {
            Self::Linear(m) => m.denormalize(normalized),
            Self::Log(m) => m.denormalize(normalized),
            Self::Power(m) => m.denormalize(normalized),
            Self::Int(m) => m.denormalize(normalized),
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            Self::Linear(m) => m.range(),
            Self::Log(m) => m.range(),
            Self::Power(m) => m.range(),
            Self::Int(m) => m.range(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        let range = ParameterRange::linear(-60.0, 12.0);
        assert_eq!(range.denormalize(0.0), -60.0);
        assert_eq!(range.denormalize(1.0), 12.0);
        assert_eq!(range.normalize(-24.0), 0.5);
        assert_eq!(range.normalize(100.0), 1.0);
    }

    #[test]
    fn test_log_geometric_mean() {
        let range = ParameterRange::log(20.0, 20000.0);
        let mid = range.denormalize(0.5);
        assert!((mid - (20.0f64 * 20000.0).sqrt()).abs() < 1e-6);
        assert!((range.normalize(mid) - 0.5).abs() < 1e-9);
        assert_eq!(range.normalize(1.0), 0.0);
    }

    #[test]
    fn test_power_skews_toward_max() {
        let range = ParameterRange::power(-60.0, 0.0, 2.0);
        let mid = range.denormalize(0.5);
        assert!(mid > -30.0, "expected more resolution near max, got {}", mid);
        assert!((range.normalize(mid) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_int_snaps() {
        let range = ParameterRange::int(1, 5);
        assert_eq!(range.steps(), 4);
        assert_eq!(range.denormalize(0.3), 2.0);
        assert_eq!(range.normalize(3.0), 0.5);
        assert_eq!(range.normalize(3.4), 0.5);
    }

    #[test]
    fn test_validate() {
        assert!(ParameterRange::linear(0.0, 1.0).validate().is_ok());
        assert!(ParameterRange::log(0.0, 100.0).validate().is_err());
        assert!(ParameterRange::power(0.0, 1.0, 0.0).validate().is_err());
        assert!(ParameterRange::int(3, 3).validate().is_err());
        assert!(ParameterRange::linear(0.0, f64::INFINITY).validate().is_err());
    }
}
