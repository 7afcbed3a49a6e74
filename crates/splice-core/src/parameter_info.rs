//! Parameter metadata.
//!
//! [`ParameterInfo`] is the immutable description of one parameter: its
//! stable address and identifier, display name, step count, group, plain
//! value range and display formatter. Infos are `const`-constructible so a
//! plugin can declare its catalog in statics.

use splice_utils::address_from_identifier;

use crate::parameter_format::Formatter;
use crate::parameter_groups::GroupIndex;
use crate::parameter_range::{ParameterRange, RangeMapper};
use crate::types::{ParameterAddress, ParameterValue, MAX_STRING_LENGTH, PATH_SEPARATOR};

/// Metadata describing a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Stable numeric identity used on the real-time path.
    pub address: ParameterAddress,
    /// Stable string identity used for serialized state.
    pub identifier: &'static str,
    /// Display name (e.g., "Master Volume").
    pub name: &'static str,
    /// Default value in normalized form (0.0 to 1.0).
    pub default_normalized: ParameterValue,
    /// Number of discrete steps. 0 = continuous, N = N + 1 levels.
    pub steps: u32,
    /// Containing group, `None` for ungrouped parameters.
    pub group: Option<GroupIndex>,
    /// Plain value mapping.
    pub range: ParameterRange,
    /// Display formatting of the plain value.
    pub formatter: Formatter,
}

impl ParameterInfo {
    /// Create a new continuous parameter with an explicit address.
    pub const fn new(
        address: ParameterAddress,
        identifier: &'static str,
        name: &'static str,
    ) -> Self {
        Self {
            address,
            identifier,
            name,
            default_normalized: 0.5,
            steps: 0,
            group: None,
            range: ParameterRange::linear(0.0, 1.0),
            formatter: Formatter::Float { precision: 2 },
        }
    }

    /// Create a parameter whose address is derived from its identifier.
    pub const fn hashed(identifier: &'static str, name: &'static str) -> Self {
        Self::new(address_from_identifier(identifier), identifier, name)
    }

    /// Create an on/off toggle (one step, formatted as On/Off).
    pub const fn toggle(address: ParameterAddress, identifier: &'static str, name: &'static str) -> Self {
        Self::new(address, identifier, name)
            .with_steps(1)
            .with_default(0.0)
            .with_formatter(Formatter::Boolean)
    }

    /// Set the default normalized value.
    pub const fn with_default(mut self, default: ParameterValue) -> Self {
        self.default_normalized = default;
        self
    }

    /// Set the step count (0 = continuous).
    pub const fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Place the parameter in a group.
    pub const fn with_group(mut self, group: GroupIndex) -> Self {
        self.group = Some(group);
        self
    }

    /// Set the plain value range. Integer ranges also set the step count.
    pub const fn with_range(mut self, range: ParameterRange) -> Self {
        let steps = range.steps();
        if steps > 0 {
            self.steps = steps;
        }
        self.range = range;
        self
    }

    /// Set the display formatter.
    pub const fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Unit label of the display formatter.
    pub fn units(&self) -> &'static str {
        self.formatter.units()
    }

    /// Parent group index in host form: `-1` for ungrouped parameters.
    pub fn parent_index(&self) -> i64 {
        self.group.map(|index| index as i64).unwrap_or(-1)
    }

    /// Clamp to `[0, 1]` and snap to the step grid.
    ///
    /// NaN maps to 0. Every write path and the formatter go through this, so
    /// displayed text always matches the value that will be applied.
    #[inline]
    pub fn quantize(&self, value: ParameterValue) -> ParameterValue {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        if self.steps == 0 {
            return value;
        }
        let steps = self.steps as f32;
        (value * steps).round() / steps
    }

    /// Convert a normalized value to the plain range.
    pub fn normalized_to_plain(&self, normalized: ParameterValue) -> f64 {
        self.range.denormalize(self.quantize(normalized) as f64)
    }

    /// Convert a plain value to normalized form.
    pub fn plain_to_normalized(&self, plain: f64) -> ParameterValue {
        self.quantize(self.range.normalize(plain) as f32)
    }

    /// Validate the metadata, returning a description of the first problem.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.identifier.is_empty() {
            return Err(format!("parameter {} has an empty identifier", self.address));
        }
        if self.identifier.contains(PATH_SEPARATOR) {
            return Err(format!(
                "parameter identifier '{}' contains '{}'",
                self.identifier, PATH_SEPARATOR
            ));
        }
        if self.identifier.len() >= MAX_STRING_LENGTH || self.name.len() >= MAX_STRING_LENGTH {
            return Err(format!(
                "parameter '{}' identifier or name exceeds {} bytes",
                self.identifier,
                MAX_STRING_LENGTH - 1
            ));
        }
        if !(0.0..=1.0).contains(&self.default_normalized) {
            return Err(format!(
                "parameter '{}' default {} is outside [0, 1]",
                self.identifier, self.default_normalized
            ));
        }
        self.range
            .validate()
            .map_err(|msg| format!("parameter '{}': {}", self.identifier, msg))
    }
}
