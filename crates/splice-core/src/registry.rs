//! Parameter registry: metadata catalog plus the live value store.
//!
//! The catalog (groups and parameter infos) is fixed when the registry is
//! built and never changes for the lifetime of an instance. Values are
//! mutable from every execution context:
//!
//! - Render thread: automation events applied at sample offsets
//! - Control thread: host `set_parameter_value`, state loading
//! - UI thread: editor gestures
//!
//! # Thread Safety
//!
//! Each parameter is backed by an `AtomicU32` holding the bits of its
//! normalized `f32` value, so every read and write is wait-free and no
//! writer can block the render thread. Concurrent writers to the same
//! address resolve as last-write-wins; there is no cross-address atomicity.
//!
//! Address lookup uses a table sorted by address and binary search. It
//! never hashes or allocates, so it is safe on the render path.
//!
//! # Example
//!
//! ```ignore
//! use splice_core::{Formatter, GroupInfo, ParameterInfo, ParameterRegistry};
//!
//! let registry = ParameterRegistry::builder()
//!     .group(GroupInfo::new("filter", "Filter"))
//!     .parameter(ParameterInfo::new(0, "gain", "Gain"))
//!     .parameter(ParameterInfo::new(1, "cutoff", "Cutoff").with_group(0))
//!     .build()?;
//!
//! registry.set(1, 0.25);
//! assert_eq!(registry.get(1), 0.25);
//! assert_eq!(registry.get(99), 0.0); // unknown address
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::error::{PluginError, PluginResult};
use crate::parameter_groups::{GroupIndex, GroupInfo};
use crate::parameter_info::ParameterInfo;
use crate::types::{ParameterAddress, ParameterValue, PATH_SEPARATOR};

/// Value returned for reads of unknown addresses.
pub const UNKNOWN_PARAMETER_VALUE: ParameterValue = 0.0;

// =============================================================================
// Builder
// =============================================================================

/// Collects groups and parameters, then validates them into a registry.
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    groups: Vec<GroupInfo>,
    parameters: Vec<ParameterInfo>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. Its index is the number of groups added before it.
    pub fn group(mut self, info: GroupInfo) -> Self {
        self.groups.push(info);
        self
    }

    /// Append a parameter. Parameter indices follow insertion order.
    pub fn parameter(mut self, info: ParameterInfo) -> Self {
        self.parameters.push(info);
        self
    }

    /// Append a group and return its index.
    pub fn add_group(&mut self, info: GroupInfo) -> GroupIndex {
        self.groups.push(info);
        self.groups.len() - 1
    }

    /// Append a parameter and return its index.
    pub fn add_parameter(&mut self, info: ParameterInfo) -> usize {
        self.parameters.push(info);
        self.parameters.len() - 1
    }

    /// Validate the catalog and create the registry with every parameter at
    /// its default value.
    ///
    /// Rejects empty or over-long identifiers and names, groups whose parent
    /// does not precede them, parameters in unknown groups, duplicate
    /// addresses, identifiers repeated among siblings, identifiers containing
    /// [`PATH_SEPARATOR`], colliding serialization paths, defaults outside
    /// `[0, 1]` and unusable ranges.
    pub fn build(self) -> PluginResult<ParameterRegistry> {
        let invalid = PluginError::InvalidConfiguration;

        let mut sibling_groups = HashSet::new();
        for (index, group) in self.groups.iter().enumerate() {
            group.validate(index).map_err(invalid)?;
            if !sibling_groups.insert((group.parent, group.identifier)) {
                return Err(invalid(format!(
                    "duplicate group identifier '{}'",
                    group.identifier
                )));
            }
        }

        let mut sibling_parameters = HashSet::new();
        let mut by_address = Vec::with_capacity(self.parameters.len());
        for (index, info) in self.parameters.iter().enumerate() {
            info.validate().map_err(invalid)?;
            if let Some(group) = info.group {
                if group >= self.groups.len() {
                    return Err(invalid(format!(
                        "parameter '{}' references unknown group {}",
                        info.identifier, group
                    )));
                }
            }
            if !sibling_parameters.insert((info.group, info.identifier)) {
                return Err(invalid(format!(
                    "duplicate parameter identifier '{}'",
                    info.identifier
                )));
            }
            by_address.push((info.address, index));
        }

        by_address.sort_unstable_by_key(|&(address, _)| address);
        if let Some(pair) = by_address.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(invalid(format!("duplicate parameter address {}", pair[0].0)));
        }

        let mut by_path = HashMap::with_capacity(self.parameters.len());
        for (index, info) in self.parameters.iter().enumerate() {
            let path = parameter_path(&self.groups, info);
            if by_path.contains_key(&path) {
                return Err(invalid(format!("duplicate parameter path '{}'", path)));
            }
            by_path.insert(path, index);
        }

        let values = self
            .parameters
            .iter()
            .map(|info| AtomicU32::new(info.quantize(info.default_normalized).to_bits()))
            .collect();
        let changed = self.parameters.iter().map(|_| AtomicBool::new(false)).collect();

        log::debug!(
            "Parameter registry built: {} parameters in {} groups",
            self.parameters.len(),
            self.groups.len()
        );

        Ok(ParameterRegistry {
            groups: self.groups,
            parameters: self.parameters,
            values,
            changed,
            by_address,
            by_path,
        })
    }
}

/// Slash-separated identifiers from the root group down to the parameter.
fn parameter_path(groups: &[GroupInfo], info: &ParameterInfo) -> String {
    let mut segments = vec![info.identifier];
    let mut group = info.group;
    while let Some(index) = group {
        segments.push(groups[index].identifier);
        group = groups[index].parent;
    }
    segments.reverse();
    segments.join(&*PATH_SEPARATOR.to_string())
}

// =============================================================================
// Registry
// =============================================================================

/// Parameter catalog and lock-free value store.
pub struct ParameterRegistry {
    groups: Vec<GroupInfo>,
    parameters: Vec<ParameterInfo>,
    /// Normalized values as `f32` bits, indexed like `parameters`.
    values: Box<[AtomicU32]>,
    /// Set on every write the editor did not originate; cleared by editor sync.
    changed: Box<[AtomicBool]>,
    /// `(address, index)` sorted by address.
    by_address: Vec<(ParameterAddress, usize)>,
    /// Serialization path to index. Control paths only.
    by_path: HashMap<String, usize>,
}

impl ParameterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group info by index, `None` when out of range.
    pub fn group_info(&self, index: usize) -> Option<&GroupInfo> {
        self.groups.get(index)
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Parameter info by index, `None` when out of range.
    pub fn parameter_info(&self, index: usize) -> Option<&ParameterInfo> {
        self.parameters.get(index)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterInfo> {
        self.parameters.iter()
    }

    /// Index of the parameter with `address`. Allocation-free.
    #[inline]
    pub fn index_of(&self, address: ParameterAddress) -> Option<usize> {
        self.by_address
            .binary_search_by_key(&address, |&(a, _)| a)
            .ok()
            .map(|position| self.by_address[position].1)
    }

    pub fn info_by_address(&self, address: ParameterAddress) -> Option<&ParameterInfo> {
        self.index_of(address).map(|index| &self.parameters[index])
    }

    /// Serialization path of a parameter (`"group/subgroup/identifier"`).
    pub fn path_of(&self, index: usize) -> Option<String> {
        self.parameters
            .get(index)
            .map(|info| parameter_path(&self.groups, info))
    }

    /// Index of the parameter with a serialization path.
    pub fn index_of_path(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Current normalized value, [`UNKNOWN_PARAMETER_VALUE`] for unknown addresses.
    #[inline]
    pub fn get(&self, address: ParameterAddress) -> ParameterValue {
        self.index_of(address)
            .map(|index| self.value_at(index))
            .unwrap_or(UNKNOWN_PARAMETER_VALUE)
    }

    /// Current normalized value by index. Out-of-range indices read as 0.
    #[inline]
    pub fn value_at(&self, index: usize) -> ParameterValue {
        self.values
            .get(index)
            .map(|slot| f32::from_bits(slot.load(Ordering::Relaxed)))
            .unwrap_or(UNKNOWN_PARAMETER_VALUE)
    }

    /// Plain (denormalized) value by index.
    pub fn plain_value_at(&self, index: usize) -> f64 {
        match self.parameters.get(index) {
            Some(info) => info.normalized_to_plain(self.value_at(index)),
            None => 0.0,
        }
    }

    /// Set a value by address. Clamped and quantized; unknown addresses are
    /// ignored.
    ///
    /// Returns the index and the value actually stored.
    #[inline]
    pub fn set(
        &self,
        address: ParameterAddress,
        value: ParameterValue,
    ) -> Option<(usize, ParameterValue)> {
        let index = self.index_of(address)?;
        self.set_at(index, value).map(|stored| (index, stored))
    }

    /// Set a value by index, marking it for editor sync.
    #[inline]
    pub fn set_at(&self, index: usize, value: ParameterValue) -> Option<ParameterValue> {
        let stored = self.store(index, value)?;
        self.changed[index].store(true, Ordering::Release);
        Some(stored)
    }

    /// Set a value on behalf of the editor. The editor already displays it,
    /// so no sync notification is raised.
    #[inline]
    pub fn set_from_editor(&self, index: usize, value: ParameterValue) -> Option<ParameterValue> {
        self.store(index, value)
    }

    #[inline]
    fn store(&self, index: usize, value: ParameterValue) -> Option<ParameterValue> {
        let info = self.parameters.get(index)?;
        let value = info.quantize(value);
        self.values[index].store(value.to_bits(), Ordering::Relaxed);
        Some(value)
    }

    /// Reset every parameter to its default value.
    pub fn reset_to_defaults(&self) {
        for (index, info) in self.parameters.iter().enumerate() {
            self.set_at(index, info.default_normalized);
        }
    }

    /// Visit every parameter written since the previous call (by anything
    /// other than the editor) with its current value, clearing the marks.
    pub fn drain_changed(&self, mut f: impl FnMut(usize, ParameterValue)) {
        for (index, flag) in self.changed.iter().enumerate() {
            if flag.swap(false, Ordering::Acquire) {
                f(index, self.value_at(index));
            }
        }
    }

    // =========================================================================
    // Display
    // =========================================================================

    /// Format a normalized value for display.
    ///
    /// Writes nothing for unknown addresses. The value goes through the same
    /// quantization as writes, so the text matches what would be applied.
    /// Allocation-free when `out` is.
    pub fn normalized_to_string(
        &self,
        address: ParameterAddress,
        value: ParameterValue,
        out: &mut dyn fmt::Write,
    ) -> fmt::Result {
        match self.info_by_address(address) {
            Some(info) => info.formatter.write(info.normalized_to_plain(value), out),
            None => Ok(()),
        }
    }

    /// Parse display text to a quantized normalized value.
    pub fn string_to_normalized(
        &self,
        address: ParameterAddress,
        text: &str,
    ) -> Option<ParameterValue> {
        let info = self.info_by_address(address)?;
        let plain = info.formatter.parse(text)?;
        Some(info.plain_to_normalized(plain))
    }
}

impl fmt::Debug for ParameterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterRegistry")
            .field("groups", &self.groups.len())
            .field("parameters", &self.parameters.len())
            .finish()
    }
}
