//! Plugin state persistence.
//!
//! # Format
//!
//! Little-endian, self-describing, sectioned:
//!
//! ```text
//! "SPLC"   magic
//! u8       major version (must match)
//! u8       minor version (newer minors only add sections)
//! { u8 tag, u32 length, payload }*
//!
//! tag 1  parameters: u32 count, { u16 path_len, path, f32 value }*
//! tag 2  extra: JSON from Plugin::save_extra
//! ```
//!
//! Parameters are keyed by their serialization path
//! (`"group/subgroup/identifier"`) rather than by address, so catalogs can
//! be reordered or extended without breaking saved sessions. Unknown paths
//! and unknown section tags are skipped.
//!
//! Loading is two-phase: [`decode`] parses the whole stream without touching
//! the registry, [`DecodedState::apply`] writes the values. A truncated or
//! corrupt stream therefore leaves the live values as they were.

use std::io::{Read, Write};

use crate::error::{PluginError, PluginResult};
use crate::registry::ParameterRegistry;
use crate::types::ParameterValue;

const MAGIC: &[u8; 4] = b"SPLC";
const VERSION_MAJOR: u8 = 1;
const VERSION_MINOR: u8 = 0;

const SECTION_PARAMETERS: u8 = 1;
const SECTION_EXTRA: u8 = 2;

// =============================================================================
// Save
// =============================================================================

/// Serialize every parameter value, plus optional extra state, into `writer`.
pub fn save(
    registry: &ParameterRegistry,
    extra: Option<&serde_json::Value>,
    writer: &mut dyn Write,
) -> PluginResult<()> {
    let mut out = Vec::with_capacity(64 + registry.parameter_count() * 24);
    out.extend_from_slice(MAGIC);
    out.push(VERSION_MAJOR);
    out.push(VERSION_MINOR);

    let mut parameters = Vec::new();
    parameters.extend_from_slice(&(registry.parameter_count() as u32).to_le_bytes());
    for index in 0..registry.parameter_count() {
        let Some(path) = registry.path_of(index) else {
            continue;
        };
        let len = u16::try_from(path.len()).map_err(|_| {
            PluginError::StateError(format!("parameter path too long: {}", path))
        })?;
        parameters.extend_from_slice(&len.to_le_bytes());
        parameters.extend_from_slice(path.as_bytes());
        parameters.extend_from_slice(&registry.value_at(index).to_le_bytes());
    }
    write_section(&mut out, SECTION_PARAMETERS, &parameters)?;

    if let Some(extra) = extra {
        let json = serde_json::to_vec(extra)
            .map_err(|e| PluginError::StateError(format!("extra state: {}", e)))?;
        write_section(&mut out, SECTION_EXTRA, &json)?;
    }

    writer.write_all(&out)?;
    writer.flush()?;

    log::debug!(
        "Saved state: {} parameters, {} bytes",
        registry.parameter_count(),
        out.len()
    );
    Ok(())
}

fn write_section(out: &mut Vec<u8>, tag: u8, payload: &[u8]) -> PluginResult<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| PluginError::StateError(format!("section {} too large", tag)))?;
    out.push(tag);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

// =============================================================================
// Load
// =============================================================================

/// A parsed state blob, not yet applied.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DecodedState {
    /// Registry index and saved value of every recognized parameter.
    pub values: Vec<(usize, ParameterValue)>,
    pub extra: Option<serde_json::Value>,
}

impl DecodedState {
    /// Write the decoded values. Parameters missing from the blob keep their
    /// current values.
    ///
    /// Returns `(index, stored value)` for each applied parameter.
    pub fn apply(&self, registry: &ParameterRegistry) -> Vec<(usize, ParameterValue)> {
        self.values
            .iter()
            .filter_map(|&(index, value)| registry.set_at(index, value).map(|stored| (index, stored)))
            .collect()
    }
}

/// Read and parse a complete state blob from `reader`.
pub fn decode(registry: &ParameterRegistry, reader: &mut dyn Read) -> PluginResult<DecodedState> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut input = Input::new(&data);
    if input.take(4)? != MAGIC {
        return Err(PluginError::StateError("not a Splice state blob".to_string()));
    }
    let major = input.u8()?;
    let minor = input.u8()?;
    if major != VERSION_MAJOR {
        return Err(PluginError::StateError(format!(
            "unsupported state version {}.{}",
            major, minor
        )));
    }

    let mut state = DecodedState::default();
    let mut skipped = 0usize;

    while !input.is_empty() {
        let tag = input.u8()?;
        let len = input.u32()? as usize;
        let payload = input.take(len)?;

        match tag {
            SECTION_PARAMETERS => {
                let mut section = Input::new(payload);
                let count = section.u32()?;
                for _ in 0..count {
                    let path_len = section.u16()? as usize;
                    let path = std::str::from_utf8(section.take(path_len)?)
                        .map_err(|_| PluginError::StateError("parameter path is not UTF-8".to_string()))?;
                    let value = section.f32()?;
                    match registry.index_of_path(path) {
                        Some(index) => state.values.push((index, value)),
                        None => skipped += 1,
                    }
                }
            }
            SECTION_EXTRA => {
                let extra = serde_json::from_slice(payload)
                    .map_err(|e| PluginError::StateError(format!("extra state: {}", e)))?;
                state.extra = Some(extra);
            }
            other => log::debug!("Skipping unknown state section {}", other),
        }
    }

    if skipped > 0 {
        log::warn!("Ignored {} unknown parameters in saved state", skipped);
    }
    Ok(state)
}

/// Bounds-checked little-endian reader over a byte slice.
struct Input<'a> {
    data: &'a [u8],
}

impl<'a> Input<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn take(&mut self, len: usize) -> PluginResult<&'a [u8]> {
        if len > self.data.len() {
            return Err(PluginError::StateError("unexpected end of state data".to_string()));
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> PluginResult<[u8; N]> {
        let mut bytes = [0; N];
        bytes.copy_from_slice(self.take(N)?);
        Ok(bytes)
    }

    fn u8(&mut self) -> PluginResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> PluginResult<u16> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> PluginResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn f32(&mut self) -> PluginResult<f32> {
        self.array().map(f32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_groups::GroupInfo;
    use crate::parameter_info::ParameterInfo;
    use proptest::prelude::*;

    fn registry() -> ParameterRegistry {
        ParameterRegistry::builder()
            .group(GroupInfo::new("filter", "Filter"))
            .parameter(ParameterInfo::new(1, "gain", "Gain"))
            .parameter(ParameterInfo::new(2, "cutoff", "Cutoff").with_group(0))
            .parameter(ParameterInfo::new(3, "mode", "Mode").with_group(0).with_steps(3))
            .build()
            .unwrap()
    }

    fn saved(registry: &ParameterRegistry, extra: Option<&serde_json::Value>) -> Vec<u8> {
        let mut blob = Vec::new();
        save(registry, extra, &mut blob).unwrap();
        blob
    }

    fn load(registry: &ParameterRegistry, mut blob: &[u8]) -> PluginResult<DecodedState> {
        decode(registry, &mut blob)
    }

    #[test]
    fn test_round_trip_with_extra() {
        let source = registry();
        source.set(1, 0.25);
        source.set(2, 0.8);
        source.set(3, 1.0);
        let extra = serde_json::json!({ "theme": "dark", "zoom": 2 });
        let blob = saved(&source, Some(&extra));

        let target = registry();
        let state = load(&target, &blob).unwrap();
        let applied = state.apply(&target);

        assert_eq!(applied.len(), 3);
        assert_eq!(target.get(1), 0.25);
        assert_eq!(target.get(2), 0.8);
        assert_eq!(target.get(3), 1.0);
        assert_eq!(state.extra, Some(extra));
    }

    #[test]
    fn test_header_layout() {
        let blob = saved(&registry(), None);
        assert_eq!(&blob[..4], b"SPLC");
        assert_eq!(blob[4], 1);
        assert_eq!(blob[6], SECTION_PARAMETERS);
    }

    #[test]
    fn test_unknown_paths_ignored() {
        let other = ParameterRegistry::builder()
            .parameter(ParameterInfo::new(1, "gain", "Gain"))
            .parameter(ParameterInfo::new(9, "drive", "Drive"))
            .build()
            .unwrap();
        other.set(1, 0.1);
        other.set(9, 0.9);
        let blob = saved(&other, None);

        let target = registry();
        target.set(2, 0.6);
        load(&target, &blob).unwrap().apply(&target);

        assert_eq!(target.get(1), 0.1);
        // absent from the blob: keeps its current value
        assert_eq!(target.get(2), 0.6);
        assert_eq!(target.get(3), registry().get(3));
    }

    #[test]
    fn test_group_path_distinguishes_identifiers() {
        let flat = ParameterRegistry::builder()
            .parameter(ParameterInfo::new(2, "cutoff", "Cutoff"))
            .build()
            .unwrap();
        flat.set(2, 0.1);
        let blob = saved(&flat, None);

        let target = registry();
        let state = load(&target, &blob).unwrap();
        assert!(state.values.is_empty());
    }

    #[test]
    fn test_shared_leaf_identifiers_restore_independently() {
        let catalog = || {
            ParameterRegistry::builder()
                .group(GroupInfo::new("a", "A"))
                .group(GroupInfo::new("c", "C").with_parent(0))
                .parameter(ParameterInfo::new(1, "b", "B").with_group(0))
                .parameter(ParameterInfo::new(2, "b", "B"))
                .parameter(ParameterInfo::new(3, "b", "B").with_group(1))
                .build()
                .unwrap()
        };
        let source = catalog();
        source.set(1, 0.1);
        source.set(2, 0.9);
        source.set(3, 0.3);
        let blob = saved(&source, None);

        let target = catalog();
        let state = load(&target, &blob).unwrap();
        assert_eq!(state.apply(&target).len(), 3);
        assert_eq!(target.get(1), 0.1);
        assert_eq!(target.get(2), 0.9);
        assert_eq!(target.get(3), 0.3);
    }

    #[test]
    fn test_bad_magic_and_version() {
        let target = registry();
        assert!(matches!(load(&target, b"NOPE\x01\x00"), Err(PluginError::StateError(_))));
        assert!(matches!(load(&target, b"SPLC\x02\x00"), Err(PluginError::StateError(_))));
        assert!(load(&target, b"").is_err());
    }

    #[test]
    fn test_truncated_blob_changes_nothing() {
        let source = registry();
        source.set(1, 0.9);
        let blob = saved(&source, None);

        let target = registry();
        let before = target.get(1);
        assert!(load(&target, &blob[..blob.len() - 2]).is_err());
        assert_eq!(target.get(1), before);
    }

    #[test]
    fn test_newer_minor_with_unknown_section() {
        let source = registry();
        source.set(1, 0.3);
        let mut blob = saved(&source, None);
        blob[5] = 7;
        blob.extend_from_slice(&[42, 3, 0, 0, 0, 1, 2, 3]);

        let target = registry();
        load(&target, &blob).unwrap().apply(&target);
        assert_eq!(target.get(1), 0.3);
    }

    #[test]
    fn test_minimal_reads_are_accumulated() {
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let Some((&first, rest)) = self.0.split_first() else {
                    return Ok(0);
                };
                if buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = first;
                self.0 = rest;
                Ok(1)
            }
        }

        let source = registry();
        source.set(2, 0.42);
        let blob = saved(&source, None);

        let target = registry();
        decode(&target, &mut Trickle(&blob)).unwrap().apply(&target);
        assert_eq!(target.get(2), 0.42);
    }

    #[test]
    fn test_stalled_writer_aborts_save() {
        struct Stalled;
        impl Write for Stalled {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let result = save(&registry(), None, &mut Stalled);
        assert!(matches!(result, Err(PluginError::Io(_))));
    }

    proptest! {
        #[test]
        fn prop_save_load_restores_values(values in proptest::collection::vec(0.0f32..=1.0, 3)) {
            let source = registry();
            for (address, value) in (1..=3).zip(&values) {
                source.set(address, *value);
            }
            let blob = saved(&source, None);

            let target = registry();
            load(&target, &blob).unwrap().apply(&target);
            for address in 1..=3 {
                prop_assert_eq!(target.get(address), source.get(address));
            }
        }
    }
}
