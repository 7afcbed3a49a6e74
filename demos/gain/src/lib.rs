//! Splice Gain - example plugin showing the smallest complete Splice setup.
//!
//! Key points:
//! 1. Parameters are declared once in [`Plugin::parameters`]; the bridge
//!    publishes them to the host and keeps their values
//! 2. The processor reads values from the [`ProcessContext`] per segment, so
//!    automation lands on the exact sample
//! 3. Ramped automation is forwarded through `parameter_changed` and
//!    rendered as a linear glide
//! 4. Non-parameter settings travel with the host session via
//!    `save_extra`/`load_extra`
//!
//! The cdylib is linked into the app extension next to the Objective-C
//! `AUAudioUnit` subclass that calls the `splice_auv3_*` functions.

use serde::{Deserialize, Serialize};
use splice::prelude::*;

// =============================================================================
// Plugin Configuration
// =============================================================================

pub static CONFIG: PluginConfig = PluginConfig::new("Splice Gain")
    .with_vendor("Splice Framework")
    .with_version(env!("CARGO_PKG_VERSION"));

pub const GAIN: ParameterAddress = 0;
pub const INVERT: ParameterAddress = 1;

/// Registry index of the gain parameter, as reported in `ParameterChange`.
const GAIN_INDEX: usize = 0;

const MIN_DB: f64 = -60.0;
const MAX_DB: f64 = 12.0;

/// Normalized position of 0 dB on the gain range.
const UNITY: ParameterValue = ((0.0 - MIN_DB) / (MAX_DB - MIN_DB)) as ParameterValue;

#[inline]
fn db_to_linear(db: f64) -> f32 {
    if db <= MIN_DB {
        0.0
    } else {
        10f64.powf(db / 20.0) as f32
    }
}

// =============================================================================
// Plugin
// =============================================================================

/// Settings stored alongside the parameter values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Name of the preset the user last loaded, shown by the host UI.
    #[serde(default)]
    pub preset_name: Option<String>,
}

#[derive(Default)]
pub struct Gain {
    pub settings: Settings,
}

impl Plugin for Gain {
    type Processor = GainProcessor;

    fn parameters(&self) -> RegistryBuilder {
        let mut builder = ParameterRegistry::builder();
        let output = builder.add_group(GroupInfo::new("output", "Output"));
        let gain = builder.add_parameter(
            ParameterInfo::new(GAIN, "gain", "Gain")
                .with_group(output)
                .with_range(ParameterRange::linear(MIN_DB, MAX_DB))
                .with_default(UNITY)
                .with_formatter(Formatter::DecibelDirect {
                    precision: 1,
                    min_db: MIN_DB,
                }),
        );
        debug_assert_eq!(gain, GAIN_INDEX);
        builder.add_parameter(ParameterInfo::toggle(INVERT, "invert", "Invert Phase").with_group(output));
        builder
    }

    fn create_processor(&mut self, setup: ProcessSetup) -> PluginResult<GainProcessor> {
        log::debug!(
            "Gain processor at {} Hz, {} channels",
            setup.sample_rate,
            setup.channels
        );
        Ok(GainProcessor::default())
    }

    fn save_extra(&self) -> Option<serde_json::Value> {
        serde_json::to_value(&self.settings).ok()
    }

    fn load_extra(&mut self, extra: serde_json::Value) -> PluginResult<()> {
        self.settings = serde_json::from_value(extra)
            .map_err(|e| PluginError::StateError(format!("invalid gain settings: {}", e)))?;
        Ok(())
    }
}

// =============================================================================
// Processor
// =============================================================================

pub struct GainProcessor {
    /// Linear gain applied at the end of the previous segment.
    current: f32,
    /// Frames left in the active glide, 0 when not gliding.
    glide_remaining: u32,
}

impl Default for GainProcessor {
    fn default() -> Self {
        Self {
            current: 1.0,
            glide_remaining: 0,
        }
    }
}

impl GainProcessor {
    #[inline]
    fn gain_at(&self, target: f32, frame: usize) -> f32 {
        if self.glide_remaining == 0 {
            return target;
        }
        let progress = (frame + 1).min(self.glide_remaining as usize) as f32;
        self.current + (target - self.current) * progress / self.glide_remaining as f32
    }
}

impl Processor for GainProcessor {
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: Option<&AuxBuffer>,
        context: &ProcessContext,
    ) -> ProcessStatus {
        let parameters = context.parameters;
        let target = parameters
            .index_of(GAIN)
            .map(|index| db_to_linear(parameters.plain_value_at(index)))
            .unwrap_or(1.0);
        let polarity = if parameters.get(INVERT) > 0.5 { -1.0 } else { 1.0 };

        let frames = buffer.num_samples();
        if frames == 0 {
            return ProcessStatus::Normal;
        }
        for channel in buffer.channels_mut() {
            for (frame, sample) in channel.iter_mut().enumerate() {
                *sample *= self.gain_at(target, frame) * polarity;
            }
        }

        if (self.glide_remaining as usize) > frames {
            self.current = self.gain_at(target, frames - 1);
            self.glide_remaining -= frames as u32;
        } else {
            self.current = target;
            self.glide_remaining = 0;
        }
        ProcessStatus::Normal
    }

    fn parameter_changed(&mut self, change: ParameterChange) {
        // Only the gain glides; invert always jumps.
        if change.index == GAIN_INDEX {
            self.glide_remaining = change.ramp_frames;
        }
    }

    fn reset(&mut self) {
        self.glide_remaining = 0;
    }
}

// =============================================================================
// Plugin Exports
// =============================================================================

export_auv3!(CONFIG, Gain);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use splice::auv3::{BridgeInstance, PluginWrapper};
    use splice::core::{parameter_queue, RenderEngine, RenderEvent, TailLength};

    fn engine() -> (RenderEngine<GainProcessor>, Arc<ParameterRegistry>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut plugin = Gain::default();
        let registry = Arc::new(plugin.parameters().build().unwrap());
        let (_sender, receiver) = parameter_queue(16);
        let mut engine = RenderEngine::new(registry.clone(), receiver, Arc::new(TailLength::default()));
        let setup = ProcessSetup {
            sample_rate: 48000.0,
            max_block_size: 64,
            channels: 2,
        };
        engine.activate(setup, |setup| plugin.create_processor(setup)).unwrap();
        (engine, registry)
    }

    fn render(engine: &mut RenderEngine<GainProcessor>, frames: usize, events: Vec<RenderEvent>) -> Vec<f32> {
        let mut left = vec![1.0f32; frames];
        let mut right = vec![1.0f32; frames];
        {
            let mut buffer = Buffer::new([&mut left[..], &mut right[..]], frames);
            engine.process(&mut buffer, None, Transport::default(), events);
        }
        assert_eq!(left, right);
        left
    }

    #[test]
    fn test_default_is_unity() {
        let (mut engine, _) = engine();
        let output = render(&mut engine, 16, Vec::new());
        assert!(output.iter().all(|&s| (s - 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_automation_jumps_at_offset() {
        let (mut engine, registry) = engine();
        let output = render(&mut engine, 16, vec![RenderEvent::parameter(8, GAIN, 0.0)]);

        assert!(output[..8].iter().all(|&s| (s - 1.0).abs() < 1e-4));
        assert!(output[8..].iter().all(|&s| s == 0.0));
        assert_eq!(registry.get(GAIN), 0.0);
    }

    #[test]
    fn test_ramp_glides_to_target() {
        let (mut engine, _) = engine();
        let output = render(&mut engine, 16, vec![RenderEvent::ramp(0, GAIN, 0.0, 8)]);

        assert!(output[..8].windows(2).all(|pair| pair[1] < pair[0]));
        assert!(output[0] < 1.0);
        assert!(output[7..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_ramp_spans_blocks() {
        let (mut engine, _) = engine();
        let first = render(&mut engine, 4, vec![RenderEvent::ramp(0, GAIN, 0.0, 8)]);
        let second = render(&mut engine, 8, Vec::new());

        assert!((first[3] - 0.5).abs() < 1e-3);
        assert!(second[0] < first[3]);
        assert!(second[3..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_invert() {
        let (mut engine, _) = engine();
        let output = render(&mut engine, 8, vec![RenderEvent::parameter(0, INVERT, 1.0)]);
        assert!(output.iter().all(|&s| (s + 1.0).abs() < 1e-4));
    }

    #[test]
    fn test_catalog_layout() {
        let (_, registry) = engine();
        assert_eq!(registry.index_of(GAIN), Some(GAIN_INDEX));
        assert_eq!(registry.path_of(GAIN_INDEX).as_deref(), Some("output/gain"));
        assert_eq!(registry.path_of(1).as_deref(), Some("output/invert"));
    }

    #[test]
    fn test_gain_display() {
        let (_, registry) = engine();
        let mut text = String::new();
        registry.normalized_to_string(GAIN, 1.0, &mut text).unwrap();
        assert_eq!(text, "+12.0 dB");

        text.clear();
        registry.normalized_to_string(GAIN, 0.5, &mut text).unwrap();
        assert_eq!(text, "-24.0 dB");
    }

    #[test]
    fn test_state_restores_settings_and_values() {
        let source = PluginWrapper::<Gain>::new(&CONFIG).unwrap();
        source.lock_plugin().unwrap().settings.preset_name = Some("Quiet".to_string());
        source.set_parameter_value(GAIN, 0.25);
        source.set_parameter_value(INVERT, 1.0);

        let mut blob = Vec::new();
        source.save_state(&mut blob).unwrap();

        let target = PluginWrapper::<Gain>::new(&CONFIG).unwrap();
        target.load_state(&mut &blob[..]).unwrap();

        assert_eq!(target.registry().get(GAIN), 0.25);
        assert_eq!(target.registry().get(INVERT), 1.0);
        assert_eq!(
            target.lock_plugin().unwrap().settings.preset_name.as_deref(),
            Some("Quiet")
        );
    }

    #[test]
    fn test_rejects_malformed_settings() {
        let mut plugin = Gain::default();
        assert!(plugin.load_extra(serde_json::json!({ "preset_name": 7 })).is_err());
        assert!(plugin.load_extra(serde_json::json!({})).is_ok());
        assert_eq!(plugin.settings, Settings::default());
    }
}
