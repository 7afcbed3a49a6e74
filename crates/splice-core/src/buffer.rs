//! Audio buffer views for plugin processing.
//!
//! - **[`Buffer`]**: main bus, processed in place (the format layer copies
//!   host input into the output channels before rendering)
//! - **[`AuxBuffer`]**: read-only auxiliary (sidechain) input
//!
//! # Segments
//!
//! The engine renders a block in segments split at event offsets. Rather
//! than rebuilding views per segment, both buffer types carry a sample
//! window into the full block; processors only ever see the current
//! segment through [`Buffer::channel`] and friends.
//!
//! # Real-Time Safety
//!
//! Channel slices live in fixed-size stack arrays of [`MAX_CHANNELS`]
//! slots. No heap allocation occurs during construction or use.
//!
//! # Example: Gain
//!
//! ```ignore
//! fn process(&mut self, buffer: &mut Buffer, _aux: Option<&AuxBuffer>, context: &ProcessContext) -> ProcessStatus {
//!     let gain = context.parameters.plain_value_at(GAIN) as f32;
//!     for channel in buffer.channels_mut() {
//!         for sample in channel {
//!             *sample *= gain;
//!         }
//!     }
//!     ProcessStatus::Normal
//! }
//! ```

use std::ops::Range;

use crate::types::MAX_CHANNELS;

// =============================================================================
// Buffer - Main Audio I/O
// =============================================================================

/// Main bus channels for one block, processed in place.
pub struct Buffer<'a> {
    channels: [Option<&'a mut [f32]>; MAX_CHANNELS],
    num_channels: usize,
    num_frames: usize,
    window: Range<usize>,
}

impl<'a> Buffer<'a> {
    /// Create a buffer from channel slices covering `num_frames` frames.
    ///
    /// Channels beyond [`MAX_CHANNELS`] are ignored. Slices shorter than
    /// `num_frames` shrink the block to the shortest slice.
    pub fn new(channels: impl IntoIterator<Item = &'a mut [f32]>, num_frames: usize) -> Self {
        let mut slots: [Option<&'a mut [f32]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_channels = 0;
        let mut frames = num_frames;
        for (slot, channel) in slots.iter_mut().zip(channels) {
            frames = frames.min(channel.len());
            *slot = Some(channel);
            num_channels += 1;
        }

        Self {
            channels: slots,
            num_channels,
            num_frames: frames,
            window: 0..frames,
        }
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Frames in the current segment.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.window.len()
    }

    /// Position of the current segment within the block.
    #[inline]
    pub fn segment_offset(&self) -> usize {
        self.window.start
    }

    /// Frames in the whole block.
    #[inline]
    pub fn block_frames(&self) -> usize {
        self.num_frames
    }

    /// Current segment of one channel. Empty when the channel doesn't exist.
    #[inline]
    pub fn channel(&mut self, channel: usize) -> &mut [f32] {
        let window = self.window.clone();
        match self.channels.get_mut(channel).and_then(|slot| slot.as_mut()) {
            Some(samples) => &mut samples[window],
            None => &mut [],
        }
    }

    /// Iterate over the current segment of every channel.
    #[inline]
    pub fn channels_mut(&mut self) -> ChannelsMut<'_, 'a> {
        ChannelsMut {
            slots: self.channels[..self.num_channels].iter_mut(),
            window: self.window.clone(),
        }
    }

    /// Zero the whole block, regardless of the current segment.
    pub fn silence(&mut self) {
        let frames = self.num_frames;
        for samples in self.channels[..self.num_channels].iter_mut().flatten() {
            samples[..frames].fill(0.0);
        }
    }

    /// Restrict the view to `window` (clamped to the block).
    #[inline]
    pub(crate) fn set_window(&mut self, window: Range<usize>) {
        let end = window.end.min(self.num_frames);
        self.window = window.start.min(end)..end;
    }
}

/// Iterator returned by [`Buffer::channels_mut`].
pub struct ChannelsMut<'s, 'a> {
    slots: std::slice::IterMut<'s, Option<&'a mut [f32]>>,
    window: Range<usize>,
}

impl<'s, 'a> Iterator for ChannelsMut<'s, 'a> {
    type Item = &'s mut [f32];

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(samples) = slot.as_mut() {
                return Some(&mut samples[self.window.clone()]);
            }
        }
        None
    }
}

// =============================================================================
// AuxBuffer - Sidechain Input
// =============================================================================

/// Read-only auxiliary input channels for one block.
pub struct AuxBuffer<'a> {
    channels: [Option<&'a [f32]>; MAX_CHANNELS],
    num_channels: usize,
    num_frames: usize,
    window: Range<usize>,
}

impl<'a> AuxBuffer<'a> {
    pub fn new(channels: impl IntoIterator<Item = &'a [f32]>, num_frames: usize) -> Self {
        let mut slots: [Option<&'a [f32]>; MAX_CHANNELS] = [None; MAX_CHANNELS];
        let mut num_channels = 0;
        let mut frames = num_frames;
        for (slot, channel) in slots.iter_mut().zip(channels) {
            frames = frames.min(channel.len());
            *slot = Some(channel);
            num_channels += 1;
        }

        Self {
            channels: slots,
            num_channels,
            num_frames: frames,
            window: 0..frames,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.window.len()
    }

    /// Current segment of one channel. Empty when the channel doesn't exist.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        match self.channels.get(channel).copied().flatten() {
            Some(samples) => &samples[self.window.clone()],
            None => &[],
        }
    }

    #[inline]
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.channels[..self.num_channels]
            .iter()
            .filter_map(move |slot| slot.map(|samples| &samples[self.window.clone()]))
    }

    #[inline]
    pub(crate) fn set_window(&mut self, window: Range<usize>) {
        let end = window.end.min(self.num_frames);
        self.window = window.start.min(end)..end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_limits_channel_view() {
        let mut left = [1.0f32; 8];
        let mut right = [2.0f32; 8];
        let mut buffer = Buffer::new([&mut left[..], &mut right[..]], 8);
        assert_eq!(buffer.num_channels(), 2);

        buffer.set_window(2..5);
        assert_eq!(buffer.num_samples(), 3);
        assert_eq!(buffer.segment_offset(), 2);
        for channel in buffer.channels_mut() {
            channel.fill(0.0);
        }

        assert_eq!(left, [1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(right[4], 0.0);
        assert_eq!(right[5], 2.0);
    }

    fn apply_gain(buffer: &mut Buffer, gain: f32) -> usize {
        let mut channels = 0;
        for channel in buffer.channels_mut() {
            channel.iter_mut().for_each(|s| *s *= gain);
            channels += 1;
        }
        channels
    }

    #[test]
    fn test_channels_mut_through_borrowed_buffer() {
        let mut left = [1.0f32; 4];
        let mut right = [2.0f32; 4];
        let mut buffer = Buffer::new([&mut left[..], &mut right[..]], 4);
        buffer.set_window(0..2);

        assert_eq!(apply_gain(&mut buffer, 0.5), 2);
        assert_eq!(buffer.channels_mut().map(|c| c.len()).sum::<usize>(), 4);
        assert_eq!(left, [0.5, 0.5, 1.0, 1.0]);
        assert_eq!(right, [1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_missing_channel_is_empty() {
        let mut mono = [0.5f32; 4];
        let mut buffer = Buffer::new([&mut mono[..]], 4);
        assert!(buffer.channel(3).is_empty());
        assert_eq!(buffer.channel(0).len(), 4);
    }

    #[test]
    fn test_short_slice_shrinks_block() {
        let mut long = [0.0f32; 8];
        let mut short = [0.0f32; 3];
        let buffer = Buffer::new([&mut long[..], &mut short[..]], 8);
        assert_eq!(buffer.block_frames(), 3);
    }

    #[test]
    fn test_silence_ignores_window() {
        let mut samples = [1.0f32; 4];
        let mut buffer = Buffer::new([&mut samples[..]], 4);
        buffer.set_window(1..2);
        buffer.silence();
        assert_eq!(samples, [0.0; 4]);
    }

    #[test]
    fn test_aux_window() {
        let sidechain = [0.0f32, 1.0, 2.0, 3.0];
        let mut aux = AuxBuffer::new([&sidechain[..]], 4);
        aux.set_window(1..3);
        assert_eq!(aux.channel(0), &[1.0, 2.0]);
        assert_eq!(aux.channels().count(), 1);
        assert!(aux.channel(1).is_empty());
    }
}
