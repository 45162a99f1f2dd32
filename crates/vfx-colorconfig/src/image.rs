//! Packed image buffers processed in place.

/// Interleaved `f32` pixel buffer borrowed for processing.
///
/// Construction performs no validation; dimensions, channel count and buffer
/// length are checked when a [`Processor`](crate::Processor) is applied.
#[derive(Debug)]
pub struct PackedImageDesc<'a> {
    data: &'a mut [f32],
    width: usize,
    height: usize,
    channels: usize,
}

impl<'a> PackedImageDesc<'a> {
    /// Describes `data` as `width * height` pixels of `channels` values.
    pub fn new(data: &'a mut [f32], width: usize, height: usize, channels: usize) -> Self {
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Values per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Pixel data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        self.data
    }

    /// Mutable pixel data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        self.data
    }
}
