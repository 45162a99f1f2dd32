//! Compiled processors and their application to pixel buffers.
//!
//! A [`Processor`] is an immutable list of [`ProcessorOp`]s plus the
//! [`ProcessorMetadata`] recorded while compiling it. File lookups are
//! already resolved, so later changes to the originating context have no
//! effect. Processors are `Send + Sync` and keep no per-call scratch state.
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::{PackedImageDesc, Processor, ProcessorOp};
//!
//! let gain = ProcessorOp::Matrix {
//!     matrix: [2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0],
//!     offset: [0.0; 4],
//! };
//! let processor = Processor::from_ops(vec![gain]);
//!
//! let mut pixels = vec![0.25_f32, 0.5, 0.125, 1.0];
//! processor.apply(&mut PackedImageDesc::new(&mut pixels, 1, 1, 4)).unwrap();
//! assert_eq!(pixels, [0.5, 1.0, 0.25, 1.0]);
//! ```

use sha2::{Digest, Sha256};

use crate::error::{OcioError, OcioResult};
use crate::image::PackedImageDesc;

const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Evaluate 3D LUT with tetrahedral interpolation.
///
/// `lut` is red-fastest, `size^3` RGB triplets.
fn eval_lut3d_tetrahedral(
    lut: &[f32],
    size: usize,
    rgb: &[f32; 3],
    domain_min: [f32; 3],
    domain_max: [f32; 3],
) -> [f32; 3] {
    let r = ((rgb[0] - domain_min[0]) / (domain_max[0] - domain_min[0])).clamp(0.0, 1.0);
    let g = ((rgb[1] - domain_min[1]) / (domain_max[1] - domain_min[1])).clamp(0.0, 1.0);
    let b = ((rgb[2] - domain_min[2]) / (domain_max[2] - domain_min[2])).clamp(0.0, 1.0);

    let max_idx = (size - 1) as f32;
    let ri = r * max_idx;
    let gi = g * max_idx;
    let bi = b * max_idx;

    let r0 = (ri.floor() as usize).min(size - 2);
    let g0 = (gi.floor() as usize).min(size - 2);
    let b0 = (bi.floor() as usize).min(size - 2);

    let fr = ri - r0 as f32;
    let fg = gi - g0 as f32;
    let fb = bi - b0 as f32;

    let idx = |r: usize, g: usize, b: usize| -> [f32; 3] {
        let i = (b * size * size + g * size + r) * 3;
        [lut[i], lut[i + 1], lut[i + 2]]
    };

    let c000 = idx(r0, g0, b0);
    let c100 = idx(r0 + 1, g0, b0);
    let c010 = idx(r0, g0 + 1, b0);
    let c110 = idx(r0 + 1, g0 + 1, b0);
    let c001 = idx(r0, g0, b0 + 1);
    let c101 = idx(r0 + 1, g0, b0 + 1);
    let c011 = idx(r0, g0 + 1, b0 + 1);
    let c111 = idx(r0 + 1, g0 + 1, b0 + 1);

    let mut result = [0.0f32; 3];
    for i in 0..3 {
        result[i] = if fr > fg {
            if fg > fb {
                (1.0 - fr) * c000[i] + (fr - fg) * c100[i] + (fg - fb) * c110[i] + fb * c111[i]
            } else if fr > fb {
                (1.0 - fr) * c000[i] + (fr - fb) * c100[i] + (fb - fg) * c101[i] + fg * c111[i]
            } else {
                (1.0 - fb) * c000[i] + (fb - fr) * c001[i] + (fr - fg) * c101[i] + fg * c111[i]
            }
        } else if fr > fb {
            (1.0 - fg) * c000[i] + (fg - fr) * c010[i] + (fr - fb) * c110[i] + fb * c111[i]
        } else if fg > fb {
            (1.0 - fg) * c000[i] + (fg - fb) * c010[i] + (fb - fr) * c011[i] + fr * c111[i]
        } else {
            (1.0 - fb) * c000[i] + (fb - fg) * c001[i] + (fg - fr) * c011[i] + fr * c111[i]
        };
    }

    result
}

/// Compiled operation. Every op acts on RGB only; alpha passes through.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ProcessorOp {
    /// Row-major 4x4 matrix + offset.
    Matrix { matrix: [f32; 16], offset: [f32; 4] },
    /// Per-channel power, negatives clamped to zero.
    Exponent { value: [f32; 3] },
    /// Log (`forward`) or antilog of `base`.
    Log { base: f32, forward: bool },
    /// ASC CDL. The inverse runs saturation first, then SOP backwards.
    Cdl {
        slope: [f32; 3],
        offset: [f32; 3],
        power: [f32; 3],
        saturation: f32,
        forward: bool,
    },
    /// 1D LUT with `channels` interleaved values per entry.
    Lut1d {
        lut: Vec<f32>,
        size: usize,
        channels: usize,
        domain_min: [f32; 3],
        domain_max: [f32; 3],
    },
    /// 3D LUT, red-fastest, tetrahedral interpolation.
    Lut3d {
        lut: Vec<f32>,
        size: usize,
        domain_min: [f32; 3],
        domain_max: [f32; 3],
    },
}

impl ProcessorOp {
    /// Returns true if this operation is an identity (no-op).
    pub fn is_identity(&self) -> bool {
        match self {
            ProcessorOp::Matrix { matrix, offset } => {
                matrix.iter().zip(IDENTITY.iter()).all(|(a, b)| (a - b).abs() < 1e-6)
                    && offset.iter().all(|v| v.abs() < 1e-6)
            }
            ProcessorOp::Exponent { value } => value.iter().all(|v| (*v - 1.0).abs() < 1e-6),
            ProcessorOp::Cdl { slope, offset, power, saturation, .. } => {
                slope.iter().all(|v| (*v - 1.0).abs() < 1e-6)
                    && offset.iter().all(|v| v.abs() < 1e-6)
                    && power.iter().all(|v| (*v - 1.0).abs() < 1e-6)
                    && (*saturation - 1.0).abs() < 1e-6
            }
            _ => false,
        }
    }

    /// Checks that LUT tables match their declared shape.
    ///
    /// A 1D LUT needs at least 2 entries of 1 or 3 channels; a 3D LUT needs
    /// at least 2 entries per axis. Other ops are always valid.
    pub fn validate(&self) -> OcioResult<()> {
        let (kind, lut, size, channels) = match self {
            ProcessorOp::Lut1d { lut, size, channels, .. } => ("1D", lut, *size, *channels),
            ProcessorOp::Lut3d { lut, size, .. } => ("3D", lut, *size, 3),
            _ => return Ok(()),
        };
        match self.expected_lut_len() {
            Some(n) if lut.len() == n => Ok(()),
            _ => Err(OcioError::Transform(format!(
                "malformed {kind} LUT: size {size}, {channels} channels, {} values",
                lut.len()
            ))),
        }
    }

    /// Table length implied by the LUT shape, `None` if the shape is invalid.
    fn expected_lut_len(&self) -> Option<usize> {
        match self {
            ProcessorOp::Lut1d { size, channels, .. } => {
                if *size < 2 || !matches!(channels, 1 | 3) {
                    return None;
                }
                size.checked_mul(*channels)
            }
            ProcessorOp::Lut3d { size, .. } => {
                if *size < 2 {
                    return None;
                }
                size.checked_pow(3)?.checked_mul(3)
            }
            _ => None,
        }
    }

    /// True if an output channel depends on another input channel.
    pub fn has_channel_crosstalk(&self) -> bool {
        match self {
            ProcessorOp::Matrix { matrix, .. } => (0..3)
                .flat_map(|row| (0..3).map(move |col| (row, col)))
                .any(|(row, col)| row != col && matrix[row * 4 + col].abs() > 1e-9),
            ProcessorOp::Cdl { saturation, .. } => (*saturation - 1.0).abs() > 1e-6,
            ProcessorOp::Lut3d { .. } => true,
            _ => false,
        }
    }

    #[inline]
    fn apply_rgb(&self, pixel: &mut [f32; 3]) {
        match self {
            ProcessorOp::Matrix { matrix, offset } => {
                let [r, g, b] = *pixel;
                pixel[0] = r * matrix[0] + g * matrix[1] + b * matrix[2] + offset[0];
                pixel[1] = r * matrix[4] + g * matrix[5] + b * matrix[6] + offset[1];
                pixel[2] = r * matrix[8] + g * matrix[9] + b * matrix[10] + offset[2];
            }

            ProcessorOp::Exponent { value } => {
                for (v, e) in pixel.iter_mut().zip(value) {
                    *v = v.max(0.0).powf(*e);
                }
            }

            ProcessorOp::Log { base, forward } => {
                if *forward {
                    for v in pixel.iter_mut() {
                        *v = v.max(1e-10).log(*base);
                    }
                } else {
                    for v in pixel.iter_mut() {
                        *v = base.powf(*v);
                    }
                }
            }

            ProcessorOp::Cdl { slope, offset, power, saturation, forward } => {
                if *forward {
                    for i in 0..3 {
                        pixel[i] = (pixel[i] * slope[i] + offset[i]).max(0.0).powf(power[i]);
                    }
                    apply_saturation(pixel, *saturation);
                } else {
                    apply_saturation(pixel, 1.0 / *saturation);
                    for i in 0..3 {
                        let v = pixel[i].max(0.0).powf(1.0 / power[i]);
                        pixel[i] = (v - offset[i]) / slope[i];
                    }
                }
            }

            ProcessorOp::Lut1d { lut, size, channels, domain_min, domain_max } => {
                // Malformed tables leave the pixel unchanged.
                if self.expected_lut_len().is_none_or(|n| lut.len() < n) {
                    return;
                }
                for (i, v) in pixel.iter_mut().enumerate() {
                    let range = domain_max[i] - domain_min[i];
                    let scale = if range.abs() < 1e-10 {
                        0.0
                    } else {
                        (*size - 1) as f32 / range
                    };
                    let idx = ((*v - domain_min[i]) * scale).clamp(0.0, (*size - 1) as f32);
                    let idx_floor = idx.floor() as usize;
                    let idx_ceil = (idx_floor + 1).min(*size - 1);
                    let frac = idx - idx_floor as f32;

                    let ch = if *channels == 1 { 0 } else { i };
                    let v0 = lut[idx_floor * channels + ch];
                    let v1 = lut[idx_ceil * channels + ch];
                    *v = v0 + (v1 - v0) * frac;
                }
            }

            ProcessorOp::Lut3d { lut, size, domain_min, domain_max } => {
                if self.expected_lut_len().is_none_or(|n| lut.len() < n) {
                    return;
                }
                *pixel = eval_lut3d_tetrahedral(lut, *size, pixel, *domain_min, *domain_max);
            }
        }
    }
}

fn apply_saturation(pixel: &mut [f32; 3], saturation: f32) {
    if saturation == 1.0 {
        return;
    }
    let luma = pixel[0] * LUMA_R + pixel[1] * LUMA_G + pixel[2] * LUMA_B;
    for v in pixel.iter_mut() {
        *v = luma + (*v - luma) * saturation;
    }
}

/// Files and looks consulted while compiling a processor.
///
/// Both lists keep first-seen order and hold no duplicates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessorMetadata {
    files: Vec<String>,
    looks: Vec<String>,
}

impl ProcessorMetadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resolved file path.
    pub fn add_file(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    /// Records a look name.
    pub fn add_look(&mut self, look: impl Into<String>) {
        let look = look.into();
        if !self.looks.contains(&look) {
            self.looks.push(look);
        }
    }

    /// Number of files.
    #[inline]
    pub fn num_files(&self) -> usize {
        self.files.len()
    }

    /// File at `index`.
    #[inline]
    pub fn file(&self, index: usize) -> Option<&str> {
        self.files.get(index).map(String::as_str)
    }

    /// All files.
    #[inline]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Number of looks.
    #[inline]
    pub fn num_looks(&self) -> usize {
        self.looks.len()
    }

    /// Look at `index`.
    #[inline]
    pub fn look(&self, index: usize) -> Option<&str> {
        self.looks.get(index).map(String::as_str)
    }

    /// All looks.
    #[inline]
    pub fn looks(&self) -> &[String] {
        &self.looks
    }
}

/// Compiled transform processor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Processor {
    ops: Vec<ProcessorOp>,
    metadata: ProcessorMetadata,
}

impl Processor {
    /// Creates a no-op processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor from compiled ops.
    pub fn from_ops(ops: Vec<ProcessorOp>) -> Self {
        Self {
            ops,
            metadata: ProcessorMetadata::default(),
        }
    }

    pub(crate) fn with_metadata(ops: Vec<ProcessorOp>, metadata: ProcessorMetadata) -> Self {
        let mut processor = Self { ops, metadata };
        processor.optimize();
        processor
    }

    /// Returns the compiled operations.
    #[inline]
    pub fn ops(&self) -> &[ProcessorOp] {
        &self.ops
    }

    /// Returns the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Files and looks consulted during compilation.
    #[inline]
    pub fn metadata(&self) -> &ProcessorMetadata {
        &self.metadata
    }

    /// True if applying this processor never alters pixel data.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if channels mix, so per-channel application is invalid.
    pub fn has_channel_crosstalk(&self) -> bool {
        self.ops.iter().any(ProcessorOp::has_channel_crosstalk)
    }

    /// Hash identifying the compiled CPU pipeline.
    pub fn cpu_cache_id(&self) -> String {
        if self.ops.is_empty() {
            return "<NOOP>".to_string();
        }
        let mut hasher = Sha256::new();
        for op in &self.ops {
            hasher.update(format!("{op:?}").as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Removes identity ops and folds adjacent matrices.
    fn optimize(&mut self) {
        self.ops.retain(|op| !op.is_identity());
        self.combine_matrices();
        self.ops.retain(|op| !op.is_identity());
    }

    /// Combines adjacent matrix operations into single matrix.
    fn combine_matrices(&mut self) {
        if self.ops.len() < 2 {
            return;
        }

        let mut result = Vec::with_capacity(self.ops.len());
        let mut pending: Option<([f32; 16], [f32; 4])> = None;

        for op in self.ops.drain(..) {
            if let ProcessorOp::Matrix { matrix, offset } = &op {
                pending = Some(match pending.take() {
                    Some((prev_m, prev_o)) => {
                        let m = mat4_mul(matrix, &prev_m);
                        let o = mat4_apply(matrix, &prev_o);
                        (m, [o[0] + offset[0], o[1] + offset[1], o[2] + offset[2], o[3] + offset[3]])
                    }
                    None => (*matrix, *offset),
                });
            } else {
                if let Some((matrix, offset)) = pending.take() {
                    result.push(ProcessorOp::Matrix { matrix, offset });
                }
                result.push(op);
            }
        }

        if let Some((matrix, offset)) = pending {
            result.push(ProcessorOp::Matrix { matrix, offset });
        }

        self.ops = result;
    }

    /// Applies the processor to a packed image in place.
    ///
    /// Dimensions, channel count and buffer length are validated first; on
    /// failure the buffer is left untouched.
    pub fn apply(&self, image: &mut PackedImageDesc<'_>) -> OcioResult<()> {
        let (width, height, channels) = (image.width(), image.height(), image.channels());
        if width == 0 || height == 0 {
            return Err(OcioError::InvalidDimensions { width, height });
        }
        if channels != 3 && channels != 4 {
            return Err(OcioError::InvalidArgument(format!(
                "unsupported channel count {channels} (expected 3 or 4)"
            )));
        }
        let needed = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| OcioError::InvalidArgument("image size overflows".into()))?;
        if image.data().len() < needed {
            return Err(OcioError::InvalidArgument(format!(
                "buffer holds {} values, {width}x{height}x{channels} needs {needed}",
                image.data().len()
            )));
        }
        if self.ops.is_empty() {
            return Ok(());
        }

        for pixel in image.data_mut()[..needed].chunks_exact_mut(channels) {
            let mut rgb = [pixel[0], pixel[1], pixel[2]];
            self.apply_one_rgb(&mut rgb);
            pixel[..3].copy_from_slice(&rgb);
        }
        Ok(())
    }

    /// Applies the transform to RGB pixels in-place.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        for pixel in pixels.iter_mut() {
            self.apply_one_rgb(pixel);
        }
    }

    /// Applies the transform to RGBA pixels in-place. Alpha is preserved.
    pub fn apply_rgba(&self, pixels: &mut [[f32; 4]]) {
        for pixel in pixels.iter_mut() {
            let mut rgb = [pixel[0], pixel[1], pixel[2]];
            self.apply_one_rgb(&mut rgb);
            pixel[..3].copy_from_slice(&rgb);
        }
    }

    #[inline]
    fn apply_one_rgb(&self, pixel: &mut [f32; 3]) {
        for op in &self.ops {
            op.apply_rgb(pixel);
        }
    }
}

/// 4x4 matrix multiply (row-major [f32; 16] layout)
fn mat4_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    let mut r = [0.0; 16];
    for i in 0..4 {
        for j in 0..4 {
            r[i * 4 + j] = a[i * 4] * b[j]
                + a[i * 4 + 1] * b[4 + j]
                + a[i * 4 + 2] * b[8 + j]
                + a[i * 4 + 3] * b[12 + j];
        }
    }
    r
}

/// Apply 4x4 matrix to 4-vector (row-major [f32; 16] layout)
fn mat4_apply(m: &[f32; 16], v: &[f32; 4]) -> [f32; 4] {
    [
        m[0] * v[0] + m[1] * v[1] + m[2] * v[2] + m[3] * v[3],
        m[4] * v[0] + m[5] * v[1] + m[6] * v[2] + m[7] * v[3],
        m[8] * v[0] + m[9] * v[1] + m[10] * v[2] + m[11] * v[3],
        m[12] * v[0] + m[13] * v[1] + m[14] * v[2] + m[15] * v[3],
    ]
}
