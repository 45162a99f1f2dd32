//! Color space definition and properties.
//!
//! A color space describes:
//! - How to convert to/from the reference space
//! - Categorization (family, equality group)
//! - Metadata (bit depth, description, allocation hints)
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::{BitDepth, ColorSpace};
//!
//! let cs = ColorSpace::builder("lg10")
//!     .family("lg")
//!     .equality_group("log")
//!     .bit_depth(BitDepth::Uint10)
//!     .description("conversion from film log")
//!     .build();
//!
//! assert_eq!(cs.name(), "lg10");
//! assert_eq!(cs.bit_depth(), BitDepth::Uint10);
//! ```

use crate::transform::Transform;

/// Bit depth hint for the color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// Unspecified.
    #[default]
    Unknown,
    /// 8-bit unsigned integer.
    Uint8,
    /// 10-bit unsigned integer.
    Uint10,
    /// 12-bit unsigned integer.
    Uint12,
    /// 14-bit unsigned integer.
    Uint14,
    /// 16-bit unsigned integer.
    Uint16,
    /// 32-bit unsigned integer.
    Uint32,
    /// 16-bit float.
    F16,
    /// 32-bit float.
    F32,
}

impl BitDepth {
    /// Parses a config token such as `10ui` or `32f`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "8ui" => Some(Self::Uint8),
            "10ui" => Some(Self::Uint10),
            "12ui" => Some(Self::Uint12),
            "14ui" => Some(Self::Uint14),
            "16ui" => Some(Self::Uint16),
            "32ui" => Some(Self::Uint32),
            "16f" => Some(Self::F16),
            "32f" => Some(Self::F32),
            _ => None,
        }
    }

    /// Config token for this bit depth.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Uint8 => "8ui",
            Self::Uint10 => "10ui",
            Self::Uint12 => "12ui",
            Self::Uint14 => "14ui",
            Self::Uint16 => "16ui",
            Self::Uint32 => "32ui",
            Self::F16 => "16f",
            Self::F32 => "32f",
        }
    }

    /// True for floating-point depths.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }
}

/// Allocation type for GPU texture mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AllocationType {
    /// Uniform distribution.
    #[default]
    Uniform,
    /// Log2 distribution.
    Lg2,
}

impl AllocationType {
    /// Parses a config token.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Some(Self::Uniform),
            "lg2" => Some(Self::Lg2),
            _ => None,
        }
    }

    /// Config token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Lg2 => "lg2",
        }
    }
}

/// GPU allocation hints. Carried through parsing and serialization only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationInfo {
    /// Allocation type.
    pub alloc_type: AllocationType,
    /// Range variables (min, max and optional offset).
    pub vars: Vec<f64>,
}

/// Color space definition.
///
/// `Clone` is a deep copy: cloning is how an editable copy is taken.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColorSpace {
    name: String,
    family: String,
    equality_group: String,
    description: String,
    bit_depth: BitDepth,
    is_data: bool,
    allocation: AllocationInfo,
    to_reference: Option<Transform>,
    from_reference: Option<Transform>,
}

impl ColorSpace {
    /// Creates a new color space with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a builder for constructing color spaces.
    #[inline]
    pub fn builder(name: impl Into<String>) -> ColorSpaceBuilder {
        ColorSpaceBuilder::new(name)
    }

    /// Returns an independent copy that can be modified freely.
    #[inline]
    pub fn editable_copy(&self) -> Self {
        self.clone()
    }

    /// Returns the color space name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the family label.
    #[inline]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Returns the equality group. Empty means "unique".
    #[inline]
    pub fn equality_group(&self) -> &str {
        &self.equality_group
    }

    /// Returns the description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the bit depth hint.
    #[inline]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Checks if this is a data (non-color) space.
    #[inline]
    pub fn is_data(&self) -> bool {
        self.is_data
    }

    /// Returns allocation hints.
    #[inline]
    pub fn allocation(&self) -> &AllocationInfo {
        &self.allocation
    }

    /// Returns the transform to reference space.
    #[inline]
    pub fn to_reference(&self) -> Option<&Transform> {
        self.to_reference.as_ref()
    }

    /// Returns the transform from reference space.
    #[inline]
    pub fn from_reference(&self) -> Option<&Transform> {
        self.from_reference.as_ref()
    }

    /// Sets the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sets the family.
    pub fn set_family(&mut self, family: impl Into<String>) {
        self.family = family.into();
    }

    /// Sets the equality group.
    pub fn set_equality_group(&mut self, group: impl Into<String>) {
        self.equality_group = group.into();
    }

    /// Sets the description.
    pub fn set_description(&mut self, desc: impl Into<String>) {
        self.description = desc.into();
    }

    /// Sets the bit depth.
    pub fn set_bit_depth(&mut self, depth: BitDepth) {
        self.bit_depth = depth;
    }

    /// Marks as data (non-color) space.
    pub fn set_is_data(&mut self, is_data: bool) {
        self.is_data = is_data;
    }

    /// Sets allocation hints.
    pub fn set_allocation(&mut self, alloc: AllocationInfo) {
        self.allocation = alloc;
    }

    /// Sets or clears the transform to reference space.
    pub fn set_to_reference(&mut self, transform: Option<Transform>) {
        self.to_reference = transform;
    }

    /// Sets or clears the transform from reference space.
    pub fn set_from_reference(&mut self, transform: Option<Transform>) {
        self.from_reference = transform;
    }

    /// Case-insensitive name comparison.
    #[inline]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// True if a conversion between `self` and `other` is a no-op.
    ///
    /// Holds for the same color space or for a shared, non-empty equality group.
    pub fn is_equivalent(&self, other: &ColorSpace) -> bool {
        if !self.name.is_empty() && self.matches_name(&other.name) {
            return true;
        }
        !self.equality_group.is_empty() && self.equality_group == other.equality_group
    }
}

/// Builder for constructing color spaces.
#[derive(Debug)]
pub struct ColorSpaceBuilder {
    inner: ColorSpace,
}

impl ColorSpaceBuilder {
    /// Creates a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: ColorSpace::new(name),
        }
    }

    /// Sets the family.
    pub fn family(mut self, family: impl Into<String>) -> Self {
        self.inner.family = family.into();
        self
    }

    /// Sets the equality group.
    pub fn equality_group(mut self, group: impl Into<String>) -> Self {
        self.inner.equality_group = group.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.inner.description = desc.into();
        self
    }

    /// Sets the bit depth.
    pub fn bit_depth(mut self, depth: BitDepth) -> Self {
        self.inner.bit_depth = depth;
        self
    }

    /// Marks as data (non-color) space.
    pub fn is_data(mut self, is_data: bool) -> Self {
        self.inner.is_data = is_data;
        self
    }

    /// Sets allocation hints.
    pub fn allocation(mut self, alloc: AllocationInfo) -> Self {
        self.inner.allocation = alloc;
        self
    }

    /// Sets the transform to reference space.
    pub fn to_reference(mut self, transform: Transform) -> Self {
        self.inner.to_reference = Some(transform);
        self
    }

    /// Sets the transform from reference space.
    pub fn from_reference(mut self, transform: Transform) -> Self {
        self.inner.from_reference = Some(transform);
        self
    }

    /// Builds the color space.
    pub fn build(self) -> ColorSpace {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_colorspace() {
        let cs = ColorSpace::builder("lnf")
            .family("ln")
            .bit_depth(BitDepth::F32)
            .description("lnf :  linear show space")
            .build();

        assert_eq!(cs.name(), "lnf");
        assert_eq!(cs.family(), "ln");
        assert!(cs.bit_depth().is_float());
        assert!(cs.matches_name("LNF"));
        assert!(cs.to_reference().is_none());
    }

    #[test]
    fn bit_depth_tokens() {
        for token in ["unknown", "8ui", "10ui", "12ui", "14ui", "16ui", "32ui", "16f", "32f"] {
            let depth = BitDepth::parse(token).unwrap();
            assert_eq!(depth.as_str(), token);
        }
        assert_eq!(BitDepth::parse("11ui"), None);
    }

    #[test]
    fn editable_copy_is_independent() {
        let original = ColorSpace::builder("vd8").family("vd").build();
        let mut copy = original.editable_copy();
        copy.set_family("video");

        assert_eq!(original.family(), "vd");
        assert_eq!(copy.family(), "video");
    }

    #[test]
    fn equivalence() {
        let a = ColorSpace::builder("a").equality_group("g").build();
        let b = ColorSpace::builder("b").equality_group("g").build();
        let c = ColorSpace::builder("c").build();
        let c2 = ColorSpace::builder("c2").build();

        assert!(a.is_equivalent(&b));
        assert!(c.is_equivalent(&c));
        assert!(!c.is_equivalent(&c2));
        assert!(!a.is_equivalent(&c));
    }
}
