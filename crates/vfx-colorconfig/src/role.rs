//! Standard color space roles.
//!
//! Roles reference color spaces by purpose rather than by name, which keeps
//! tools portable across configs.
//!
//! # Standard Roles
//!
//! - `default` - Fallback color space for unlabeled input
//! - `reference` - Reference space all transforms pass through
//! - `data` - Non-color data (normals, masks, etc.)
//! - `scene_linear` - Scene-referred linear working space
//! - `compositing_log` - Log space for compositing operations
//! - `color_timing` - Color grading/timing space
//! - `texture_paint` - Texture painting space
//! - `matte_paint` - Matte painting space
//! - `color_picking` - Color picker display space

use std::collections::BTreeMap;

/// Standard role names.
pub mod names {
    /// Fallback input color space.
    pub const DEFAULT: &str = "default";
    /// Reference space.
    pub const REFERENCE: &str = "reference";
    /// Non-color data (normals, masks).
    pub const DATA: &str = "data";
    /// Color picker display space.
    pub const COLOR_PICKING: &str = "color_picking";
    /// Scene-referred linear working space.
    pub const SCENE_LINEAR: &str = "scene_linear";
    /// Compositing log space.
    pub const COMPOSITING_LOG: &str = "compositing_log";
    /// Color grading space.
    pub const COLOR_TIMING: &str = "color_timing";
    /// Texture painting space.
    pub const TEXTURE_PAINT: &str = "texture_paint";
    /// Matte painting space.
    pub const MATTE_PAINT: &str = "matte_paint";

    /// Every standard role.
    pub const ALL: [&str; 9] = [
        DEFAULT,
        REFERENCE,
        DATA,
        COLOR_PICKING,
        SCENE_LINEAR,
        COMPOSITING_LOG,
        COLOR_TIMING,
        TEXTURE_PAINT,
        MATTE_PAINT,
    ];
}

/// Role to color space mapping.
///
/// Roles enumerate in name order, so indices are stable between mutations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roles {
    mapping: BTreeMap<String, String>,
}

impl Roles {
    /// Creates an empty roles mapping.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or removes a role.
    ///
    /// An empty `colorspace` removes the role.
    pub fn set(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        let role = role.into();
        let colorspace = colorspace.into();
        if colorspace.is_empty() {
            self.mapping.remove(&role);
        } else {
            self.mapping.insert(role, colorspace);
        }
    }

    /// Gets the color space name for a role.
    #[inline]
    pub fn get(&self, role: &str) -> Option<&str> {
        self.mapping.get(role).map(String::as_str)
    }

    /// Checks if a role is defined.
    #[inline]
    pub fn contains(&self, role: &str) -> bool {
        self.mapping.contains_key(role)
    }

    /// Role name at `index`, or `None` when out of range.
    #[inline]
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.mapping.keys().nth(index).map(String::as_str)
    }

    /// Returns all defined roles.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of defined roles.
    #[inline]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Checks if no roles are defined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Removes every role.
    #[inline]
    pub fn clear(&mut self) {
        self.mapping.clear();
    }

    /// Gets the default input color space name.
    #[inline]
    pub fn default_input(&self) -> Option<&str> {
        self.get(names::DEFAULT)
    }
}
