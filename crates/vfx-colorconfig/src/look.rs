//! Look definitions for creative color transforms.
//!
//! A look is a named grade applied in its own process space, typically a
//! show LUT or a per-shot CDL. Views reference looks through look chains
//! such as `"+di, -grade"`.
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::Look;
//!
//! let look = Look::new("di")
//!     .process_space("p3dci8")
//!     .description("digital intermediate grade");
//!
//! assert_eq!(look.name(), "di");
//! assert_eq!(look.get_process_space(), "p3dci8");
//! ```

use crate::transform::{Transform, TransformDirection};

/// A named creative look/grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Look {
    name: String,
    process_space: String,
    description: String,
    transform: Option<Transform>,
    inverse_transform: Option<Transform>,
}

impl Look {
    /// Creates a new look with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process_space: String::new(),
            description: String::new(),
            transform: None,
            inverse_transform: None,
        }
    }

    /// Sets the process space.
    pub fn process_space(mut self, space: impl Into<String>) -> Self {
        self.process_space = space.into();
        self
    }

    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Sets the forward transform.
    pub fn transform(mut self, t: Transform) -> Self {
        self.transform = Some(t);
        self
    }

    /// Sets the explicit inverse transform.
    pub fn inverse_transform(mut self, t: Transform) -> Self {
        self.inverse_transform = Some(t);
        self
    }

    /// Returns the look name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the process space name.
    #[inline]
    pub fn get_process_space(&self) -> &str {
        &self.process_space
    }

    /// Returns the description.
    #[inline]
    pub fn get_description(&self) -> &str {
        &self.description
    }

    /// Returns the forward transform.
    #[inline]
    pub fn get_transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Returns the explicit inverse transform.
    #[inline]
    pub fn get_inverse_transform(&self) -> Option<&Transform> {
        self.inverse_transform.as_ref()
    }

    /// Transform to run for `direction`.
    ///
    /// An explicit inverse is used as-is; otherwise the forward transform is
    /// inverted.
    pub fn transform_for(&self, direction: TransformDirection) -> Option<Transform> {
        match direction {
            TransformDirection::Forward => self
                .transform
                .clone()
                .or_else(|| self.inverse_transform.clone().map(Transform::inverse)),
            TransformDirection::Inverse => self
                .inverse_transform
                .clone()
                .or_else(|| self.transform.clone().map(Transform::inverse)),
        }
    }
}

/// Collection of looks, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LookManager {
    looks: Vec<Look>,
}

impl LookManager {
    /// Creates an empty look manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a look, replacing one with the same name in place.
    pub fn add(&mut self, look: Look) {
        match self.looks.iter_mut().find(|l| l.name.eq_ignore_ascii_case(&look.name)) {
            Some(existing) => *existing = look,
            None => self.looks.push(look),
        }
    }

    /// Gets a look by name.
    pub fn get(&self, name: &str) -> Option<&Look> {
        self.looks.iter().find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Returns all looks.
    #[inline]
    pub fn all(&self) -> &[Look] {
        &self.looks
    }

    /// Look name at `index`.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.looks.get(index).map(|l| l.name.as_str())
    }

    /// Number of looks.
    #[inline]
    pub fn len(&self) -> usize {
        self.looks.len()
    }

    /// Checks if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.looks.is_empty()
    }

    /// Removes every look.
    #[inline]
    pub fn clear(&mut self) {
        self.looks.clear();
    }
}

/// Parses a look chain into `(name, direction)` pairs.
///
/// Entries are separated by `,` or `:`. A `-` prefix selects the inverse,
/// `+` or no prefix the forward direction.
pub fn parse_looks(looks: &str) -> Vec<(&str, TransformDirection)> {
    looks
        .split([',', ':'])
        .map(|s| {
            let s = s.trim();
            if let Some(name) = s.strip_prefix('-') {
                (name.trim(), TransformDirection::Inverse)
            } else if let Some(name) = s.strip_prefix('+') {
                (name.trim(), TransformDirection::Forward)
            } else {
                (s, TransformDirection::Forward)
            }
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}
