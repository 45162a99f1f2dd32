//! Transform definitions for color space conversions.
//!
//! Transforms are declarative: they describe an operation and never run on
//! their own. A [`Config`](crate::Config) compiles them against a
//! [`Context`](crate::Context) into a [`Processor`](crate::Processor).
//!
//! Node kinds:
//! - Matrix, exponent, log and CDL math
//! - File references (resolved through the context search path)
//! - Color space, look and display/view references
//! - Groups chaining any of the above

/// Transform application direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformDirection {
    /// Forward transform.
    #[default]
    Forward,
    /// Inverse transform.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Combines a nested direction with the direction it is applied in.
    #[inline]
    pub fn combine(self, outer: Self) -> Self {
        if outer == Self::Inverse { self.inverse() } else { self }
    }

    /// Parses a config token (`forward` / `inverse`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "inverse" => Some(Self::Inverse),
            _ => None,
        }
    }

    /// Config token for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Inverse => "inverse",
        }
    }
}

/// Interpolation method for LUT-backed file transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Not specified; the loader picks.
    #[default]
    Unknown,
    /// Nearest neighbor.
    Nearest,
    /// Linear interpolation.
    Linear,
    /// Tetrahedral interpolation (3D only).
    Tetrahedral,
    /// Best available.
    Best,
}

impl Interpolation {
    /// Parses a config token. Unrecognized tokens yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Some(Self::Unknown),
            "nearest" => Some(Self::Nearest),
            "linear" => Some(Self::Linear),
            "tetrahedral" => Some(Self::Tetrahedral),
            "best" => Some(Self::Best),
            _ => None,
        }
    }

    /// Config token for this interpolation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Tetrahedral => "tetrahedral",
            Self::Best => "best",
        }
    }
}

/// Color transform definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// 4x4 matrix + offset.
    Matrix(MatrixTransform),
    /// Per-channel power.
    Exponent(ExponentTransform),
    /// Logarithm of a fixed base.
    Log(LogTransform),
    /// ASC CDL (slope/offset/power/sat).
    Cdl(CdlTransform),
    /// LUT or other file reference.
    File(FileTransform),
    /// Conversion between two named color spaces.
    ColorSpace(ColorSpaceTransform),
    /// Look chain applied between two color spaces.
    Look(LookTransform),
    /// Display/view rendering of an input color space.
    Display(DisplayTransform),
    /// Ordered chain of transforms.
    Group(GroupTransform),
}

impl Transform {
    /// Creates a matrix transform from a row-major 4x4 array.
    pub fn matrix(m: [f64; 16]) -> Self {
        Self::Matrix(MatrixTransform {
            matrix: m,
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a group transform.
    pub fn group(transforms: Vec<Transform>) -> Self {
        Self::Group(GroupTransform {
            transforms,
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a file transform. `src` may contain `$VAR` tokens.
    pub fn file(src: impl Into<String>) -> Self {
        Self::File(FileTransform {
            src: src.into(),
            interpolation: Interpolation::default(),
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a color space conversion transform.
    pub fn colorspace(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self::ColorSpace(ColorSpaceTransform {
            src: src.into(),
            dst: dst.into(),
            direction: TransformDirection::Forward,
        })
    }

    /// Creates a uniform exponent transform (alpha untouched).
    pub fn exponent(value: f64) -> Self {
        Self::Exponent(ExponentTransform {
            value: [value, value, value, 1.0],
            direction: TransformDirection::Forward,
        })
    }

    /// Direction stored on this node.
    pub fn direction(&self) -> TransformDirection {
        match self {
            Self::Matrix(t) => t.direction,
            Self::Exponent(t) => t.direction,
            Self::Log(t) => t.direction,
            Self::Cdl(t) => t.direction,
            Self::File(t) => t.direction,
            Self::ColorSpace(t) => t.direction,
            Self::Look(t) => t.direction,
            Self::Display(t) => t.direction,
            Self::Group(t) => t.direction,
        }
    }

    /// Returns the inverse of this transform.
    pub fn inverse(mut self) -> Self {
        let dir = match &mut self {
            Self::Matrix(t) => &mut t.direction,
            Self::Exponent(t) => &mut t.direction,
            Self::Log(t) => &mut t.direction,
            Self::Cdl(t) => &mut t.direction,
            Self::File(t) => &mut t.direction,
            Self::ColorSpace(t) => &mut t.direction,
            Self::Look(t) => &mut t.direction,
            Self::Display(t) => &mut t.direction,
            Self::Group(t) => &mut t.direction,
        };
        *dir = dir.inverse();
        self
    }

    /// Collects every file transform reachable through groups.
    pub fn file_transforms(&self) -> Vec<&FileTransform> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a FileTransform>) {
        match self {
            Self::File(f) => out.push(f),
            Self::Group(g) => {
                for t in &g.transforms {
                    t.collect_files(out);
                }
            }
            _ => {}
        }
    }
}

/// 4x4 matrix + offset transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixTransform {
    /// 4x4 matrix in row-major order.
    pub matrix: [f64; 16],
    /// RGBA offset.
    pub offset: [f64; 4],
    /// Direction.
    pub direction: TransformDirection,
}

impl MatrixTransform {
    /// Identity matrix.
    pub const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
}

impl Default for MatrixTransform {
    fn default() -> Self {
        Self {
            matrix: Self::IDENTITY,
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        }
    }
}

/// Exponent/gamma transform. Negative inputs clamp to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentTransform {
    /// Per-channel exponents [R, G, B, A].
    pub value: [f64; 4],
    /// Direction.
    pub direction: TransformDirection,
}

/// Log transform (lin-to-log forward, log-to-lin inverse).
#[derive(Debug, Clone, PartialEq)]
pub struct LogTransform {
    /// Base of logarithm.
    pub base: f64,
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for LogTransform {
    fn default() -> Self {
        Self {
            base: 2.0,
            direction: TransformDirection::Forward,
        }
    }
}

/// ASC CDL transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CdlTransform {
    /// Per-channel slope [R, G, B].
    pub slope: [f64; 3],
    /// Per-channel offset [R, G, B].
    pub offset: [f64; 3],
    /// Per-channel power [R, G, B].
    pub power: [f64; 3],
    /// Saturation (1.0 = no change).
    pub saturation: f64,
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for CdlTransform {
    fn default() -> Self {
        Self {
            slope: [1.0; 3],
            offset: [0.0; 3],
            power: [1.0; 3],
            saturation: 1.0,
            direction: TransformDirection::Forward,
        }
    }
}

/// File-based transform.
///
/// The file format itself is handled by a [`FileLoader`](crate::FileLoader).
#[derive(Debug, Clone, PartialEq)]
pub struct FileTransform {
    /// Source file name, possibly containing context variables.
    pub src: String,
    /// Interpolation method.
    pub interpolation: Interpolation,
    /// Direction.
    pub direction: TransformDirection,
}

/// Reference to a pair of named color spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpaceTransform {
    /// Source color space or role.
    pub src: String,
    /// Destination color space or role.
    pub dst: String,
    /// Direction.
    pub direction: TransformDirection,
}

/// Look chain applied between two color spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct LookTransform {
    /// Source color space.
    pub src: String,
    /// Destination color space.
    pub dst: String,
    /// Look chain (`"a, -b"` or `"a:b"`).
    pub looks: String,
    /// Direction.
    pub direction: TransformDirection,
}

/// Display/view rendering of an input color space.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTransform {
    /// Input color space.
    pub input_colorspace: String,
    /// Display name.
    pub display: String,
    /// View name.
    pub view: String,
    /// Look chain replacing the view's own looks.
    pub looks_override: String,
    /// Whether [`looks_override`](Self::looks_override) is used.
    pub looks_override_enabled: bool,
    /// Direction.
    pub direction: TransformDirection,
}

impl DisplayTransform {
    /// Creates a display transform for `input` shown on `display` / `view`.
    pub fn new(input: impl Into<String>, display: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            input_colorspace: input.into(),
            display: display.into(),
            view: view.into(),
            ..Default::default()
        }
    }

    /// Replaces the view's looks with `looks`.
    pub fn with_looks_override(mut self, looks: impl Into<String>) -> Self {
        self.looks_override = looks.into();
        self.looks_override_enabled = true;
        self
    }
}

/// Group of chained transforms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupTransform {
    /// Ordered list of transforms.
    pub transforms: Vec<Transform>,
    /// Direction (inverse runs children reversed).
    pub direction: TransformDirection,
}
