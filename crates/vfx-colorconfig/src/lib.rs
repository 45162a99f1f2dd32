//! Color management configuration and processor resolution for VFX.
//!
//! This crate models an OCIO-style color configuration:
//! - Color spaces, roles, displays/views and looks held by a [`Config`]
//! - A [`Context`] of variables and search paths for locating LUT files
//! - Declarative [`Transform`] graphs compiled into cached [`Processor`]s
//! - In-place application to [`PackedImageDesc`] pixel buffers
//!
//! LUT file formats are not parsed here. A [`FileLoader`] installed on the
//! config turns resolved files into processor operations.
//!
//! # Quick Start
//!
//! ```
//! use vfx_colorconfig::{CdlTransform, ColorSpace, Config, PackedImageDesc, Transform};
//!
//! let mut config = Config::new();
//! config.add_colorspace(ColorSpace::new("lnf"));
//! config.add_colorspace(
//!     ColorSpace::builder("bright")
//!         .from_reference(Transform::Cdl(CdlTransform {
//!             slope: [2.0; 3],
//!             ..Default::default()
//!         }))
//!         .build(),
//! );
//! config.set_role("scene_linear", "lnf")?;
//!
//! let processor = config.processor("scene_linear", "bright")?;
//!
//! let mut pixels = vec![0.25_f32, 0.25, 0.25, 1.0];
//! processor.apply(&mut PackedImageDesc::new(&mut pixels, 1, 1, 4))?;
//! assert_eq!(pixels, [0.5, 0.5, 0.5, 1.0]);
//! # Ok::<(), vfx_colorconfig::OcioError>(())
//! ```
//!
//! # Loading Configs
//!
//! ```ignore
//! use vfx_colorconfig::Config;
//!
//! let config = Config::from_file("path/to/config.ocio")?;
//! config.sanity_check()?;
//!
//! let display = config.default_display().unwrap_or("sRGB");
//! println!("{} views on {display}", config.num_views(display));
//! ```
//!
//! # Contexts
//!
//! File transforms are resolved through the context passed at compile time,
//! so the same config can bind different files per shot:
//!
//! ```ignore
//! let mut ctx = config.current_context().editable_copy();
//! ctx.set_string_var("SHOT", "sh020");
//! let processor = config.processor_with_context(&ctx, "lg10", "lnf")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;
mod colorspace;
mod compile;
mod config;
mod context;
mod current;
mod display;
mod error;
mod image;
mod loader;
mod look;
mod processor;
mod role;
mod transform;
mod yaml;

pub mod validate;

// Re-exports
pub use error::{ErrorKind, OcioError, OcioResult};
pub use config::{Config, OCIO_ENV};
pub use colorspace::{AllocationInfo, AllocationType, BitDepth, ColorSpace, ColorSpaceBuilder};
pub use context::{Context, EnvironmentMode, MAX_EXPANDED_LEN, SEARCH_PATH_SEPARATOR};
pub use current::{clear_all_caches, current_config, set_current_config};
pub use display::{Display, DisplayManager, View};
pub use image::PackedImageDesc;
pub use loader::{CachedFileLoader, FileLoader, NullFileLoader};
pub use look::{parse_looks, Look, LookManager};
pub use processor::{Processor, ProcessorMetadata, ProcessorOp};
pub use role::{names as role_names, Roles};
pub use transform::{
    CdlTransform, ColorSpaceTransform, DisplayTransform, ExponentTransform, FileTransform,
    GroupTransform, Interpolation, LogTransform, LookTransform, MatrixTransform, Transform,
    TransformDirection,
};
pub use validate::{check as validate_config, has_errors, has_warnings, Issue, IssueCategory, Severity};

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Crate version as `0xMMmmpp00`.
pub fn version_hex() -> u32 {
    fn part(s: &str) -> u32 {
        s.parse().unwrap_or(0) & 0xff
    }
    (part(env!("CARGO_PKG_VERSION_MAJOR")) << 24)
        | (part(env!("CARGO_PKG_VERSION_MINOR")) << 16)
        | (part(env!("CARGO_PKG_VERSION_PATCH")) << 8)
}
