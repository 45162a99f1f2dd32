//! Color configuration: the unit of serialization, resolution and caching.
//!
//! A config aggregates color spaces, roles, displays/views and looks plus a
//! default [`Context`]. Processors are requested from a config by name, by
//! color space value or by transform, and are cached until the config is
//! mutated.
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::{ColorSpace, Config};
//!
//! let mut config = Config::new();
//! config.add_colorspace(ColorSpace::new("lnf"));
//! config.add_colorspace(ColorSpace::builder("lnh").equality_group("linear").build());
//! config.set_role("scene_linear", "lnf")?;
//!
//! let processor = config.processor("scene_linear", "lnf")?;
//! assert!(processor.is_noop());
//! # Ok::<(), vfx_colorconfig::OcioError>(())
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::ProcessorCache;
use crate::colorspace::{AllocationInfo, AllocationType, BitDepth, ColorSpace};
use crate::compile::Compiler;
use crate::context::{referenced_vars, Context, EnvironmentMode};
use crate::display::DisplayManager;
use crate::error::{OcioError, OcioResult};
use crate::loader::{FileLoader, NullFileLoader};
use crate::look::{Look, LookManager};
use crate::processor::Processor;
use crate::role::{names, Roles};
use crate::transform::{FileTransform, Transform, TransformDirection};
use crate::{validate, yaml};

/// Environment variable naming the default config file.
pub const OCIO_ENV: &str = "OCIO";

/// Color management configuration.
///
/// Mutation requires `&mut self` and clears the processor cache, so a
/// `&Config` (or `Arc<Config>`) can be shared across threads for resolution.
/// `Clone` is a deep copy with an empty cache.
pub struct Config {
    /// Profile version (1 or 2).
    version: u32,
    description: String,
    /// Search path as written in the document.
    search_path: String,
    /// Config file location; anchors relative search paths.
    working_dir: PathBuf,
    strict_parsing: bool,
    /// Predefined context variables with defaults.
    environment: Option<BTreeMap<String, String>>,
    colorspaces: Vec<ColorSpace>,
    roles: Roles,
    displays: DisplayManager,
    looks: LookManager,
    context: Context,
    loader: Arc<dyn FileLoader>,
    cache: ProcessorCache,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("version", &self.version)
            .field("description", &self.description)
            .field("search_path", &self.search_path)
            .field("working_dir", &self.working_dir)
            .field("colorspaces", &self.colorspaces.len())
            .field("roles", &self.roles.len())
            .field("displays", &self.displays.num_displays())
            .field("looks", &self.looks.len())
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

impl Clone for Config {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            description: self.description.clone(),
            search_path: self.search_path.clone(),
            working_dir: self.working_dir.clone(),
            strict_parsing: self.strict_parsing,
            environment: self.environment.clone(),
            colorspaces: self.colorspaces.clone(),
            roles: self.roles.clone(),
            displays: self.displays.clone(),
            looks: self.looks.clone(),
            context: self.context.clone(),
            loader: Arc::clone(&self.loader),
            cache: ProcessorCache::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates an empty config.
    ///
    /// The default context loads the whole process environment.
    pub fn new() -> Self {
        let mut config = Self {
            version: 1,
            description: String::new(),
            search_path: String::new(),
            working_dir: PathBuf::from("."),
            strict_parsing: true,
            environment: None,
            colorspaces: Vec::new(),
            roles: Roles::new(),
            displays: DisplayManager::new(),
            looks: LookManager::new(),
            context: Context::new(),
            loader: Arc::new(NullFileLoader),
            cache: ProcessorCache::new(),
        };
        config.context = config.build_context();
        config
    }

    /// Minimal working config: one data space named `raw`.
    pub fn raw() -> Self {
        let mut config = Self::new();
        config.set_description("A raw color configuration, with no color transforms.");
        config.add_colorspace(
            ColorSpace::builder("raw")
                .family("raw")
                .description("A raw color space. Conversions to and from this space are no-ops.")
                .bit_depth(BitDepth::F32)
                .is_data(true)
                .allocation(AllocationInfo {
                    alloc_type: AllocationType::Uniform,
                    vars: vec![0.0, 1.0],
                })
                .build(),
        );
        config.set_role_unchecked(names::DEFAULT, "raw");
        config.add_display("sRGB", "Raw", "raw", "");
        config
    }

    /// Loads the config named by `$OCIO`.
    ///
    /// When the variable is unset or empty, a warning is logged and the
    /// [`raw`](Self::raw) config is returned.
    pub fn from_env() -> OcioResult<Self> {
        Self::from_env_value(std::env::var_os(OCIO_ENV))
    }

    fn from_env_value(value: Option<OsString>) -> OcioResult<Self> {
        match value {
            Some(path) if !path.is_empty() => Self::from_file(PathBuf::from(path)),
            _ => {
                warn!("${} not set, using raw config", OCIO_ENV);
                Ok(Self::raw())
            }
        }
    }

    /// Loads a config document from a file.
    ///
    /// Relative search paths resolve against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> OcioResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OcioError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(path)?;
        let working_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_yaml_str(&content, working_dir)
    }

    /// Parses a config document held in memory.
    pub fn from_yaml_str(yaml: &str, working_dir: impl Into<PathBuf>) -> OcioResult<Self> {
        yaml::parse(yaml, working_dir.into())
    }

    /// Returns an independent copy that can be modified freely.
    #[inline]
    pub fn editable_copy(&self) -> Self {
        self.clone()
    }

    /// Validates referential integrity.
    ///
    /// Fails with [`OcioError::MalformedConfig`] on the first error-level
    /// issue reported by [`validate::check`]. Warnings are logged.
    pub fn sanity_check(&self) -> OcioResult<()> {
        let issues = validate::check(self);
        for issue in issues.iter().filter(|i| i.severity == validate::Severity::Warning) {
            warn!("{}", issue.message);
        }
        match issues.into_iter().find(|i| i.severity == validate::Severity::Error) {
            Some(issue) => Err(OcioError::MalformedConfig {
                reason: issue.message,
            }),
            None => Ok(()),
        }
    }

    /// Writes the config document.
    pub fn serialize(&self) -> String {
        yaml::serialize(self)
    }

    /// Writes the config document to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> OcioResult<()> {
        std::fs::write(path, self.serialize())?;
        Ok(())
    }

    /// Hash identifying this config.
    ///
    /// With a context, the resolved path and filesystem metadata (existence,
    /// size, modification time) of every referenced file are hashed too.
    /// File contents are never read.
    pub fn cache_id(&self, context: Option<&Context>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.serialize().as_bytes());

        if let Some(context) = context {
            for file in self.file_transforms() {
                match context.resolve_file_location(&file.src) {
                    Ok(path) => {
                        hasher.update(path.to_string_lossy().as_bytes());
                        if let Ok(meta) = std::fs::metadata(&path) {
                            hasher.update(meta.len().to_le_bytes());
                            let modified = meta
                                .modified()
                                .ok()
                                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                                .map_or(0, |d| d.as_nanos());
                            hasher.update(modified.to_le_bytes());
                        }
                    }
                    Err(_) => {
                        hasher.update(b"missing:");
                        hasher.update(file.src.as_bytes());
                    }
                }
                hasher.update([0u8]);
            }
        }

        format!("{:x}", hasher.finalize())
    }

    /// File transforms reachable from color spaces and looks.
    fn file_transforms(&self) -> Vec<&FileTransform> {
        let colorspace_transforms = self
            .colorspaces
            .iter()
            .flat_map(|cs| cs.to_reference().into_iter().chain(cs.from_reference()));
        let look_transforms = self
            .looks
            .all()
            .iter()
            .flat_map(|l| l.get_transform().into_iter().chain(l.get_inverse_transform()));
        colorspace_transforms
            .chain(look_transforms)
            .flat_map(Transform::file_transforms)
            .collect()
    }

    fn invalidate(&mut self) {
        self.cache.clear();
    }

    // ========================================================================
    // Document properties
    // ========================================================================

    /// Profile version.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Sets the profile version (1 or 2).
    pub fn set_version(&mut self, version: u32) -> OcioResult<()> {
        if !(1..=2).contains(&version) {
            return Err(OcioError::UnsupportedVersion {
                version: version.to_string(),
            });
        }
        self.version = version;
        self.invalidate();
        Ok(())
    }

    /// Free-text description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.invalidate();
    }

    /// Search path as stored in the document.
    #[inline]
    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    /// Sets the search path of the document and of the default context.
    pub fn set_search_path(&mut self, path: &str) {
        self.search_path = path.to_string();
        self.context.set_search_path(path);
        self.invalidate();
    }

    /// Directory relative search paths resolve against.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Sets the working directory of the config and of the default context.
    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = dir.into();
        self.context.set_working_dir(self.working_dir.clone());
        self.invalidate();
    }

    /// Whether unparseable strings are rejected instead of falling back to
    /// the `default` role.
    #[inline]
    pub fn is_strict_parsing(&self) -> bool {
        self.strict_parsing
    }

    /// Sets strict parsing.
    pub fn set_strict_parsing(&mut self, strict: bool) {
        self.strict_parsing = strict;
        self.invalidate();
    }

    /// Predefined context variables, if the config declares any.
    #[inline]
    pub fn environment(&self) -> Option<&BTreeMap<String, String>> {
        self.environment.as_ref()
    }

    /// Replaces the predefined variables and rebuilds the default context.
    pub fn set_environment(&mut self, environment: Option<BTreeMap<String, String>>) {
        self.environment = environment;
        self.context = self.build_context();
        self.invalidate();
    }

    /// Declares one predefined variable and rebuilds the default context.
    pub fn add_environment_var(&mut self, name: impl Into<String>, default: impl Into<String>) {
        let mut env = self.environment.take().unwrap_or_default();
        env.insert(name.into(), default.into());
        self.set_environment(Some(env));
    }

    /// Builds the default context from the document.
    ///
    /// With an `environment` section the context only loads the declared
    /// variables plus those referenced by search paths and file transforms.
    /// Without one it loads the whole process environment.
    fn build_context(&self) -> Context {
        let mut context = Context::new();
        context.set_search_path(&self.search_path);
        context.set_working_dir(self.working_dir.clone());

        match &self.environment {
            Some(env) => {
                context.set_environment_mode(EnvironmentMode::LoadPredefined);
                for (name, value) in env {
                    context.set_string_var(name.as_str(), value.as_str());
                }
                context.load_environment();

                let mut referenced = referenced_vars(&self.search_path);
                for file in self.file_transforms() {
                    referenced.extend(referenced_vars(&file.src));
                }
                context.load_environment_vars(referenced.iter().map(String::as_str));
            }
            None => {
                context.set_environment_mode(EnvironmentMode::LoadAll);
                context.load_environment();
            }
        }
        context
    }

    // ========================================================================
    // Context and loader
    // ========================================================================

    /// Context used when none is supplied.
    #[inline]
    pub fn current_context(&self) -> &Context {
        &self.context
    }

    /// Replaces the default context.
    pub fn set_current_context(&mut self, context: Context) {
        self.context = context;
        self.invalidate();
    }

    /// Loader turning resolved files into processor ops.
    #[inline]
    pub fn file_loader(&self) -> &dyn FileLoader {
        self.loader.as_ref()
    }

    /// Installs a file loader.
    pub fn set_file_loader(&mut self, loader: Arc<dyn FileLoader>) {
        self.loader = loader;
        self.invalidate();
    }

    /// Drops cached processors and cached file content of this config.
    ///
    /// Other configs are unaffected; see
    /// [`clear_all_caches`](crate::clear_all_caches) for the current config.
    pub fn clear_caches(&self) {
        self.cache.clear();
        self.loader.clear_cache();
    }

    /// Number of cached processors.
    #[inline]
    pub fn num_cached_processors(&self) -> usize {
        self.cache.len()
    }

    // ========================================================================
    // Color spaces
    // ========================================================================

    /// All color spaces in index order.
    #[inline]
    pub fn colorspaces(&self) -> &[ColorSpace] {
        &self.colorspaces
    }

    /// Number of color spaces.
    #[inline]
    pub fn num_colorspaces(&self) -> usize {
        self.colorspaces.len()
    }

    /// Color space name at `index`.
    pub fn colorspace_name_by_index(&self, index: usize) -> Option<&str> {
        self.colorspaces.get(index).map(ColorSpace::name)
    }

    /// Looks up a color space by name, then by role.
    pub fn colorspace(&self, name: &str) -> Option<&ColorSpace> {
        self.colorspace_by_name(name).or_else(|| {
            self.roles
                .get(name)
                .and_then(|target| self.colorspace_by_name(target))
        })
    }

    /// Looks up a color space by literal name only (case-insensitive).
    pub fn colorspace_by_name(&self, name: &str) -> Option<&ColorSpace> {
        if name.is_empty() {
            return None;
        }
        self.colorspaces.iter().find(|cs| cs.matches_name(name))
    }

    /// Index of the color space `name` resolves to.
    pub fn index_for_colorspace(&self, name: &str) -> Option<usize> {
        let target = self.colorspace(name)?.name();
        self.colorspaces.iter().position(|cs| cs.name() == target)
    }

    /// Stores a copy of `cs`, replacing a same-named color space in place.
    pub fn add_colorspace(&mut self, cs: ColorSpace) {
        match self.colorspaces.iter_mut().find(|c| c.matches_name(cs.name())) {
            Some(existing) => *existing = cs,
            None => self.colorspaces.push(cs),
        }
        self.invalidate();
    }

    /// Removes every color space.
    pub fn clear_colorspaces(&mut self) {
        self.colorspaces.clear();
        self.invalidate();
    }

    /// Finds the color space named inside an arbitrary string.
    ///
    /// The longest matching name wins (case-insensitive); among equally long
    /// matches the one starting right-most wins. Without a match, a
    /// non-strict config falls back to the `default` role.
    pub fn parse_colorspace_from_string(&self, text: &str) -> Option<&str> {
        let haystack = text.to_ascii_lowercase();
        let mut best: Option<(usize, usize, &str)> = None;

        for cs in &self.colorspaces {
            if cs.name().is_empty() {
                continue;
            }
            let needle = cs.name().to_ascii_lowercase();
            if let Some(start) = haystack.rfind(&needle) {
                let candidate = (needle.len(), start, cs.name());
                if best.is_none_or(|(len, pos, _)| (candidate.0, candidate.1) > (len, pos)) {
                    best = Some(candidate);
                }
            }
        }

        if let Some((_, _, name)) = best {
            return Some(name);
        }
        if self.strict_parsing {
            return None;
        }
        self.colorspace(names::DEFAULT).map(ColorSpace::name)
    }

    // ========================================================================
    // Roles
    // ========================================================================

    /// Role mapping.
    #[inline]
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Defines a role. An empty `colorspace` removes it.
    ///
    /// # Errors
    ///
    /// [`OcioError::ColorSpaceNotFound`] if `colorspace` is not empty and
    /// names no color space of this config. The role is left unchanged.
    pub fn set_role(
        &mut self,
        role: impl Into<String>,
        colorspace: impl Into<String>,
    ) -> OcioResult<()> {
        let colorspace = colorspace.into();
        if !colorspace.is_empty() && self.colorspace_by_name(&colorspace).is_none() {
            return Err(OcioError::ColorSpaceNotFound { name: colorspace });
        }
        self.set_role_unchecked(role, colorspace);
        Ok(())
    }

    /// Defines a role without checking its target. Documents may name
    /// color spaces that do not exist; `sanity_check` reports those.
    pub(crate) fn set_role_unchecked(
        &mut self,
        role: impl Into<String>,
        colorspace: impl Into<String>,
    ) {
        self.roles.set(role, colorspace);
        self.invalidate();
    }

    /// Number of roles.
    #[inline]
    pub fn num_roles(&self) -> usize {
        self.roles.len()
    }

    /// Checks if `role` is defined.
    #[inline]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Role name at `index` in name order.
    #[inline]
    pub fn role_name(&self, index: usize) -> Option<&str> {
        self.roles.name_at(index)
    }

    // ========================================================================
    // Displays and views
    // ========================================================================

    /// Display registry.
    #[inline]
    pub fn displays(&self) -> &DisplayManager {
        &self.displays
    }

    /// Adds (or replaces) `view` of `display`, creating the display if needed.
    pub fn add_display(&mut self, display: &str, view: &str, colorspace: &str, looks: &str) {
        self.displays.add_display(display, view, colorspace, looks);
        self.invalidate();
    }

    /// Removes every display. Active lists are kept.
    pub fn clear_displays(&mut self) {
        self.displays.clear();
        self.invalidate();
    }

    /// Number of displays.
    #[inline]
    pub fn num_displays(&self) -> usize {
        self.displays.num_displays()
    }

    /// Display name at `index`.
    #[inline]
    pub fn display(&self, index: usize) -> Option<&str> {
        self.displays.display_name(index)
    }

    /// Default display.
    #[inline]
    pub fn default_display(&self) -> Option<&str> {
        self.displays.default_display()
    }

    /// Number of views of `display`.
    #[inline]
    pub fn num_views(&self, display: &str) -> usize {
        self.displays.num_views(display)
    }

    /// View name at `index` of `display`.
    #[inline]
    pub fn view(&self, display: &str, index: usize) -> Option<&str> {
        self.displays.view_name(display, index)
    }

    /// Default view of `display`.
    #[inline]
    pub fn default_view(&self, display: &str) -> Option<&str> {
        self.displays.default_view(display)
    }

    /// Target color space of `display` / `view`.
    pub fn display_colorspace_name(&self, display: &str, view: &str) -> Option<&str> {
        self.displays.view(display, view).map(|v| v.colorspace())
    }

    /// Look chain of `display` / `view`.
    pub fn display_looks(&self, display: &str, view: &str) -> Option<&str> {
        self.displays.view(display, view).map(|v| v.looks())
    }

    /// Sets active displays from a comma-delimited list.
    pub fn set_active_displays(&mut self, displays: &str) {
        self.displays.set_active_displays(displays);
        self.invalidate();
    }

    /// Active displays joined with `", "`.
    pub fn active_displays(&self) -> String {
        self.displays.active_displays()
    }

    /// Sets active views from a comma-delimited list.
    pub fn set_active_views(&mut self, views: &str) {
        self.displays.set_active_views(views);
        self.invalidate();
    }

    /// Active views joined with `", "`.
    pub fn active_views(&self) -> String {
        self.displays.active_views()
    }

    // ========================================================================
    // Looks
    // ========================================================================

    /// Look registry.
    #[inline]
    pub fn looks(&self) -> &LookManager {
        &self.looks
    }

    /// Adds a look, replacing a same-named one.
    pub fn add_look(&mut self, look: Look) {
        self.looks.add(look);
        self.invalidate();
    }

    /// Looks up a look by name.
    #[inline]
    pub fn look(&self, name: &str) -> Option<&Look> {
        self.looks.get(name)
    }

    /// Number of looks.
    #[inline]
    pub fn num_looks(&self) -> usize {
        self.looks.len()
    }

    /// Look name at `index`.
    #[inline]
    pub fn look_name_by_index(&self, index: usize) -> Option<&str> {
        self.looks.name_at(index)
    }

    /// Removes every look.
    pub fn clear_looks(&mut self) {
        self.looks.clear();
        self.invalidate();
    }

    // ========================================================================
    // Processors
    // ========================================================================

    /// Processor converting between two color spaces or roles.
    pub fn processor(&self, src: &str, dst: &str) -> OcioResult<Arc<Processor>> {
        self.processor_with_context(&self.context, src, dst)
    }

    /// Processor converting between two color spaces or roles, resolving
    /// files through `context`.
    pub fn processor_with_context(
        &self,
        context: &Context,
        src: &str,
        dst: &str,
    ) -> OcioResult<Arc<Processor>> {
        let src_cs = self
            .colorspace(src)
            .ok_or_else(|| OcioError::ColorSpaceNotFound { name: src.into() })?;
        let dst_cs = self
            .colorspace(dst)
            .ok_or_else(|| OcioError::ColorSpaceNotFound { name: dst.into() })?;
        self.colorspace_processor(context, src_cs, dst_cs, src, dst)
    }

    /// Processor converting between two color space values.
    pub fn processor_for_colorspaces(
        &self,
        src: &ColorSpace,
        dst: &ColorSpace,
    ) -> OcioResult<Arc<Processor>> {
        self.processor_for_colorspaces_with_context(&self.context, src, dst)
    }

    /// Processor converting between two color space values, resolving files
    /// through `context`.
    pub fn processor_for_colorspaces_with_context(
        &self,
        context: &Context,
        src: &ColorSpace,
        dst: &ColorSpace,
    ) -> OcioResult<Arc<Processor>> {
        self.colorspace_processor(context, src, dst, src.name(), dst.name())
    }

    /// Processor applying `transform` in `direction`.
    pub fn processor_for_transform(
        &self,
        transform: &Transform,
        direction: TransformDirection,
    ) -> OcioResult<Arc<Processor>> {
        self.processor_for_transform_with_context(&self.context, transform, direction)
    }

    /// Processor applying `transform` in `direction`, resolving files
    /// through `context`.
    pub fn processor_for_transform_with_context(
        &self,
        context: &Context,
        transform: &Transform,
        direction: TransformDirection,
    ) -> OcioResult<Arc<Processor>> {
        let key = format!("tx|{transform:?}|{direction:?}|{}", context.cache_id());
        self.cache.get_or_try_insert(key, || {
            debug!(
                transform = transform_name(transform),
                direction = direction.as_str(),
                "compiling processor"
            );
            let mut compiler = Compiler::new(self, context);
            compiler
                .add_transform(transform, direction)
                .map_err(|e| OcioError::Compilation {
                    src: transform_name(transform).to_string(),
                    dst: direction.as_str().to_string(),
                    source: Box::new(e),
                })?;
            Ok(compiler.finish())
        })
    }

    fn colorspace_processor(
        &self,
        context: &Context,
        src: &ColorSpace,
        dst: &ColorSpace,
        src_label: &str,
        dst_label: &str,
    ) -> OcioResult<Arc<Processor>> {
        let key = format!("cs|{src:?}|{dst:?}|{}", context.cache_id());
        self.cache.get_or_try_insert(key, || {
            debug!(src = src_label, dst = dst_label, "compiling processor");
            let mut compiler = Compiler::new(self, context);
            compiler
                .add_colorspace_conversion(src, dst)
                .map_err(|e| OcioError::Compilation {
                    src: src_label.to_string(),
                    dst: dst_label.to_string(),
                    source: Box::new(e),
                })?;
            Ok(compiler.finish())
        })
    }
}

/// Tag name of a transform node.
fn transform_name(transform: &Transform) -> &'static str {
    match transform {
        Transform::Matrix(_) => "MatrixTransform",
        Transform::Exponent(_) => "ExponentTransform",
        Transform::Log(_) => "LogTransform",
        Transform::Cdl(_) => "CDLTransform",
        Transform::File(_) => "FileTransform",
        Transform::ColorSpace(_) => "ColorSpaceTransform",
        Transform::Look(_) => "LookTransform",
        Transform::Display(_) => "DisplayTransform",
        Transform::Group(_) => "GroupTransform",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::CdlTransform;

    const FILM_CONFIG: &str = r#"
ocio_profile_version: 1

search_path: luts
strictparsing: true

roles:
  color_picking: cpf
  color_timing: lg10
  compositing_log: lgf
  data: ncf
  default: ncf
  matte_paint: vd8
  reference: lnf
  scene_linear: lnf
  texture_paint: dt16

displays:
  DCIP3:
    - !<View> {name: Film, colorspace: p3dci8}
    - !<View> {name: Log, colorspace: lg10}
    - !<View> {name: Raw, colorspace: nc10}
    - !<View> {name: Film DI, colorspace: p3dci8, looks: di}
  sRGB:
    - !<View> {name: Film, colorspace: srgb8}
    - !<View> {name: Log, colorspace: lg10}
    - !<View> {name: Raw, colorspace: nc10}
    - !<View> {name: Film DI, colorspace: srgb8, looks: di}

active_displays: [sRGB, DCIP3]
active_views: [Film, Log, Raw]

looks:
  - !<Look>
    name: di
    process_space: p3dci8

colorspaces:
  - !<ColorSpace>
    name: lnf
    family: ln
    bitdepth: 32f
    description: linear float
    allocation: lg2
    allocationvars: [-15, 6]
  - !<ColorSpace>
    name: lg10
    family: lg
    bitdepth: 10ui
    to_reference: !<CDLTransform> {slope: [2, 2, 2]}
  - !<ColorSpace>
    name: lgf
    family: lg
    bitdepth: 32f
  - !<ColorSpace>
    name: vd8
    family: vd
    bitdepth: 8ui
  - !<ColorSpace>
    name: vd10
    family: vd
    bitdepth: 10ui
  - !<ColorSpace>
    name: nc10
    family: nc
    equalitygroup: nc
    bitdepth: 10ui
  - !<ColorSpace>
    name: ncf
    family: nc
    equalitygroup: nc
    bitdepth: 32f
    isdata: true
  - !<ColorSpace>
    name: cpf
    family: cp
    bitdepth: 32f
  - !<ColorSpace>
    name: dt16
    family: dt
    bitdepth: 16f
  - !<ColorSpace>
    name: p3dci8
    family: p3dci
    bitdepth: 8ui
  - !<ColorSpace>
    name: srgb8
    family: srgb
    bitdepth: 8ui
"#;

    fn film() -> Config {
        Config::from_yaml_str(FILM_CONFIG, "/shows/film").unwrap()
    }

    #[test]
    fn parse_film_config() {
        let config = film();
        assert_eq!(config.version(), 1);
        assert_eq!(config.num_colorspaces(), 11);
        assert_eq!(config.num_roles(), 9);
        assert_eq!(config.search_path(), "luts");
        assert_eq!(config.working_dir(), Path::new("/shows/film"));
        assert_eq!(config.colorspace("scene_linear").unwrap().name(), "lnf");
        assert!(config.sanity_check().is_ok());
    }

    #[test]
    fn displays_and_views() {
        let config = film();
        assert_eq!(config.default_display(), Some("sRGB"));
        assert_eq!(config.num_views("sRGB"), 4);
        assert_eq!(config.view("sRGB", 2), Some("Raw"));
        assert_eq!(config.active_displays(), "sRGB, DCIP3");
        assert_eq!(config.active_views(), "Film, Log, Raw");
        assert_eq!(config.display_looks("sRGB", "Film DI"), Some("di"));
        assert_eq!(config.display_colorspace_name("sRGB", "Raw"), Some("nc10"));
        assert_eq!(config.display_colorspace_name("sRGB", "Missing"), None);
    }

    #[test]
    fn parse_colorspace_prefers_longest_rightmost() {
        let config = film();
        assert_eq!(
            config.parse_colorspace_from_string("/path/to/comp_vd10_and_nc10.exr"),
            Some("nc10")
        );
        assert_eq!(config.parse_colorspace_from_string("plate_lnf_lg10.dpx"), Some("lg10"));
        assert_eq!(config.parse_colorspace_from_string("lnf.vd10"), Some("vd10"));
        assert_eq!(config.parse_colorspace_from_string("unrelated"), None);
    }

    #[test]
    fn parse_colorspace_default_fallback() {
        let mut config = film();
        config.set_strict_parsing(false);
        assert_eq!(config.parse_colorspace_from_string("unrelated"), Some("ncf"));

        config.set_role(names::DEFAULT, "").unwrap();
        assert_eq!(config.parse_colorspace_from_string("unrelated"), None);
    }

    #[test]
    fn colorspace_names_beat_roles() {
        let mut config = film();
        config.add_colorspace(ColorSpace::new("reference"));
        assert_eq!(config.colorspace("reference").unwrap().name(), "reference");
        assert_eq!(config.colorspace("REFERENCE").unwrap().name(), "reference");
    }

    #[test]
    fn add_colorspace_overwrites_in_place() {
        let mut config = film();
        let index = config.index_for_colorspace("lg10").unwrap();

        let mut cs = config.colorspace("lg10").unwrap().editable_copy();
        cs.set_description("replaced");
        config.add_colorspace(cs.clone());
        cs.set_description("changed after add");

        assert_eq!(config.num_colorspaces(), 11);
        assert_eq!(config.index_for_colorspace("lg10"), Some(index));
        assert_eq!(config.colorspace("lg10").unwrap().description(), "replaced");
    }

    #[test]
    fn role_name_out_of_range() {
        let config = film();
        assert_eq!(config.role_name(0), Some("color_picking"));
        assert_eq!(config.role_name(9), None);
    }

    #[test]
    fn processors_cached_until_mutation() {
        let mut config = film();
        let a = config.processor("lg10", "lnf").unwrap();
        let b = config.processor("color_timing", "reference").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(config.num_cached_processors(), 1);

        config.set_description("touched");
        assert_eq!(config.num_cached_processors(), 0);
        let c = config.processor("lg10", "lnf").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
    }

    #[test]
    fn unknown_identifier_not_wrapped() {
        let err = film().processor("nope", "lnf").unwrap_err();
        assert!(matches!(err, OcioError::ColorSpaceNotFound { ref name } if name == "nope"));
    }

    #[test]
    fn compilation_errors_wrapped() {
        let mut config = film();
        config.add_colorspace(
            ColorSpace::builder("lut")
                .to_reference(Transform::file("missing.spi1d"))
                .build(),
        );
        let err = config.processor("lut", "lnf").unwrap_err();
        assert!(matches!(err, OcioError::Compilation { ref src, ref dst, .. } if src == "lut" && dst == "lnf"));
        assert!(err.is_missing_file());
    }

    #[test]
    fn data_spaces_are_noops() {
        let config = film();
        assert!(config.processor("lg10", "ncf").unwrap().is_noop());
        assert!(config.processor("nc10", "ncf").unwrap().is_noop());
        assert!(!config.processor("lg10", "lnf").unwrap().is_noop());
    }

    #[test]
    fn display_transform_records_looks() {
        let mut config = film();
        config.add_look(
            Look::new("di")
                .process_space("p3dci8")
                .transform(Transform::Cdl(CdlTransform {
                    saturation: 0.8,
                    ..Default::default()
                })),
        );
        let t = Transform::Display(crate::DisplayTransform::new("lnf", "sRGB", "Film DI"));
        let processor = config
            .processor_for_transform(&t, TransformDirection::Forward)
            .unwrap();
        assert_eq!(processor.metadata().looks(), ["di".to_string()]);
        assert!(processor.has_channel_crosstalk());

        let missing = Transform::Display(crate::DisplayTransform::new("lnf", "sRGB", "Nope"));
        let err = config
            .processor_for_transform(&missing, TransformDirection::Forward)
            .unwrap_err();
        assert!(matches!(err.root_cause(), OcioError::ViewNotFound { .. }));
    }

    #[test]
    fn set_role_requires_existing_colorspace() {
        let mut config = film();
        let before = config.cache_id(None);

        let err = config.set_role(names::SCENE_LINEAR, "vd12").unwrap_err();
        assert!(matches!(err, OcioError::ColorSpaceNotFound { ref name } if name == "vd12"));
        assert_eq!(config.colorspace(names::SCENE_LINEAR).unwrap().name(), "lnf");
        assert_eq!(config.cache_id(None), before);

        config.set_role("grade", "LG10").unwrap();
        assert_eq!(config.colorspace("grade").unwrap().name(), "lg10");
        config.set_role("grade", "").unwrap();
        assert!(!config.has_role("grade"));
        assert!(config.sanity_check().is_ok());
    }

    #[test]
    fn editable_copy_is_independent() {
        let config = film();
        let mut copy = config.editable_copy();
        copy.set_role("extra", "lnf").unwrap();
        copy.clear_displays();
        assert_eq!(config.num_roles(), 9);
        assert_eq!(config.num_displays(), 2);
        assert_eq!(copy.num_roles(), 10);
        assert_eq!(copy.num_displays(), 0);
    }

    #[test]
    fn cache_id_without_context_hashes_document() {
        let mut config = film();
        let mut hasher = Sha256::new();
        hasher.update(config.serialize().as_bytes());
        assert_eq!(config.cache_id(None), format!("{:x}", hasher.finalize()));

        config.add_colorspace(
            ColorSpace::builder("lut")
                .to_reference(Transform::file("lg10.spi1d"))
                .build(),
        );
        assert_ne!(config.cache_id(Some(config.current_context())), config.cache_id(None));
    }

    #[test]
    fn env_fallback_is_raw() {
        let config = Config::from_env_value(None).unwrap();
        assert_eq!(config.num_colorspaces(), 1);
        assert!(config.colorspace("default").unwrap().is_data());

        let err = Config::from_env_value(Some("/no/such/config.ocio".into())).unwrap_err();
        assert!(matches!(err, OcioError::ConfigNotFound { .. }));
    }

    #[test]
    fn environment_section_predefines_vars() {
        let mut config = film();
        config.add_environment_var("SHOT", "sh010");
        let context = config.current_context();
        assert_eq!(context.environment_mode(), EnvironmentMode::LoadPredefined);
        assert!(context.string_var("SHOT").is_some());
    }
}
