//! Context variables, search path and file resolution.
//!
//! Configs reference files through names like `$SHOT/grade.spi3d`. A
//! [`Context`] holds the variable bindings, the ordered search path and the
//! working directory used to turn such names into existing paths.
//!
//! # Example
//!
//! ```
//! use vfx_colorconfig::Context;
//!
//! let mut ctx = Context::new();
//! ctx.set_string_var("SHOT", "sh010");
//! ctx.set_string_var("SEQ", "sq01");
//!
//! let resolved = ctx.resolve_string_var("/shows/$SEQ/shots/${SHOT}/grade.csp");
//! assert_eq!(resolved, "/shows/sq01/shots/sh010/grade.csp");
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{trace, warn};

use crate::error::{OcioError, OcioResult};

/// Separator used when joining search path entries back into a string.
#[cfg(windows)]
pub const SEARCH_PATH_SEPARATOR: char = ';';
/// Separator used when joining search path entries back into a string.
#[cfg(not(windows))]
pub const SEARCH_PATH_SEPARATOR: char = ':';

/// Upper bound on nested variable expansion.
const MAX_EXPANSION_DEPTH: usize = 16;

/// Upper bound on the length of an expanded string, in bytes.
pub const MAX_EXPANDED_LEN: usize = 64 * 1024;

/// Which process environment variables a context imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnvironmentMode {
    /// Import nothing.
    #[default]
    Unknown,
    /// Import every process environment variable.
    LoadAll,
    /// Refresh only variables the context already declares.
    LoadPredefined,
}

impl EnvironmentMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::LoadAll => "loadall",
            Self::LoadPredefined => "loadpredefined",
        }
    }
}

/// Variable bindings plus search path used to locate transform files.
///
/// `Clone` is a deep copy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    search_path: Vec<String>,
    working_dir: PathBuf,
    vars: BTreeMap<String, String>,
    environment_mode: EnvironmentMode,
}

impl Context {
    /// Creates an empty context with environment loading disabled.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an independent copy that can be modified freely.
    #[inline]
    pub fn editable_copy(&self) -> Self {
        self.clone()
    }

    /// Search path joined with [`SEARCH_PATH_SEPARATOR`].
    pub fn search_path(&self) -> String {
        self.search_path.join(&SEARCH_PATH_SEPARATOR.to_string())
    }

    /// Search path entries in declared order.
    #[inline]
    pub fn search_paths(&self) -> &[String] {
        &self.search_path
    }

    /// Replaces the search path from a delimited string.
    ///
    /// Entries are split on `;` everywhere and also on `:` outside Windows.
    pub fn set_search_path(&mut self, path: &str) {
        self.search_path = split_search_path(path);
    }

    /// Appends one search path entry.
    pub fn add_search_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !path.is_empty() {
            self.search_path.push(path);
        }
    }

    /// Removes all search path entries.
    #[inline]
    pub fn clear_search_paths(&mut self) {
        self.search_path.clear();
    }

    /// Directory relative search path entries are joined onto.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Sets the working directory.
    pub fn set_working_dir(&mut self, dir: impl Into<PathBuf>) {
        self.working_dir = dir.into();
    }

    /// Sets a variable, replacing any previous value.
    #[inline]
    pub fn set_string_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Gets a variable value.
    #[inline]
    pub fn string_var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Number of variables.
    #[inline]
    pub fn num_string_vars(&self) -> usize {
        self.vars.len()
    }

    /// Variable name at `index` in sorted order.
    pub fn string_var_name_by_index(&self, index: usize) -> Option<&str> {
        self.vars.keys().nth(index).map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in sorted order.
    pub fn string_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Removes all variables.
    #[inline]
    pub fn clear_string_vars(&mut self) {
        self.vars.clear();
    }

    /// Returns the environment mode.
    #[inline]
    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }

    /// Sets the environment mode. Takes effect on the next
    /// [`load_environment`](Self::load_environment).
    #[inline]
    pub fn set_environment_mode(&mut self, mode: EnvironmentMode) {
        self.environment_mode = mode;
    }

    /// Seeds variables from the process environment according to the mode.
    ///
    /// `LoadAll` never overrides a variable that is already set.
    pub fn load_environment(&mut self) {
        match self.environment_mode {
            EnvironmentMode::Unknown => {}
            EnvironmentMode::LoadAll => {
                for (key, value) in env::vars_os() {
                    if let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) {
                        self.vars.entry(key).or_insert(value);
                    }
                }
            }
            EnvironmentMode::LoadPredefined => {
                for (key, value) in self.vars.iter_mut() {
                    if let Ok(env_value) = env::var(key) {
                        *value = env_value;
                    }
                }
            }
        }
    }

    /// Imports the named process variables that are not declared yet.
    pub(crate) fn load_environment_vars<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            if self.vars.contains_key(name) {
                continue;
            }
            if let Ok(value) = env::var(name) {
                self.vars.insert(name.to_string(), value);
            }
        }
    }

    /// Substitutes `$VAR` and `${VAR}` tokens, recursively.
    ///
    /// Unknown variables are left as-is. Expansion stops before the result
    /// would exceed [`MAX_EXPANDED_LEN`] bytes; the last pass that fit is
    /// returned.
    pub fn resolve_string_var(&self, input: &str) -> String {
        let mut current = input.to_string();
        for _ in 0..MAX_EXPANSION_DEPTH {
            if !current.contains('$') {
                break;
            }
            let Some(next) = self.substitute(&current) else {
                warn!(input, limit = MAX_EXPANDED_LEN, "variable expansion too long, stopped");
                break;
            };
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// One pass of token substitution, `None` once the output outgrows
    /// [`MAX_EXPANDED_LEN`].
    fn substitute(&self, input: &str) -> Option<String> {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    name.push(ch);
                }
                match self.vars.get(&name) {
                    Some(value) if closed => {
                        if result.len() + value.len() > MAX_EXPANDED_LEN {
                            return None;
                        }
                        result.push_str(value);
                    }
                    _ => {
                        result.push_str("${");
                        result.push_str(&name);
                        if closed {
                            result.push('}');
                        }
                    }
                }
            } else {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match self.vars.get(&name) {
                    Some(value) if !name.is_empty() => {
                        if result.len() + value.len() > MAX_EXPANDED_LEN {
                            return None;
                        }
                        result.push_str(value);
                    }
                    _ => {
                        result.push('$');
                        result.push_str(&name);
                    }
                }
            }
        }

        Some(result)
    }

    /// Resolves a file name to an existing path.
    ///
    /// Variables are substituted first. Absolute names must exist as given;
    /// relative names are tried against each search path entry in order.
    /// Fails with [`OcioError::MissingFile`] when nothing matches.
    pub fn resolve_file_location(&self, filename: &str) -> OcioResult<PathBuf> {
        let resolved = self.resolve_string_var(filename);
        if resolved.is_empty() {
            return Err(OcioError::InvalidArgument("empty file name".into()));
        }

        let path = Path::new(&resolved);
        if path.is_absolute() {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(OcioError::MissingFile {
                file: resolved,
                searched: Vec::new(),
            });
        }

        let mut searched = Vec::with_capacity(self.search_path.len());
        for entry in &self.search_path {
            let dir = PathBuf::from(self.resolve_string_var(entry));
            let dir = if dir.is_relative() {
                self.working_dir.join(dir)
            } else {
                dir
            };
            let candidate = dir.join(&resolved);
            trace!(candidate = %candidate.display(), "probing search path");
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(dir.display().to_string());
        }

        if self.search_path.is_empty() {
            let candidate = self.working_dir.join(&resolved);
            if candidate.is_file() {
                return Ok(candidate);
            }
            searched.push(self.working_dir.display().to_string());
        }

        Err(OcioError::MissingFile {
            file: resolved,
            searched,
        })
    }

    /// Stable hash of everything that affects resolution.
    pub fn cache_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"search_path");
        for entry in &self.search_path {
            hasher.update(entry.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(b"working_dir");
        hasher.update(self.working_dir.to_string_lossy().as_bytes());
        hasher.update(b"mode");
        hasher.update(self.environment_mode.as_str().as_bytes());
        for (k, v) in &self.vars {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Splits a search path string into non-empty entries.
pub(crate) fn split_search_path(path: &str) -> Vec<String> {
    path.split(|c| c == ';' || (cfg!(not(windows)) && c == ':'))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Names of the variables referenced by `input`.
pub(crate) fn referenced_vars(input: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            continue;
        }
        let mut name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
        }
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
