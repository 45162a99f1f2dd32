//! Config document reading and writing.
//!
//! Documents use the OCIO profile layout. Verbatim tags such as
//! `!<ColorSpace>` are normalized before parsing: transform tags become
//! local tags that select a [`RawTransform`] variant, structural tags
//! (`View`, `ColorSpace`, `Look`) are dropped.
//!
//! Writing is deterministic: roles sorted by name, color spaces and looks in
//! index order, displays and views in declaration order, transforms in flow
//! style. Parsing a written document and writing it again yields the same
//! text.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::colorspace::{AllocationInfo, AllocationType, BitDepth, ColorSpace};
use crate::config::Config;
use crate::context::SEARCH_PATH_SEPARATOR;
use crate::error::{OcioError, OcioResult};
use crate::look::Look;
use crate::transform::*;

static VERBATIM_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!<(\w+)>").expect("static regex is valid"));

/// Rewrites `!<XTransform>` to `!XTransform` and strips other verbatim tags.
///
/// Only tags at the start of a node are touched. Text inside quoted
/// scalars, plain scalars and comments is copied unchanged.
fn normalize_tags(src: &str) -> Cow<'_, str> {
    if !src.contains("!<") {
        return Cow::Borrowed(src);
    }

    let mut out = String::with_capacity(src.len());
    let mut quote: Option<char> = None;
    let mut node_start = true;
    let mut flow_depth = 0usize;
    let mut prev_space = true;
    let mut rest = src;

    while let Some(c) = rest.chars().next() {
        let mut len = c.len_utf8();
        match quote {
            Some('"') => match c {
                '\\' => len += rest[1..].chars().next().map_or(0, char::len_utf8),
                '"' => quote = None,
                _ => {}
            },
            Some(_) => {
                if c == '\'' {
                    if rest[1..].starts_with('\'') {
                        len = 2;
                    } else {
                        quote = None;
                    }
                }
            }
            None if c == '#' && prev_space => {
                len = rest.find('\n').unwrap_or(rest.len());
            }
            None if c.is_whitespace() => {
                if c == '\n' && flow_depth == 0 {
                    node_start = true;
                }
            }
            None if node_start => {
                if let Some(caps) = VERBATIM_TAG.captures(rest) {
                    let name = &caps[1];
                    if name.ends_with("Transform") {
                        out.push('!');
                        out.push_str(name);
                    }
                    rest = &rest[caps[0].len()..];
                    prev_space = false;
                    continue;
                }
                match c {
                    '"' | '\'' => {
                        quote = Some(c);
                        node_start = false;
                    }
                    '[' | '{' => flow_depth += 1,
                    '-' | '?' if rest[1..].starts_with(char::is_whitespace) => {}
                    _ => node_start = false,
                }
            }
            None => match c {
                ':' if rest[1..].is_empty() || rest[1..].starts_with(char::is_whitespace) => {
                    node_start = true
                }
                ',' if flow_depth > 0 => node_start = true,
                '[' | '{' if flow_depth > 0 => flow_depth += 1,
                ']' | '}' if flow_depth > 0 => flow_depth -= 1,
                _ => {}
            },
        }
        out.push_str(&rest[..len]);
        prev_space = rest[..len].ends_with(char::is_whitespace);
        rest = &rest[len..];
    }
    Cow::Owned(out)
}

// ============================================================================
// Raw YAML structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "profile_version")]
    ocio_profile_version: Option<Value>,
    description: Option<String>,
    search_path: Option<StringList>,
    strictparsing: Option<bool>,
    environment: Option<BTreeMap<String, Option<Value>>>,
    roles: Option<BTreeMap<String, String>>,
    displays: Option<serde_yaml::Mapping>,
    active_displays: Option<StringList>,
    active_views: Option<StringList>,
    looks: Option<Vec<RawLook>>,
    colorspaces: Option<Vec<RawColorSpace>>,
}

/// Either `[a, b]` or `"a, b"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    fn join(self, sep: &str) -> String {
        match self {
            Self::List(items) => items.join(sep),
            Self::Joined(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawView {
    name: String,
    colorspace: String,
    looks: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLook {
    name: String,
    process_space: Option<String>,
    description: Option<String>,
    transform: Option<RawTransform>,
    inverse_transform: Option<RawTransform>,
}

#[derive(Debug, Deserialize)]
struct RawColorSpace {
    name: String,
    family: Option<String>,
    equalitygroup: Option<String>,
    bitdepth: Option<String>,
    description: Option<String>,
    isdata: Option<bool>,
    allocation: Option<String>,
    allocationvars: Option<Vec<f64>>,
    to_reference: Option<RawTransform>,
    from_reference: Option<RawTransform>,
}

#[derive(Debug, Deserialize)]
enum RawTransform {
    #[serde(rename = "MatrixTransform")]
    Matrix(RawMatrixTransform),
    #[serde(rename = "ExponentTransform")]
    Exponent(RawExponentTransform),
    #[serde(rename = "LogTransform")]
    Log(RawLogTransform),
    #[serde(rename = "CDLTransform")]
    Cdl(RawCdlTransform),
    #[serde(rename = "FileTransform")]
    File(RawFileTransform),
    #[serde(rename = "ColorSpaceTransform")]
    ColorSpace(RawColorSpaceTransform),
    #[serde(rename = "LookTransform")]
    Look(RawLookTransform),
    #[serde(rename = "DisplayTransform")]
    Display(RawDisplayTransform),
    #[serde(rename = "GroupTransform")]
    Group(RawGroupTransform),
}

/// A single number or a list of numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Floats {
    One(f64),
    Many(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct RawMatrixTransform {
    matrix: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExponentTransform {
    value: Option<Floats>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLogTransform {
    base: Option<f64>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCdlTransform {
    slope: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    power: Option<Vec<f64>>,
    #[serde(alias = "saturation")]
    sat: Option<f64>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFileTransform {
    src: String,
    interpolation: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawColorSpaceTransform {
    src: String,
    dst: String,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLookTransform {
    src: String,
    dst: String,
    looks: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDisplayTransform {
    #[serde(alias = "src")]
    input_colorspace: String,
    display: String,
    view: String,
    looks_override: Option<String>,
    direction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGroupTransform {
    #[serde(default)]
    children: Vec<RawTransform>,
    direction: Option<String>,
}

// ============================================================================
// Raw -> model conversion
// ============================================================================

fn parse_direction(direction: Option<String>) -> OcioResult<TransformDirection> {
    match direction {
        None => Ok(TransformDirection::Forward),
        Some(d) => TransformDirection::parse(&d)
            .ok_or_else(|| OcioError::malformed(format!("unknown transform direction '{d}'"))),
    }
}

/// Copies `values` into a fixed array, requiring an exact length.
fn fixed<const N: usize>(values: Option<Vec<f64>>, default: [f64; N], what: &str) -> OcioResult<[f64; N]> {
    match values {
        None => Ok(default),
        Some(v) => <[f64; N]>::try_from(v.as_slice()).map_err(|_| {
            OcioError::malformed(format!("{what} expects {N} values, got {}", v.len()))
        }),
    }
}

impl RawTransform {
    fn into_transform(self) -> OcioResult<Transform> {
        Ok(match self {
            Self::Matrix(m) => Transform::Matrix(MatrixTransform {
                matrix: fixed(m.matrix, MatrixTransform::IDENTITY, "matrix")?,
                offset: fixed(m.offset, [0.0; 4], "matrix offset")?,
                direction: parse_direction(m.direction)?,
            }),

            Self::Exponent(e) => {
                let value = match e.value {
                    None => [1.0; 4],
                    Some(Floats::One(v)) => [v, v, v, 1.0],
                    Some(Floats::Many(v)) => match v.as_slice() {
                        [r, g, b] => [*r, *g, *b, 1.0],
                        [r, g, b, a] => [*r, *g, *b, *a],
                        _ => {
                            return Err(OcioError::malformed(format!(
                                "exponent expects 1, 3 or 4 values, got {}",
                                v.len()
                            )));
                        }
                    },
                };
                Transform::Exponent(ExponentTransform {
                    value,
                    direction: parse_direction(e.direction)?,
                })
            }

            Self::Log(l) => Transform::Log(LogTransform {
                base: l.base.unwrap_or(2.0),
                direction: parse_direction(l.direction)?,
            }),

            Self::Cdl(c) => Transform::Cdl(CdlTransform {
                slope: fixed(c.slope, [1.0; 3], "CDL slope")?,
                offset: fixed(c.offset, [0.0; 3], "CDL offset")?,
                power: fixed(c.power, [1.0; 3], "CDL power")?,
                saturation: c.sat.unwrap_or(1.0),
                direction: parse_direction(c.direction)?,
            }),

            Self::File(f) => {
                let interpolation = match f.interpolation.as_deref() {
                    None => Interpolation::Unknown,
                    Some(token) => Interpolation::parse(token).unwrap_or_else(|| {
                        warn!(src = %f.src, token, "unknown interpolation, using default");
                        Interpolation::Unknown
                    }),
                };
                Transform::File(FileTransform {
                    src: f.src,
                    interpolation,
                    direction: parse_direction(f.direction)?,
                })
            }

            Self::ColorSpace(c) => Transform::ColorSpace(ColorSpaceTransform {
                src: c.src,
                dst: c.dst,
                direction: parse_direction(c.direction)?,
            }),

            Self::Look(l) => Transform::Look(LookTransform {
                src: l.src,
                dst: l.dst,
                looks: l.looks.unwrap_or_default(),
                direction: parse_direction(l.direction)?,
            }),

            Self::Display(d) => Transform::Display(DisplayTransform {
                input_colorspace: d.input_colorspace,
                display: d.display,
                view: d.view,
                looks_override_enabled: d.looks_override.is_some(),
                looks_override: d.looks_override.unwrap_or_default(),
                direction: parse_direction(d.direction)?,
            }),

            Self::Group(g) => Transform::Group(GroupTransform {
                transforms: g
                    .children
                    .into_iter()
                    .map(RawTransform::into_transform)
                    .collect::<OcioResult<_>>()?,
                direction: parse_direction(g.direction)?,
            }),
        })
    }
}

fn optional_transform(raw: Option<RawTransform>) -> OcioResult<Option<Transform>> {
    raw.map(RawTransform::into_transform).transpose()
}

fn parse_version(value: Option<Value>) -> OcioResult<u32> {
    let value = value.ok_or_else(|| OcioError::malformed("missing ocio_profile_version"))?;
    let text = match &value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    };
    let major = text.split('.').next().unwrap_or_default().trim();
    match major.parse::<u32>() {
        Ok(v @ (1 | 2)) => Ok(v),
        _ => Err(OcioError::UnsupportedVersion { version: text }),
    }
}

fn scalar_to_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn parse_colorspace(index: usize, raw: RawColorSpace) -> OcioResult<ColorSpace> {
    let context = |e: OcioError| {
        OcioError::malformed(format!("colorspace {} ('{}'): {}", index, raw.name, e))
    };

    let bit_depth = match raw.bitdepth.as_deref() {
        None => BitDepth::Unknown,
        Some(token) => BitDepth::parse(token)
            .ok_or_else(|| OcioError::malformed(format!("unknown bitdepth '{token}'")))
            .map_err(context)?,
    };
    let alloc_type = match raw.allocation.as_deref() {
        None => AllocationType::default(),
        Some(token) => AllocationType::parse(token)
            .ok_or_else(|| OcioError::malformed(format!("unknown allocation '{token}'")))
            .map_err(context)?,
    };
    let to_reference = optional_transform(raw.to_reference).map_err(context)?;
    let from_reference = optional_transform(raw.from_reference).map_err(context)?;

    let mut cs = ColorSpace::builder(raw.name)
        .family(raw.family.unwrap_or_default())
        .equality_group(raw.equalitygroup.unwrap_or_default())
        .description(raw.description.unwrap_or_default().trim_end())
        .bit_depth(bit_depth)
        .is_data(raw.isdata.unwrap_or(false))
        .allocation(AllocationInfo {
            alloc_type,
            vars: raw.allocationvars.unwrap_or_default(),
        })
        .build();
    cs.set_to_reference(to_reference);
    cs.set_from_reference(from_reference);
    Ok(cs)
}

fn parse_look(raw: RawLook) -> OcioResult<Look> {
    let name = raw.name;
    let context = |e: OcioError| OcioError::malformed(format!("look '{}': {}", name, e));

    let mut look = Look::new(name.as_str())
        .process_space(raw.process_space.unwrap_or_default())
        .description(raw.description.unwrap_or_default().trim_end());
    if let Some(t) = optional_transform(raw.transform).map_err(context)? {
        look = look.transform(t);
    }
    if let Some(t) = optional_transform(raw.inverse_transform).map_err(context)? {
        look = look.inverse_transform(t);
    }
    Ok(look)
}

/// Parses a config document. `working_dir` anchors relative search paths.
pub(crate) fn parse(yaml: &str, working_dir: PathBuf) -> OcioResult<Config> {
    let text = normalize_tags(yaml);
    let raw: RawConfig = serde_yaml::from_str(&text)?;

    let mut config = Config::new();
    config.set_version(parse_version(raw.ocio_profile_version)?)?;
    config.set_description(raw.description.unwrap_or_default().trim_end());
    config.set_strict_parsing(raw.strictparsing.unwrap_or(true));
    config.set_working_dir(working_dir);
    if let Some(path) = raw.search_path {
        config.set_search_path(&path.join(&SEARCH_PATH_SEPARATOR.to_string()));
    }

    for (index, raw_cs) in raw.colorspaces.unwrap_or_default().into_iter().enumerate() {
        let cs = parse_colorspace(index, raw_cs)?;
        if config.colorspace_by_name(cs.name()).is_some() {
            return Err(OcioError::malformed(format!(
                "colorspace {} ('{}'): duplicate name",
                index,
                cs.name()
            )));
        }
        config.add_colorspace(cs);
    }

    for (role, cs) in raw.roles.unwrap_or_default() {
        if config.set_role(&role, &cs).is_err() {
            warn!(role = %role, colorspace = %cs, "role references an unknown colorspace");
            config.set_role_unchecked(role, cs);
        }
    }

    for raw_look in raw.looks.unwrap_or_default() {
        config.add_look(parse_look(raw_look)?);
    }

    for (key, views) in raw.displays.unwrap_or_default() {
        let display = match key {
            Value::String(s) => s,
            other => {
                return Err(OcioError::malformed(format!(
                    "display name must be a string, got {other:?}"
                )));
            }
        };
        let views: Vec<RawView> = serde_yaml::from_value(views)
            .map_err(|e| OcioError::malformed(format!("display '{display}': {e}")))?;
        for view in views {
            config.add_display(
                &display,
                &view.name,
                &view.colorspace,
                view.looks.as_deref().unwrap_or_default(),
            );
        }
    }

    if let Some(list) = raw.active_displays {
        config.set_active_displays(&list.join(", "));
    }
    if let Some(list) = raw.active_views {
        config.set_active_views(&list.join(", "));
    }

    // Environment last: the default context depends on every file reference.
    if let Some(env) = raw.environment {
        let env = env
            .into_iter()
            .map(|(name, value)| (name, scalar_to_string(value)))
            .collect();
        config.set_environment(Some(env));
    }

    debug!(
        version = config.version(),
        colorspaces = config.num_colorspaces(),
        roles = config.num_roles(),
        displays = config.num_displays(),
        looks = config.num_looks(),
        "parsed config"
    );
    Ok(config)
}

// ============================================================================
// Writing
// ============================================================================

const RESERVED: &[&str] = &[
    "true", "false", "yes", "no", "on", "off", "y", "n", "null", "~",
];

/// Formats a string scalar, quoting it unless it is plain-safe in both
/// block and flow context.
fn scalar(s: &str) -> Cow<'_, str> {
    let mut chars = s.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || matches!(first, '_' | '/'))
                && chars.all(|c| {
                    c.is_ascii_alphanumeric()
                        || matches!(c, '_' | ' ' | '.' | '/' | '+' | '-' | '(' | ')')
                })
                && !s.ends_with(' ')
                && !RESERVED.contains(&s.to_ascii_lowercase().as_str())
        }
        None => false,
    };
    if plain {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

fn float(v: f64) -> String {
    if v.is_nan() {
        ".nan".into()
    } else if v.is_infinite() {
        if v > 0.0 { ".inf".into() } else { "-.inf".into() }
    } else {
        format!("{v}")
    }
}

fn floats(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().copied().map(float).collect();
    format!("[{}]", items.join(", "))
}

fn flow(tag: &str, fields: Vec<String>) -> String {
    if fields.is_empty() {
        format!("!<{tag}> {{}}")
    } else {
        format!("!<{tag}> {{{}}}", fields.join(", "))
    }
}

fn push_direction(fields: &mut Vec<String>, direction: TransformDirection) {
    if direction == TransformDirection::Inverse {
        fields.push(format!("direction: {}", direction.as_str()));
    }
}

/// Writes a transform in flow style.
fn transform(t: &Transform) -> String {
    let mut fields = Vec::new();
    match t {
        Transform::Matrix(m) => {
            fields.push(format!("matrix: {}", floats(&m.matrix)));
            if m.offset.iter().any(|v| *v != 0.0) {
                fields.push(format!("offset: {}", floats(&m.offset)));
            }
            push_direction(&mut fields, m.direction);
            flow("MatrixTransform", fields)
        }
        Transform::Exponent(e) => {
            fields.push(format!("value: {}", floats(&e.value)));
            push_direction(&mut fields, e.direction);
            flow("ExponentTransform", fields)
        }
        Transform::Log(l) => {
            fields.push(format!("base: {}", float(l.base)));
            push_direction(&mut fields, l.direction);
            flow("LogTransform", fields)
        }
        Transform::Cdl(c) => {
            fields.push(format!("slope: {}", floats(&c.slope)));
            fields.push(format!("offset: {}", floats(&c.offset)));
            fields.push(format!("power: {}", floats(&c.power)));
            fields.push(format!("sat: {}", float(c.saturation)));
            push_direction(&mut fields, c.direction);
            flow("CDLTransform", fields)
        }
        Transform::File(f) => {
            fields.push(format!("src: {}", scalar(&f.src)));
            if f.interpolation != Interpolation::Unknown {
                fields.push(format!("interpolation: {}", f.interpolation.as_str()));
            }
            push_direction(&mut fields, f.direction);
            flow("FileTransform", fields)
        }
        Transform::ColorSpace(c) => {
            fields.push(format!("src: {}", scalar(&c.src)));
            fields.push(format!("dst: {}", scalar(&c.dst)));
            push_direction(&mut fields, c.direction);
            flow("ColorSpaceTransform", fields)
        }
        Transform::Look(l) => {
            fields.push(format!("src: {}", scalar(&l.src)));
            fields.push(format!("dst: {}", scalar(&l.dst)));
            fields.push(format!("looks: {}", scalar(&l.looks)));
            push_direction(&mut fields, l.direction);
            flow("LookTransform", fields)
        }
        Transform::Display(d) => {
            fields.push(format!("input_colorspace: {}", scalar(&d.input_colorspace)));
            fields.push(format!("display: {}", scalar(&d.display)));
            fields.push(format!("view: {}", scalar(&d.view)));
            if d.looks_override_enabled {
                fields.push(format!("looks_override: {}", scalar(&d.looks_override)));
            }
            push_direction(&mut fields, d.direction);
            flow("DisplayTransform", fields)
        }
        Transform::Group(g) => {
            let children: Vec<String> = g.transforms.iter().map(transform).collect();
            fields.push(format!("children: [{}]", children.join(", ")));
            push_direction(&mut fields, g.direction);
            flow("GroupTransform", fields)
        }
    }
}

fn string_list(items: &[String]) -> String {
    let items: Vec<Cow<'_, str>> = items.iter().map(|s| scalar(s)).collect();
    format!("[{}]", items.join(", "))
}

/// Writes `config` as a profile document.
pub(crate) fn serialize(config: &Config) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_config(&mut out, config);
    out
}

fn write_config(out: &mut String, config: &Config) -> std::fmt::Result {
    writeln!(out, "ocio_profile_version: {}", config.version())?;
    writeln!(out)?;
    if !config.description().is_empty() {
        writeln!(out, "description: {}", scalar(config.description()))?;
    }
    writeln!(out, "search_path: {}", scalar(&config.search_path()))?;
    writeln!(out, "strictparsing: {}", config.is_strict_parsing())?;

    if let Some(env) = config.environment() {
        writeln!(out)?;
        if env.is_empty() {
            writeln!(out, "environment: {{}}")?;
        } else {
            writeln!(out, "environment:")?;
            for (name, value) in env {
                writeln!(out, "  {}: {}", scalar(name), scalar(value))?;
            }
        }
    }

    writeln!(out)?;
    if config.roles().is_empty() {
        writeln!(out, "roles: {{}}")?;
    } else {
        writeln!(out, "roles:")?;
        for (role, cs) in config.roles().iter() {
            writeln!(out, "  {}: {}", scalar(role), scalar(cs))?;
        }
    }

    writeln!(out)?;
    let displays = config.displays();
    if displays.num_displays() == 0 {
        writeln!(out, "displays: {{}}")?;
    } else {
        writeln!(out, "displays:")?;
        for display in displays.displays() {
            writeln!(out, "  {}:", scalar(display.name()))?;
            for view in display.views() {
                write!(
                    out,
                    "    - !<View> {{name: {}, colorspace: {}",
                    scalar(view.name()),
                    scalar(view.colorspace())
                )?;
                if !view.looks().is_empty() {
                    write!(out, ", looks: {}", scalar(view.looks()))?;
                }
                writeln!(out, "}}")?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "active_displays: {}", string_list(displays.active_display_list()))?;
    writeln!(out, "active_views: {}", string_list(displays.active_view_list()))?;

    if !config.looks().is_empty() {
        writeln!(out)?;
        writeln!(out, "looks:")?;
        for look in config.looks().all() {
            writeln!(out, "  - !<Look>")?;
            writeln!(out, "    name: {}", scalar(look.name()))?;
            if !look.get_process_space().is_empty() {
                writeln!(out, "    process_space: {}", scalar(look.get_process_space()))?;
            }
            if !look.get_description().is_empty() {
                writeln!(out, "    description: {}", scalar(look.get_description()))?;
            }
            if let Some(t) = look.get_transform() {
                writeln!(out, "    transform: {}", transform(t))?;
            }
            if let Some(t) = look.get_inverse_transform() {
                writeln!(out, "    inverse_transform: {}", transform(t))?;
            }
        }
    }

    writeln!(out)?;
    if config.num_colorspaces() == 0 {
        writeln!(out, "colorspaces: []")?;
        return Ok(());
    }
    writeln!(out, "colorspaces:")?;
    for cs in config.colorspaces() {
        writeln!(out, "  - !<ColorSpace>")?;
        writeln!(out, "    name: {}", scalar(cs.name()))?;
        writeln!(out, "    family: {}", scalar(cs.family()))?;
        writeln!(out, "    equalitygroup: {}", scalar(cs.equality_group()))?;
        writeln!(out, "    bitdepth: {}", cs.bit_depth().as_str())?;
        writeln!(out, "    description: {}", scalar(cs.description()))?;
        writeln!(out, "    isdata: {}", cs.is_data())?;
        writeln!(out, "    allocation: {}", cs.allocation().alloc_type.as_str())?;
        if !cs.allocation().vars.is_empty() {
            writeln!(out, "    allocationvars: {}", floats(&cs.allocation().vars))?;
        }
        if let Some(t) = cs.to_reference() {
            writeln!(out, "    to_reference: {}", transform(t))?;
        }
        if let Some(t) = cs.from_reference() {
            writeln!(out, "    from_reference: {}", transform(t))?;
        }
    }
    Ok(())
}
