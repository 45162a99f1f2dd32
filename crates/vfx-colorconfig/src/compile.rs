//! Compilation of transforms into processor operations.
//!
//! The compiler walks a transform graph against a config and a context.
//! Color space, look and display references are expanded through the
//! config; file references are resolved through the context and loaded by
//! the config's [`FileLoader`](crate::FileLoader).

use glam::{DMat4, DVec4};
use tracing::trace;

use crate::colorspace::ColorSpace;
use crate::config::Config;
use crate::context::Context;
use crate::error::{OcioError, OcioResult};
use crate::look::parse_looks;
use crate::processor::{Processor, ProcessorMetadata, ProcessorOp};
use crate::transform::*;

/// Nesting limit for color space references.
const MAX_DEPTH: usize = 64;

pub(crate) struct Compiler<'a> {
    config: &'a Config,
    context: &'a Context,
    ops: Vec<ProcessorOp>,
    metadata: ProcessorMetadata,
    /// Conversions currently being expanded, outermost first.
    stack: Vec<String>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(config: &'a Config, context: &'a Context) -> Self {
        Self {
            config,
            context,
            ops: Vec::new(),
            metadata: ProcessorMetadata::default(),
            stack: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Processor {
        Processor::with_metadata(self.ops, self.metadata)
    }

    fn colorspace(&self, name: &str) -> OcioResult<&'a ColorSpace> {
        let config = self.config;
        config
            .colorspace(name)
            .ok_or_else(|| OcioError::ColorSpaceNotFound { name: name.into() })
    }

    /// Appends the conversion `src -> reference -> dst`.
    pub(crate) fn add_colorspace_conversion(
        &mut self,
        src: &ColorSpace,
        dst: &ColorSpace,
    ) -> OcioResult<()> {
        if src.is_equivalent(dst) || src.is_data() || dst.is_data() {
            return Ok(());
        }

        let step = format!("{} -> {}", src.name(), dst.name());
        if self.stack.contains(&step) || self.stack.len() >= MAX_DEPTH {
            let mut chain = self.stack.clone();
            chain.push(step);
            return Err(OcioError::CircularReference {
                chain: chain.join(", "),
            });
        }

        self.stack.push(step);
        let result = self
            .add_to_reference(src)
            .and_then(|_| self.add_from_reference(dst));
        self.stack.pop();
        result
    }

    fn add_to_reference(&mut self, cs: &ColorSpace) -> OcioResult<()> {
        if let Some(t) = cs.to_reference() {
            self.add_transform(t, TransformDirection::Forward)
        } else if let Some(t) = cs.from_reference() {
            self.add_transform(t, TransformDirection::Inverse)
        } else {
            Ok(())
        }
    }

    fn add_from_reference(&mut self, cs: &ColorSpace) -> OcioResult<()> {
        if let Some(t) = cs.from_reference() {
            self.add_transform(t, TransformDirection::Forward)
        } else if let Some(t) = cs.to_reference() {
            self.add_transform(t, TransformDirection::Inverse)
        } else {
            Ok(())
        }
    }

    /// Appends `transform` applied in `direction`.
    pub(crate) fn add_transform(
        &mut self,
        transform: &Transform,
        direction: TransformDirection,
    ) -> OcioResult<()> {
        let dir = transform.direction().combine(direction);
        let forward = dir == TransformDirection::Forward;

        match transform {
            Transform::Matrix(m) => {
                let op = if forward {
                    ProcessorOp::Matrix {
                        matrix: m.matrix.map(|v| v as f32),
                        offset: m.offset.map(|v| v as f32),
                    }
                } else {
                    invert_matrix(&m.matrix, &m.offset)?
                };
                self.ops.push(op);
            }

            Transform::Exponent(e) => {
                let rgb = [e.value[0], e.value[1], e.value[2]];
                let value = if forward {
                    rgb
                } else {
                    if rgb.iter().any(|v| v.abs() < 1e-12) {
                        return Err(OcioError::Transform(
                            "cannot invert exponent of zero".into(),
                        ));
                    }
                    rgb.map(|v| 1.0 / v)
                };
                self.ops.push(ProcessorOp::Exponent {
                    value: value.map(|v| v as f32),
                });
            }

            Transform::Log(l) => {
                if l.base <= 0.0 || (l.base - 1.0).abs() < 1e-12 {
                    return Err(OcioError::Transform(format!("invalid log base {}", l.base)));
                }
                self.ops.push(ProcessorOp::Log {
                    base: l.base as f32,
                    forward,
                });
            }

            Transform::Cdl(c) => {
                if !forward
                    && (c.slope.iter().chain(&c.power).any(|v| v.abs() < 1e-12)
                        || c.saturation.abs() < 1e-12)
                {
                    return Err(OcioError::Transform(
                        "cannot invert CDL with zero slope, power or saturation".into(),
                    ));
                }
                self.ops.push(ProcessorOp::Cdl {
                    slope: c.slope.map(|v| v as f32),
                    offset: c.offset.map(|v| v as f32),
                    power: c.power.map(|v| v as f32),
                    saturation: c.saturation as f32,
                    forward,
                });
            }

            Transform::File(f) => {
                let path = self.context.resolve_file_location(&f.src)?;
                trace!(src = %f.src, path = %path.display(), "resolved file transform");
                self.metadata.add_file(path.to_string_lossy());
                let ops = self.config.file_loader().load(&path, f.interpolation, dir)?;
                for op in &ops {
                    op.validate()?;
                }
                self.ops.extend(ops);
            }

            Transform::ColorSpace(c) => {
                let src = self.colorspace(&c.src)?;
                let dst = self.colorspace(&c.dst)?;
                if forward {
                    self.add_colorspace_conversion(src, dst)?;
                } else {
                    self.add_colorspace_conversion(dst, src)?;
                }
            }

            Transform::Look(l) => {
                self.add_look_chain(&l.src, &l.dst, &l.looks, dir)?;
            }

            Transform::Display(d) => {
                let config = self.config;
                let display = config
                    .displays()
                    .display(&d.display)
                    .ok_or_else(|| OcioError::DisplayNotFound {
                        name: d.display.clone(),
                    })?;
                let view = display.view(&d.view).ok_or_else(|| OcioError::ViewNotFound {
                    display: d.display.clone(),
                    view: d.view.clone(),
                })?;
                let looks = if d.looks_override_enabled {
                    d.looks_override.as_str()
                } else {
                    view.looks()
                };
                self.add_look_chain(&d.input_colorspace, view.colorspace(), looks, dir)?;
            }

            Transform::Group(g) => {
                if forward {
                    for child in &g.transforms {
                        self.add_transform(child, TransformDirection::Forward)?;
                    }
                } else {
                    for child in g.transforms.iter().rev() {
                        self.add_transform(child, TransformDirection::Inverse)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Appends `src -> look process spaces -> dst`, recording each look.
    fn add_look_chain(
        &mut self,
        src: &str,
        dst: &str,
        looks: &str,
        direction: TransformDirection,
    ) -> OcioResult<()> {
        let mut chain = parse_looks(looks);
        let (start, end) = if direction == TransformDirection::Forward {
            (src, dst)
        } else {
            chain.reverse();
            for entry in chain.iter_mut() {
                entry.1 = entry.1.inverse();
            }
            (dst, src)
        };

        let mut current = self.colorspace(start)?;
        for (name, look_dir) in chain {
            let config = self.config;
            let look = config
                .look(name)
                .ok_or_else(|| OcioError::LookNotFound { name: name.into() })?;
            self.metadata.add_look(look.name());

            let process = if look.get_process_space().is_empty() {
                current
            } else {
                self.colorspace(look.get_process_space())?
            };
            self.add_colorspace_conversion(current, process)?;
            if let Some(t) = look.transform_for(look_dir) {
                self.add_transform(&t, TransformDirection::Forward)?;
            }
            current = process;
        }

        let end = self.colorspace(end)?;
        self.add_colorspace_conversion(current, end)
    }
}

/// Inverse of the affine map `x -> M x + offset`.
fn invert_matrix(matrix: &[f64; 16], offset: &[f64; 4]) -> OcioResult<ProcessorOp> {
    // glam is column-major; the stored matrix is row-major.
    let m = DMat4::from_cols_array(matrix).transpose();
    if m.determinant().abs() < 1e-12 {
        return Err(OcioError::Transform(
            "cannot invert singular matrix (determinant near zero)".into(),
        ));
    }
    let inv = m.inverse();
    let inv_offset = -(inv * DVec4::from_array(*offset));
    Ok(ProcessorOp::Matrix {
        matrix: inv.transpose().to_cols_array().map(|v| v as f32),
        offset: inv_offset.to_array().map(|v| v as f32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn compile(config: &Config, t: &Transform, dir: TransformDirection) -> OcioResult<Processor> {
        let ctx = config.current_context().clone();
        let mut compiler = Compiler::new(config, &ctx);
        compiler.add_transform(t, dir)?;
        Ok(compiler.finish())
    }

    fn gain_config() -> Config {
        let mut config = Config::new();
        config.add_colorspace(ColorSpace::builder("lin").build());
        config.add_colorspace(
            ColorSpace::builder("gain2")
                .from_reference(Transform::Cdl(CdlTransform {
                    slope: [2.0; 3],
                    ..Default::default()
                }))
                .build(),
        );
        config
    }

    #[test]
    fn matrix_inverse_round_trip() {
        let m = Transform::Matrix(MatrixTransform {
            matrix: [
                2.0, 0.1, 0.0, 0.0,
                0.0, 1.0, 0.3, 0.0,
                0.2, 0.0, 0.5, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
            offset: [0.1, -0.2, 0.05, 0.0],
            direction: TransformDirection::Forward,
        });
        let config = Config::new();
        let group = Transform::group(vec![m.clone(), m.inverse()]);
        let processor = compile(&config, &group, TransformDirection::Forward).unwrap();

        let mut pixels = [[0.18_f32, 0.5, 0.9]];
        processor.apply_rgb(&mut pixels);
        assert_relative_eq!(pixels[0][0], 0.18, epsilon = 1e-5);
        assert_relative_eq!(pixels[0][1], 0.5, epsilon = 1e-5);
        assert_relative_eq!(pixels[0][2], 0.9, epsilon = 1e-5);
    }

    #[test]
    fn singular_matrix_fails_inverse() {
        let mut m = MatrixTransform::default();
        m.matrix[0] = 0.0;
        m.direction = TransformDirection::Inverse;
        let err = compile(&Config::new(), &Transform::Matrix(m), TransformDirection::Forward)
            .unwrap_err();
        assert!(matches!(err, OcioError::Transform(_)));
    }

    #[test]
    fn inverse_group_reverses_children() {
        let group = Transform::group(vec![
            Transform::exponent(2.0),
            Transform::Cdl(CdlTransform {
                offset: [0.1; 3],
                ..Default::default()
            }),
        ]);
        let processor = compile(&Config::new(), &group, TransformDirection::Inverse).unwrap();

        assert!(matches!(processor.ops()[0], ProcessorOp::Cdl { forward: false, .. }));
        assert!(matches!(processor.ops()[1], ProcessorOp::Exponent { .. }));
    }

    #[test]
    fn colorspace_transform_uses_references() {
        let config = gain_config();
        let processor =
            compile(&config, &Transform::colorspace("lin", "gain2"), TransformDirection::Forward)
                .unwrap();
        let mut pixels = [[0.25_f32, 0.25, 0.25]];
        processor.apply_rgb(&mut pixels);
        assert_relative_eq!(pixels[0][0], 0.5);

        let processor =
            compile(&config, &Transform::colorspace("lin", "gain2"), TransformDirection::Inverse)
                .unwrap();
        let mut pixels = [[0.5_f32, 0.5, 0.5]];
        processor.apply_rgb(&mut pixels);
        assert_relative_eq!(pixels[0][0], 0.25);
    }

    #[test]
    fn self_reference_is_circular() {
        let mut config = Config::new();
        config.add_colorspace(ColorSpace::builder("ref").build());
        config.add_colorspace(
            ColorSpace::builder("loop")
                .to_reference(Transform::colorspace("loop", "ref"))
                .build(),
        );
        let err = compile(&config, &Transform::colorspace("loop", "ref"), TransformDirection::Forward)
            .unwrap_err();
        assert!(matches!(err, OcioError::CircularReference { .. }));
    }

    #[test]
    fn file_transform_without_file_is_missing() {
        let config = Config::new();
        let err = compile(&config, &Transform::file("nope.spi1d"), TransformDirection::Forward)
            .unwrap_err();
        assert!(err.is_missing_file());
    }

    #[test]
    fn unknown_look_reported() {
        let config = gain_config();
        let t = Transform::Look(LookTransform {
            src: "lin".into(),
            dst: "gain2".into(),
            looks: "missing".into(),
            direction: TransformDirection::Forward,
        });
        let err = compile(&config, &t, TransformDirection::Forward).unwrap_err();
        assert!(matches!(err, OcioError::LookNotFound { .. }));
    }
}
