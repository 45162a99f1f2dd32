//! End-to-end resolution tests against an on-disk film config.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use approx::assert_relative_eq;
use vfx_colorconfig::{
    ColorSpace, Config, Context, FileLoader, Interpolation, OcioError, OcioResult,
    PackedImageDesc, ProcessorOp, Transform, TransformDirection, role_names,
};

const FILM_CONFIG: &str = r#"
ocio_profile_version: 1

search_path: luts
strictparsing: false

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
  sRGB:
    - !<View> {name: Film, colorspace: srgb8}
    - !<View> {name: Log, colorspace: lg10}
    - !<View> {name: Raw, colorspace: nc10}
    - !<View> {name: Film DI, colorspace: srgb8, looks: di}
  DCIP3:
    - !<View> {name: Film, colorspace: p3dci8}
    - !<View> {name: Log, colorspace: lg10}
    - !<View> {name: Raw, colorspace: nc10}
    - !<View> {name: Film DI, colorspace: p3dci8, looks: di}

active_displays: [sRGB, DCIP3]
active_views: [Film, Log, Raw]

looks:
  - !<Look>
    name: di
    process_space: p3dci8
    transform: !<FileTransform> {src: look_di.cc, interpolation: linear}

colorspaces:
  - !<ColorSpace>
    name: lnf
    family: ln
    equalitygroup: ""
    bitdepth: 32f
    description: |
      lnf :  linear show space
    isdata: false
    allocation: lg2
    allocationvars: [-15, 6]

  - !<ColorSpace>
    name: lg10
    family: lg
    bitdepth: 10ui
    description: |
      lg10 : conversion from film log
    to_reference: !<FileTransform> {src: lg10.spi1d, interpolation: nearest}

  - !<ColorSpace>
    name: lgf
    family: lg
    bitdepth: 32f
    to_reference: !<FileTransform> {src: lg10.spi1d, interpolation: linear}

  - !<ColorSpace>
    name: vd8
    family: vd
    bitdepth: 8ui
    to_reference: !<ExponentTransform> {value: [2.2, 2.2, 2.2, 1]}

  - !<ColorSpace>
    name: vd10
    family: vd
    bitdepth: 10ui
    to_reference: !<ExponentTransform> {value: [2.2, 2.2, 2.2, 1]}

  - !<ColorSpace>
    name: nc10
    family: nc
    equalitygroup: nc
    bitdepth: 10ui
    isdata: false

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
    to_reference: !<GroupTransform>
      children:
        - !<MatrixTransform> {matrix: [2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 2, 0, 0, 0, 0, 1]}
        - !<LogTransform> {base: 10, direction: inverse}

  - !<ColorSpace>
    name: dt16
    family: dt
    bitdepth: 16f

  - !<ColorSpace>
    name: p3dci8
    family: p3dci
    bitdepth: 8ui
    from_reference: !<ColorSpaceTransform> {src: lnf, dst: vd8, direction: inverse}

  - !<ColorSpace>
    name: srgb8
    family: srgb
    bitdepth: 8ui
    from_reference: !<CDLTransform> {slope: [1, 1, 1], offset: [0, 0, 0], power: [0.5, 0.5, 0.5], sat: 1}
"#;

/// Loads any existing file as a uniform gain of 2.
#[derive(Debug)]
struct GainLoader;

impl FileLoader for GainLoader {
    fn load(
        &self,
        path: &Path,
        _interpolation: Interpolation,
        direction: TransformDirection,
    ) -> OcioResult<Vec<ProcessorOp>> {
        assert!(path.is_file(), "loader called with unresolved path");
        let gain = match direction {
            TransformDirection::Forward => 2.0,
            TransformDirection::Inverse => 0.5,
        };
        let mut matrix = [0.0; 16];
        matrix[0] = gain;
        matrix[5] = gain;
        matrix[10] = gain;
        matrix[15] = 1.0;
        Ok(vec![ProcessorOp::Matrix { matrix, offset: [0.0; 4] }])
    }
}

/// Returns a 3D LUT whose table is shorter than its declared size.
#[derive(Debug)]
struct TruncatedLutLoader;

impl FileLoader for TruncatedLutLoader {
    fn load(
        &self,
        _path: &Path,
        _interpolation: Interpolation,
        _direction: TransformDirection,
    ) -> OcioResult<Vec<ProcessorOp>> {
        Ok(vec![ProcessorOp::Lut3d {
            lut: vec![0.5; 3],
            size: 1,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
        }])
    }
}

/// Writes the config plus its LUT directory into a fresh temp dir.
fn film_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.ocio"), FILM_CONFIG).unwrap();
    fs::create_dir(dir.path().join("luts")).unwrap();
    fs::write(dir.path().join("luts/lg10.spi1d"), "lut").unwrap();
    fs::write(dir.path().join("luts/look_di.cc"), "cc").unwrap();
    dir
}

fn film_config(dir: &Path) -> Config {
    let mut config = Config::from_file(dir.join("config.ocio")).unwrap();
    config.set_file_loader(Arc::new(GainLoader));
    config
}

#[test]
fn loads_and_passes_sanity_check() {
    let dir = film_dir();
    let config = film_config(dir.path());

    config.sanity_check().unwrap();
    assert_eq!(config.num_colorspaces(), 11);
    assert_eq!(config.colorspace("lnf").unwrap().description(), "lnf :  linear show space");
    assert_eq!(config.default_display(), Some("sRGB"));
    assert_eq!(config.default_view("sRGB"), Some("Film"));
    assert_eq!(config.num_views("sRGB"), 4);
    assert_eq!(config.view("sRGB", 2), Some("Raw"));
    assert_eq!(config.display_looks("sRGB", "Film DI"), Some("di"));
    assert_eq!(config.display_colorspace_name("sRGB", "Raw"), Some("nc10"));
}

#[test]
fn set_role_rejects_unknown_colorspace() {
    let mut config = Config::from_yaml_str(FILM_CONFIG, ".").unwrap();
    let err = config.set_role(role_names::MATTE_PAINT, "vd12").unwrap_err();

    assert!(matches!(err, OcioError::ColorSpaceNotFound { ref name } if name == "vd12"));
    assert_eq!(config.colorspace(role_names::MATTE_PAINT).unwrap().name(), "vd8");
    assert!(config.sanity_check().is_ok());
}

#[test]
fn sanity_check_reports_dangling_role() {
    let yaml = FILM_CONFIG.replace("matte_paint: vd8", "matte_paint: vd12");
    let config = Config::from_yaml_str(&yaml, ".").unwrap();

    let err = config.sanity_check().unwrap_err();
    assert!(matches!(err, OcioError::MalformedConfig { ref reason } if reason.contains("vd12")));
}

#[test]
fn role_round_trip() {
    let mut config = Config::from_yaml_str(FILM_CONFIG, ".").unwrap();
    let before = config.num_roles();

    config.set_role("x", "lg10").unwrap();
    assert!(config.has_role("x"));
    assert_eq!(config.num_roles(), before + 1);

    config.set_role("x", "").unwrap();
    assert!(!config.has_role("x"));
    assert_eq!(config.num_roles(), before);
}

#[test]
fn index_stability() {
    let mut config = Config::from_yaml_str(FILM_CONFIG, ".").unwrap();
    config.add_colorspace(ColorSpace::new("extra"));
    config.add_colorspace(ColorSpace::builder("lg10").family("replaced").build());

    for i in 0..config.num_colorspaces() {
        let name = config.colorspace_name_by_index(i).unwrap();
        assert_eq!(config.index_for_colorspace(name), Some(i));
    }
    assert_eq!(config.colorspace_name_by_index(config.num_colorspaces()), None);
}

#[test]
fn noop_symmetry() {
    let dir = film_dir();
    let config = film_config(dir.path());

    for i in 0..config.num_colorspaces() {
        let name = config.colorspace_name_by_index(i).unwrap();
        let processor = config.processor(name, name).unwrap();
        assert!(processor.is_noop(), "{name} -> {name}");
    }
    assert!(config.processor("nc10", "ncf").unwrap().is_noop());
    assert!(config.processor("ncf", "nc10").unwrap().is_noop());
    assert!(!config.processor("lg10", "lnf").unwrap().is_noop());

    let vd8 = config.colorspace("vd8").unwrap().editable_copy();
    assert!(config.processor_for_colorspaces(&vd8, &vd8).unwrap().is_noop());
}

#[test]
fn substring_parse_policy() {
    let mut config = Config::from_yaml_str(FILM_CONFIG, ".").unwrap();
    assert!(!config.is_strict_parsing());
    assert_eq!(config.parse_colorspace_from_string("unrelated text"), Some("ncf"));

    config.set_strict_parsing(true);
    assert_eq!(config.parse_colorspace_from_string("unrelated text"), None);
}

#[test]
fn longest_rightmost_match() {
    let config = Config::from_yaml_str(FILM_CONFIG, ".").unwrap();
    assert_eq!(
        config.parse_colorspace_from_string("/shots/sh010/plate_vd10_and_nc10.0100.dpx"),
        Some("nc10")
    );
    assert_eq!(config.parse_colorspace_from_string("NC10_then_VD10"), Some("vd10"));
}

#[test]
fn file_resolution_follows_context() {
    let root = tempfile::tempdir().unwrap();
    for sub in ["a", "b"] {
        fs::create_dir(root.path().join(sub)).unwrap();
        fs::write(root.path().join(sub).join("lg10.spi1d"), sub).unwrap();
    }

    let dir = film_dir();
    let config = film_config(dir.path());

    let mut ctx_a = config.current_context().editable_copy();
    ctx_a.set_search_path(&root.path().join("a").to_string_lossy());
    let mut ctx_b = Context::new();
    ctx_b.set_search_path(&root.path().join("b").to_string_lossy());

    let pa = config.processor_with_context(&ctx_a, "lg10", "lnf").unwrap();
    let pb = config.processor_with_context(&ctx_b, "lg10", "lnf").unwrap();

    assert!(Path::new(pa.metadata().file(0).unwrap()).ends_with("a/lg10.spi1d"));
    assert!(Path::new(pb.metadata().file(0).unwrap()).ends_with("b/lg10.spi1d"));
    assert!(!Arc::ptr_eq(&pa, &pb));

    // Compiled bindings are frozen.
    ctx_a.set_search_path("/nowhere");
    assert!(Path::new(pa.metadata().file(0).unwrap()).ends_with("a/lg10.spi1d"));
}

#[test]
fn context_variables_select_files() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("sh010")).unwrap();
    fs::write(root.path().join("sh010/grade.cc"), "").unwrap();

    let dir = film_dir();
    let config = film_config(dir.path());

    let mut ctx = Context::new();
    ctx.set_search_path(&format!("{}/$SHOT", root.path().display()));
    ctx.set_string_var("SHOT", "sh010");

    let t = Transform::file("grade.cc");
    let processor = config
        .processor_for_transform_with_context(&ctx, &t, TransformDirection::Forward)
        .unwrap();
    assert!(processor.metadata().file(0).unwrap().ends_with("grade.cc"));

    ctx.set_string_var("SHOT", "sh020");
    let err = config
        .processor_for_transform_with_context(&ctx, &t, TransformDirection::Forward)
        .unwrap_err();
    assert!(err.is_missing_file());
}

#[test]
fn missing_file_detectable_through_wrapper() {
    let config = Config::from_yaml_str(FILM_CONFIG, "/no/such/show").unwrap();
    let err = config.processor("lg10", "lnf").unwrap_err();

    assert!(matches!(err, OcioError::Compilation { .. }));
    assert!(err.is_missing_file());
    let OcioError::MissingFile { file, searched } = err.root_cause() else {
        panic!("expected missing file, got {err}");
    };
    assert_eq!(file, "lg10.spi1d");
    assert_eq!(searched.len(), 1);
}

#[test]
fn malformed_loader_output_fails_compilation() {
    let dir = film_dir();
    let mut config = Config::from_file(dir.path().join("config.ocio")).unwrap();
    config.set_file_loader(Arc::new(TruncatedLutLoader));

    let err = config.processor("lg10", "lnf").unwrap_err();
    assert!(matches!(err, OcioError::Compilation { .. }));
    assert!(matches!(err.root_cause(), OcioError::Transform(msg) if msg.contains("3D LUT")));
}

#[test]
fn processor_math_through_references() {
    let dir = film_dir();
    let config = film_config(dir.path());

    // lg10 -> lnf: file gain of 2.
    let mut pixels = [[0.1_f32, 0.2, 0.3]];
    config.processor("lg10", "lnf").unwrap().apply_rgb(&mut pixels);
    assert_relative_eq!(pixels[0][0], 0.2, epsilon = 1e-6);
    assert_relative_eq!(pixels[0][2], 0.6, epsilon = 1e-6);

    // lnf -> cpf: inverse of (matrix x2 then 10^x) is log10 then /2.
    let mut pixels = [[100.0_f32, 10.0, 1.0]];
    config.processor("lnf", "cpf").unwrap().apply_rgb(&mut pixels);
    assert_relative_eq!(pixels[0][0], 1.0, epsilon = 1e-5);
    assert_relative_eq!(pixels[0][1], 0.5, epsilon = 1e-5);
    assert_relative_eq!(pixels[0][2], 0.0, epsilon = 1e-5);

    // vd8 -> vd10 goes through lnf and back: identity.
    let mut pixels = [[0.5_f32, 0.25, 0.75]];
    config.processor("vd8", "vd10").unwrap().apply_rgb(&mut pixels);
    assert_relative_eq!(pixels[0][0], 0.5, epsilon = 1e-5);
    assert_relative_eq!(pixels[0][1], 0.25, epsilon = 1e-5);

    // p3dci8 is defined as the inverse of lnf -> vd8.
    let mut pixels = [[0.5_f32, 0.5, 0.5]];
    config.processor("lnf", "p3dci8").unwrap().apply_rgb(&mut pixels);
    assert_relative_eq!(pixels[0][0], 0.5_f32.powf(2.2), epsilon = 1e-5);
}

#[test]
fn display_view_with_look() {
    let dir = film_dir();
    let config = film_config(dir.path());

    let t = Transform::Display(vfx_colorconfig::DisplayTransform::new("lnf", "sRGB", "Film DI"));
    let processor = config
        .processor_for_transform(&t, TransformDirection::Forward)
        .unwrap();

    assert_eq!(processor.metadata().num_looks(), 1);
    assert_eq!(processor.metadata().look(0), Some("di"));
    assert_eq!(processor.metadata().num_files(), 1);
    assert!(processor.metadata().file(0).unwrap().ends_with("look_di.cc"));

    // lnf -> p3dci8 (x^2.2), di gain 2, p3dci8 -> lnf (x^(1/2.2)), lnf -> srgb8 (sqrt).
    let mut pixels = [[0.25_f32, 0.25, 0.25]];
    processor.apply_rgb(&mut pixels);
    let expected = (2.0_f32.powf(1.0 / 2.2) * 0.25).sqrt();
    assert_relative_eq!(pixels[0][0], expected, epsilon = 1e-4);

    let overridden = Transform::Display(
        vfx_colorconfig::DisplayTransform::new("lnf", "sRGB", "Film DI").with_looks_override(""),
    );
    let processor = config
        .processor_for_transform(&overridden, TransformDirection::Forward)
        .unwrap();
    assert_eq!(processor.metadata().num_looks(), 0);
}

#[test]
fn invalid_dimensions_leave_buffer_untouched() {
    let dir = film_dir();
    let config = film_config(dir.path());
    let processor = config.processor("lg10", "lnf").unwrap();

    let original = vec![0.1_f32, 0.2, 0.3, 1.0, 0.4, 0.5, 0.6, 1.0];
    for (width, height) in [(0, 2), (2, 0), (0, 0)] {
        let mut pixels = original.clone();
        let err = processor
            .apply(&mut PackedImageDesc::new(&mut pixels, width, height, 4))
            .unwrap_err();
        assert!(matches!(err, OcioError::InvalidDimensions { .. }));
        assert!(err.to_string().contains("image dimensions must be positive"));
        assert_eq!(pixels, original);
    }

    let mut pixels = original.clone();
    processor
        .apply(&mut PackedImageDesc::new(&mut pixels, 2, 1, 4))
        .unwrap();
    assert_relative_eq!(pixels[0], 0.2, epsilon = 1e-6);
    assert_eq!(pixels[3], 1.0);
    assert_eq!(pixels[7], 1.0);
}

#[test]
fn serialization_idempotent() {
    let dir = film_dir();
    let config = film_config(dir.path());

    let first = config.serialize();
    let reparsed = Config::from_yaml_str(&first, dir.path()).unwrap();
    let second = reparsed.serialize();
    assert_eq!(first, second);

    assert_eq!(reparsed.num_colorspaces(), config.num_colorspaces());
    assert_eq!(reparsed.active_views(), "Film, Log, Raw");
    assert_eq!(reparsed.look("di").unwrap().get_process_space(), "p3dci8");
    assert_eq!(
        reparsed.colorspace("cpf").unwrap().to_reference(),
        config.colorspace("cpf").unwrap().to_reference()
    );
}

#[test]
fn written_file_reloads() {
    let dir = film_dir();
    let mut config = film_config(dir.path());
    config.add_environment_var("SHOT", "sh010");
    config.set_description("written \"back\"\nsecond line");

    let path = dir.path().join("written.ocio");
    config.write_to_file(&path).unwrap();
    let reloaded = Config::from_file(&path).unwrap();

    assert_eq!(reloaded.serialize(), config.serialize());
    assert_eq!(reloaded.description(), "written \"back\"\nsecond line");
    assert_eq!(reloaded.environment().unwrap().len(), 1);
}

#[test]
fn cache_id_tracks_file_metadata() {
    let dir = film_dir();
    let config = film_config(dir.path());
    let ctx = config.current_context();

    let before = config.cache_id(Some(ctx));
    assert_eq!(before, config.cache_id(Some(ctx)));
    assert_ne!(before, config.cache_id(None));

    fs::write(dir.path().join("luts/lg10.spi1d"), "a longer lut body").unwrap();
    assert_ne!(before, config.cache_id(Some(ctx)));
}

#[test]
fn shared_config_across_threads() {
    let dir = film_dir();
    let config = Arc::new(film_config(dir.path()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = Arc::clone(&config);
            std::thread::spawn(move || {
                let processor = config.processor("lg10", "lnf").unwrap();
                let mut pixels = [[0.25_f32, 0.25, 0.25, 1.0]; 16];
                processor.apply_rgba(&mut pixels);
                pixels[0][0]
            })
        })
        .collect();

    for h in handles {
        assert_relative_eq!(h.join().unwrap(), 0.5, epsilon = 1e-6);
    }
    assert_eq!(config.num_cached_processors(), 1);
}
