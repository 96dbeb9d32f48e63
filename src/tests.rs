//! Tests for the pointer blur pipeline

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::blur::plan::dispatch_size;
use crate::blur::{
    blur_intensity, box_blur_2d, effective_filter_dim, BlurParams, BufferId, CpuBlurPipeline, FramePlan,
    PassBinding, PassDirection, PointerParams, TiledBlur, BATCH, TILE_DIM,
};
use crate::config::{GalleryConfig, Mode, PointerSettings, MAX_SURFACE_DIM};
use crate::error::{CapabilityError, ConfigError, PlanError, ShaderError};
use crate::frame::{FrameBuffer, Rgba};
use crate::gpu::blur::{tiled_blur_shader, BlurUniforms, FlipUniforms, PointerUniforms};
use crate::gpu::device::LossAware;
use crate::gpu::readback::padded_bytes_per_row;
use crate::gpu::scene::scene_shader;
use crate::gpu::shader::ShaderTemplate;
use crate::gpu::{BlurRenderer, DeviceSlot, GpuDevice, SlotState};
use crate::interactive::{adjust_decay, adjust_radius, button_event};
use crate::pointer::{PointerEvent, PointerHistory, PointerState, SurfaceRect};
use crate::render::write_ppm;
use crate::scene::Scene;

const BYTE: f32 = 1.0 / 255.0;

fn params(filter_size: u32) -> BlurParams {
    BlurParams::from_filter_size(filter_size).unwrap()
}

/// Run both passes of `plan` directly on `input`
fn run_plan(input: &FrameBuffer, params: BlurParams, pointer: &PointerParams, directions: [PassDirection; 2]) -> FrameBuffer {
    let kernel = TiledBlur::new(params);
    let (w, h) = input.dims();
    let mut working_b = FrameBuffer::new(w, h);
    let mut working_a = FrameBuffer::new(w, h);
    kernel.run_pass(input, &mut working_b, pointer, directions[0]);
    kernel.run_pass(&working_b, &mut working_a, pointer, directions[1]);
    working_a
}

fn single_white_texel(w: u32, h: u32, at: (u32, u32)) -> FrameBuffer {
    let mut frame = FrameBuffer::filled(w, h, Rgba::black());
    frame.store(at.0, at.1, Rgba::rgb(1.0, 1.0, 1.0));
    frame
}

/// Every texel was written by some workgroup (fresh buffers start with alpha 0)
fn assert_full_coverage(frame: &FrameBuffer, label: &str) {
    let (w, h) = frame.dims();
    for y in 0..h {
        for x in 0..w {
            let texel = frame.texel(x, y);
            assert!(texel.a == 1.0, "{}: texel ({}, {}) never written", label, x, y);
            assert!(texel.is_finite(), "{}: texel ({}, {}) not finite", label, x, y);
        }
    }
}

// ---------------------------------------------------------------------------
// Falloff

#[test]
fn test_intensity_zero_at_and_beyond_radius() {
    assert_eq!(blur_intensity(0.2, 0.2, 2.0), 0.0);
    assert_eq!(blur_intensity(0.35, 0.2, 2.0), 0.0);
    assert_eq!(blur_intensity(5.0, 0.2, 0.0), 0.0);
    assert_eq!(effective_filter_dim(15, 0.0), 3);
}

#[test]
fn test_intensity_full_at_pointer() {
    assert_eq!(blur_intensity(0.0, 0.2, 2.0), 1.0);
    assert_eq!(effective_filter_dim(15, 1.0), 15);
    assert_eq!(effective_filter_dim(15, 0.1), 15);
}

#[test]
fn test_intensity_monotonic() {
    let mut previous = f32::INFINITY;
    for i in 0..=400 {
        let d = i as f32 * 0.001;
        let intensity = blur_intensity(d, 0.2, 2.0);
        assert!(intensity <= previous, "intensity rose at distance {}", d);
        assert!((0.0..=1.0).contains(&intensity));
        previous = intensity;
    }
}

#[test]
fn test_effective_filter_dim_narrowing() {
    assert_eq!(effective_filter_dim(15, 0.08), 13);
    assert_eq!(effective_filter_dim(15, 0.04), 7);
    assert_eq!(effective_filter_dim(15, 0.005), 3);
    assert_eq!(effective_filter_dim(15, f32::NAN), 3);

    for filter_dim in [3, 5, 15, 63, 127] {
        for i in 0..=100 {
            let intensity = i as f32 * 0.01;
            let dim = effective_filter_dim(filter_dim, intensity);
            assert!(dim % 2 == 1, "even width {} for intensity {}", dim, intensity);
            assert!(dim >= 3 && dim <= filter_dim);
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters and dispatch sizing

#[test]
fn test_blur_params_from_filter_size() {
    assert_eq!(params(15), BlurParams { filter_dim: 15, block_dim: 113 });
    assert_eq!(params(16), BlurParams { filter_dim: 17, block_dim: 111 });
    assert_eq!(params(0).filter_dim, 3);
    assert_eq!(params(2).filter_dim, 3);
    assert_eq!(params(126), BlurParams { filter_dim: 127, block_dim: 1 });
    assert_eq!(BlurParams::from_filter_size(128), Err(ConfigError::FilterTooLarge(128)));
    assert_eq!(BlurParams::default(), params(15));
    assert_eq!(params(15).filter_offset(), 7);
}

#[test]
fn test_dispatch_size_800x600() {
    let p = BlurParams::default();
    assert_eq!(dispatch_size(PassDirection::Horizontal, (800, 600), &p), (8, 150));
    assert_eq!(dispatch_size(PassDirection::Vertical, (800, 600), &p), (6, 200));

    let plan = FramePlan::standard();
    assert_eq!(plan.passes()[0].workgroups((800, 600), &p), (8, 150));
    assert_eq!(plan.passes()[1].workgroups((800, 600), &p), (6, 200));
}

// ---------------------------------------------------------------------------
// Kernel properties

#[test]
fn test_separable_matches_2d_box_blur() {
    let scene = Scene::default().rasterize(200, 150);
    for filter_size in [3, 7, 15] {
        let p = params(filter_size);
        let blurred = run_plan(
            &scene,
            p,
            &PointerParams::full_strength(),
            [PassDirection::Horizontal, PassDirection::Vertical],
        );
        let reference = box_blur_2d(&scene, p.filter_dim);
        let diff = blurred.max_diff(&reference);
        println!("filter {}: max diff {:.4}", filter_size, diff);
        assert!(diff <= 2.0 * BYTE + 1e-6, "filter {} differs by {}", filter_size, diff);
    }
}

#[test]
fn test_bright_spot_spreads_to_square() {
    let input = single_white_texel(100, 80, (50, 40));
    let p = params(5);
    let blurred = run_plan(
        &input,
        p,
        &PointerParams::full_strength(),
        [PassDirection::Horizontal, PassDirection::Vertical],
    );

    let lit = blurred.as_bytes().chunks_exact(4).filter(|t| t[0] > 0).count();
    assert_eq!(lit, 25);
    for y in 38..=42 {
        for x in 48..=52 {
            assert!((blurred.texel(x, y).r - 10.0 * BYTE).abs() < 1e-6);
        }
    }
    assert!(blurred.max_diff(&box_blur_2d(&input, p.filter_dim)) <= BYTE);
}

#[test]
fn test_same_flip_twice_is_not_2d_blur() {
    let input = single_white_texel(100, 80, (50, 40));
    let p = params(5);
    let pointer = PointerParams::full_strength();

    let wrong = run_plan(&input, p, &pointer, [PassDirection::Horizontal, PassDirection::Horizontal]);
    let reference = box_blur_2d(&input, p.filter_dim);

    // Nothing leaves the source row, but the 2-D blur reaches the next one
    assert_eq!(wrong.texel(50, 41).r, 0.0);
    assert!(reference.texel(50, 41).r > 0.03);
    assert!(wrong.texel(46, 40).r > 0.0);
    assert!(wrong.max_diff(&reference) > 0.03);

    let plan = FramePlan::new([
        PassBinding::new(PassDirection::Horizontal, BufferId::Scene, BufferId::WorkingB),
        PassBinding::new(PassDirection::Horizontal, BufferId::WorkingB, BufferId::WorkingA),
    ]);
    assert_eq!(plan, Err(PlanError::SameDirection(PassDirection::Horizontal)));
}

#[test]
fn test_full_coverage_at_awkward_sizes() {
    let pointer = PointerParams::full_strength();
    let cases: &[((u32, u32), &[u32])] = &[
        ((800, 600), &[15]),
        ((257, 131), &[3, 15, 127]),
        ((113, 4), &[3, 15, 127]),
        ((114, 5), &[3, 15, 127]),
        ((1, 1), &[3, 15, 127]),
    ];

    for &((w, h), filter_sizes) in cases {
        let scene = Scene::gradient_only().rasterize(w, h);
        for &filter_size in filter_sizes {
            let kernel = TiledBlur::new(params(filter_size));
            for direction in [PassDirection::Horizontal, PassDirection::Vertical] {
                let mut output = FrameBuffer::new(w, h);
                kernel.run_pass(&scene, &mut output, &pointer, direction);
                assert_full_coverage(&output, &format!("{}x{} filter {} {:?}", w, h, filter_size, direction));
            }
        }
    }
}

#[test]
fn test_load_indices_clamped() {
    let dims = (257, 131);
    let kernel = TiledBlur::new(params(15));

    // First invocation of the first group starts left of the image
    assert_eq!(kernel.base_index((0, 0), 0), (-7, 0));
    assert_eq!(kernel.load_coord((0, 0), 0, 0, 0, PassDirection::Horizontal, dims), (0, 0));

    for direction in [PassDirection::Horizontal, PassDirection::Vertical] {
        let (gx, gy) = dispatch_size(direction, dims, kernel.params());
        for group_y in 0..gy {
            for group_x in 0..gx {
                for local_x in 0..TILE_DIM / BATCH {
                    for row in 0..BATCH {
                        for col in 0..BATCH {
                            let (x, y) = kernel.load_coord((group_x, group_y), local_x, row, col, direction, dims);
                            assert!(x < dims.0 && y < dims.1, "load ({}, {}) out of bounds", x, y);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_pointer_at_corners() {
    let (w, h) = (160, 120);
    let scene = Scene::default();
    let mut pipeline = CpuBlurPipeline::new(w, h, BlurParams::default(), &scene);

    for corner in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        let pointer = PointerParams::new(corner, 0.2, 2.0);
        let frame = pipeline.render(&pointer);
        assert_full_coverage(frame, &format!("corner {:?}", corner));
    }
}

#[test]
fn test_end_to_end_800x600() {
    let (w, h) = (800, 600);
    let scene_frame = Scene::gradient_only().rasterize(w, h);
    let mut pipeline = CpuBlurPipeline::new(w, h, BlurParams::default(), &Scene::gradient_only());
    let pointer = PointerParams::default();
    let frame = pipeline.render(&pointer).clone();

    assert_eq!(frame.dims(), (w, h));
    assert_full_coverage(&frame, "800x600");
    assert_eq!(pipeline.buffer(BufferId::WorkingA), &frame);

    // Centre texel gets the full-width filter: the flattest 15x15 average
    let centre_uv = (400.5 / w as f32, 300.5 / h as f32);
    assert_eq!(effective_filter_dim(15, pointer.intensity_at(centre_uv)), 15);
    let reference = box_blur_2d(&scene_frame, 15);
    let centre = frame.texel(400, 300);
    println!("centre: {:?} reference: {:?}", centre, reference.texel(400, 300));
    assert!(centre.max_channel_diff(reference.texel(400, 300)) <= 2.0 * BYTE + 1e-6);

    // Outside the radius only the 3-tap minimum runs, which leaves a linear ramp in place
    let mut far = 0;
    let mut worst = 0.0f32;
    for y in 0..h {
        for x in 0..w {
            let dx = (x as f32 + 0.5) / w as f32 - 0.5;
            let dy = (y as f32 + 0.5) / h as f32 - 0.5;
            if (dx * dx + dy * dy).sqrt() <= 0.2 {
                continue;
            }
            far += 1;
            worst = worst.max(frame.texel(x, y).max_channel_diff(scene_frame.texel(x, y)));
        }
    }
    println!("{} texels outside the radius, worst diff {:.4}", far, worst);
    assert!(far > (w * h / 2) as usize);
    assert!(worst <= 3.0 * BYTE + 1e-6, "far texels moved by {}", worst);
}

#[test]
fn test_text_near_pointer_is_blurred() {
    let scene = Scene::default();
    let scene_frame = scene.rasterize(800, 600);
    let mut pipeline = CpuBlurPipeline::new(800, 600, BlurParams::default(), &scene);
    let frame = pipeline.render(&PointerParams::default());

    // "R" left stroke near the pointer: mixed with the gradient
    assert_eq!(scene_frame.texel(355, 285).g, 1.0);
    assert!(frame.texel(355, 285).g < 0.8);

    // "B" left stroke outside the radius: only a 3-tap blur over white
    assert!(frame.texel(163, 285).g > 0.95);
}

#[test]
fn test_plan_rejects_reordered_passes() {
    use BufferId::*;
    use PassDirection::*;

    let vertical_first = FramePlan::new([
        PassBinding::new(Vertical, Scene, WorkingB),
        PassBinding::new(Horizontal, WorkingB, WorkingA),
    ]);
    assert_eq!(
        vertical_first,
        Err(PlanError::NotStandard {
            pass: 1,
            expected: PassBinding::new(Horizontal, Scene, WorkingB),
            found: PassBinding::new(Vertical, Scene, WorkingB),
        })
    );

    // Swapped working buffers would present B
    let swapped = FramePlan::new([
        PassBinding::new(Horizontal, Scene, WorkingA),
        PassBinding::new(Vertical, WorkingA, WorkingB),
    ]);
    assert_eq!(
        swapped,
        Err(PlanError::NotStandard {
            pass: 1,
            expected: PassBinding::new(Horizontal, Scene, WorkingB),
            found: PassBinding::new(Horizontal, Scene, WorkingA),
        })
    );

    let standard = FramePlan::new([
        PassBinding::new(Horizontal, Scene, WorkingB),
        PassBinding::new(Vertical, WorkingB, WorkingA),
    ]);
    assert_eq!(standard, Ok(FramePlan::standard()));
}

// ---------------------------------------------------------------------------
// Pass plan

#[test]
fn test_standard_plan() {
    let plan = FramePlan::standard();
    assert_eq!(FramePlan::new(*plan.passes()), Ok(plan));
    assert_eq!(plan.presented(), BufferId::WorkingA);
    assert_eq!(plan.passes()[0].output, plan.passes()[1].input);
    assert_eq!(plan.passes()[0].direction.flip_value(), 0);
    assert_eq!(plan.passes()[1].direction.flip_value(), 1);
}

#[test]
fn test_plan_rejects_invalid_chains() {
    use BufferId::*;
    use PassDirection::*;

    let aliased = FramePlan::new([PassBinding::new(Horizontal, Scene, Scene), PassBinding::new(Vertical, Scene, WorkingA)]);
    assert_eq!(aliased, Err(PlanError::AliasedBuffers { pass: 1, buffer: Scene }));

    let writes_scene = FramePlan::new([
        PassBinding::new(Horizontal, Scene, WorkingB),
        PassBinding::new(Vertical, WorkingB, Scene),
    ]);
    assert_eq!(writes_scene, Err(PlanError::WritesScene { pass: 2 }));

    let not_scene = FramePlan::new([
        PassBinding::new(Horizontal, WorkingA, WorkingB),
        PassBinding::new(Vertical, WorkingB, WorkingA),
    ]);
    assert_eq!(not_scene, Err(PlanError::SceneNotFirst(WorkingA)));

    let broken = FramePlan::new([
        PassBinding::new(Horizontal, Scene, WorkingB),
        PassBinding::new(Vertical, WorkingA, WorkingB),
    ]);
    assert_eq!(broken, Err(PlanError::BrokenChain { expected: WorkingB, found: WorkingA }));
}

// ---------------------------------------------------------------------------
// Shader templates

#[test]
fn test_template_substitution() {
    let source = ShaderTemplate::new("test", "const N: u32 = {{N}}u;\nconst S: f32 = {{ SCALE }};")
        .define("N", 4)
        .define("SCALE", "0.5")
        .render()
        .unwrap();
    assert_eq!(source, "const N: u32 = 4u;\nconst S: f32 = 0.5;");
}

#[test]
fn test_template_errors() {
    let missing = ShaderTemplate::new("test", "{{A}} {{B}}").define("A", 1).render();
    assert_eq!(
        missing,
        Err(ShaderError::UnresolvedConstant {
            shader: "test".to_string(),
            name: "B".to_string()
        })
    );

    let open = ShaderTemplate::new("test", "const X = {{X;").define("X", 1).render();
    assert!(matches!(open, Err(ShaderError::Template { ref shader, .. }) if shader == "test"));

    // Defining extra constants is harmless
    let extra = ShaderTemplate::new("test", "{{A}}").define("A", 1).define("UNUSED", 2).render();
    assert_eq!(extra, Ok("1".to_string()));
}

#[test]
fn test_builtin_shaders_resolve() {
    let blur = tiled_blur_shader().render().unwrap();
    assert!(!blur.contains("{{"));
    assert!(blur.contains("const TILE_DIM: i32 = 128;"));
    assert!(blur.contains("const BATCH: i32 = 4;"));
    assert!(blur.contains("@workgroup_size(32, 1, 1)"));
    assert!(blur.contains("const INTENSITY_THRESHOLD: f32 = 0.1;"));

    let scene = scene_shader(&Scene::default()).render().unwrap();
    assert!(!scene.contains("{{"));
    assert!(scene.contains("fn vs_fullscreen"));
    assert!(scene.contains("fn fs_scene"));
    let count = Scene::default().strokes.len();
    assert!(scene.contains(&format!("const STROKE_COUNT: u32 = {}u;", count)));

    // No strokes still needs a non-empty array
    let empty = scene_shader(&Scene::gradient_only()).render().unwrap();
    assert!(empty.contains("array<vec4<f32>, 1>"));
    assert!(empty.contains("const STROKE_COUNT: u32 = 0u;"));
}

#[test]
fn test_uniform_layouts() {
    assert_eq!(std::mem::size_of::<BlurUniforms>(), 16);
    assert_eq!(std::mem::size_of::<PointerUniforms>(), 16);
    assert_eq!(std::mem::size_of::<FlipUniforms>(), 16);

    let uniforms = BlurUniforms::from(&BlurParams::default());
    assert_eq!((uniforms.filter_dim, uniforms.block_dim), (15, 113));
    let pointer = PointerUniforms::from(&PointerParams::default());
    assert_eq!(pointer.position, [0.5, 0.5]);
}

// ---------------------------------------------------------------------------
// Configuration

#[test]
fn test_config_defaults() {
    let args: [&str; 0] = [];
    let (mode, config) = GalleryConfig::from_args(&args).unwrap();
    assert_eq!(mode, Mode::Help);
    assert_eq!(config, GalleryConfig::default());
    assert_eq!(config.surface_size, (800, 600));
    assert_eq!(config.validate(), Ok(BlurParams::default()));
}

#[test]
fn test_config_parse_snapshot() {
    let args = [
        "--snapshot", "out.ppm", "--gpu", "--radius", "0.3", "--decay", "1.5", "--filter-size", "20", "--size",
        "320x240", "--pointer", "0.25,0.75",
    ];
    let (mode, config) = GalleryConfig::from_args(&args).unwrap();
    assert_eq!(
        mode,
        Mode::Snapshot {
            path: "out.ppm".to_string(),
            gpu: true
        }
    );
    assert_eq!(config.pointer, PointerSettings { max_radius: 0.3, decay_factor: 1.5 });
    assert_eq!(config.surface_size, (320, 240));
    assert_eq!(config.snapshot_pointer, (0.25, 0.75));
    assert_eq!(config.validate().unwrap().filter_dim, 21);
}

#[test]
fn test_config_errors() {
    let parse = |args: &[&str]| GalleryConfig::from_args(args).map(|_| ());

    assert_eq!(parse(&["--bogus"]), Err(ConfigError::UnknownArgument("--bogus".to_string())));
    assert_eq!(parse(&["--radius"]), Err(ConfigError::MissingValue("--radius".to_string())));
    assert_eq!(
        parse(&["--radius", "wide"]),
        Err(ConfigError::InvalidValue {
            flag: "--radius".to_string(),
            value: "wide".to_string()
        })
    );
    assert_eq!(parse(&["--radius", "-1"]), Err(ConfigError::InvalidRadius(-1.0)));
    assert_eq!(parse(&["--decay", "-0.5"]), Err(ConfigError::InvalidDecay(-0.5)));
    assert_eq!(parse(&["--filter-size", "200"]), Err(ConfigError::FilterTooLarge(200)));
    assert_eq!(parse(&["--size", "0x10"]), Err(ConfigError::InvalidSurfaceSize(0, 10)));
    assert!(parse(&["--size", "800"]).is_err());
    assert_eq!(
        parse(&["--size", "100000x600"]),
        Err(ConfigError::SurfaceTooLarge {
            width: 100_000,
            height: 600,
            max: MAX_SURFACE_DIM
        })
    );
    assert!(parse(&["--size", "8192x8192"]).is_ok());

    // Largest accepted surface still fits the padded readback in u32
    let (_, padded) = padded_bytes_per_row(MAX_SURFACE_DIM);
    assert!((padded as u64) * (MAX_SURFACE_DIM as u64) <= u32::MAX as u64);
}

#[test]
fn test_viewer_adjustments_stay_in_range() {
    let mut settings = PointerSettings::default();
    for _ in 0..100 {
        adjust_radius(&mut settings, -0.02);
        adjust_decay(&mut settings, -0.25);
    }
    assert!(settings.max_radius > 0.0);
    assert_eq!(settings.decay_factor, 0.0);

    let mut config = GalleryConfig::default();
    config.pointer = settings;
    assert!(config.validate().is_ok());
}

#[test]
fn test_button_events_wait_for_cursor() {
    // A click before any cursor movement must not jump the pointer to the corner
    assert_eq!(button_event(None, true), None);
    assert_eq!(button_event(None, false), None);
    assert_eq!(button_event(Some((120.0, 80.0)), true), Some(PointerEvent::Pressed { x: 120.0, y: 80.0 }));
    assert_eq!(button_event(Some((120.0, 80.0)), false), Some(PointerEvent::Released { x: 120.0, y: 80.0 }));
}

// ---------------------------------------------------------------------------
// Pointer feed

#[test]
fn test_surface_normalization() {
    let rect = SurfaceRect::new(100.0, 50.0, 800.0, 600.0);
    assert_eq!(rect.normalize(500.0, 350.0), (0.5, 0.5));
    assert_eq!(rect.normalize(0.0, 0.0), (0.0, 0.0));
    assert_eq!(rect.normalize(2000.0, 2000.0), (1.0, 1.0));
    assert_eq!(rect.normalize(f32::NAN, 350.0), (0.5, 0.5));
    assert_eq!(SurfaceRect::from_size(0, 0).normalize(10.0, 10.0), (0.5, 0.5));
}

#[test]
fn test_pointer_state_events() {
    let surface = SurfaceRect::from_size(800, 600);
    let mut state = PointerState::default();
    assert_eq!(state.position(), (0.5, 0.5));
    assert_eq!(state.speed(), 0.0);

    state.handle(PointerEvent::Moved { x: 200.0, y: 150.0 }, &surface);
    assert_eq!(state.position(), (0.25, 0.25));
    assert!(!state.is_down());

    state.handle(PointerEvent::Pressed { x: 200.0, y: 450.0 }, &surface);
    assert!(state.is_down());
    assert_eq!(state.velocity(), (0.0, 0.5));
    assert_eq!(state.direction(), (0.0, 1.0));
    assert_eq!(state.speed(), 0.5);

    state.handle(PointerEvent::Left, &surface);
    assert!(!state.is_down());
    assert_eq!(state.history().len(), 2);
    assert_eq!(state.position(), (0.25, 0.75));

    let settings = PointerSettings { max_radius: 0.3, decay_factor: 1.0 };
    assert_eq!(state.blur_params(&settings), PointerParams::new((0.25, 0.75), 0.3, 1.0));
}

#[test]
fn test_pointer_history_ring() {
    let mut history = PointerHistory::default();
    assert_eq!(history.capacity(), 5);
    assert_eq!(history.velocity(), (0.0, 0.0));
    assert_eq!(history.direction(), (0.0, 0.0));

    for i in 0..7 {
        history.push((i as f32, 0.0));
    }
    assert_eq!(history.len(), 5);
    assert_eq!(history.latest(), Some((6.0, 0.0)));
    assert_eq!(history.direction(), (1.0, 0.0));

    // Repeating a sample means no motion
    history.push((6.0, 0.0));
    assert_eq!(history.speed(), 0.0);
    assert_eq!(history.direction(), (0.0, 0.0));

    history.clear();
    assert!(history.is_empty());
    assert_eq!(PointerHistory::new(0).capacity(), 2);
}

// ---------------------------------------------------------------------------
// Device slot

struct FakeDevice {
    id: usize,
    lost: Mutex<Option<String>>,
}

impl FakeDevice {
    fn new(id: usize) -> Self {
        Self { id, lost: Mutex::new(None) }
    }

    fn lose(&self, reason: &str) {
        *self.lost.lock().unwrap() = Some(reason.to_string());
    }
}

impl LossAware for FakeDevice {
    fn lost_reason(&self) -> Option<String> {
        self.lost.lock().unwrap().clone()
    }
}

#[test]
fn test_device_slot_shares_initialization() {
    let slot = Arc::new(DeviceSlot::<FakeDevice>::new());
    let inits = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let slot = Arc::clone(&slot);
            let inits = Arc::clone(&inits);
            thread::spawn(move || {
                slot.acquire(|| {
                    let id = inits.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    Ok(FakeDevice::new(id))
                })
                .unwrap()
            })
        })
        .collect();

    let devices: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert!(devices.iter().all(|d| Arc::ptr_eq(d, &devices[0])));
    assert_eq!(slot.state(), SlotState::Ready);
}

#[test]
fn test_device_slot_loss_and_reset() {
    let slot = DeviceSlot::<FakeDevice>::new();
    assert_eq!(slot.state(), SlotState::Empty);
    assert!(slot.current().is_none());

    let device = slot.acquire(|| Ok(FakeDevice::new(1))).unwrap();
    assert_eq!(device.id, 1);
    device.lose("driver reset");

    assert_eq!(slot.state(), SlotState::Lost("driver reset".to_string()));
    assert!(slot.current().is_none());

    // No silent re-initialization while lost
    let again = slot.acquire(|| Ok(FakeDevice::new(2)));
    assert!(matches!(again, Err(CapabilityError::DeviceLost(reason)) if reason == "driver reset"));

    slot.reset();
    assert_eq!(slot.state(), SlotState::Empty);
    let fresh = slot.acquire(|| Ok(FakeDevice::new(3))).unwrap();
    assert_eq!(fresh.id, 3);

    slot.invalidate("surface gone");
    assert_eq!(slot.state(), SlotState::Lost("surface gone".to_string()));
}

#[test]
fn test_device_slot_failed_init_can_retry() {
    let slot = DeviceSlot::<FakeDevice>::new();
    let failed = slot.acquire(|| Err(CapabilityError::NoAdapter));
    assert!(matches!(failed, Err(CapabilityError::NoAdapter)));
    assert_eq!(slot.state(), SlotState::Empty);
    assert!(slot.acquire(|| Ok(FakeDevice::new(1))).is_ok());
}

// ---------------------------------------------------------------------------
// Output

#[test]
fn test_scene_colors() {
    let scene = Scene::default();
    assert_eq!(scene.color_at(0.205, 0.45), scene.text_color);
    let gradient = Scene::gradient_only();
    assert_eq!(gradient.color_at(0.0, 0.9), gradient.gradient_start);
    assert!(gradient.color_at(1.0, 0.1).max_channel_diff(gradient.gradient_end) < 1e-6);

    let frame = gradient.rasterize(4, 1);
    assert!(frame.texel(0, 0).r < frame.texel(3, 0).r);
}

#[test]
fn test_write_ppm() {
    let mut frame = FrameBuffer::filled(2, 1, Rgba::rgb(1.0, 0.0, 0.0));
    frame.store(1, 0, Rgba::rgb(0.0, 0.0, 1.0));
    let mut out = Vec::new();
    write_ppm(&frame, &mut out).unwrap();
    assert_eq!(out, b"P6\n2 1\n255\n\xff\x00\x00\x00\x00\xff".to_vec());
}

#[test]
fn test_readback_row_padding() {
    assert_eq!(padded_bytes_per_row(1), (4, 256));
    assert_eq!(padded_bytes_per_row(64), (256, 256));
    assert_eq!(padded_bytes_per_row(65), (260, 512));
}

// ---------------------------------------------------------------------------
// GPU (skipped without an adapter)

#[test]
fn test_gpu_matches_cpu_kernel() {
    let gpu = match GpuDevice::request(GpuDevice::new_instance()) {
        Ok(gpu) => gpu,
        Err(e) => {
            println!("Skipping GPU test: {}", e);
            return;
        }
    };

    let (w, h) = (256, 192);
    let scene = Scene::gradient_only();
    let p = BlurParams::default();
    let pointer = PointerParams::new((0.4, 0.6), 0.3, 2.0);

    let renderer = BlurRenderer::new(&gpu, (w, h), p, &scene, FramePlan::standard()).unwrap();
    assert_eq!(renderer.size(), (w, h));
    assert_eq!(renderer.blur().params(), &p);
    assert_eq!(renderer.blur().bindings(), *renderer.plan().passes());
    let gpu_scene = renderer.read_buffer(&gpu, BufferId::Scene).unwrap();
    assert!(gpu_scene.max_diff(&scene.rasterize(w, h)) <= BYTE + 1e-6);

    let gpu_frame = renderer.render_offscreen(&gpu, &pointer).unwrap();
    let mut cpu = CpuBlurPipeline::new(w, h, p, &scene);
    let diff = gpu_frame.max_diff(cpu.render(&pointer));
    println!("GPU vs CPU max diff: {:.4}", diff);
    assert!(diff <= 3.0 * BYTE + 1e-6);
    assert_full_coverage(&gpu_frame, "gpu");
}
