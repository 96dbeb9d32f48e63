mod blur;
mod config;
mod error;
mod frame;
mod gpu;
mod interactive;
mod pointer;
mod render;
mod scene;

#[cfg(test)]
mod tests;

// Re-export public API
pub use blur::{box_blur_2d, BlurParams, CpuBlurPipeline, FramePlan, PointerParams, TiledBlur};
pub use config::{GalleryConfig, Mode, PointerSettings};
pub use error::{CapabilityError, ConfigError, GalleryError, PlanError, ShaderError};
pub use frame::{FrameBuffer, Rgba};
pub use gpu::{BlurRenderer, DeviceSlot, GpuDevice};
pub use interactive::{run_gpu_viewer, CpuPreview};
pub use pointer::{PointerEvent, PointerState, SurfaceRect};
pub use render::save_ppm;
pub use scene::Scene;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, config) = match GalleryConfig::from_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    let result = match mode {
        Mode::Help => {
            print_usage();
            Ok(())
        }
        Mode::Interactive => run_interactive(&config),
        Mode::CpuPreview => run_cpu_preview(&config, None),
        Mode::Snapshot { path, gpu } => run_snapshot(&config, &path, gpu),
        Mode::Benchmark => run_benchmark(&config),
        Mode::Probe => run_probe(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Pointer Blur");
    println!("Run with --interactive for the GPU viewer (falls back to the CPU preview)");
    println!("Run with --cpu for the CPU preview");
    println!("Run with --snapshot <file.ppm> [--gpu] to render one frame");
    println!("Run with --benchmark to time the CPU kernel");
    println!("Run with --probe to check GPU support");
    println!();
    println!("Options:");
    println!("  --radius <f32>       Pointer radius of influence (default 0.2)");
    println!("  --decay <f32>        Falloff steepness (default 2.0)");
    println!("  --filter-size <u32>  Widest box filter (default 15)");
    println!("  --size <W>x<H>       Surface size (default 800x600)");
    println!("  --pointer <u>,<v>    Snapshot pointer position (default 0.5,0.5)");
}

fn acquire_device(slot: &DeviceSlot) -> Result<std::sync::Arc<GpuDevice>, CapabilityError> {
    slot.acquire(|| GpuDevice::request(GpuDevice::new_instance()))
}

fn run_interactive(config: &GalleryConfig) -> Result<(), GalleryError> {
    let slot = DeviceSlot::new();

    let reason = match acquire_device(&slot) {
        Ok(gpu) => {
            log::info!("GPU available: {}", gpu.summary());
            match run_gpu_viewer(config, &slot) {
                Ok(()) => return Ok(()),
                Err(GalleryError::Capability(e)) => e.to_string(),
                Err(e) => return Err(e),
            }
        }
        Err(e) => e.to_string(),
    };

    log::warn!("GPU pipeline unavailable: {}", reason);
    println!("GPU blur unavailable ({reason}); showing the CPU preview instead.");
    run_cpu_preview(config, Some(&format!("GPU unavailable: {reason}")))
}

fn run_cpu_preview(config: &GalleryConfig, notice: Option<&str>) -> Result<(), GalleryError> {
    CpuPreview::new(config, notice)?.run()
}

fn run_snapshot(config: &GalleryConfig, path: &str, use_gpu: bool) -> Result<(), GalleryError> {
    let params = config.validate()?;
    let (width, height) = config.surface_size;
    let (u, v) = config.snapshot_pointer;
    let pointer = PointerParams::new(
        (u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
        config.pointer.max_radius,
        config.pointer.decay_factor,
    );
    let scene = Scene::default();

    let frame = if use_gpu {
        let slot = DeviceSlot::new();
        let gpu = acquire_device(&slot)?;
        let renderer = BlurRenderer::new(&gpu, (width, height), params, &scene, FramePlan::standard())?;
        renderer.render_offscreen(&gpu, &pointer)?
    } else {
        let mut pipeline = CpuBlurPipeline::new(width, height, params, &scene);
        pipeline.render(&pointer).clone()
    };

    save_ppm(&frame, path)?;
    println!(
        "Saved {}x{} snapshot ({} path) to {}",
        width,
        height,
        if use_gpu { "GPU" } else { "CPU" },
        path
    );
    Ok(())
}

fn run_benchmark(config: &GalleryConfig) -> Result<(), GalleryError> {
    use std::time::Instant;

    let params = config.validate()?;
    let scene = Scene::default();
    let sizes = [(256, 256), (800, 600), (1920, 1080)];
    let iterations = 10;

    println!("=== Tiled Blur Benchmark (CPU) ===");
    println!("Filter dim {}, block dim {}\n", params.filter_dim, params.block_dim);

    for (width, height) in sizes {
        println!("Frame size: {}x{}", width, height);
        println!("-----------------------");

        let mut pipeline = CpuBlurPipeline::new(width, height, params, &scene);
        let input = scene.rasterize(width, height);

        // Pointer-modulated frame, as in the viewers
        let pointer = PointerParams::new((0.5, 0.5), config.pointer.max_radius, config.pointer.decay_factor);
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = pipeline.render(&pointer);
        }
        let avg_tiled_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

        // Full-width filter everywhere, comparable to the 2-D reference
        let full = PointerParams::full_strength();
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = pipeline.render(&full);
        }
        let avg_full_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

        let start = Instant::now();
        for _ in 0..iterations {
            let _ = box_blur_2d(&input, params.filter_dim);
        }
        let avg_naive_ms = start.elapsed().as_secs_f64() * 1000.0 / iterations as f64;

        let max_diff = pipeline.render(&full).max_diff(&box_blur_2d(&input, params.filter_dim));

        println!("  Tiled (pointer):     {:.3} ms/iter", avg_tiled_ms);
        println!("  Tiled (full width):  {:.3} ms/iter", avg_full_ms);
        println!("  Naive 2-D box blur:  {:.3} ms/iter", avg_naive_ms);
        println!("  Speedup: {:.2}x", avg_naive_ms / avg_full_ms);
        println!("  Max difference vs naive: {:.4}", max_diff);
        println!();
    }

    Ok(())
}

fn run_probe() -> Result<(), GalleryError> {
    match gpu::probe() {
        Ok(summary) => println!("GPU blur supported on {}", summary),
        Err(e) => println!("GPU blur unavailable: {}", e),
    }
    Ok(())
}
