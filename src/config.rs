//! Runtime configuration and command-line parsing

use crate::blur::BlurParams;
use crate::error::ConfigError;
use crate::pointer::DEFAULT_HISTORY_LEN;

/// Pointer influence on the blur
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSettings {
    /// Radius of influence in UV units
    pub max_radius: f32,
    /// Exponential falloff steepness
    pub decay_factor: f32,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            max_radius: 0.2,
            decay_factor: 2.0,
        }
    }
}

/// What the binary should do
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Help,
    Interactive,
    CpuPreview,
    Snapshot { path: String, gpu: bool },
    Benchmark,
    Probe,
}

/// Configuration shared by all modes
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    /// Render surface and blur buffer size in pixels
    pub surface_size: (u32, u32),
    /// Base blur width; even values are rounded up to odd
    pub filter_size: u32,
    pub pointer: PointerSettings,
    /// Fixed pointer position for snapshots, UV space
    pub snapshot_pointer: (f32, f32),
    /// Samples kept for pointer velocity
    pub history_len: usize,
    /// Window title
    pub title: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            filter_size: 15,
            pointer: PointerSettings::default(),
            snapshot_pointer: (0.5, 0.5),
            history_len: DEFAULT_HISTORY_LEN,
            title: "Pointer Blur (ESC to exit)".to_string(),
        }
    }
}

/// Largest surface edge, wgpu's default 2-D texture limit.
///
/// Keeps padded readback sizes well inside `u32`.
pub const MAX_SURFACE_DIM: u32 = 8192;

impl GalleryConfig {
    /// Check ranges and derive the kernel parameters
    pub fn validate(&self) -> Result<BlurParams, ConfigError> {
        let (width, height) = self.surface_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidSurfaceSize(width, height));
        }
        if width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
            return Err(ConfigError::SurfaceTooLarge {
                width,
                height,
                max: MAX_SURFACE_DIM,
            });
        }
        let radius = self.pointer.max_radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(radius));
        }
        let decay = self.pointer.decay_factor;
        if !decay.is_finite() || decay < 0.0 {
            return Err(ConfigError::InvalidDecay(decay));
        }
        BlurParams::from_filter_size(self.filter_size)
    }

    /// Parse arguments (without the program name) into a mode and config
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<(Mode, Self), ConfigError> {
        let mut config = Self::default();
        let mut mode = Mode::Help;
        let mut snapshot_path = None;
        let mut gpu = false;

        let mut iter = args.iter().map(<S as AsRef<str>>::as_ref);
        while let Some(arg) = iter.next() {
            match arg {
                "--interactive" => mode = Mode::Interactive,
                "--cpu" => mode = Mode::CpuPreview,
                "--benchmark" => mode = Mode::Benchmark,
                "--probe" => mode = Mode::Probe,
                "--gpu" => gpu = true,
                "--help" | "-h" => mode = Mode::Help,
                "--snapshot" => snapshot_path = Some(value(&mut iter, arg)?.to_string()),
                "--radius" => config.pointer.max_radius = parse(&mut iter, arg)?,
                "--decay" => config.pointer.decay_factor = parse(&mut iter, arg)?,
                "--filter-size" => config.filter_size = parse(&mut iter, arg)?,
                "--size" => {
                    let raw = value(&mut iter, arg)?;
                    config.surface_size = parse_pair(raw, 'x').ok_or_else(|| invalid(arg, raw))?;
                }
                "--pointer" => {
                    let raw = value(&mut iter, arg)?;
                    config.snapshot_pointer = parse_pair(raw, ',').ok_or_else(|| invalid(arg, raw))?;
                }
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }

        if let Some(path) = snapshot_path {
            mode = Mode::Snapshot { path, gpu };
        }

        config.validate()?;
        Ok((mode, config))
    }
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a str>, flag: &str) -> Result<&'a str, ConfigError> {
    iter.next().ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse<'a, T: std::str::FromStr>(iter: &mut impl Iterator<Item = &'a str>, flag: &str) -> Result<T, ConfigError> {
    let raw = value(iter, flag)?;
    raw.parse().map_err(|_| invalid(flag, raw))
}

fn parse_pair<T: std::str::FromStr>(raw: &str, separator: char) -> Option<(T, T)> {
    let (a, b) = raw.split_once(separator)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn invalid(flag: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: raw.to_string(),
    }
}
