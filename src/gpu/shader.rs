//! WGSL templating
//!
//! Shader sources are minijinja templates whose `{{NAME}}` variables are
//! filled in when a pipeline is built. Shared stages (the fullscreen vertex
//! shader) are prepended as a prelude instead of being copied into every file.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::OnceLock;

use minijinja::value::Value;
use minijinja::{Environment, UndefinedBehavior};

use crate::error::ShaderError;

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

// `{{ NAME }}` variables only; WGSL never contains `{%` or `{#`
fn shader_env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env
    })
}

/// Fullscreen-triangle vertex stage producing `uv` with a top-left origin
pub const FULLSCREEN_PRELUDE: &str = include_str!("shaders/fullscreen.wgsl");

/// A WGSL source with named constants to inject
#[derive(Debug, Clone)]
pub struct ShaderTemplate<'a> {
    label: &'a str,
    prelude: Option<&'a str>,
    source: &'a str,
    constants: Vec<(&'a str, String)>,
}

impl<'a> ShaderTemplate<'a> {
    pub fn new(label: &'a str, source: &'a str) -> Self {
        Self {
            label,
            prelude: None,
            source,
            constants: Vec::new(),
        }
    }

    /// Prepend a shared stage, e.g. `FULLSCREEN_PRELUDE`
    pub fn with_prelude(mut self, prelude: &'a str) -> Self {
        self.prelude = Some(prelude);
        self
    }

    pub fn define(mut self, name: &'a str, value: impl Display) -> Self {
        self.constants.push((name, value.to_string()));
        self
    }

    /// Produce the final WGSL, failing on any placeholder left undefined
    pub fn render(&self) -> Result<String, ShaderError> {
        let env = shader_env();
        let template = env
            .template_from_str(self.source)
            .map_err(|e| self.template_error(e))?;

        let context: BTreeMap<&str, Value> = self
            .constants
            .iter()
            .map(|(name, value)| (*name, Value::from(value.as_str())))
            .collect();

        let mut missing: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|name| !context.contains_key(name.as_str()))
            .collect();
        missing.sort();
        if let Some(name) = missing.into_iter().next() {
            return Err(ShaderError::UnresolvedConstant {
                shader: self.label.to_string(),
                name,
            });
        }

        let body = template.render(&context).map_err(|e| self.template_error(e))?;
        Ok(match self.prelude {
            Some(prelude) => format!("{prelude}\n{body}"),
            None => body,
        })
    }

    fn template_error(&self, error: minijinja::Error) -> ShaderError {
        ShaderError::Template {
            shader: self.label.to_string(),
            detail: error.to_string(),
        }
    }

    /// Render and compile into a shader module
    pub fn build(&self, device: &wgpu::Device) -> Result<wgpu::ShaderModule, ShaderError> {
        let source = self.render()?;
        log::debug!("Compiling shader '{}' ({} bytes)", self.label, source.len());
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        }))
    }
}

/// Format an `f32` as a WGSL float literal (always with a decimal point)
pub fn wgsl_f32(value: f32) -> String {
    format!("{value:?}")
}

/// `vec3<f32>(r, g, b)` literal
pub fn wgsl_vec3(r: f32, g: f32, b: f32) -> String {
    format!("vec3<f32>({}, {}, {})", wgsl_f32(r), wgsl_f32(g), wgsl_f32(b))
}
