//! GPU device ownership, capability probing and loss tracking

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CapabilityError;

/// Adapter description reported by `probe`
#[derive(Debug, Clone)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl std::fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// Instance, adapter, device and queue, acquired once and passed by reference
pub struct GpuDevice {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    lost: Arc<Mutex<Option<String>>>,
}

impl GpuDevice {
    /// Request an adapter with compute support and open a device on it
    pub fn request(instance: wgpu::Instance) -> Result<Self, CapabilityError> {
        pollster::block_on(Self::request_async(instance))
    }

    async fn request_async(instance: wgpu::Instance) -> Result<Self, CapabilityError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(CapabilityError::NoAdapter)?;

        let info = adapter.get_info();
        let downlevel = adapter.get_downlevel_capabilities();
        if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
            return Err(CapabilityError::NoComputeSupport { adapter: info.name });
        }
        log::info!("Using GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Blur Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| CapabilityError::DeviceRejected(e.to_string()))?;

        let lost = Arc::new(Mutex::new(None));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::error!("GPU device lost ({:?}): {}", reason, message);
            let mut slot = lost_flag.lock().unwrap_or_else(PoisonError::into_inner);
            *slot = Some(format!("{reason:?}: {message}"));
        });
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("Uncaptured GPU error: {}", error);
        }));

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            lost,
        })
    }

    pub fn new_instance() -> wgpu::Instance {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    }

    pub fn summary(&self) -> AdapterSummary {
        let info = self.adapter.get_info();
        AdapterSummary {
            name: info.name,
            backend: info.backend,
            device_type: info.device_type,
        }
    }
}

/// Something that can report that it became unusable
pub trait LossAware {
    fn lost_reason(&self) -> Option<String>;
}

impl LossAware for GpuDevice {
    fn lost_reason(&self) -> Option<String> {
        self.lost.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Ask whether this platform can run the compute + render pipeline
pub fn probe() -> Result<AdapterSummary, CapabilityError> {
    let gpu = GpuDevice::request(GpuDevice::new_instance())?;
    Ok(gpu.summary())
}

/// Observable state of a `DeviceSlot`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Ready,
    Lost(String),
}

enum Slot<T> {
    Empty,
    Ready(Arc<T>),
    Lost(String),
}

/// Single owner of the device handle.
///
/// `acquire` holds the lock while initializing, so concurrent callers wait
/// for and share one initialization. Loss moves the slot to `Lost`, where
/// it stays until `reset`.
pub struct DeviceSlot<T = GpuDevice> {
    state: Mutex<Slot<T>>,
}

impl<T: LossAware> DeviceSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Slot::Empty),
        }
    }

    /// Return the live device, running `init` if the slot is empty
    pub fn acquire<F>(&self, init: F) -> Result<Arc<T>, CapabilityError>
    where
        F: FnOnce() -> Result<T, CapabilityError>,
    {
        let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh(&mut slot);

        match &*slot {
            Slot::Ready(device) => return Ok(Arc::clone(device)),
            Slot::Lost(reason) => return Err(CapabilityError::DeviceLost(reason.clone())),
            Slot::Empty => {}
        }

        // Failure leaves the slot empty so a later call can retry
        let device = Arc::new(init()?);
        *slot = Slot::Ready(Arc::clone(&device));
        Ok(device)
    }

    /// The live device, if any, without initializing
    pub fn current(&self) -> Option<Arc<T>> {
        let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh(&mut slot);
        match &*slot {
            Slot::Ready(device) => Some(Arc::clone(device)),
            _ => None,
        }
    }

    /// Drop the device and mark the slot lost
    pub fn invalidate(&self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Invalidating GPU device: {}", reason);
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Slot::Lost(reason);
    }

    /// Forget any device or loss so the next `acquire` initializes again
    pub fn reset(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Slot::Empty;
    }

    pub fn state(&self) -> SlotState {
        let mut slot = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh(&mut slot);
        match &*slot {
            Slot::Empty => SlotState::Empty,
            Slot::Ready(_) => SlotState::Ready,
            Slot::Lost(reason) => SlotState::Lost(reason.clone()),
        }
    }

    // Ready -> Lost once the device reports loss
    fn refresh(slot: &mut Slot<T>) {
        if let Slot::Ready(device) = slot {
            if let Some(reason) = device.lost_reason() {
                log::error!("GPU device lost, dropping pipeline state: {}", reason);
                *slot = Slot::Lost(reason);
            }
        }
    }
}

impl<T: LossAware> Default for DeviceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
