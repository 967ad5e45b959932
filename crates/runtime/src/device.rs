//! Accelerator binding for the model host.
//!
//! `Auto` tries Metal (Apple Silicon), then CUDA (NVIDIA), then falls back
//! to CPU. When the deployment requires an accelerator, falling back to CPU
//! is a cold-start failure.

use candle_core::Device;
use tracing::{info, warn};

use tts_core::{DeviceConfig, DevicePreference, TtsError, TtsResult};

/// Bind a compute device according to `config`.
pub fn bind_device(config: &DeviceConfig) -> TtsResult<Device> {
    let device = match config.preference {
        DevicePreference::Cpu => {
            info!("Using CPU device (forced)");
            Device::Cpu
        }
        DevicePreference::Metal => select_metal(config.gpu_index)?,
        DevicePreference::Cuda => select_cuda(config.gpu_index)?,
        DevicePreference::Auto => select_auto(config.gpu_index),
    };

    if config.require_accelerator && !is_accelerator(&device) {
        return Err(TtsError::device(
            "an accelerator is required but only the CPU is available",
        ));
    }

    Ok(device)
}

#[allow(unused_variables)]
fn select_auto(gpu_index: usize) -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(gpu_index) {
            Ok(device) => {
                info!(gpu_index, "Auto-selected Metal GPU (Apple Silicon)");
                return device;
            }
            Err(e) => warn!("Metal GPU not available: {e}"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(gpu_index) {
            Ok(device) => {
                info!(gpu_index, "Auto-selected CUDA GPU (NVIDIA)");
                return device;
            }
            Err(e) => warn!("CUDA GPU not available: {e}"),
        }
    }

    warn!("No GPU available, falling back to CPU");
    Device::Cpu
}

#[allow(unused_variables)]
fn select_metal(gpu_index: usize) -> TtsResult<Device> {
    #[cfg(feature = "metal")]
    {
        let device = Device::new_metal(gpu_index).map_err(|e| {
            TtsError::device(format!("Metal GPU requested but not available: {e}"))
        })?;
        info!(gpu_index, "Using Metal GPU (Apple Silicon)");
        Ok(device)
    }

    #[cfg(not(feature = "metal"))]
    {
        Err(TtsError::device(
            "Metal GPU requested but the 'metal' feature is not enabled",
        ))
    }
}

#[allow(unused_variables)]
fn select_cuda(gpu_index: usize) -> TtsResult<Device> {
    #[cfg(feature = "cuda")]
    {
        let device = Device::new_cuda(gpu_index).map_err(|e| {
            TtsError::device(format!("CUDA GPU requested but not available: {e}"))
        })?;
        info!(gpu_index, "Using CUDA GPU (NVIDIA)");
        Ok(device)
    }

    #[cfg(not(feature = "cuda"))]
    {
        Err(TtsError::device(
            "CUDA GPU requested but the 'cuda' feature is not enabled",
        ))
    }
}

/// Whether `device` is a GPU.
pub fn is_accelerator(device: &Device) -> bool {
    !matches!(device, Device::Cpu)
}

/// Get device name for logging/display.
pub fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
