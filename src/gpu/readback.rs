//! Copy a frame texture back into a `FrameBuffer`

use super::device::GpuDevice;
use crate::error::GalleryError;
use crate::frame::FrameBuffer;

/// (unpadded, padded) bytes per row for an RGBA8 texture of `width`
pub fn padded_bytes_per_row(width: u32) -> (u32, u32) {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unpadded, unpadded.div_ceil(align) * align)
}

fn strip_row_padding(data: &[u8], height: u32, unpadded: u32, padded: u32) -> Vec<u8> {
    if unpadded == padded {
        return data[..(unpadded * height) as usize].to_vec();
    }

    let mut output = Vec::with_capacity((unpadded * height) as usize);
    for row in data.chunks(padded as usize).take(height as usize) {
        output.extend_from_slice(&row[..unpadded as usize]);
    }
    output
}

/// Read an RGBA8 texture of `size` back to the CPU, blocking until done
pub fn read_texture(
    gpu: &GpuDevice,
    texture: &wgpu::Texture,
    size: (u32, u32),
) -> Result<FrameBuffer, GalleryError> {
    let (width, height) = size;
    let (unpadded, padded) = padded_bytes_per_row(width);

    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: padded as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            log::warn!("Readback receiver dropped before map completed");
        }
    });
    let _ = gpu.device.poll(wgpu::Maintain::Wait);

    receiver
        .recv()
        .map_err(|e| GalleryError::Readback(e.to_string()))?
        .map_err(|e| GalleryError::Readback(e.to_string()))?;

    let pixels = {
        let mapped = slice.get_mapped_range();
        strip_row_padding(&mapped, height, unpadded, padded)
    };
    buffer.unmap();

    FrameBuffer::from_rgba8(width, height, pixels)
        .ok_or_else(|| GalleryError::Readback(format!("short readback for {width}x{height}")))
}
