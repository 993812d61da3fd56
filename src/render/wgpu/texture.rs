use std::iter;

use log::warn;
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource,
    Device, Extent3d, FilterMode, ImageCopyTexture, ImageDataLayout, Origin3d, Queue,
    SamplerDescriptor, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureViewDescriptor,
};

use crate::asset::texture::{
    ImageFormat, ImageRecord, MagFilter, MinFilter, MipmapFilter, SamplerRecord, WrapMode,
};

/// Full mip chain length down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Pad tightly packed RGB8 texels to RGBA8 with an opaque alpha.
pub fn pad_rgb_to_rgba(data: &[u8]) -> Vec<u8> {
    data.chunks_exact(3)
        .flat_map(|chunk| chunk.iter().cloned().chain(iter::once(u8::MAX)))
        .collect()
}

/// Halve an RGBA8 image with a box filter, clamping at odd edges. Returns
/// the new data and size.
pub fn downsample_rgba(data: &[u8], width: u32, height: u32) -> (Vec<u8>, u32, u32) {
    let next_width = (width / 2).max(1);
    let next_height = (height / 2).max(1);
    let texel = |x: u32, y: u32| {
        let offset = ((y.min(height - 1) * width + x.min(width - 1)) * 4) as usize;
        &data[offset..offset + 4]
    };
    let mut out = Vec::with_capacity((next_width * next_height * 4) as usize);
    for y in 0..next_height {
        for x in 0..next_width {
            let corners = [
                texel(x * 2, y * 2),
                texel(x * 2 + 1, y * 2),
                texel(x * 2, y * 2 + 1),
                texel(x * 2 + 1, y * 2 + 1),
            ];
            for channel in 0..4 {
                let sum: u32 = corners.iter().map(|texel| texel[channel] as u32).sum();
                out.push((sum / 4) as u8);
            }
        }
    }
    (out, next_width, next_height)
}

fn address_mode(mode: WrapMode) -> AddressMode {
    match mode {
        WrapMode::ClampToEdge => AddressMode::ClampToEdge,
        WrapMode::MirroredRepeat => AddressMode::MirrorRepeat,
        WrapMode::Repeat => AddressMode::Repeat,
    }
}

/// Upload an image with a CPU-generated mip chain and wrap it in a bind
/// group with its sampler.
///
/// The cache only hands supported formats to this path; anything else is
/// replaced by a single white texel so a bad decoder cannot crash a draw.
pub fn upload(
    device: &Device,
    queue: &Queue,
    layout: &BindGroupLayout,
    image: &ImageRecord,
    sampler: &SamplerRecord,
) -> BindGroup {
    let (rgba, (width, height)) = match image.format {
        ImageFormat::Rgb8 => (pad_rgb_to_rgba(&image.data), image.size),
        ImageFormat::Rgba8 => (image.data.clone(), image.size),
        format => {
            warn!("Unsupported image format {:?} reached upload", format);
            (vec![u8::MAX; 4], (1, 1))
        }
    };

    let texture = device.create_texture(&TextureDescriptor {
        label: Some("Model texture"),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: mip_level_count(width, height),
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let mut level = 0;
    let mut data = rgba;
    let mut level_size = (width, height);
    loop {
        queue.write_texture(
            ImageCopyTexture {
                texture: &texture,
                mip_level: level,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            &data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * level_size.0),
                rows_per_image: Some(level_size.1),
            },
            Extent3d {
                width: level_size.0,
                height: level_size.1,
                depth_or_array_layers: 1,
            },
        );
        if level_size == (1, 1) {
            break;
        }
        let (next, next_width, next_height) = downsample_rgba(&data, level_size.0, level_size.1);
        data = next;
        level_size = (next_width, next_height);
        level += 1;
    }

    let texture_view = texture.create_view(&TextureViewDescriptor::default());
    let gpu_sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("Model sampler"),
        address_mode_u: address_mode(sampler.wrap_x),
        address_mode_v: address_mode(sampler.wrap_y),
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: match sampler.mag_filter {
            MagFilter::Nearest => FilterMode::Nearest,
            MagFilter::Linear => FilterMode::Linear,
        },
        min_filter: match sampler.min_filter {
            MinFilter::Nearest => FilterMode::Nearest,
            MinFilter::Linear => FilterMode::Linear,
        },
        mipmap_filter: match sampler.mipmap_filter {
            MipmapFilter::Nearest => FilterMode::Nearest,
            MipmapFilter::Linear => FilterMode::Linear,
        },
        ..Default::default()
    });

    device.create_bind_group(&BindGroupDescriptor {
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(&texture_view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(&gpu_sampler),
            },
        ],
        label: Some("Model texture bind group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_covers_the_longest_side() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(300, 200), 9);
        assert_eq!(mip_level_count(1024, 1), 11);
    }

    #[test]
    fn rgb_padding_appends_opaque_alpha() {
        let padded = pad_rgb_to_rgba(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(padded, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn downsample_averages_quads() {
        #[rustfmt::skip]
        let data = vec![
            0, 0, 0, 255,   4, 0, 0, 255,
            8, 0, 0, 255,   12, 0, 0, 255,
        ];
        let (out, width, height) = downsample_rgba(&data, 2, 2);
        assert_eq!((width, height), (1, 1));
        assert_eq!(out, vec![6, 0, 0, 255]);
    }

    #[test]
    fn downsample_clamps_odd_edges() {
        let row = |value: u8| [value, 0, 0, 255];
        let data: Vec<u8> = [row(10), row(20), row(30)].concat();
        let (out, width, height) = downsample_rgba(&data, 3, 1);
        assert_eq!((width, height), (1, 1));
        assert_eq!(out[0], 15);
    }
}
