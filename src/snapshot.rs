// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    format::{FormatClass, PixelFormat},
    frame::{plane_rows, Frame},
    pipeline::Pipeline,
};
use std::{error::Error, io};
use turbojpeg::{OwnedBuf, Subsamp};

/// Owned, tightly packed copy of a [`Frame`].
///
/// Unlike the frame it was taken from, a snapshot does not hold a pool slot
/// and can be kept or sent to another thread.
#[derive(Clone, Debug)]
pub struct Snapshot {
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: Vec<Vec<u8>>,
}

/// Bytes of pixel data per row of plane `index`, without padding.
fn row_bytes(format: PixelFormat, index: usize, width: usize) -> usize {
    match format {
        PixelFormat::I420 if index > 0 => width.div_ceil(2),
        _ => width * format.bytes_per_pixel(),
    }
}

impl Snapshot {
    /// Copies the visible pixels of every plane, dropping row padding.
    pub fn from_frame<P: Pipeline>(frame: &Frame<'_, P>) -> Self {
        let format = frame.format();
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        let planes = frame
            .planes()
            .enumerate()
            .map(|(index, plane)| {
                let row_len = row_bytes(format, index, width);
                let rows = plane_rows(format, index, height);
                let mut pixels = Vec::with_capacity(row_len * rows);
                for y in 0..rows {
                    let row = plane.row(y).unwrap_or(&[]);
                    let visible = &row[..row.len().min(row_len)];
                    pixels.extend_from_slice(visible);
                    pixels.resize(pixels.len() + row_len - visible.len(), 0);
                }
                pixels
            })
            .collect();

        Self {
            format,
            width: frame.width(),
            height: frame.height(),
            planes,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, index: usize) -> Option<&[u8]> {
        self.planes.get(index).map(Vec::as_slice)
    }

    /// Row length in bytes of plane `index`.
    pub fn pitch(&self, index: usize) -> usize {
        row_bytes(self.format, index, self.width as usize)
    }
}

fn jpeg_format(format: PixelFormat) -> Option<turbojpeg::PixelFormat> {
    match format {
        PixelFormat::YV12 => Some(turbojpeg::PixelFormat::GRAY),
        PixelFormat::ARGB => Some(turbojpeg::PixelFormat::ARGB),
        PixelFormat::RGBA => Some(turbojpeg::PixelFormat::RGBA),
        PixelFormat::ABGR => Some(turbojpeg::PixelFormat::ABGR),
        PixelFormat::BGRA => Some(turbojpeg::PixelFormat::BGRA),
        PixelFormat::RGB32 => Some(turbojpeg::PixelFormat::RGBX),
        PixelFormat::BGR32 => Some(turbojpeg::PixelFormat::BGRX),
        PixelFormat::BGR24 => Some(turbojpeg::PixelFormat::BGR),
        PixelFormat::RGB24 => Some(turbojpeg::PixelFormat::RGB),
        PixelFormat::I420
        | PixelFormat::YUYV
        | PixelFormat::YVYU
        | PixelFormat::UYVY
        | PixelFormat::VYUY => None,
    }
}

/// Compresses a snapshot to JPEG with turbojpeg.
///
/// I420, the gray-shaped YV12 plane and the RGB family are supported.
///
/// # Errors
///
/// Returns an error for packed YUV formats or if compression fails.
pub fn encode_jpeg(snapshot: &Snapshot, quality: i32) -> Result<OwnedBuf, Box<dyn Error>> {
    let width = snapshot.width as usize;
    let height = snapshot.height as usize;

    if snapshot.format.class() == FormatClass::PlanarYuv420 {
        let pixels = snapshot.planes.concat();
        let image = turbojpeg::YuvImage {
            pixels: pixels.as_slice(),
            width,
            align: 1,
            height,
            subsamp: Subsamp::Sub2x2,
        };
        return Ok(turbojpeg::compress_yuv(image, quality)?);
    }

    let format = jpeg_format(snapshot.format).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("can't encode {} as jpeg", snapshot.format),
        )
    })?;
    let subsamp = match snapshot.format.class() {
        FormatClass::Gray => Subsamp::Gray,
        _ => Subsamp::Sub2x2,
    };
    let image = turbojpeg::Image {
        pixels: snapshot.plane(0).unwrap_or(&[]),
        width,
        pitch: snapshot.pitch(0),
        height,
        format,
    };
    Ok(turbojpeg::compress(image, quality, subsamp)?)
}
