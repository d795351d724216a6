// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Typed, non-owning views over pipeline buffers.
//!
//! A [`Frame`] wraps exactly one [`RawBuffer`] checked out of the pipeline's
//! pool. Pixel data is never copied: each [`Plane`] is a slice straight over
//! the buffer memory. Slices borrow the frame rather than the camera, so
//! they cannot be kept once the frame is released. Copy the pixels (see
//! [`crate::snapshot::Snapshot`]) to keep them longer.

use crate::{
    camera::Camera,
    error::{Error, Result},
    format::PixelFormat,
    pipeline::{Pipeline, RawBuffer, RawPlane, MAX_PLANES},
};
use core::fmt;
use std::{mem::ManuallyDrop, ptr, slice::from_raw_parts};
use tracing::trace;

/// One plane of a frame, borrowed from the pipeline buffer.
#[derive(Copy, Clone, Debug)]
pub struct Plane<'f> {
    pub data: &'f [u8],
    /// Bytes between the start of consecutive rows.
    pub pitch: usize,
}

impl<'f> Plane<'f> {
    /// Row `y`, including any padding up to the pitch.
    pub fn row(&self, y: usize) -> Option<&'f [u8]> {
        let start = y.checked_mul(self.pitch)?;
        if start >= self.data.len() {
            return None;
        }
        let end = start.saturating_add(self.pitch).min(self.data.len());
        Some(&self.data[start..end])
    }

    /// The `bytes_per_pixel` bytes of pixel `x` in row `y`.
    ///
    /// Only the pitch bounds `x`, so pixels in the row padding are returned
    /// too. Use [`Frame::pixel`] for a bounds-checked lookup.
    pub fn pixel(&self, x: usize, y: usize, bytes_per_pixel: usize) -> Option<&'f [u8]> {
        let row = self.row(y)?;
        let start = x.checked_mul(bytes_per_pixel)?;
        row.get(start..start.checked_add(bytes_per_pixel)?)
    }
}

/// Samples of a single pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pixel<'f> {
    Ycbcr { y: u8, cb: u8, cr: u8 },
    Gray(u8),
    /// The 4:2:2 macropixel covering the pixel and its horizontal
    /// neighbour, in the component order of the frame format.
    PackedYuv(&'f [u8]),
    /// One pixel in the component order of the frame format.
    Rgb(&'f [u8]),
}

/// Plane arrangement of a frame, determined by its format.
#[derive(Copy, Clone, Debug)]
pub enum Layout<'f> {
    /// Full resolution luma and two chroma planes at half resolution on
    /// each axis.
    Ycbcr420 {
        y: Plane<'f>,
        cb: Plane<'f>,
        cr: Plane<'f>,
    },
    /// Single 8-bit channel.
    Gray(Plane<'f>),
    /// Interleaved 4:2:2 YUV. The component order is given by `format`.
    PackedYuv { plane: Plane<'f>, format: PixelFormat },
    /// Interleaved RGB family, 3 or 4 bytes per pixel.
    PackedRgb {
        plane: Plane<'f>,
        format: PixelFormat,
        bytes_per_pixel: usize,
    },
}

/// A captured image checked out of the pipeline's buffer pool.
///
/// The pool slot is returned when the frame is dropped or passed to
/// [`Frame::release`]. Since `release` consumes the frame, a slot cannot be
/// returned twice.
pub struct Frame<'a, P: Pipeline> {
    camera: &'a Camera<P>,
    raw: ManuallyDrop<RawBuffer>,
    format: PixelFormat,
    planes: [RawPlane; MAX_PLANES],
}

impl<'a, P: Pipeline> Frame<'a, P> {
    /// Wraps a freshly dequeued buffer according to `format`.
    ///
    /// On failure the buffer goes straight back to the pool.
    pub(crate) fn from_raw(
        camera: &'a Camera<P>,
        format: Option<PixelFormat>,
        raw: RawBuffer,
    ) -> Result<Self> {
        match plane_views(format, &raw) {
            Ok((format, planes)) => Ok(Self {
                camera,
                raw: ManuallyDrop::new(raw),
                format,
                planes,
            }),
            Err(err) => {
                // SAFETY: `raw` was just dequeued from this camera's pipeline.
                unsafe { camera.pipeline().enqueue(raw) };
                Err(err)
            }
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.raw.width()
    }

    pub fn height(&self) -> u32 {
        self.raw.height()
    }

    pub fn plane_count(&self) -> usize {
        self.format.plane_count()
    }

    pub fn plane(&self, index: usize) -> Option<Plane<'_>> {
        if index >= self.plane_count() {
            return None;
        }
        let plane = &self.planes[index];
        // SAFETY: plane_views checked the pointer, and the pool keeps the
        // memory alive until `raw` is enqueued, which needs `self` by value.
        let data = unsafe { from_raw_parts(plane.data, plane.length) };
        Some(Plane {
            data,
            pitch: plane.pitch,
        })
    }

    pub fn planes(&self) -> impl Iterator<Item = Plane<'_>> + '_ {
        (0..self.plane_count()).filter_map(|index| self.plane(index))
    }

    pub fn layout(&self) -> Layout<'_> {
        let plane = |index| {
            self.plane(index).unwrap_or(Plane {
                data: &[],
                pitch: 0,
            })
        };
        match self.format {
            PixelFormat::I420 => Layout::Ycbcr420 {
                y: plane(0),
                cb: plane(1),
                cr: plane(2),
            },
            PixelFormat::YV12 => Layout::Gray(plane(0)),
            PixelFormat::YUYV | PixelFormat::YVYU | PixelFormat::UYVY | PixelFormat::VYUY => {
                Layout::PackedYuv {
                    plane: plane(0),
                    format: self.format,
                }
            }
            PixelFormat::ARGB
            | PixelFormat::RGBA
            | PixelFormat::ABGR
            | PixelFormat::BGRA
            | PixelFormat::RGB32
            | PixelFormat::BGR32
            | PixelFormat::BGR24
            | PixelFormat::RGB24 => Layout::PackedRgb {
                plane: plane(0),
                format: self.format,
                bytes_per_pixel: self.format.bytes_per_pixel(),
            },
        }
    }

    /// Samples of pixel (`x`, `y`), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel<'_>> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        match self.layout() {
            Layout::Ycbcr420 { y: luma, cb, cr } => Some(Pixel::Ycbcr {
                y: luma.pixel(x, y, 1)?[0],
                cb: cb.pixel(x / 2, y / 2, 1)?[0],
                cr: cr.pixel(x / 2, y / 2, 1)?[0],
            }),
            Layout::Gray(plane) => Some(Pixel::Gray(plane.pixel(x, y, 1)?[0])),
            Layout::PackedYuv { plane, .. } => plane.pixel(x / 2, y, 4).map(Pixel::PackedYuv),
            Layout::PackedRgb {
                plane,
                bytes_per_pixel,
                ..
            } => plane.pixel(x, y, bytes_per_pixel).map(Pixel::Rgb),
        }
    }

    /// Returns the buffer to the pool. Same as dropping the frame.
    pub fn release(self) {
        drop(self);
    }

    /// Gives up the frame without returning its buffer to the pool.
    ///
    /// The slot stays checked out until the buffer is handed to
    /// [`Camera::release_raw`]. Forgetting to do so shrinks the pool for
    /// good.
    pub fn into_raw(self) -> RawBuffer {
        let mut frame = ManuallyDrop::new(self);
        // SAFETY: `frame` is never dropped, so `raw` is taken exactly once.
        unsafe { ManuallyDrop::take(&mut frame.raw) }
    }
}

impl<P: Pipeline> Drop for Frame<'_, P> {
    fn drop(&mut self) {
        // SAFETY: `raw` is only taken here or in into_raw, which skips drop.
        let raw = unsafe { ManuallyDrop::take(&mut self.raw) };
        trace!("releasing {} buffer", self.format);
        // SAFETY: the frame holds a borrow of the camera, so the stream that
        // produced `raw` is still running.
        unsafe { self.camera.pipeline().enqueue(raw) };
    }
}

impl<P: Pipeline> fmt::Debug for Frame<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Frame")
            .field("format", &self.format)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("planes", &&self.planes[..self.plane_count()])
            .finish()
    }
}

impl<P: Pipeline> fmt::Display for Frame<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width(), self.height(), self.format)
    }
}

/// Number of rows in plane `index` of a `height` pixel tall image.
pub fn plane_rows(format: PixelFormat, index: usize, height: usize) -> usize {
    match format {
        PixelFormat::I420 if index > 0 => height.div_ceil(2),
        _ => height,
    }
}

/// Resolves the plane views for `raw` under `format`.
///
/// A plane spans the length the pipeline reported, or `pitch` times the
/// plane's row count when no length was reported.
fn plane_views(
    format: Option<PixelFormat>,
    raw: &RawBuffer,
) -> Result<(PixelFormat, [RawPlane; MAX_PLANES])> {
    let format = format.ok_or_else(|| Error::UnsupportedFormat("no format set".to_string()))?;
    let needed = format.plane_count();
    let reported = raw.planes();
    if reported.len() < needed {
        return Err(Error::UnsupportedFormat(format!(
            "{} needs {} planes but the buffer has {}",
            format,
            needed,
            reported.len()
        )));
    }

    let mut views = [RawPlane {
        data: ptr::null(),
        length: 0,
        pitch: 0,
    }; MAX_PLANES];
    let height = raw.height() as usize;
    for (index, (view, plane)) in views.iter_mut().zip(reported).take(needed).enumerate() {
        if plane.data.is_null() {
            return Err(Error::UnsupportedFormat(format!(
                "{} plane {} has no data",
                format, index
            )));
        }
        let length = match plane.length {
            0 => plane.pitch * plane_rows(format, index, height),
            length => length,
        };
        *view = RawPlane {
            data: plane.data,
            length,
            pitch: plane.pitch,
        };
    }

    Ok((format, views))
}
