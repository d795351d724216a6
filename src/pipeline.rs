// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Boundary with the capture pipeline.
//!
//! The camera handle never touches sensor or ISP control directly. It drives
//! a [`Pipeline`] obtained from a [`Backend`], which owns the hardware
//! resources and a finite pool of output buffers. Dropping a pipeline tears
//! it down and releases everything it allocated.

use crate::{error::Status, format::PixelFormat};
use std::{ffi::c_void, ptr::NonNull, time::Duration};

/// Upper bound on the planes a pipeline buffer can describe.
pub const MAX_PLANES: usize = 3;

/// Factory for pipeline instances.
pub trait Backend {
    type Pipeline: Pipeline;

    /// Allocates a pipeline for a sensor mode of `width`x`height` at `fps`.
    /// Returns `None` if the hardware could not be initialised, in which case
    /// nothing remains allocated.
    fn init(&self, width: u32, height: u32, fps: u32) -> Option<Self::Pipeline>;
}

/// An initialised capture pipeline.
///
/// Configuration calls report a [`Status`] and must leave the pipeline
/// unchanged on failure. Buffer exchange goes through `&self` so several
/// buffers can be checked out at once.
pub trait Pipeline {
    fn set_output_size(&mut self, width: u32, height: u32) -> Status;

    fn set_frame_size(&mut self, width: u32, height: u32) -> Status;

    fn set_fps(&mut self, fps: u32) -> Status;

    /// Region of interest in fractional sensor coordinates.
    fn set_crop(&mut self, x: f64, y: f64, width: f64, height: f64) -> Status;

    fn set_transform(&mut self, rotation: i32, hflip: bool, vflip: bool) -> Status;

    fn set_format(&mut self, format: PixelFormat) -> Status;

    /// Starts streaming into the buffer pool.
    fn enable(&mut self);

    /// Stops streaming. Every buffer must have been enqueued beforehand.
    fn disable(&mut self);

    /// Waits up to `timeout` for the next filled buffer, in capture order.
    /// A zero timeout polls without blocking.
    fn dequeue(&self, timeout: Duration) -> Option<RawBuffer>;

    /// Hands `buffer` back to the pool.
    ///
    /// # Safety
    ///
    /// `buffer` must have been dequeued from this pipeline during the
    /// current stream and not enqueued since.
    unsafe fn enqueue(&self, buffer: RawBuffer);
}

/// One plane of a [`RawBuffer`] as reported by the pipeline.
#[derive(Copy, Clone, Debug)]
pub struct RawPlane {
    pub data: *const u8,
    /// Readable bytes at `data`, or 0 if the pipeline does not report it.
    pub length: usize,
    /// Bytes between the start of consecutive rows.
    pub pitch: usize,
}

/// A filled buffer borrowed from the pipeline's pool.
///
/// The pool keeps ownership of the memory: once the buffer is enqueued the
/// plane pointers are dangling. `RawBuffer` is deliberately neither `Clone`
/// nor `Copy` so a pool slot can only be returned once.
#[derive(Debug)]
pub struct RawBuffer {
    handle: NonNull<c_void>,
    planes: [RawPlane; MAX_PLANES],
    num_planes: usize,
    width: u32,
    height: u32,
}

impl RawBuffer {
    /// Describes a dequeued buffer.
    ///
    /// Planes beyond [`MAX_PLANES`] are ignored.
    ///
    /// # Safety
    ///
    /// Every plane must point at `length` readable bytes (or `pitch` times
    /// the plane's row count when `length` is 0) that stay valid and
    /// unmodified until the buffer is passed back to
    /// [`Pipeline::enqueue`] on the pipeline that produced it. `handle`
    /// must identify the pool slot to that pipeline.
    pub unsafe fn new(handle: NonNull<c_void>, width: u32, height: u32, planes: &[RawPlane]) -> Self {
        let empty = RawPlane {
            data: std::ptr::null(),
            length: 0,
            pitch: 0,
        };
        let mut table = [empty; MAX_PLANES];
        let num_planes = planes.len().min(MAX_PLANES);
        table[..num_planes].copy_from_slice(&planes[..num_planes]);
        Self {
            handle,
            planes: table,
            num_planes,
            width,
            height,
        }
    }

    /// Pool slot identifier, meaningful only to the producing pipeline.
    pub fn handle(&self) -> NonNull<c_void> {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn planes(&self) -> &[RawPlane] {
        &self.planes[..self.num_planes]
    }
}
