// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # Raspberry Pi Camera Frame Library
//!
//! This library exposes the camera's continuous video stream as a sequence
//! of frames. Capture, scaling and pixel-format conversion run on the
//! VideoCore coprocessor; the host only configures the pipeline and reads
//! finished buffers in place.
//!
//! ## Features
//!
//! - **Zero-copy frames**: [`Frame`] is a typed view straight over the
//!   pipeline's buffer memory, returned to the pool when dropped.
//! - **Format-aware layouts**: planar I420, gray-shaped YV12, packed YUV and
//!   the packed RGB family, each with its own [`frame::Layout`].
//! - **Checked configuration**: size, frame rate and format changes are
//!   refused while streaming, crop windows are validated before they reach
//!   the hardware, and state is only committed once the pipeline accepts it.
//! - **Software pipeline**: [`software::SoftwareBackend`] produces test
//!   pattern frames on any host for development and testing.
//!
//! ## Example
//!
//! ```no_run
//! use picamera::{mmal::MmalBackend, Camera, NormalizedRect, PixelFormat};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MmalBackend::load(picamera::mmal::LIBRARY)?;
//! let mut camera = Camera::open(&backend, 1280, 720, 30)?;
//! camera.set_crop(NormalizedRect::new(0.25, 0.25, 0.75, 0.75))?;
//! camera.set_format(PixelFormat::I420)?;
//! camera.enable();
//!
//! for _ in 0..10 {
//!     let frame = camera.get_frame(Duration::from_secs(1))?;
//!     let luma = frame.plane(0).unwrap();
//!     println!("{} first row {:?}", frame, &luma.data[..8]);
//!     // Frames must be released (or dropped) promptly, the pool only
//!     // holds a few buffers.
//!     frame.release();
//! }
//!
//! camera.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Requirements
//!
//! - **Raspberry Pi**: VideoCore userland and `libpicamera.so` for the MMAL
//!   backend.
//! - **Other hosts**: the software backend has no requirements.
//!
//! ## Safety
//!
//! The MMAL backend calls into the capture library through FFI, and frames
//! read memory owned by the pipeline. Both are wrapped so that safe code can
//! neither read a buffer after releasing it nor release it twice. Returning a
//! buffer by hand, through [`Camera::release_raw`] or
//! [`pipeline::Pipeline::enqueue`], is `unsafe`.

pub mod camera;
pub mod error;
pub mod format;
pub mod frame;
pub mod geometry;
pub mod mmal;
pub mod pipeline;
pub mod snapshot;
pub mod software;

pub use camera::{Camera, Rotation, Transform};
pub use error::{Error, Result, Status};
pub use format::PixelFormat;
pub use frame::{Frame, Layout, Pixel, Plane};
pub use geometry::{NormalizedRect, Size};
