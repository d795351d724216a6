// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Low-level bindings for `libpicamera`, the C wrapper around the VideoCore
//! MMAL camera and ISP components.
//!
//! The library is opened at runtime with [`libloading`] so that crates
//! depending on these bindings build on hosts without the VideoCore
//! userland installed.

#![allow(non_camel_case_types, non_upper_case_globals)]

use libc::{c_double, c_int, c_uint, c_void};
use libloading::Library;
use std::ffi::OsStr;

pub type MMAL_STATUS_T = c_int;

pub const MMAL_SUCCESS: MMAL_STATUS_T = 0;
pub const MMAL_ENOMEM: MMAL_STATUS_T = 1;
pub const MMAL_ENOSPC: MMAL_STATUS_T = 2;
pub const MMAL_EINVAL: MMAL_STATUS_T = 3;
pub const MMAL_ENOSYS: MMAL_STATUS_T = 4;
pub const MMAL_ENOENT: MMAL_STATUS_T = 5;
pub const MMAL_ENXIO: MMAL_STATUS_T = 6;
pub const MMAL_EIO: MMAL_STATUS_T = 7;
pub const MMAL_ESPIPE: MMAL_STATUS_T = 8;
pub const MMAL_ECORRUPT: MMAL_STATUS_T = 9;
pub const MMAL_ENOTREADY: MMAL_STATUS_T = 10;
pub const MMAL_ECONFIG: MMAL_STATUS_T = 11;
pub const MMAL_EISCONN: MMAL_STATUS_T = 12;
pub const MMAL_ENOTCONN: MMAL_STATUS_T = 13;
pub const MMAL_EAGAIN: MMAL_STATUS_T = 14;
pub const MMAL_EFAULT: MMAL_STATUS_T = 15;

/// Equivalent of the `MMAL_FOURCC` macro.
pub const fn mmal_fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | (code[1] as u32) << 8 | (code[2] as u32) << 16 | (code[3] as u32) << 24
}

pub const MMAL_ENCODING_I420: u32 = mmal_fourcc(b"I420");
pub const MMAL_ENCODING_YV12: u32 = mmal_fourcc(b"YV12");
pub const MMAL_ENCODING_YUYV: u32 = mmal_fourcc(b"YUYV");
pub const MMAL_ENCODING_YVYU: u32 = mmal_fourcc(b"YVYU");
pub const MMAL_ENCODING_UYVY: u32 = mmal_fourcc(b"UYVY");
pub const MMAL_ENCODING_VYUY: u32 = mmal_fourcc(b"VYUY");
pub const MMAL_ENCODING_ARGB: u32 = mmal_fourcc(b"ARGB");
pub const MMAL_ENCODING_RGBA: u32 = mmal_fourcc(b"RGBA");
pub const MMAL_ENCODING_ABGR: u32 = mmal_fourcc(b"ABGR");
pub const MMAL_ENCODING_BGRA: u32 = mmal_fourcc(b"BGRA");
pub const MMAL_ENCODING_RGB32: u32 = mmal_fourcc(b"RGB4");
pub const MMAL_ENCODING_BGR32: u32 = mmal_fourcc(b"BGR4");
pub const MMAL_ENCODING_RGB24: u32 = mmal_fourcc(b"RGB3");
pub const MMAL_ENCODING_BGR24: u32 = mmal_fourcc(b"BGR3");

/// Maximum number of planes described by a `camera_buffer`.
pub const CAMERA_MAX_PLANES: usize = 3;

#[repr(C)]
#[derive(Debug)]
pub struct camera {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Debug)]
pub struct camera_buffer {
    /// Opaque MMAL buffer header, owned by the library.
    pub hnd: *mut c_void,
    pub data: [*mut u8; CAMERA_MAX_PLANES],
    pub length: [u32; CAMERA_MAX_PLANES],
    pub pitch: [u32; CAMERA_MAX_PLANES],
    pub width: u32,
    pub height: u32,
}

type InitFn = unsafe extern "C" fn(width: u32, height: u32, fps: c_uint) -> *mut camera;
type ExitFn = unsafe extern "C" fn(camera: *mut camera);
type ToggleFn = unsafe extern "C" fn(camera: *mut camera) -> c_int;
type SizeFn = unsafe extern "C" fn(camera: *mut camera, width: u32, height: u32) -> c_int;
type FpsFn = unsafe extern "C" fn(camera: *mut camera, fps: c_uint) -> c_int;
type CropFn = unsafe extern "C" fn(
    camera: *mut camera,
    left: c_double,
    top: c_double,
    width: c_double,
    height: c_double,
) -> c_int;
type TransformFn =
    unsafe extern "C" fn(camera: *mut camera, rot: c_int, hflip: c_int, vflip: c_int) -> c_int;
type FormatFn = unsafe extern "C" fn(camera: *mut camera, format: u32) -> c_int;
type DequeueFn = unsafe extern "C" fn(camera: *mut camera, timeout_ms: u32) -> *mut camera_buffer;
type QueueFn = unsafe extern "C" fn(camera: *mut camera, buf: *mut camera_buffer);

/// Function table resolved from `libpicamera.so`.
pub struct picamera {
    __library: Library,
    camera_init: InitFn,
    camera_exit: ExitFn,
    camera_enable: ToggleFn,
    camera_disable: ToggleFn,
    camera_set_frame_size: SizeFn,
    camera_set_out_size: SizeFn,
    camera_set_fps: FpsFn,
    camera_set_crop: CropFn,
    camera_set_transform: TransformFn,
    camera_set_format: FormatFn,
    camera_dequeue_buffer: DequeueFn,
    camera_queue_buffer: QueueFn,
}

impl picamera {
    /// Opens the shared library at `path` and resolves every symbol.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers. The caller must make sure
    /// `path` names a build of `libpicamera` matching these declarations.
    pub unsafe fn new<P: AsRef<OsStr>>(path: P) -> Result<Self, libloading::Error> {
        let library = Library::new(path)?;
        Self::from_library(library)
    }

    /// # Safety
    ///
    /// See [`picamera::new`].
    pub unsafe fn from_library<L: Into<Library>>(library: L) -> Result<Self, libloading::Error> {
        let __library = library.into();
        let camera_init = *__library.get::<InitFn>(b"camera_init\0")?;
        let camera_exit = *__library.get::<ExitFn>(b"camera_exit\0")?;
        let camera_enable = *__library.get::<ToggleFn>(b"camera_enable\0")?;
        let camera_disable = *__library.get::<ToggleFn>(b"camera_disable\0")?;
        let camera_set_frame_size = *__library.get::<SizeFn>(b"camera_set_frame_size\0")?;
        let camera_set_out_size = *__library.get::<SizeFn>(b"camera_set_out_size\0")?;
        let camera_set_fps = *__library.get::<FpsFn>(b"camera_set_fps\0")?;
        let camera_set_crop = *__library.get::<CropFn>(b"camera_set_crop\0")?;
        let camera_set_transform = *__library.get::<TransformFn>(b"camera_set_transform\0")?;
        let camera_set_format = *__library.get::<FormatFn>(b"camera_set_format\0")?;
        let camera_dequeue_buffer = *__library.get::<DequeueFn>(b"camera_dequeue_buffer\0")?;
        let camera_queue_buffer = *__library.get::<QueueFn>(b"camera_queue_buffer\0")?;
        Ok(picamera {
            __library,
            camera_init,
            camera_exit,
            camera_enable,
            camera_disable,
            camera_set_frame_size,
            camera_set_out_size,
            camera_set_fps,
            camera_set_crop,
            camera_set_transform,
            camera_set_format,
            camera_dequeue_buffer,
            camera_queue_buffer,
        })
    }

    /// Allocates the camera and ISP components. Returns null on failure.
    pub unsafe fn camera_init(&self, width: u32, height: u32, fps: c_uint) -> *mut camera {
        (self.camera_init)(width, height, fps)
    }

    pub unsafe fn camera_exit(&self, camera: *mut camera) {
        (self.camera_exit)(camera)
    }

    pub unsafe fn camera_enable(&self, camera: *mut camera) -> c_int {
        (self.camera_enable)(camera)
    }

    pub unsafe fn camera_disable(&self, camera: *mut camera) -> c_int {
        (self.camera_disable)(camera)
    }

    pub unsafe fn camera_set_frame_size(&self, camera: *mut camera, width: u32, height: u32) -> c_int {
        (self.camera_set_frame_size)(camera, width, height)
    }

    pub unsafe fn camera_set_out_size(&self, camera: *mut camera, width: u32, height: u32) -> c_int {
        (self.camera_set_out_size)(camera, width, height)
    }

    pub unsafe fn camera_set_fps(&self, camera: *mut camera, fps: c_uint) -> c_int {
        (self.camera_set_fps)(camera, fps)
    }

    pub unsafe fn camera_set_crop(
        &self,
        camera: *mut camera,
        left: c_double,
        top: c_double,
        width: c_double,
        height: c_double,
    ) -> c_int {
        (self.camera_set_crop)(camera, left, top, width, height)
    }

    pub unsafe fn camera_set_transform(
        &self,
        camera: *mut camera,
        rot: c_int,
        hflip: c_int,
        vflip: c_int,
    ) -> c_int {
        (self.camera_set_transform)(camera, rot, hflip, vflip)
    }

    pub unsafe fn camera_set_format(&self, camera: *mut camera, format: u32) -> c_int {
        (self.camera_set_format)(camera, format)
    }

    /// Waits up to `timeout_ms` for a filled buffer. Returns null on timeout.
    pub unsafe fn camera_dequeue_buffer(&self, camera: *mut camera, timeout_ms: u32) -> *mut camera_buffer {
        (self.camera_dequeue_buffer)(camera, timeout_ms)
    }

    /// Returns `buf` to the pool. `buf` must not be used afterwards.
    pub unsafe fn camera_queue_buffer(&self, camera: *mut camera, buf: *mut camera_buffer) {
        (self.camera_queue_buffer)(camera, buf)
    }
}
