// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! VideoCore MMAL pipeline through `libpicamera`.

use crate::{
    error::{Error, Result, Status},
    format::PixelFormat,
    pipeline::{Backend, Pipeline, RawBuffer, RawPlane},
};
use picamera_sys::{camera, camera_buffer, picamera as picamera_library, CAMERA_MAX_PLANES};
use std::{
    ffi::{c_void, OsStr},
    ptr::NonNull,
    sync::Arc,
    time::Duration,
};
use tracing::{debug, warn};

/// Default soname of the capture library.
pub const LIBRARY: &str = "libpicamera.so";

const fn encoding(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::I420 => picamera_sys::MMAL_ENCODING_I420,
        PixelFormat::YV12 => picamera_sys::MMAL_ENCODING_YV12,
        PixelFormat::YUYV => picamera_sys::MMAL_ENCODING_YUYV,
        PixelFormat::YVYU => picamera_sys::MMAL_ENCODING_YVYU,
        PixelFormat::UYVY => picamera_sys::MMAL_ENCODING_UYVY,
        PixelFormat::VYUY => picamera_sys::MMAL_ENCODING_VYUY,
        PixelFormat::ARGB => picamera_sys::MMAL_ENCODING_ARGB,
        PixelFormat::RGBA => picamera_sys::MMAL_ENCODING_RGBA,
        PixelFormat::ABGR => picamera_sys::MMAL_ENCODING_ABGR,
        PixelFormat::BGRA => picamera_sys::MMAL_ENCODING_BGRA,
        PixelFormat::RGB32 => picamera_sys::MMAL_ENCODING_RGB32,
        PixelFormat::BGR32 => picamera_sys::MMAL_ENCODING_BGR32,
        PixelFormat::BGR24 => picamera_sys::MMAL_ENCODING_BGR24,
        PixelFormat::RGB24 => picamera_sys::MMAL_ENCODING_RGB24,
    }
}

/// Loaded capture library, shared by the pipelines it creates.
#[derive(Clone)]
pub struct MmalBackend {
    lib: Arc<picamera_library>,
}

impl MmalBackend {
    /// Loads the capture library from `path`, usually [`LIBRARY`].
    ///
    /// # Errors
    ///
    /// [`Error::HardwareFault`] if the library or one of its symbols cannot
    /// be found.
    pub fn load<P: AsRef<OsStr>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: libpicamera has no load-time side effects beyond those of
        // the VideoCore userland libraries it links.
        let lib = unsafe { picamera_library::new(path) }.map_err(|err| {
            Error::HardwareFault(format!("couldn't load {}: {}", path.to_string_lossy(), err))
        })?;
        debug!("loaded {}", path.to_string_lossy());
        Ok(Self { lib: Arc::new(lib) })
    }
}

impl Backend for MmalBackend {
    type Pipeline = MmalPipeline;

    fn init(&self, width: u32, height: u32, fps: u32) -> Option<MmalPipeline> {
        let camera = NonNull::new(unsafe { self.lib.camera_init(width, height, fps) })?;
        Some(MmalPipeline {
            lib: self.lib.clone(),
            camera,
        })
    }
}

/// Camera and ISP components owned through `libpicamera`.
pub struct MmalPipeline {
    lib: Arc<picamera_library>,
    camera: NonNull<camera>,
}

impl MmalPipeline {
    fn raw(&self) -> *mut camera {
        self.camera.as_ptr()
    }
}

impl Pipeline for MmalPipeline {
    fn set_output_size(&mut self, width: u32, height: u32) -> Status {
        unsafe { self.lib.camera_set_out_size(self.raw(), width, height) }.into()
    }

    fn set_frame_size(&mut self, width: u32, height: u32) -> Status {
        unsafe { self.lib.camera_set_frame_size(self.raw(), width, height) }.into()
    }

    fn set_fps(&mut self, fps: u32) -> Status {
        unsafe { self.lib.camera_set_fps(self.raw(), fps) }.into()
    }

    fn set_crop(&mut self, x: f64, y: f64, width: f64, height: f64) -> Status {
        unsafe { self.lib.camera_set_crop(self.raw(), x, y, width, height) }.into()
    }

    fn set_transform(&mut self, rotation: i32, hflip: bool, vflip: bool) -> Status {
        unsafe {
            self.lib
                .camera_set_transform(self.raw(), rotation, hflip.into(), vflip.into())
        }
        .into()
    }

    fn set_format(&mut self, format: PixelFormat) -> Status {
        unsafe { self.lib.camera_set_format(self.raw(), encoding(format)) }.into()
    }

    fn enable(&mut self) {
        let ret = unsafe { self.lib.camera_enable(self.raw()) };
        if ret != 0 {
            warn!("camera_enable failed: {}", ret);
        }
    }

    fn disable(&mut self) {
        let ret = unsafe { self.lib.camera_disable(self.raw()) };
        if ret != 0 {
            warn!("camera_disable failed: {}", ret);
        }
    }

    fn dequeue(&self, timeout: Duration) -> Option<RawBuffer> {
        let timeout_ms = timeout.as_millis().min(u32::MAX as u128) as u32;
        let buf = NonNull::new(unsafe { self.lib.camera_dequeue_buffer(self.raw(), timeout_ms) })?;
        // SAFETY: the library hands out a valid buffer that stays ours until
        // camera_queue_buffer.
        let desc: &camera_buffer = unsafe { buf.as_ref() };

        let mut planes = Vec::with_capacity(CAMERA_MAX_PLANES);
        for index in 0..CAMERA_MAX_PLANES {
            if desc.data[index].is_null() {
                break;
            }
            planes.push(RawPlane {
                data: desc.data[index],
                length: desc.length[index] as usize,
                pitch: desc.pitch[index] as usize,
            });
        }

        // SAFETY: plane memory belongs to the MMAL buffer header, which is
        // only recycled once the buffer is queued back in enqueue.
        Some(unsafe { RawBuffer::new(buf.cast::<c_void>(), desc.width, desc.height, &planes) })
    }

    unsafe fn enqueue(&self, buffer: RawBuffer) {
        unsafe {
            self.lib
                .camera_queue_buffer(self.raw(), buffer.handle().cast::<camera_buffer>().as_ptr())
        }
    }
}

impl Drop for MmalPipeline {
    fn drop(&mut self) {
        unsafe { self.lib.camera_exit(self.raw()) };
        debug!("camera pipeline exited");
    }
}
