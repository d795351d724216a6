// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    error::{Error, Result},
    format::PixelFormat,
    frame::Frame,
    geometry::{NormalizedRect, Size},
    pipeline::{Backend, Pipeline, RawBuffer},
};
use core::fmt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Sensor modes in ascending order, used to pick the source size for a
/// requested output size.
pub const SENSOR_MODES: [Size; 3] = [
    Size::new(640, 480),
    Size::new(1296, 972),
    Size::new(2592, 1944),
];

/// Returns the smallest sensor mode covering `width`x`height` on both axes,
/// or the largest mode if none does.
///
/// ```
/// use picamera::camera::select_source_size;
/// use picamera::geometry::Size;
///
/// assert_eq!(select_source_size(320, 320), Size::new(640, 480));
/// assert_eq!(select_source_size(2000, 1200), Size::new(2592, 1944));
/// assert_eq!(select_source_size(4000, 3000), Size::new(2592, 1944));
/// ```
pub fn select_source_size(width: u32, height: u32) -> Size {
    let wanted = Size::new(width, height);
    SENSOR_MODES
        .iter()
        .copied()
        .find(|mode| mode.covers(&wanted))
        .unwrap_or(SENSOR_MODES[SENSOR_MODES.len() - 1])
}

/// Output rotation applied by the ISP.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation (0 degrees)
    #[default]
    Rotation0,
    /// Rotate 90 degrees clockwise
    Rotation90,
    /// Rotate 180 degrees
    Rotation180,
    /// Rotate 270 degrees clockwise (90 degrees counter-clockwise)
    Rotation270,
}

impl Rotation {
    pub const fn degrees(&self) -> i32 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }

    /// Accepts any multiple of 90, including negative angles.
    pub const fn from_degrees(degrees: i32) -> Option<Rotation> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Rotation0),
            90 => Some(Rotation::Rotation90),
            180 => Some(Rotation::Rotation180),
            270 => Some(Rotation::Rotation270),
            _ => None,
        }
    }
}

/// Rotation and mirroring of the output image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Transform {
    pub rotation: Rotation,
    pub hflip: bool,
    pub vflip: bool,
}

impl Transform {
    pub const fn new(rotation: Rotation, hflip: bool, vflip: bool) -> Self {
        Self {
            rotation,
            hflip,
            vflip,
        }
    }
}

/// Handle owning a capture pipeline and its configuration.
///
/// The handle is the single source of truth for the current configuration;
/// values are committed only after the pipeline accepts them. Size, frame
/// rate and format can only change while streaming is disabled. Crop and
/// transform may change at any time.
///
/// Frames borrow the handle, so the borrow checker rejects reconfiguring,
/// disabling or closing the camera while a frame is still checked out.
///
/// # Thread Safety
///
/// `Camera` does no internal locking. Share it between threads only with
/// external synchronisation.
///
/// # Example
///
/// ```no_run
/// use picamera::{Camera, PixelFormat, software::SoftwareBackend};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut camera = Camera::open(&SoftwareBackend::default(), 320, 240, 30)?;
/// camera.set_format(PixelFormat::RGBA)?;
/// camera.enable();
///
/// let frame = camera.get_frame(Duration::from_secs(1))?;
/// println!("{}x{} {}", frame.width(), frame.height(), frame.format());
/// frame.release();
///
/// camera.disable();
/// camera.close();
/// # Ok(())
/// # }
/// ```
pub struct Camera<P: Pipeline> {
    pipeline: P,
    source_size: Size,
    output_size: Size,
    crop: NormalizedRect,
    fps: u32,
    transform: Transform,
    format: Option<PixelFormat>,
    enabled: bool,
}

impl<P: Pipeline> Camera<P> {
    /// Opens a pipeline producing `width`x`height` frames at `fps`.
    ///
    /// The sensor mode is chosen with [`select_source_size`] and the
    /// pipeline is asked to scale to the requested size straight away.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HardwareFault`] if the pipeline cannot be allocated
    /// and [`Error::ConfigurationRejected`] if the output size is refused. In
    /// both cases no hardware resource is left allocated.
    pub fn open<B>(backend: &B, width: u32, height: u32, fps: u32) -> Result<Self>
    where
        B: Backend<Pipeline = P>,
    {
        let source_size = select_source_size(width, height);
        let mut pipeline = backend
            .init(source_size.width, source_size.height, fps)
            .ok_or_else(|| {
                Error::HardwareFault(format!(
                    "couldn't initialise pipeline at {source_size} {fps} fps"
                ))
            })?;

        if let Err(err) = pipeline.set_output_size(width, height).check() {
            warn!("output size {}x{} rejected: {}", width, height, err);
            return Err(err);
        }

        info!(
            "camera opened source: {} output: {}x{} fps: {}",
            source_size, width, height, fps
        );
        Ok(Self {
            pipeline,
            source_size,
            output_size: Size::new(width, height),
            crop: NormalizedRect::UNIT,
            fps,
            transform: Transform::default(),
            format: None,
            enabled: false,
        })
    }

    fn ensure_disabled(&self, message: &'static str) -> Result<()> {
        if self.enabled {
            return Err(Error::InvalidState(message));
        }
        Ok(())
    }

    /// Selects the sensor mode directly.
    pub fn set_source_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_disabled("can't set frame size when enabled")?;
        self.pipeline
            .set_frame_size(width, height)
            .check()
            .inspect_err(|err| warn!("frame size {}x{} rejected: {}", width, height, err))?;
        self.source_size = Size::new(width, height);
        debug!("source size {}", self.source_size);
        Ok(())
    }

    pub fn source_size(&self) -> Size {
        self.source_size
    }

    pub fn set_output_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.ensure_disabled("can't set output size when enabled")?;
        self.pipeline
            .set_output_size(width, height)
            .check()
            .inspect_err(|err| warn!("output size {}x{} rejected: {}", width, height, err))?;
        self.output_size = Size::new(width, height);
        debug!("output size {}", self.output_size);
        Ok(())
    }

    pub fn output_size(&self) -> Size {
        self.output_size
    }

    pub fn set_fps(&mut self, fps: u32) -> Result<()> {
        self.ensure_disabled("can't set FPS when enabled")?;
        self.pipeline
            .set_fps(fps)
            .check()
            .inspect_err(|err| warn!("fps {} rejected: {}", fps, err))?;
        self.fps = fps;
        debug!("fps {}", fps);
        Ok(())
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn set_format(&mut self, format: PixelFormat) -> Result<()> {
        self.ensure_disabled("can't set format when enabled")?;
        self.pipeline
            .set_format(format)
            .check()
            .inspect_err(|err| warn!("format {} rejected: {}", format, err))?;
        self.format = Some(format);
        debug!("format {}", format);
        Ok(())
    }

    /// The active output format, `None` until [`Camera::set_format`]
    /// succeeds.
    pub fn format(&self) -> Option<PixelFormat> {
        self.format
    }

    /// Sets the crop window. Allowed while streaming.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCropRequest`] if `crop` leaves `(0,0)-(1,1)` or has
    /// no area; the pipeline is not called in that case.
    pub fn set_crop(&mut self, crop: NormalizedRect) -> Result<()> {
        if !NormalizedRect::UNIT.contains(&crop) {
            return Err(Error::InvalidCropRequest(
                "crop rectangle must be inside (0,0)-(1,1)",
            ));
        }
        if crop.width() <= 0.0 || crop.height() <= 0.0 {
            return Err(Error::InvalidCropRequest("empty crop rectangle"));
        }

        self.pipeline
            .set_crop(crop.min_x(), crop.min_y(), crop.width(), crop.height())
            .check()
            .inspect_err(|err| warn!("crop {} rejected: {}", crop, err))?;
        self.crop = crop;
        debug!("crop {}", crop);
        Ok(())
    }

    pub fn crop(&self) -> NormalizedRect {
        self.crop
    }

    /// Sets rotation and mirroring. Allowed while streaming.
    pub fn set_transform(&mut self, transform: Transform) -> Result<()> {
        self.pipeline
            .set_transform(
                transform.rotation.degrees(),
                transform.hflip,
                transform.vflip,
            )
            .check()
            .inspect_err(|err| warn!("transform {:?} rejected: {}", transform, err))?;
        self.transform = transform;
        debug!("transform {:?}", transform);
        Ok(())
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts streaming. Does nothing if already enabled.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.pipeline.enable();
            self.enabled = true;
            info!("camera enabled");
        }
    }

    /// Stops streaming. Does nothing if already disabled.
    pub fn disable(&mut self) {
        if self.enabled {
            self.pipeline.disable();
            self.enabled = false;
            info!("camera disabled");
        }
    }

    /// Waits up to `timeout` for the next frame.
    ///
    /// The returned [`Frame`] holds one slot of the pipeline's finite pool
    /// until it is released or dropped; holding on to frames starves later
    /// calls. A zero timeout polls.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if the camera is not enabled.
    /// - [`Error::NoFrameAvailable`] if nothing arrived within `timeout`.
    /// - [`Error::UnsupportedFormat`] if no format was set or the buffer
    ///   doesn't carry the planes the format needs. The buffer is returned
    ///   to the pool first.
    pub fn get_frame(&self, timeout: Duration) -> Result<Frame<'_, P>> {
        if !self.enabled {
            return Err(Error::InvalidState("camera not enabled"));
        }

        let raw = self
            .pipeline
            .dequeue(timeout)
            .ok_or(Error::NoFrameAvailable)?;
        trace!("dequeued {}x{} buffer", raw.width(), raw.height());
        Frame::from_raw(self, self.format, raw)
    }

    /// Returns a buffer obtained from [`Frame::into_raw`] to the pool.
    ///
    /// # Safety
    ///
    /// `raw` must come from this camera, must not have been released
    /// already, and the camera must not have been disabled since it was
    /// dequeued.
    pub unsafe fn release_raw(&self, raw: RawBuffer) {
        unsafe { self.pipeline.enqueue(raw) };
    }

    /// The underlying pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Stops streaming and tears the pipeline down.
    pub fn close(self) {
        info!("camera closing");
        drop(self);
    }
}

impl<P: Pipeline> Drop for Camera<P> {
    fn drop(&mut self) {
        self.disable();
        debug!("camera pipeline released");
    }
}

impl<P: Pipeline> fmt::Display for Camera<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let format = self.format.map(|f| f.name()).unwrap_or("unset");
        write!(
            f,
            "source {} output {} {} fps {} crop {} {}",
            self.source_size,
            self.output_size,
            format,
            self.fps,
            self.crop,
            if self.enabled { "enabled" } else { "disabled" },
        )
    }
}
