// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Software stand-in for the camera pipeline.
//!
//! [`SoftwareBackend`] behaves like the VideoCore pipeline closely enough to
//! run the camera on hosts without the hardware: a fixed pool of buffers is
//! allocated when streaming starts, a producer thread fills free buffers
//! with a moving test pattern at the configured frame rate, and filled
//! buffers are handed out in capture order. Buffer layouts follow the ISP:
//! rows are padded to 32 bytes, I420 chroma planes use half the luma pitch,
//! and YV12 comes back as a single plane with pitch equal to the width.
//!
//! Every stream gets an id that is unique within the process. Buffers
//! enqueued to a stream other than the one that produced them are freed
//! rather than joining its pool.

use crate::{
    error::Status,
    format::{FormatClass, PixelFormat},
    frame::plane_rows,
    geometry::{NormalizedRect, Size},
    pipeline::{Backend, Pipeline, RawBuffer, RawPlane, MAX_PLANES},
};
use kanal::{Receiver, Sender};
use std::{
    ffi::c_void,
    ptr::NonNull,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, trace, warn};

/// Buffers in the pool unless configured otherwise.
pub const DEFAULT_POOL_SIZE: usize = 3;

const PITCH_ALIGN: usize = 32;

/// Longest the producer sleeps before rechecking for shutdown.
const PRODUCER_POLL: Duration = Duration::from_millis(10);

static NEXT_STREAM: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug)]
pub struct SoftwareBackend {
    pool_size: usize,
}

impl SoftwareBackend {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size: pool_size.max(1),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl Backend for SoftwareBackend {
    type Pipeline = SoftwarePipeline;

    fn init(&self, width: u32, height: u32, fps: u32) -> Option<SoftwarePipeline> {
        if width == 0 || height == 0 || fps == 0 {
            warn!("software pipeline rejects {}x{} at {} fps", width, height, fps);
            return None;
        }

        debug!("software pipeline {}x{} {} fps", width, height, fps);
        Some(SoftwarePipeline {
            frame_size: Size::new(width, height),
            output_size: Size::new(width, height),
            fps,
            format: PixelFormat::I420,
            crop: NormalizedRect::UNIT,
            transform: (0, false, false),
            pool_size: self.pool_size,
            stream: None,
        })
    }
}

pub struct SoftwarePipeline {
    frame_size: Size,
    output_size: Size,
    fps: u32,
    format: PixelFormat,
    crop: NormalizedRect,
    transform: (i32, bool, bool),
    pool_size: usize,
    stream: Option<Stream>,
}

impl SoftwarePipeline {
    pub fn frame_size(&self) -> Size {
        self.frame_size
    }

    pub fn output_size(&self) -> Size {
        self.output_size
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn crop(&self) -> NormalizedRect {
        self.crop
    }

    /// Rotation in degrees, horizontal and vertical flip.
    pub fn transform(&self) -> (i32, bool, bool) {
        self.transform
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl Pipeline for SoftwarePipeline {
    fn set_output_size(&mut self, width: u32, height: u32) -> Status {
        if width == 0 || height == 0 {
            return Status::Einval;
        }
        self.output_size = Size::new(width, height);
        Status::Success
    }

    fn set_frame_size(&mut self, width: u32, height: u32) -> Status {
        if width == 0 || height == 0 {
            return Status::Einval;
        }
        self.frame_size = Size::new(width, height);
        Status::Success
    }

    fn set_fps(&mut self, fps: u32) -> Status {
        if fps == 0 {
            return Status::Einval;
        }
        self.fps = fps;
        Status::Success
    }

    fn set_crop(&mut self, x: f64, y: f64, width: f64, height: f64) -> Status {
        self.crop = NormalizedRect::new(x, y, x + width, y + height);
        Status::Success
    }

    fn set_transform(&mut self, rotation: i32, hflip: bool, vflip: bool) -> Status {
        if rotation.rem_euclid(90) != 0 {
            return Status::Einval;
        }
        self.transform = (rotation, hflip, vflip);
        Status::Success
    }

    fn set_format(&mut self, format: PixelFormat) -> Status {
        self.format = format;
        Status::Success
    }

    fn enable(&mut self) {
        if self.stream.is_some() {
            return;
        }
        self.stream = Some(Stream::start(
            self.pool_size,
            NEXT_STREAM.fetch_add(1, Ordering::Relaxed),
            self.format,
            self.output_size,
            Duration::from_secs(1) / self.fps,
        ));
    }

    fn disable(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("software pipeline stopped");
        }
    }

    fn dequeue(&self, timeout: Duration) -> Option<RawBuffer> {
        let stream = self.stream.as_ref()?;
        let slot = if timeout.is_zero() {
            stream.ready_rx.try_recv().ok().flatten()?
        } else {
            stream.ready_rx.recv_timeout(timeout).ok()?
        };
        trace!("dequeued software buffer {}", slot.sequence);
        Some(slot.into_raw())
    }

    unsafe fn enqueue(&self, buffer: RawBuffer) {
        // SAFETY: software buffer handles are only created by Slot::into_raw.
        let slot = unsafe { Box::from_raw(buffer.handle().cast::<Slot>().as_ptr()) };
        match &self.stream {
            Some(stream) if stream.id == slot.stream => {
                if stream.free_tx.send(*slot).is_err() {
                    warn!("software pool closed, dropping buffer");
                }
            }
            _ => warn!("dropping buffer from stream {}", slot.stream),
        }
    }
}

impl Drop for SoftwarePipeline {
    fn drop(&mut self) {
        self.disable();
        debug!("software pipeline exited");
    }
}

struct Stream {
    id: u64,
    free_tx: Sender<Slot>,
    ready_rx: Receiver<Slot>,
    stop: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
}

impl Stream {
    fn start(
        pool_size: usize,
        stream_id: u64,
        format: PixelFormat,
        size: Size,
        interval: Duration,
    ) -> Self {
        let (free_tx, free_rx) = kanal::bounded(pool_size);
        let (ready_tx, ready_rx) = kanal::bounded(pool_size);
        for _ in 0..pool_size {
            if free_tx.send(Slot::new(stream_id, format, size)).is_err() {
                warn!("couldn't fill software buffer pool");
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let producer_stop = stop.clone();
        let producer = thread::Builder::new()
            .name("picamera-software".to_string())
            .spawn(move || produce(free_rx, ready_tx, interval, producer_stop))
            .inspect_err(|err| warn!("couldn't start software producer: {}", err))
            .ok();

        debug!(
            "software pipeline streaming {} {} with {} buffers",
            size, format, pool_size
        );
        Self {
            id: stream_id,
            free_tx,
            ready_rx,
            stop,
            producer,
        }
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                warn!("software producer panicked");
            }
        }
    }
}

fn produce(free: Receiver<Slot>, ready: Sender<Slot>, interval: Duration, stop: Arc<AtomicBool>) {
    let mut sequence = 0;
    let mut next = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        let Ok(mut slot) = free.recv_timeout(PRODUCER_POLL) else {
            continue;
        };

        loop {
            let now = Instant::now();
            if now >= next || stop.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep((next - now).min(PRODUCER_POLL));
        }
        next = (next + interval).max(Instant::now());

        slot.fill(sequence);
        sequence += 1;
        if ready.send(slot).is_err() {
            break;
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct PlaneLayout {
    offset: usize,
    length: usize,
    pitch: usize,
}

/// One pool buffer. Ownership moves between the pool channels and the
/// consumer, where it lives behind the [`RawBuffer`] handle.
struct Slot {
    stream: u64,
    sequence: u64,
    data: Box<[u8]>,
    planes: [PlaneLayout; MAX_PLANES],
    num_planes: usize,
    size: Size,
}

impl Slot {
    fn new(stream_id: u64, format: PixelFormat, size: Size) -> Self {
        let (planes, num_planes, total) = buffer_layout(format, size);
        Self {
            stream: stream_id,
            sequence: 0,
            data: vec![0; total].into_boxed_slice(),
            planes,
            num_planes,
            size,
        }
    }

    fn fill(&mut self, sequence: u64) {
        self.sequence = sequence;
        for plane in &self.planes[..self.num_planes] {
            let bytes = &mut self.data[plane.offset..plane.offset + plane.length];
            for (y, row) in bytes.chunks_mut(plane.pitch.max(1)).enumerate() {
                for (x, byte) in row.iter_mut().enumerate() {
                    *byte = (x as u64 + y as u64 + sequence) as u8;
                }
            }
        }
    }

    fn into_raw(self) -> RawBuffer {
        let size = self.size;
        let num_planes = self.num_planes;
        let layout = self.planes;
        let slot = Box::leak(Box::new(self));
        let base = slot.data.as_ptr();
        let mut planes = [RawPlane {
            data: std::ptr::null(),
            length: 0,
            pitch: 0,
        }; MAX_PLANES];
        for (raw, plane) in planes.iter_mut().zip(&layout[..num_planes]) {
            *raw = RawPlane {
                // SAFETY: buffer_layout keeps every plane inside `data`.
                data: unsafe { base.add(plane.offset) },
                length: plane.length,
                pitch: plane.pitch,
            };
        }
        let handle = NonNull::from(slot).cast::<c_void>();
        // SAFETY: the slot is leaked until enqueue rebuilds the box, so the
        // plane memory outlives the buffer.
        unsafe { RawBuffer::new(handle, size.width, size.height, &planes[..num_planes]) }
    }
}

fn align(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

/// Plane offsets, lengths and pitches for a `format` buffer of `size`.
fn buffer_layout(format: PixelFormat, size: Size) -> ([PlaneLayout; MAX_PLANES], usize, usize) {
    let width = size.width as usize;
    let height = size.height as usize;
    let mut planes = [PlaneLayout::default(); MAX_PLANES];

    let num_planes = match format.class() {
        FormatClass::PlanarYuv420 => {
            let pitch = align(width, PITCH_ALIGN);
            let mut offset = 0;
            for (index, plane) in planes.iter_mut().enumerate() {
                let pitch = if index == 0 { pitch } else { pitch / 2 };
                let length = pitch * plane_rows(format, index, height);
                *plane = PlaneLayout {
                    offset,
                    length,
                    pitch,
                };
                offset += length;
            }
            3
        }
        FormatClass::Gray => {
            planes[0] = PlaneLayout {
                offset: 0,
                length: width * height,
                pitch: width,
            };
            1
        }
        FormatClass::PackedYuv | FormatClass::PackedRgb => {
            let pitch = align(width * format.bytes_per_pixel(), PITCH_ALIGN);
            planes[0] = PlaneLayout {
                offset: 0,
                length: pitch * height,
                pitch,
            };
            1
        }
    };

    let total = planes[..num_planes]
        .iter()
        .map(|plane| plane.offset + plane.length)
        .max()
        .unwrap_or(0);
    (planes, num_planes, total)
}
