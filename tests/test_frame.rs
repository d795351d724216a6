// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use picamera::{
    format::FormatClass,
    frame::plane_rows,
    pipeline::{Backend, Pipeline, RawBuffer, RawPlane},
    snapshot::{encode_jpeg, Snapshot},
    software::SoftwareBackend,
    Camera, Error, Layout, Pixel, PixelFormat, Status,
};
use std::{cell::Cell, error::Error as StdError, ffi::c_void, ptr::NonNull, time::Duration};

const TIMEOUT: Duration = Duration::from_secs(2);

/// Pipeline serving one fixed buffer whose plane table is chosen by the test.
struct FixedBackend {
    width: u32,
    height: u32,
    planes: Vec<(usize, usize)>,
}

impl Backend for FixedBackend {
    type Pipeline = FixedPipeline;

    fn init(&self, _width: u32, _height: u32, _fps: u32) -> Option<FixedPipeline> {
        let storage = self
            .planes
            .iter()
            .map(|(capacity, _)| vec![0x5a; *capacity])
            .collect();
        Some(FixedPipeline {
            width: self.width,
            height: self.height,
            planes: self.planes.clone(),
            storage,
            report_lengths: Cell::new(false),
            checked_out: Cell::new(false),
            returned: Cell::new(0),
        })
    }
}

struct FixedPipeline {
    width: u32,
    height: u32,
    /// Capacity and pitch of each plane.
    planes: Vec<(usize, usize)>,
    storage: Vec<Vec<u8>>,
    report_lengths: Cell<bool>,
    checked_out: Cell<bool>,
    returned: Cell<usize>,
}

impl Pipeline for FixedPipeline {
    fn set_output_size(&mut self, _width: u32, _height: u32) -> Status {
        Status::Success
    }

    fn set_frame_size(&mut self, _width: u32, _height: u32) -> Status {
        Status::Success
    }

    fn set_fps(&mut self, _fps: u32) -> Status {
        Status::Success
    }

    fn set_crop(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) -> Status {
        Status::Success
    }

    fn set_transform(&mut self, _rotation: i32, _hflip: bool, _vflip: bool) -> Status {
        Status::Success
    }

    fn set_format(&mut self, _format: PixelFormat) -> Status {
        Status::Success
    }

    fn enable(&mut self) {}

    fn disable(&mut self) {}

    fn dequeue(&self, _timeout: Duration) -> Option<RawBuffer> {
        if self.checked_out.replace(true) {
            return None;
        }
        let planes: Vec<RawPlane> = self
            .planes
            .iter()
            .zip(&self.storage)
            .map(|((capacity, pitch), data)| RawPlane {
                data: data.as_ptr(),
                length: if self.report_lengths.get() { *capacity } else { 0 },
                pitch: *pitch,
            })
            .collect();
        let handle = NonNull::<c_void>::dangling();
        Some(unsafe { RawBuffer::new(handle, self.width, self.height, &planes) })
    }

    unsafe fn enqueue(&self, _buffer: RawBuffer) {
        self.checked_out.set(false);
        self.returned.set(self.returned.get() + 1);
    }
}

#[test]
fn test_plane_count_per_format() -> Result<(), Box<dyn StdError>> {
    let backend = SoftwareBackend::default();
    for format in PixelFormat::ALL {
        let mut camera = Camera::open(&backend, 100, 75, 500)?;
        camera.set_format(format)?;
        camera.enable();

        let frame = camera.get_frame(TIMEOUT)?;
        let expected = if format == PixelFormat::I420 { 3 } else { 1 };
        assert_eq!(frame.format(), format);
        assert_eq!(frame.plane_count(), expected, "{format}");
        assert_eq!(frame.planes().count(), expected, "{format}");
        assert_eq!((frame.width(), frame.height()), (100, 75));

        for (index, plane) in frame.planes().enumerate() {
            let rows = plane_rows(format, index, 75);
            assert_eq!(plane.data.len(), plane.pitch * rows, "{format} plane {index}");
            assert!(plane.pitch >= 100usize.div_ceil(2), "{format} plane {index}");
        }
        assert!(frame.plane(expected).is_none());
        frame.release();
    }
    Ok(())
}

#[test]
fn test_layout_per_format() -> Result<(), Box<dyn StdError>> {
    let backend = SoftwareBackend::default();
    for format in PixelFormat::ALL {
        let mut camera = Camera::open(&backend, 64, 48, 500)?;
        camera.set_format(format)?;
        camera.enable();
        let frame = camera.get_frame(TIMEOUT)?;

        match (frame.layout(), format.class()) {
            (Layout::Ycbcr420 { y, cb, cr }, FormatClass::PlanarYuv420) => {
                assert_eq!(y.data.len(), y.pitch * 48);
                assert_eq!(cb.pitch, y.pitch / 2);
                assert_eq!(cb.data.len(), cb.pitch * 24);
                assert_eq!(cr.data.len(), cr.pitch * 24);
            }
            (Layout::Gray(plane), FormatClass::Gray) => {
                assert_eq!(plane.pitch, 64);
                assert_eq!(plane.data.len(), 64 * 48);
            }
            (Layout::PackedYuv { plane, format: f }, FormatClass::PackedYuv) => {
                assert_eq!(f, format);
                assert!(plane.pitch >= 64 * 2);
            }
            (
                Layout::PackedRgb {
                    plane,
                    format: f,
                    bytes_per_pixel,
                },
                FormatClass::PackedRgb,
            ) => {
                assert_eq!(f, format);
                assert_eq!(bytes_per_pixel, format.bytes_per_pixel());
                assert!(bytes_per_pixel == 3 || bytes_per_pixel == 4);
                assert!(plane.pitch >= 64 * bytes_per_pixel);
                assert_eq!(plane.pitch % 32, 0);
            }
            (layout, class) => panic!("{format}: {layout:?} for {class:?}"),
        }
    }
    Ok(())
}

#[test]
fn test_length_from_pitch_and_rows() -> Result<(), Box<dyn StdError>> {
    let backend = FixedBackend {
        width: 10,
        height: 5,
        planes: vec![(16 * 5, 16), (8 * 3, 8), (8 * 3, 8)],
    };
    let mut camera = Camera::open(&backend, 10, 5, 30)?;
    camera.set_format(PixelFormat::I420)?;
    camera.enable();

    let frame = camera.get_frame(TIMEOUT)?;
    let lengths: Vec<_> = frame.planes().map(|plane| plane.data.len()).collect();
    assert_eq!(lengths, [16 * 5, 8 * 3, 8 * 3]);
    frame.release();
    assert_eq!(camera.pipeline().returned.get(), 1);
    Ok(())
}

#[test]
fn test_reported_length_wins() -> Result<(), Box<dyn StdError>> {
    let backend = FixedBackend {
        width: 8,
        height: 4,
        planes: vec![(100, 32)],
    };
    let mut camera = Camera::open(&backend, 8, 4, 30)?;
    camera.set_format(PixelFormat::RGBA)?;
    camera.pipeline().report_lengths.set(true);
    camera.enable();

    let frame = camera.get_frame(TIMEOUT)?;
    let plane = frame.plane(0).unwrap();
    assert_eq!(plane.data.len(), 100);
    assert_eq!(plane.pitch, 32);
    assert_eq!(plane.row(3).unwrap().len(), 4);
    assert!(plane.row(4).is_none());
    assert_eq!(plane.pixel(7, 0, 4).unwrap().len(), 4);
    assert!(plane.pixel(8, 0, 4).is_none());
    assert_eq!(plane.pixel(0, 3, 4).unwrap().len(), 4);
    assert!(plane.pixel(1, 3, 4).is_none());
    Ok(())
}

#[test]
fn test_missing_planes_rejected() -> Result<(), Box<dyn StdError>> {
    let backend = FixedBackend {
        width: 16,
        height: 16,
        planes: vec![(16 * 16, 16)],
    };
    let mut camera = Camera::open(&backend, 16, 16, 30)?;
    camera.set_format(PixelFormat::I420)?;
    camera.enable();

    let err = camera.get_frame(TIMEOUT).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)), "{err}");
    assert_eq!(camera.pipeline().returned.get(), 1);

    // The slot went back to the pool, so a single plane format still works.
    camera.disable();
    camera.set_format(PixelFormat::YV12)?;
    camera.enable();
    let frame = camera.get_frame(TIMEOUT)?;
    assert!(matches!(frame.layout(), Layout::Gray(_)));
    Ok(())
}

#[test]
fn test_plane_rows() {
    assert_eq!(plane_rows(PixelFormat::I420, 0, 5), 5);
    assert_eq!(plane_rows(PixelFormat::I420, 1, 5), 3);
    assert_eq!(plane_rows(PixelFormat::I420, 2, 4), 2);
    assert_eq!(plane_rows(PixelFormat::RGBA, 0, 5), 5);
    assert_eq!(plane_rows(PixelFormat::YV12, 0, 7), 7);
}

#[test]
fn test_format_properties() {
    for format in PixelFormat::ALL {
        let parsed: PixelFormat = format.name().parse().unwrap();
        assert_eq!(parsed, format);
        let fourcc = String::from_utf8(format.fourcc().0.to_vec()).unwrap();
        assert_eq!(fourcc.to_lowercase().parse::<PixelFormat>().unwrap(), format);
    }
    assert_eq!(PixelFormat::RGB32.to_string(), "RGB32");
    assert_eq!(PixelFormat::BGR24.to_string(), "BGR24");
    assert_eq!(PixelFormat::I420.plane_count(), 3);
    assert_eq!(PixelFormat::YV12.class(), FormatClass::Gray);
    assert_eq!(PixelFormat::UYVY.bytes_per_pixel(), 2);
    assert_eq!(PixelFormat::RGB24.bytes_per_pixel(), 3);
    assert_eq!(PixelFormat::BGR32.bytes_per_pixel(), 4);
    assert!(matches!(
        "NV12".parse::<PixelFormat>(),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_pixel_access() -> Result<(), Box<dyn StdError>> {
    // The test pattern byte at column `cx` of row `y` is `cx + y + sequence`.
    let mut camera = Camera::open(&SoftwareBackend::default(), 64, 48, 500)?;
    camera.set_format(PixelFormat::RGBA)?;
    camera.enable();
    let frame = camera.get_frame(TIMEOUT)?;
    let Some(Pixel::Rgb(origin)) = frame.pixel(0, 0) else {
        panic!("expected an RGB pixel");
    };
    let seq = origin[0];
    let Some(Pixel::Rgb(pixel)) = frame.pixel(3, 2) else {
        panic!("expected an RGB pixel");
    };
    let expected: Vec<u8> = (14..18).map(|n| seq.wrapping_add(n)).collect();
    assert_eq!(pixel, expected.as_slice());
    assert!(frame.pixel(63, 47).is_some());
    assert!(frame.pixel(64, 0).is_none());
    assert!(frame.pixel(0, 48).is_none());
    frame.release();

    camera.disable();
    camera.set_format(PixelFormat::I420)?;
    camera.enable();
    let frame = camera.get_frame(TIMEOUT)?;
    let Some(Pixel::Ycbcr { y: seq, .. }) = frame.pixel(0, 0) else {
        panic!("expected a YCbCr pixel");
    };
    assert_eq!(
        frame.pixel(5, 3),
        Some(Pixel::Ycbcr {
            y: seq.wrapping_add(8),
            cb: seq.wrapping_add(3),
            cr: seq.wrapping_add(3),
        })
    );
    frame.release();

    camera.disable();
    camera.set_format(PixelFormat::YV12)?;
    camera.enable();
    let frame = camera.get_frame(TIMEOUT)?;
    let Some(Pixel::Gray(seq)) = frame.pixel(0, 0) else {
        panic!("expected a gray pixel");
    };
    assert_eq!(frame.pixel(7, 2), Some(Pixel::Gray(seq.wrapping_add(9))));
    frame.release();

    camera.disable();
    camera.set_format(PixelFormat::YUYV)?;
    camera.enable();
    let frame = camera.get_frame(TIMEOUT)?;
    let Some(Pixel::PackedYuv(origin)) = frame.pixel(0, 0) else {
        panic!("expected a packed YUV pixel");
    };
    let seq = origin[0];
    let Some(Pixel::PackedYuv(macropixel)) = frame.pixel(5, 1) else {
        panic!("expected a packed YUV pixel");
    };
    assert_eq!(macropixel.len(), 4);
    assert_eq!(macropixel[0], seq.wrapping_add(9));
    assert_eq!(frame.pixel(4, 1), frame.pixel(5, 1));
    Ok(())
}

#[test]
fn test_snapshot_strips_padding() -> Result<(), Box<dyn StdError>> {
    let mut camera = Camera::open(&SoftwareBackend::default(), 10, 6, 500)?;
    camera.set_format(PixelFormat::RGB24)?;
    camera.enable();

    let frame = camera.get_frame(TIMEOUT)?;
    let padded = frame.plane(0).unwrap();
    assert_eq!(padded.pitch, 32);
    let snapshot = Snapshot::from_frame(&frame);
    let first_row = padded.row(1).unwrap()[..30].to_vec();
    frame.release();

    assert_eq!(snapshot.plane_count(), 1);
    assert_eq!(snapshot.pitch(0), 30);
    let pixels = snapshot.plane(0).unwrap();
    assert_eq!(pixels.len(), 30 * 6);
    assert_eq!(&pixels[30..60], first_row.as_slice());
    Ok(())
}

#[test]
fn test_encode_jpeg() -> Result<(), Box<dyn StdError>> {
    let backend = SoftwareBackend::default();
    for format in [
        PixelFormat::I420,
        PixelFormat::YV12,
        PixelFormat::RGBA,
        PixelFormat::BGR24,
        PixelFormat::RGB32,
    ] {
        let mut camera = Camera::open(&backend, 64, 48, 500)?;
        camera.set_format(format)?;
        camera.enable();
        let snapshot = Snapshot::from_frame(&camera.get_frame(TIMEOUT)?);

        let jpeg = encode_jpeg(&snapshot, 90)?;
        assert_eq!(&jpeg[..2], &[0xff, 0xd8], "{format}");
    }

    let mut camera = Camera::open(&backend, 64, 48, 500)?;
    camera.set_format(PixelFormat::YUYV)?;
    camera.enable();
    let snapshot = Snapshot::from_frame(&camera.get_frame(TIMEOUT)?);
    assert!(encode_jpeg(&snapshot, 90).is_err());
    Ok(())
}
