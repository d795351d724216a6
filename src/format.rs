// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::Error;
use core::fmt;
use std::str::FromStr;
use videostream::fourcc::FourCC;

/// Output encodings the ISP can be asked to produce.
///
/// The set is closed: every variant has a fixed plane count and channel
/// layout, and the frame factory matches on it exhaustively.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, Y then Cb then Cr.
    I420,
    /// Reported by the ISP as a single plane with pitch equal to the width,
    /// so only the luma-shaped plane is exposed.
    YV12,
    YUYV,
    YVYU,
    UYVY,
    VYUY,
    ARGB,
    RGBA,
    ABGR,
    BGRA,
    /// 32-bit RGB with an unused fourth byte.
    RGB32,
    /// 32-bit BGR with an unused fourth byte.
    BGR32,
    BGR24,
    RGB24,
}

/// Channel semantics shared by a group of [`PixelFormat`]s.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormatClass {
    PlanarYuv420,
    Gray,
    PackedYuv,
    PackedRgb,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 14] = [
        PixelFormat::I420,
        PixelFormat::YV12,
        PixelFormat::YUYV,
        PixelFormat::YVYU,
        PixelFormat::UYVY,
        PixelFormat::VYUY,
        PixelFormat::ARGB,
        PixelFormat::RGBA,
        PixelFormat::ABGR,
        PixelFormat::BGRA,
        PixelFormat::RGB32,
        PixelFormat::BGR32,
        PixelFormat::BGR24,
        PixelFormat::RGB24,
    ];

    pub const fn class(&self) -> FormatClass {
        match self {
            PixelFormat::I420 => FormatClass::PlanarYuv420,
            PixelFormat::YV12 => FormatClass::Gray,
            PixelFormat::YUYV | PixelFormat::YVYU | PixelFormat::UYVY | PixelFormat::VYUY => {
                FormatClass::PackedYuv
            }
            PixelFormat::ARGB
            | PixelFormat::RGBA
            | PixelFormat::ABGR
            | PixelFormat::BGRA
            | PixelFormat::RGB32
            | PixelFormat::BGR32
            | PixelFormat::BGR24
            | PixelFormat::RGB24 => FormatClass::PackedRgb,
        }
    }

    pub const fn plane_count(&self) -> usize {
        match self.class() {
            FormatClass::PlanarYuv420 => 3,
            FormatClass::Gray | FormatClass::PackedYuv | FormatClass::PackedRgb => 1,
        }
    }

    /// Bytes per pixel in the first plane.
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::I420 | PixelFormat::YV12 => 1,
            PixelFormat::YUYV | PixelFormat::YVYU | PixelFormat::UYVY | PixelFormat::VYUY => 2,
            PixelFormat::BGR24 | PixelFormat::RGB24 => 3,
            PixelFormat::ARGB
            | PixelFormat::RGBA
            | PixelFormat::ABGR
            | PixelFormat::BGRA
            | PixelFormat::RGB32
            | PixelFormat::BGR32 => 4,
        }
    }

    pub const fn fourcc(&self) -> FourCC {
        FourCC(*match self {
            PixelFormat::I420 => b"I420",
            PixelFormat::YV12 => b"YV12",
            PixelFormat::YUYV => b"YUYV",
            PixelFormat::YVYU => b"YVYU",
            PixelFormat::UYVY => b"UYVY",
            PixelFormat::VYUY => b"VYUY",
            PixelFormat::ARGB => b"ARGB",
            PixelFormat::RGBA => b"RGBA",
            PixelFormat::ABGR => b"ABGR",
            PixelFormat::BGRA => b"BGRA",
            PixelFormat::RGB32 => b"RGB4",
            PixelFormat::BGR32 => b"BGR4",
            PixelFormat::BGR24 => b"BGR3",
            PixelFormat::RGB24 => b"RGB3",
        })
    }

    pub const fn name(&self) -> &'static str {
        match self {
            PixelFormat::I420 => "I420",
            PixelFormat::YV12 => "YV12",
            PixelFormat::YUYV => "YUYV",
            PixelFormat::YVYU => "YVYU",
            PixelFormat::UYVY => "UYVY",
            PixelFormat::VYUY => "VYUY",
            PixelFormat::ARGB => "ARGB",
            PixelFormat::RGBA => "RGBA",
            PixelFormat::ABGR => "ABGR",
            PixelFormat::BGRA => "BGRA",
            PixelFormat::RGB32 => "RGB32",
            PixelFormat::BGR32 => "BGR32",
            PixelFormat::BGR24 => "BGR24",
            PixelFormat::RGB24 => "RGB24",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    /// Accepts either the format name or its FourCC, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelFormat::ALL
            .into_iter()
            .find(|format| {
                format.name().eq_ignore_ascii_case(s)
                    || format.fourcc().0.eq_ignore_ascii_case(s.as_bytes())
            })
            .ok_or_else(|| Error::UnsupportedFormat(format!("unknown pixel format {s:?}")))
    }
}
