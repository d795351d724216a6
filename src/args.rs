// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use picamera::{NormalizedRect, PixelFormat, Rotation, Transform};
use std::path::PathBuf;

/// Camera image mirroring options.
///
/// Determines how the camera image should be flipped by the ISP.
/// Useful for correcting camera orientation.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum MirrorSetting {
    /// No mirroring
    None,
    /// Flip horizontally (left-right)
    Horizontal,
    /// Flip vertically (top-bottom)
    Vertical,
    /// Flip both horizontally and vertically (180-degree rotation)
    Both,
}

/// Capture pipeline implementation.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum BackendSetting {
    /// VideoCore MMAL pipeline through libpicamera
    Mmal,
    /// Software test pattern pipeline
    Software,
}

/// Command-line arguments for the picamera capture tool.
///
/// Captures a number of frames and writes them as JPEG files. Arguments can
/// be specified via command line or environment variables.
///
/// # Example
///
/// ```bash
/// # Via command line
/// picamera --size 320 320 --format RGBA --mirror both --frames 10
///
/// # Via environment variables
/// export FORMAT=I420
/// export FRAMES=100
/// picamera
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture pipeline implementation
    #[arg(long, env = "BACKEND", default_value = "mmal", value_enum)]
    pub backend: BackendSetting,

    /// Path to the capture library used by the mmal backend
    #[arg(long, env = "PICAMERA_LIBRARY", default_value = picamera::mmal::LIBRARY)]
    pub library: PathBuf,

    /// Output resolution in pixels (width height)
    #[arg(
        short,
        long,
        env = "SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub size: Vec<u32>,

    /// Frame rate requested from the sensor
    #[arg(long, env = "FPS", default_value = "30")]
    pub fps: u32,

    /// Output pixel format (name or FourCC, e.g. I420, RGBA, RGB24)
    #[arg(short, long, env = "FORMAT", default_value = "RGBA")]
    pub format: PixelFormat,

    /// Crop window in normalized coordinates (x1 y1 x2 y2)
    #[arg(
        long,
        env = "CROP",
        default_value = "0 0 1 1",
        value_delimiter = ' ',
        num_args = 4
    )]
    pub crop: Vec<f64>,

    /// Output rotation in degrees (0, 90, 180 or 270)
    #[arg(long, env = "ROTATION", default_value = "0")]
    pub rotation: i32,

    /// Camera image mirroring setting
    #[arg(long, env = "MIRROR", default_value = "none", value_enum)]
    pub mirror: MirrorSetting,

    /// Number of frames to capture
    #[arg(short = 'n', long, env = "FRAMES", default_value = "10")]
    pub frames: usize,

    /// Frame timeout in milliseconds
    #[arg(long, env = "TIMEOUT", default_value = "1000")]
    pub timeout: u64,

    /// Directory receiving the captured JPEG files
    #[arg(short, long, env = "OUTPUT", default_value = ".")]
    pub output: PathBuf,

    /// JPEG quality (1-100)
    #[arg(long, env = "QUALITY", default_value = "90")]
    pub quality: i32,

    /// Buffers in the software pipeline pool
    #[arg(long, env = "POOL", default_value = "3")]
    pub pool: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

impl Args {
    pub fn crop(&self) -> NormalizedRect {
        NormalizedRect::new(self.crop[0], self.crop[1], self.crop[2], self.crop[3])
    }

    /// Rotation and mirroring, `None` if the rotation isn't a multiple of 90.
    pub fn transform(&self) -> Option<Transform> {
        let rotation = Rotation::from_degrees(self.rotation)?;
        let (hflip, vflip) = match self.mirror {
            MirrorSetting::None => (false, false),
            MirrorSetting::Horizontal => (true, false),
            MirrorSetting::Vertical => (false, true),
            MirrorSetting::Both => (true, true),
        };
        Some(Transform::new(rotation, hflip, vflip))
    }
}
