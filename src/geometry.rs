// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use core::fmt;

/// Pixel dimensions of a sensor mode or output image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if `self` is at least as large as `other` on both axes.
    pub const fn covers(&self, other: &Size) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangle in fractional coordinates relative to the full sensor frame.
///
/// The constructor orders its corners so `min <= max` always holds on both
/// axes. Used to describe the crop window, where the valid range is the
/// [`NormalizedRect::UNIT`] rectangle.
///
/// ```
/// use picamera::geometry::NormalizedRect;
///
/// let rect = NormalizedRect::new(0.75, 0.25, 0.25, 0.75);
/// assert_eq!(rect.min_x(), 0.25);
/// assert_eq!(rect.width(), 0.5);
/// assert!(NormalizedRect::UNIT.contains(&rect));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NormalizedRect {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl NormalizedRect {
    /// The full frame, `(0,0)-(1,1)`.
    pub const UNIT: NormalizedRect = NormalizedRect {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 1.0,
        max_y: 1.0,
    };

    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True if `other` lies entirely within `self`, edges included.
    pub fn contains(&self, other: &NormalizedRect) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::UNIT
    }
}

impl fmt::Display for NormalizedRect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({:.3},{:.3})-({:.3},{:.3})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
