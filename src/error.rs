// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use core::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the camera handle and frame factory.
#[derive(Debug, Error)]
pub enum Error {
    /// The pipeline declined a configuration change.
    #[error("configuration rejected: {0}")]
    ConfigurationRejected(Status),

    /// Crop rectangle outside `(0,0)-(1,1)` or with an empty area.
    #[error("invalid crop request: {0}")]
    InvalidCropRequest(&'static str),

    /// Operation not allowed in the current enabled/disabled state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Dequeue timed out. Recoverable, the caller may retry.
    #[error("no frame available")]
    NoFrameAvailable,

    /// No plane layout is known for the active format.
    #[error("format not set or unsupported: {0}")]
    UnsupportedFormat(String),

    /// Allocation, initialisation or library loading failed.
    #[error("hardware fault: {0}")]
    HardwareFault(String),
}

/// Status codes reported by the capture pipeline.
///
/// The numeric values follow `MMAL_STATUS_T`; anything outside the known
/// range is kept as [`Status::Unknown`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Success,
    Enomem,
    Enospc,
    Einval,
    Enosys,
    Enoent,
    Enxio,
    Eio,
    Espipe,
    Ecorrupt,
    Enotready,
    Econfig,
    Eisconn,
    Enotconn,
    Eagain,
    Efault,
    Unknown(i32),
}

impl Status {
    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }

    pub fn description(&self) -> &'static str {
        match self {
            Status::Success => "Success",
            Status::Enomem => "Out of memory",
            Status::Enospc => "Out of resources",
            Status::Einval => "Invalid argument",
            Status::Enosys => "Function not implemented",
            Status::Enoent => "No such file or directory",
            Status::Enxio => "No such device or address",
            Status::Eio => "I/O error",
            Status::Espipe => "Illegal seek",
            Status::Ecorrupt => "Data is corrupt",
            Status::Enotready => "Not ready",
            Status::Econfig => "Incorrect configuration",
            Status::Eisconn => "Port already connected",
            Status::Enotconn => "Port not connected",
            Status::Eagain => "Resource temporarily unavailable",
            Status::Efault => "Bad address",
            Status::Unknown(_) => "Unknown hardware error",
        }
    }

    /// Converts to `Ok` on success, otherwise [`Error::ConfigurationRejected`].
    pub fn check(self) -> Result<()> {
        match self {
            Status::Success => Ok(()),
            status => Err(Error::ConfigurationRejected(status)),
        }
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        match code {
            0 => Status::Success,
            1 => Status::Enomem,
            2 => Status::Enospc,
            3 => Status::Einval,
            4 => Status::Enosys,
            5 => Status::Enoent,
            6 => Status::Enxio,
            7 => Status::Eio,
            8 => Status::Espipe,
            9 => Status::Ecorrupt,
            10 => Status::Enotready,
            11 => Status::Econfig,
            12 => Status::Eisconn,
            13 => Status::Enotconn,
            14 => Status::Eagain,
            15 => Status::Efault,
            code => Status::Unknown(code),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Unknown(code) => write!(f, "{} ({code})", self.description()),
            _ => f.write_str(self.description()),
        }
    }
}
