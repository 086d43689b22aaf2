// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use crate::transport::Transport;

/// Errors that don't involve the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryError {
    /// When a value from the sensor is malformed in some way.
    InvalidData(&'static str),

    /// A frame-wide value fell outside of what the compensation formulas can handle (for
    /// example a gain register of 0).
    ///
    /// This is checked before any pixels are written, so the destination buffer is unchanged.
    NumericDomain(&'static str),

    /// No frame header was seen after polling the given number of packets.
    NoFrame(usize),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::InvalidData(msg) => write!(f, "{}", msg),
            LibraryError::NumericDomain(msg) => write!(f, "{}", msg),
            LibraryError::NoFrame(attempts) => {
                write!(f, "no frame header found in {} packets", attempts)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {}

pub enum Error<T>
where
    T: Transport,
{
    /// Errors originating from the transport implementation.
    TransportError(T::Error),

    /// Errors originating from within this library.
    LibraryError(LibraryError),
}

// Custom Debug implementation so that the transport itself doesn't need to implement Debug.
impl<T> fmt::Debug for Error<T>
where
    T: Transport,
    <T as Transport>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TransportError(err) => {
                f.debug_tuple("Error::TransportError").field(err).finish()
            }
            Error::LibraryError(err) => f.debug_tuple("Error::LibraryError").field(err).finish(),
        }
    }
}

impl<T> fmt::Display for Error<T>
where
    T: Transport,
    <T as Transport>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TransportError(err) => write!(f, "Transport Error: {:?}", err),
            Error::LibraryError(err) => write!(f, "Library Error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<T> std::error::Error for Error<T>
where
    T: Transport,
    <T as Transport>::Error: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::TransportError(err) => Some(err),
            Error::LibraryError(lib_err) => Some(lib_err),
        }
    }
}

impl<T> From<LibraryError> for Error<T>
where
    T: Transport,
{
    fn from(lib_err: LibraryError) -> Self {
        Self::LibraryError(lib_err)
    }
}

// Manual implementation so only the error type needs to be comparable, not the transport.
impl<T> PartialEq for Error<T>
where
    T: Transport,
    <T as Transport>::Error: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::TransportError(a), Error::TransportError(b)) => a == b,
            (Error::LibraryError(a), Error::LibraryError(b)) => a == b,
            _ => false,
        }
    }
}
