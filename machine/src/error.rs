// SPDX-License-Identifier: MPL-2.0

/// The error type which is returned from the APIs of this crate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error {
    InvalidArgs,
    NoMemory,
}

/// A specialized [`core::result::Result`] type for this crate.
pub type Result<T> = core::result::Result<T, Error>;
