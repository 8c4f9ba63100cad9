// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Error handling for fits functions.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitsError {
    /// An error associated the fitsio-crate.
    #[error("{0}")]
    Fitsio(#[from] fitsio::errors::Error),

    /// An error when converting a Rust string to a C string.
    #[error("{0}")]
    BadString(#[from] std::ffi::NulError),

    /// Two headers disagree on the value of a keyword.
    #[error("Cannot merge: non-identical values for '{keyword}' keyword ({left}, {right})")]
    MergeConflict {
        keyword: String,
        left: String,
        right: String,
    },

    /// A keyword that FITS doesn't allow.
    #[error("'{0}' is not a valid FITS keyword (1 to 8 characters of A-Z, 0-9, '-' or '_')")]
    BadKeyword(String),

    /// A "KEY=VALUE" argument without the "=VALUE".
    #[error("Expected KEY=VALUE, but got '{0}'")]
    MissingValue(String),

    /// An IO error.
    #[error("{0}")]
    IO(#[from] std::io::Error),
}
