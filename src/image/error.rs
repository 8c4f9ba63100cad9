// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Error handling for grey images.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::fits::error::FitsError;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("CDELT1/2 keywords missing, pixelsize unknown")]
    MissingPixelSize,

    #[error("Image pixels are not square (CDELT1={cdelt1}, CDELT2={cdelt2})")]
    NonSquarePixels { cdelt1: f64, cdelt2: f64 },

    #[error("Shape doesn't match existing image dims: expected {expected:?} but got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Pixel ({x}, {y}) is outside of the {naxis1}x{naxis2} image")]
    OutOfBounds {
        x: f64,
        y: f64,
        naxis1: usize,
        naxis2: usize,
    },

    #[error("Not an image HDU: '{0}'")]
    NotAnImage(String),

    #[error("Image HDU '{name}' has {naxis} axes, but a 2D image is needed")]
    NotTwoDimensional { name: String, naxis: usize },

    #[error("The limb-darkening exponent must be finite and not negative, but got {0}")]
    BadLdAlpha(f64),

    #[error("Image dimensions must be positive, but got {0}")]
    BadDimension(usize),

    #[error("Not creating '{0}' as it already exists.")]
    FileExists(PathBuf),

    #[error("Parameter '{0}' is not set")]
    MissingParam(String),

    #[error("HDU '{0}' not found.")]
    MissingHdu(String),

    #[error("{0}")]
    Fits(#[from] FitsError),

    /// An error associated with fitsio.
    #[error("{0}")]
    Fitsio(#[from] fitsio::errors::Error),

    /// An error when the pixel data can't be shaped into an image.
    #[error("{0}")]
    Shape(#[from] ndarray::ShapeError),

    /// An IO error.
    #[error("{0}")]
    IO(#[from] std::io::Error),
}
