// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Tools for OI image reconstruction input/output files, following the
 * OI-Imaging-JRA interface standard.
 */

pub mod fits;
pub mod image;
pub mod imaging_file;
pub mod params;
pub mod schema;
pub mod time;

/// Conversion factor from milliarcseconds to degrees.
pub const MAS_TO_DEG: f64 = 1.0 / 3600.0 / 1000.0;

/// HDUNAME of the initial image.
pub const INIT_IMG_NAME: &str = "IMAGE-OI INITIAL IMAGE";
/// HDUNAME of the prior image.
pub const PRIOR_IMG_NAME: &str = "IMAGE-OI PRIOR IMAGE";
/// EXTNAME of the input parameters HDU.
pub const INPUT_PARAM_NAME: &str = "IMAGE-OI INPUT PARAM";
/// EXTNAME of the output parameters HDU.
pub const OUTPUT_PARAM_NAME: &str = "IMAGE-OI OUTPUT PARAM";
