// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Simple analytic model images, centred in the field of view.
 */

use std::fmt;
use std::str::FromStr;

use log::debug;

use super::{error::ImageError, GreyImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelType {
    Blank,
    Dirac,
    Uniform,
    Gaussian,
    /// Power-law limb-darkened disc.
    Ld,
}

impl ModelType {
    pub fn variants() -> &'static [&'static str] {
        &["blank", "dirac", "uniform", "gaussian", "ld"]
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blank" => Ok(ModelType::Blank),
            "dirac" => Ok(ModelType::Dirac),
            "uniform" => Ok(ModelType::Uniform),
            "gaussian" => Ok(ModelType::Gaussian),
            "ld" => Ok(ModelType::Ld),
            _ => Err(format!(
                "Unknown model type '{}'; expected one of {}",
                s,
                ModelType::variants().join(", ")
            )),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ModelType::Blank => "blank",
            ModelType::Dirac => "dirac",
            ModelType::Uniform => "uniform",
            ModelType::Gaussian => "gaussian",
            ModelType::Ld => "ld",
        };
        write!(f, "{}", s)
    }
}

/// Everything needed to draw a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelSpec {
    pub kind: ModelType,
    /// Diameter (or FWHM for a Gaussian) in milliarcseconds.
    pub width: f64,
    /// Limb-darkening power-law exponent; only used by `ModelType::Ld`.
    pub ld_alpha: f64,
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec {
            kind: ModelType::Blank,
            width: 10.0,
            ld_alpha: 0.5,
        }
    }
}

impl GreyImage {
    /// Make a square image with a unit-flux model at its centre. The axes are
    /// labelled RA and DEC.
    pub fn centred_model(
        name: &str,
        naxis1: usize,
        pixelsize: f64,
        spec: &ModelSpec,
    ) -> Result<GreyImage, ImageError> {
        let mut img = GreyImage::new(name, naxis1, naxis1, pixelsize)?;
        img.set_ctype("RA", "DEC");

        let centre = naxis1 as f64 / 2.0;
        let width = spec.width / pixelsize;
        debug!(
            "Drawing a {} model at ({}, {}), width {} pixels",
            spec.kind, centre, centre, width
        );
        match spec.kind {
            ModelType::Blank => (),
            ModelType::Dirac => img.add_dirac(centre, centre, 1.0)?,
            ModelType::Uniform => img.add_uniform_disk(centre, centre, 1.0, width),
            ModelType::Gaussian => img.add_gaussian(centre, centre, 1.0, width),
            ModelType::Ld => img.add_ld_disk(centre, centre, 1.0, width, spec.ld_alpha)?,
        }
        Ok(img)
    }
}
