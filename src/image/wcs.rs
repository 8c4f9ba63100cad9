// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * A minimal two-axis, linear world coordinate system.
 */

use super::error::ImageError;
use crate::fits::{Header, Value};
use crate::MAS_TO_DEG;

/// WCS keywords for a 2D image. Index 0 is the first (fast) FITS axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Wcs {
    pub ctype: [String; 2],
    pub crpix: [f64; 2],
    pub crval: [f64; 2],
    /// Degrees per pixel.
    pub cdelt: [f64; 2],
    pub cunit: [String; 2],
}

impl Wcs {
    /// A WCS with square pixels of `pixelsize` milliarcseconds.
    pub fn new(pixelsize: f64) -> Wcs {
        let cdelt = pixelsize * MAS_TO_DEG;
        Wcs {
            ctype: [String::new(), String::new()],
            crpix: [0.0; 2],
            crval: [0.0; 2],
            cdelt: [cdelt, cdelt],
            cunit: ["deg".to_string(), "deg".to_string()],
        }
    }

    /// The pixel size in milliarcseconds.
    pub fn pixel_size(&self) -> f64 {
        self.cdelt[0] / MAS_TO_DEG
    }

    pub fn to_header(&self) -> Header {
        let mut header = Header::new();
        header.set("WCSAXES", 2);
        for i in 0..2 {
            let n = i + 1;
            if !self.ctype[i].is_empty() {
                header.set(format!("CTYPE{}", n), self.ctype[i].as_str());
            }
            header.set(format!("CRPIX{}", n), self.crpix[i]);
            header.set(format!("CRVAL{}", n), self.crval[i]);
            header.set(format!("CDELT{}", n), self.cdelt[i]);
            if !self.cunit[i].is_empty() {
                header.set(format!("CUNIT{}", n), self.cunit[i].as_str());
            }
        }
        header
    }

    /// Read the WCS from an image header. CDELT1 and CDELT2 must be present
    /// and equal; other keys default as in `Wcs::new`.
    pub fn from_header(header: &Header) -> Result<Wcs, ImageError> {
        let (cdelt1, cdelt2) = match (header.get_f64("CDELT1"), header.get_f64("CDELT2")) {
            (Some(c1), Some(c2)) => (c1, c2),
            _ => return Err(ImageError::MissingPixelSize),
        };
        if cdelt1 != cdelt2 {
            return Err(ImageError::NonSquarePixels { cdelt1, cdelt2 });
        }

        let mut wcs = Wcs::new(cdelt1 / MAS_TO_DEG);
        wcs.cdelt = [cdelt1, cdelt2];
        for i in 0..2 {
            let n = i + 1;
            if let Some(Value::Text(s)) = header.get(&format!("CTYPE{}", n)) {
                wcs.ctype[i] = s.clone();
            }
            if let Some(Value::Text(s)) = header.get(&format!("CUNIT{}", n)) {
                wcs.cunit[i] = s.clone();
            }
            if let Some(v) = header.get_f64(&format!("CRPIX{}", n)) {
                wcs.crpix[i] = v;
            }
            if let Some(v) = header.get_f64(&format!("CRVAL{}", n)) {
                wcs.crval[i] = v;
            }
        }
        Ok(wcs)
    }
}
