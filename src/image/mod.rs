// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Greyscale images used as initial, prior or result images for OI image
 * reconstruction.
 */

pub mod error;
pub mod model;
pub mod wcs;

use std::f64::consts::{LN_2, PI};
use std::path::Path;

use fitsio::{
    hdu::{FitsHdu, HduInfo},
    images::{ImageDescription, ImageType},
    FitsFile,
};
use log::{debug, trace};
use ndarray::Array2;

use crate::fits::{fits_delete_key, write_header, HduEntry, HduKind, HduList, Header};
pub use error::ImageError;
pub use model::{ModelSpec, ModelType};
pub use wcs::Wcs;

/// A greyscale image with square pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct GreyImage {
    /// Name of the image, written as the HDUNAME keyword.
    pub name: String,
    /// Pixel data. The axes are (slow, fast), i.e. (NAXIS2, NAXIS1).
    image: Array2<f64>,
    wcs: Wcs,
}

impl GreyImage {
    /// A blank `naxis1` by `naxis2` image with `pixelsize` milliarcsecond
    /// pixels.
    pub fn new(
        name: &str,
        naxis1: usize,
        naxis2: usize,
        pixelsize: f64,
    ) -> Result<GreyImage, ImageError> {
        for &n in &[naxis1, naxis2] {
            if n == 0 {
                return Err(ImageError::BadDimension(n));
            }
        }
        Ok(GreyImage {
            name: name.to_string(),
            image: Array2::zeros((naxis2, naxis1)),
            wcs: Wcs::new(pixelsize),
        })
    }

    pub fn naxis1(&self) -> usize {
        self.image.ncols()
    }

    pub fn naxis2(&self) -> usize {
        self.image.nrows()
    }

    /// The pixel size in milliarcseconds.
    pub fn pixel_size(&self) -> f64 {
        self.wcs.pixel_size()
    }

    pub fn is_square(&self) -> bool {
        self.naxis1() == self.naxis2()
    }

    pub fn image(&self) -> &Array2<f64> {
        &self.image
    }

    /// Replace the pixel data. The new data must have the same dimensions.
    pub fn set_image(&mut self, data: Array2<f64>) -> Result<(), ImageError> {
        if data.dim() != self.image.dim() {
            return Err(ImageError::ShapeMismatch {
                expected: self.image.dim(),
                got: data.dim(),
            });
        }
        self.image = data;
        Ok(())
    }

    pub fn wcs(&self) -> &Wcs {
        &self.wcs
    }

    pub fn wcs_mut(&mut self) -> &mut Wcs {
        &mut self.wcs
    }

    pub fn set_ctype(&mut self, ctype1: &str, ctype2: &str) {
        self.wcs.ctype = [ctype1.to_string(), ctype2.to_string()];
    }

    /// Scale the image to unit sum. A zero-sum image is left alone.
    pub fn normalise(&mut self) {
        let total = self.image.sum();
        if total.abs() > 0.0 {
            self.image /= total;
        }
    }

    /// Add a delta function to the pixel nearest (`x`, `y`). Positions are
    /// in pixels along the first (fast) and second (slow) FITS axes.
    pub fn add_dirac(&mut self, x: f64, y: f64, flux: f64) -> Result<(), ImageError> {
        let (ix, iy) = (x.round_ties_even(), y.round_ties_even());
        if ix < 0.0 || iy < 0.0 || ix >= self.naxis1() as f64 || iy >= self.naxis2() as f64 {
            return Err(ImageError::OutOfBounds {
                x,
                y,
                naxis1: self.naxis1(),
                naxis2: self.naxis2(),
            });
        }
        self.image[[iy as usize, ix as usize]] += flux;
        Ok(())
    }

    /// Add a circular uniform disk of `diameter` pixels.
    pub fn add_uniform_disk(&mut self, x: f64, y: f64, flux: f64, diameter: f64) {
        let radius = diameter / 2.0;
        let intensity = flux / (PI * radius * radius);
        for ((iy, ix), p) in self.image.indexed_iter_mut() {
            let r = (ix as f64 - x).hypot(iy as f64 - y);
            if r <= radius {
                *p += intensity;
            }
        }
    }

    /// Add a circular Gaussian with a full width at half maximum of `fwhm`
    /// pixels. `flux` is the integral to infinite limits.
    pub fn add_gaussian(&mut self, x: f64, y: f64, flux: f64, fwhm: f64) {
        let fwhm_sq = fwhm * fwhm;
        let peak = flux * 4.0 * LN_2 / (PI * fwhm_sq);
        for ((iy, ix), p) in self.image.indexed_iter_mut() {
            let r_sq = (ix as f64 - x).powi(2) + (iy as f64 - y).powi(2);
            *p += peak * (-4.0 * LN_2 * r_sq / fwhm_sq).exp();
        }
    }

    /// Add a power-law limb-darkened disk (Hestroffer 1997), I(mu) =
    /// mu^alpha, scaled so that the added pixels sum to `flux`. A disk too
    /// small to cover any pixel centre becomes a delta function.
    pub fn add_ld_disk(
        &mut self,
        x: f64,
        y: f64,
        flux: f64,
        diameter: f64,
        alpha: f64,
    ) -> Result<(), ImageError> {
        // mu is zero on the limb, so a negative exponent blows up there.
        if !(alpha >= 0.0 && alpha.is_finite()) {
            return Err(ImageError::BadLdAlpha(alpha));
        }
        let radius = diameter / 2.0;
        let mut profile = Array2::<f64>::zeros(self.image.dim());
        for ((iy, ix), p) in profile.indexed_iter_mut() {
            let r = (ix as f64 - x).hypot(iy as f64 - y);
            if r <= radius {
                let mu = (1.0 - (r / radius).powi(2)).sqrt();
                *p = mu.powf(alpha);
            }
        }

        let total = profile.sum();
        if total > 0.0 {
            self.image.scaled_add(flux / total, &profile);
            Ok(())
        } else {
            debug!("Limb-darkened disk covers no pixels; adding a point instead");
            self.add_dirac(x, y, flux)
        }
    }

    /// The header keys describing this image. EXTNAME is not allowed in a
    /// primary header, so it's only added for extensions.
    pub fn header(&self, extension: bool) -> Header {
        let mut header = self.wcs.to_header();
        header.set("HDUNAME", self.name.as_str());
        if extension {
            header.set("EXTNAME", self.name.as_str());
        }
        header
    }

    /// The dimensions in the order rust-fitsio wants them: (NAXIS2, NAXIS1).
    pub fn dimensions(&self) -> [usize; 2] {
        [self.naxis2(), self.naxis1()]
    }

    /// Write the pixels and header keys into an existing image HDU.
    pub fn write_data(
        &self,
        fptr: &mut FitsFile,
        hdu: &FitsHdu,
        extension: bool,
    ) -> Result<(), ImageError> {
        // `iter` walks in logical order, which is the FITS order regardless of
        // the array's memory layout.
        let pixels: Vec<f64> = self.image.iter().copied().collect();
        hdu.write_image(fptr, &pixels)?;
        write_header(fptr, hdu, &self.header(extension))?;
        Ok(())
    }

    /// Add this image to the end of `fptr` as an image extension.
    pub fn write_extension(&self, fptr: &mut FitsFile) -> Result<(), ImageError> {
        let dimensions = self.dimensions();
        let image_description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &dimensions,
        };
        let hdu = fptr.create_image(self.name.clone(), &image_description)?;
        self.write_data(fptr, &hdu, true)
    }

    /// Create a new FITS file with this image as its primary HDU. The open
    /// file is returned so that more keys can be added.
    pub fn write_primary<T: AsRef<Path>>(
        &self,
        path: T,
        overwrite: bool,
    ) -> Result<FitsFile, ImageError> {
        let path = path.as_ref();
        if path.exists() {
            if !overwrite {
                return Err(ImageError::FileExists(path.to_path_buf()));
            }
            trace!("file {} exists, deleting", path.display());
            std::fs::remove_file(path)?;
        }

        let dimensions = self.dimensions();
        let image_description = ImageDescription {
            data_type: ImageType::Double,
            dimensions: &dimensions,
        };
        let mut fptr = FitsFile::create(path)
            .with_custom_primary(&image_description)
            .open()?;
        let hdu = fptr.primary_hdu()?;
        // rust-fitsio names every primary it creates.
        fits_delete_key(&mut fptr, &hdu, "EXTNAME")?;
        self.write_data(&mut fptr, &hdu, false)?;
        Ok(fptr)
    }

    /// Read an image from a scanned image HDU. The name comes from HDUNAME,
    /// falling back to EXTNAME.
    pub fn from_hdu(fptr: &mut FitsFile, entry: &HduEntry) -> Result<GreyImage, ImageError> {
        let (naxis2, naxis1) = match &entry.kind {
            HduKind::Image { shape } => image_dims(shape, &entry.label())?,
            _ => return Err(ImageError::NotAnImage(entry.label())),
        };
        let wcs = Wcs::from_header(&entry.header)?;
        let hdu = entry.open(fptr)?;
        let pixels: Vec<f64> = hdu.read_image(fptr)?;
        let image = Array2::from_shape_vec((naxis2, naxis1), pixels)?;
        let name = entry
            .hduname()
            .or_else(|| entry.extname())
            .unwrap_or("")
            .to_string();
        debug!(
            "Read {}x{} image '{}' from HDU {}",
            naxis1, naxis2, name, entry.number
        );
        Ok(GreyImage { name, image, wcs })
    }

    /// Follow the parameter `keyword` in the parameter HDU `param_hdu` (e.g.
    /// INIT_IMG in the input parameters) to the image it names.
    pub fn from_param(
        fptr: &mut FitsFile,
        hdus: &HduList,
        param_hdu: &str,
        keyword: &str,
    ) -> Result<GreyImage, ImageError> {
        let params = hdus
            .find(param_hdu)
            .ok_or_else(|| ImageError::MissingHdu(param_hdu.to_string()))?;
        let name = params
            .header
            .get_str(keyword)
            .ok_or_else(|| ImageError::MissingParam(keyword.to_string()))?;
        let entry = hdus
            .find(name)
            .ok_or_else(|| ImageError::MissingHdu(name.to_string()))?;
        GreyImage::from_hdu(fptr, entry)
    }

    /// Read the image referenced by `keyword` from an image reconstruction
    /// input/output file. Use `INPUT_PARAM_NAME` with INIT_IMG or RGL_PRIO,
    /// and `OUTPUT_PARAM_NAME` with LAST_IMG.
    pub fn from_imaging_file<T: AsRef<Path>>(
        path: T,
        param_hdu: &str,
        keyword: &str,
    ) -> Result<GreyImage, ImageError> {
        let mut fptr = FitsFile::open(path.as_ref())?;
        let hdus = HduList::scan(&mut fptr)?;
        GreyImage::from_param(&mut fptr, &hdus, param_hdu, keyword)
    }
}

/// Read the pixels from the primary HDU of a FITS file.
pub fn read_primary_pixels<T: AsRef<Path>>(path: T) -> Result<Array2<f64>, ImageError> {
    let path = path.as_ref();
    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.primary_hdu()?;
    let (naxis2, naxis1) = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } => image_dims(shape, &path.display().to_string())?,
        _ => return Err(ImageError::NotAnImage(path.display().to_string())),
    };
    let pixels: Vec<f64> = hdu.read_image(&mut fptr)?;
    Ok(Array2::from_shape_vec((naxis2, naxis1), pixels)?)
}

/// Get (NAXIS2, NAXIS1) from a rust-fitsio image shape. Degenerate leading
/// axes (e.g. a single-plane cube) are allowed.
pub(crate) fn image_dims(shape: &[usize], name: &str) -> Result<(usize, usize), ImageError> {
    let naxis = shape.len();
    if naxis < 2 || shape[..naxis - 2].iter().any(|&n| n != 1) {
        return Err(ImageError::NotTwoDimensional {
            name: name.to_string(),
            naxis,
        });
    }
    Ok((shape[naxis - 2], shape[naxis - 1]))
}
