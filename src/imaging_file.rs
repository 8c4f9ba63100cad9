// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Create and edit input (and output) files for optical interferometry image
 * reconstruction.
 *
 * A file holds OIFITS data tables, the input parameters in a binary table
 * with no columns, an optional initial image (in the primary HDU) and an
 * optional prior image (in an image extension). Image reconstruction programs
 * add output parameters and a result image.
 */

use std::fmt;
use std::path::{Path, PathBuf};

use fitsio::FitsFile;
use log::{debug, trace, warn};
use thiserror::Error;

use crate::fits::{
    fits_delete_key, header::is_valid_keyword, is_commentary_keyword, read_header, write_header,
    Card, FitsError, HduList, Header, Value,
};
use crate::image::{GreyImage, ImageError};
use crate::params::{apply_default_comments, default_input_params, is_reserved, is_wcs};
use crate::schema::{check_param, ParamSet, SchemaError};
use crate::{INPUT_PARAM_NAME, OUTPUT_PARAM_NAME, PRIOR_IMG_NAME};

#[derive(Error, Debug)]
pub enum ImagingFileError {
    #[error("Not overwriting '{0}' as it already exists. Use --overwrite to replace it.")]
    FileExists(PathBuf),

    #[error("HDU '{0}' not found.")]
    MissingHdu(String),

    #[error("File has no initial image, so the image dimensions and pixel size are unknown")]
    NoInitialImage,

    #[error("'{0}' describes the structure of the file and can't be set as a parameter")]
    ReservedKeyword(String),

    #[error("'{0}' is not a valid FITS keyword")]
    BadKeyword(String),

    #[error("{0}")]
    Image(#[from] ImageError),

    #[error("{0}")]
    Fits(#[from] FitsError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// An error associated with fitsio.
    #[error("{0}")]
    Fitsio(#[from] fitsio::errors::Error),

    /// An IO error.
    #[error("{0}")]
    IO(#[from] std::io::Error),
}

/// An OIFITS table to be copied from another file.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTable {
    pub source: PathBuf,
    /// Zero-based position of the HDU in `source`.
    pub number: usize,
    pub extname: String,
}

#[derive(Clone, Debug)]
pub struct ImagingFile {
    /// Descriptive keywords from the OIFITS primary header.
    data_header: Header,
    data_tables: Vec<DataTable>,
    input_params: Header,
    output_params: Option<Header>,
    init_img: Option<GreyImage>,
    prior_img: Option<GreyImage>,
    /// The image named by the output parameter LAST_IMG.
    last_img: Option<GreyImage>,
}

impl Default for ImagingFile {
    fn default() -> Self {
        ImagingFile::new()
    }
}

impl ImagingFile {
    /// An imaging file with no data and the default input parameters.
    pub fn new() -> ImagingFile {
        ImagingFile {
            data_header: Header::new(),
            data_tables: vec![],
            input_params: default_input_params(),
            output_params: None,
            init_img: None,
            prior_img: None,
            last_img: None,
        }
    }

    /// Start an imaging file from an OIFITS file. The descriptive keywords
    /// of the primary header are kept, and all OI_* tables will be copied.
    pub fn from_data<T: AsRef<Path>>(path: T) -> Result<ImagingFile, ImagingFileError> {
        let path = path.as_ref();
        let mut fptr = FitsFile::open(path)?;
        let hdus = HduList::scan(&mut fptr)?;
        Ok(ImagingFile::from_hdus(path, &hdus))
    }

    fn from_hdus(path: &Path, hdus: &HduList) -> ImagingFile {
        let mut imaging_file = ImagingFile::new();
        if let Some(primary) = hdus.primary() {
            imaging_file.data_header = primary.header.clone();
            imaging_file
                .data_header
                .retain(|c| !is_reserved(&c.keyword) && !is_wcs(&c.keyword));
        }
        for entry in hdus.iter().skip(1) {
            if let Some(extname) = entry.extname() {
                if extname.trim().to_ascii_uppercase().starts_with("OI_") {
                    trace!("Found {} in HDU {}", extname, entry.number);
                    imaging_file.data_tables.push(DataTable {
                        source: path.to_path_buf(),
                        number: entry.number,
                        extname: extname.to_string(),
                    });
                }
            }
        }
        debug!(
            "{} OIFITS tables in {}",
            imaging_file.data_tables.len(),
            path.display()
        );
        imaging_file
    }

    /// Read an existing imaging input/output file.
    pub fn from_file<T: AsRef<Path>>(path: T) -> Result<ImagingFile, ImagingFileError> {
        let path = path.as_ref();
        let mut fptr = FitsFile::open(path)?;
        let hdus = HduList::scan(&mut fptr)?;
        let mut imaging_file = ImagingFile::from_hdus(path, &hdus);

        let input = hdus
            .find(INPUT_PARAM_NAME)
            .ok_or_else(|| ImagingFileError::MissingHdu(INPUT_PARAM_NAME.to_string()))?;
        imaging_file.input_params = param_cards(&input.header);
        imaging_file.output_params = hdus
            .find(OUTPUT_PARAM_NAME)
            .map(|e| param_cards(&e.header));

        imaging_file.init_img =
            read_optional_image(&mut fptr, &hdus, INPUT_PARAM_NAME, "INIT_IMG")?;
        imaging_file.prior_img =
            read_optional_image(&mut fptr, &hdus, INPUT_PARAM_NAME, "RGL_PRIO")?;
        if imaging_file.output_params.is_some() {
            imaging_file.last_img =
                read_optional_image(&mut fptr, &hdus, OUTPUT_PARAM_NAME, "LAST_IMG")?;
        }
        Ok(imaging_file)
    }

    pub fn data_header(&self) -> &Header {
        &self.data_header
    }

    pub fn data_tables(&self) -> &[DataTable] {
        &self.data_tables
    }

    pub fn input_params(&self) -> &Header {
        &self.input_params
    }

    pub fn output_params(&self) -> Option<&Header> {
        self.output_params.as_ref()
    }

    /// Set an input parameter, checking the type of known parameters.
    /// HISTORY and COMMENT add a commentary card with `value` as its text.
    pub fn set_input_param(&mut self, keyword: &str, value: Value) -> Result<(), ImagingFileError> {
        if !is_valid_keyword(keyword) {
            return Err(ImagingFileError::BadKeyword(keyword.to_string()));
        }
        if is_reserved(keyword) {
            return Err(ImagingFileError::ReservedKeyword(keyword.to_string()));
        }
        if is_commentary_keyword(keyword) {
            self.input_params
                .push(Card::commentary(keyword, value.to_string()));
            return Ok(());
        }
        check_param(ParamSet::Input, keyword, &value)?;
        self.input_params.set(keyword, value);
        Ok(())
    }

    pub fn init_img(&self) -> Option<&GreyImage> {
        self.init_img.as_ref()
    }

    pub fn init_img_mut(&mut self) -> Option<&mut GreyImage> {
        self.init_img.as_mut()
    }

    pub fn prior_img(&self) -> Option<&GreyImage> {
        self.prior_img.as_ref()
    }

    pub fn prior_img_mut(&mut self) -> Option<&mut GreyImage> {
        self.prior_img.as_mut()
    }

    /// The final image of a reconstruction, if this is an output file.
    pub fn last_img(&self) -> Option<&GreyImage> {
        self.last_img.as_ref()
    }

    /// Set the initial image, and point INIT_IMG at it.
    pub fn set_init_img(&mut self, img: GreyImage) {
        self.input_params.set("INIT_IMG", img.name.as_str());
        self.init_img = Some(img);
    }

    /// Set the prior image, and point RGL_PRIO at it.
    pub fn set_prior_img(&mut self, img: GreyImage) {
        self.input_params.set("RGL_PRIO", img.name.as_str());
        self.prior_img = Some(img);
    }

    /// Get the prior image, making one with the initial image's geometry if
    /// there isn't one yet.
    pub fn prior_img_or_from_init(&mut self) -> Result<&mut GreyImage, ImagingFileError> {
        if self.prior_img.is_none() {
            let mut prior = self
                .init_img
                .clone()
                .ok_or(ImagingFileError::NoInitialImage)?;
            prior.name = PRIOR_IMG_NAME.to_string();
            debug!(
                "Making a {}x{} prior image from the initial image",
                prior.naxis1(),
                prior.naxis2()
            );
            self.set_prior_img(prior);
        }
        self.prior_img
            .as_mut()
            .ok_or(ImagingFileError::NoInitialImage)
    }

    /// Write everything to `path`. Standard parameters without a comment get
    /// the standard one.
    ///
    /// The file is first written to a scratch directory next to `path` and
    /// then moved into place, so `path` may also be where this object was
    /// read from.
    pub fn write_to<T: AsRef<Path>>(
        &mut self,
        path: T,
        overwrite: bool,
    ) -> Result<(), ImagingFileError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(ImagingFileError::FileExists(path.to_path_buf()));
        }
        apply_default_comments(&mut self.input_params, ParamSet::Input);
        if let Some(output) = self.output_params.as_mut() {
            apply_default_comments(output, ParamSet::Output);
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".oi-imaging")
            .tempdir_in(parent)?;
        let file_name = path
            .file_name()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))?;
        let staged = staging.path().join(file_name);
        trace!("Writing to staging file {}", staged.display());
        self.write_new(&staged)?;

        std::fs::rename(&staged, path)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    /// Write to a file that doesn't exist yet.
    fn write_new(&self, path: &Path) -> Result<(), ImagingFileError> {
        let mut fptr = match &self.init_img {
            Some(img) => img.write_primary(path, false)?,
            None => FitsFile::create(path).open()?,
        };

        let primary = fptr.primary_hdu()?;
        fits_delete_key(&mut fptr, &primary, "EXTNAME")?;
        let existing = read_header(&mut fptr, &primary)?;
        // Only checking for conflicts; the image keys are already written.
        Header::merge(&[&existing, &self.data_header])?;
        write_header(&mut fptr, &primary, &self.data_header)?;

        if let Some(img) = &self.prior_img {
            img.write_extension(&mut fptr)?;
        }
        if let Some(img) = &self.last_img {
            let written = [self.init_img.as_ref(), self.prior_img.as_ref()]
                .iter()
                .flatten()
                .any(|i| i.name == img.name);
            if !written {
                img.write_extension(&mut fptr)?;
            }
        }

        for table in &self.data_tables {
            trace!(
                "Copying {} from {} HDU {}",
                table.extname,
                table.source.display(),
                table.number
            );
            let mut src = FitsFile::open(&table.source)?;
            let hdu = src.hdu(table.number)?;
            hdu.copy_to(&mut src, &mut fptr)?;
        }

        let hdu = fptr.create_table(INPUT_PARAM_NAME, &[])?;
        write_header(&mut fptr, &hdu, &self.input_params)?;
        if let Some(output) = &self.output_params {
            let hdu = fptr.create_table(OUTPUT_PARAM_NAME, &[])?;
            write_header(&mut fptr, &hdu, output)?;
        }
        Ok(())
    }
}

/// The cards of a parameter HDU header that are parameters.
fn param_cards(header: &Header) -> Header {
    let mut params = header.clone();
    params.retain(|c| !is_reserved(&c.keyword));
    params
}

/// Read the image named by a parameter, if there is one. A reference to a HDU
/// that doesn't exist is ignored.
fn read_optional_image(
    fptr: &mut FitsFile,
    hdus: &HduList,
    param_hdu: &str,
    keyword: &str,
) -> Result<Option<GreyImage>, ImagingFileError> {
    match GreyImage::from_param(fptr, hdus, param_hdu, keyword) {
        Ok(img) => Ok(Some(img)),
        Err(ImageError::MissingParam(_)) => Ok(None),
        Err(ImageError::MissingHdu(name)) => {
            warn!("{} refers to HDU '{}', which doesn't exist; ignoring", keyword, name);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn fmt_params(f: &mut fmt::Formatter, name: &str, params: &Header) -> fmt::Result {
    writeln!(f, "=== {} ===", name)?;
    for card in params.cards() {
        if card.is_commentary() || is_reserved(&card.keyword) {
            continue;
        }
        writeln!(f, "{:<8} = {}", card.keyword, card.value)?;
    }
    writeln!(f, "---")
}

impl fmt::Display for ImagingFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_params(f, INPUT_PARAM_NAME, &self.input_params)?;
        if let Some(output) = &self.output_params {
            fmt_params(f, OUTPUT_PARAM_NAME, output)?;
        }
        Ok(())
    }
}
