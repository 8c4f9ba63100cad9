// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * A summary of all HDUs in a FITS file, with lookup by position, EXTNAME or
 * HDUNAME.
 *
 * The image reconstruction interface standard refers to images by their
 * HDUNAME, which (unlike EXTNAME) is also allowed in the primary header.
 */

use std::iter::FromIterator;

use fitsio::{
    hdu::{FitsHdu, HduInfo},
    FitsFile,
};

use super::{error::FitsError, header::Header, read_header};

#[derive(Clone, Debug, PartialEq)]
pub enum HduKind {
    /// `shape` is in row-major order, i.e. `[NAXIS2, NAXIS1]` for a 2D image.
    Image { shape: Vec<usize> },
    Table { columns: Vec<String>, num_rows: usize },
    Other,
}

#[derive(Clone, Debug)]
pub struct HduEntry {
    /// The zero-based position of the HDU in the file.
    pub number: usize,
    pub header: Header,
    pub kind: HduKind,
}

impl HduEntry {
    pub fn extname(&self) -> Option<&str> {
        self.header.get_str("EXTNAME")
    }

    pub fn extver(&self) -> Option<i64> {
        self.header.get_i64("EXTVER")
    }

    pub fn hduname(&self) -> Option<&str> {
        self.header.get_str("HDUNAME")
    }

    pub fn hduver(&self) -> Option<i64> {
        self.header.get_i64("HDUVER")
    }

    /// A name to use in messages; HDUNAME, then EXTNAME, then the position.
    pub fn label(&self) -> String {
        match (self.hduname(), self.extname()) {
            (Some(n), _) | (None, Some(n)) => n.to_string(),
            (None, None) => format!("HDU {}", self.number),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, HduKind::Image { .. })
    }

    pub fn is_binary_table(&self) -> bool {
        matches!(self.kind, HduKind::Table { .. })
            && self.header.get_str("XTENSION") == Some("BINTABLE")
    }

    pub fn columns(&self) -> &[String] {
        match &self.kind {
            HduKind::Table { columns, .. } => columns,
            _ => &[],
        }
    }

    /// Move `fptr` to this HDU.
    pub fn open(&self, fptr: &mut FitsFile) -> Result<FitsHdu, FitsError> {
        Ok(fptr.hdu(self.number)?)
    }

    fn matches_extname(&self, name: &str) -> bool {
        self.extname()
            .map_or(false, |e| e.trim().eq_ignore_ascii_case(name.trim()))
    }

    fn matches_hduname(&self, name: &str) -> bool {
        self.hduname().map_or(false, |h| h == name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct HduList {
    entries: Vec<HduEntry>,
}

impl FromIterator<HduEntry> for HduList {
    fn from_iter<I: IntoIterator<Item = HduEntry>>(iter: I) -> Self {
        HduList {
            entries: iter.into_iter().collect(),
        }
    }
}

impl HduList {
    /// Read the header and type of every HDU in the file.
    pub fn scan(fptr: &mut FitsFile) -> Result<HduList, FitsError> {
        let num_hdus = fptr.num_hdus()?;
        let mut entries = Vec::with_capacity(num_hdus);
        for number in 0..num_hdus {
            let hdu = fptr.hdu(number)?;
            let header = read_header(fptr, &hdu)?;
            let kind = match &hdu.info {
                HduInfo::ImageInfo { shape, .. } => HduKind::Image {
                    shape: shape.clone(),
                },
                HduInfo::TableInfo {
                    column_descriptions,
                    num_rows,
                } => HduKind::Table {
                    columns: column_descriptions
                        .iter()
                        .map(|c| c.name.clone())
                        .collect(),
                    num_rows: *num_rows,
                },
                HduInfo::AnyInfo => HduKind::Other,
            };
            entries.push(HduEntry {
                number,
                header,
                kind,
            });
        }
        Ok(HduList { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HduEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HduEntry> {
        self.entries.get(index)
    }

    pub fn primary(&self) -> Option<&HduEntry> {
        self.entries.first()
    }

    /// Find a HDU by EXTNAME (case insensitive) or, failing that, HDUNAME.
    pub fn find(&self, name: &str) -> Option<&HduEntry> {
        self.entries
            .iter()
            .find(|e| e.matches_extname(name))
            .or_else(|| self.entries.iter().find(|e| e.matches_hduname(name)))
    }

    /// Find a HDU by (EXTNAME, EXTVER) or, failing that, (HDUNAME, HDUVER).
    pub fn find_versioned(&self, name: &str, ver: i64) -> Option<&HduEntry> {
        self.entries
            .iter()
            .find(|e| e.matches_extname(name) && e.extver() == Some(ver))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.matches_hduname(name) && e.hduver() == Some(ver))
            })
    }
}
