// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpers shared by the command-line tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fitsio::tables::{ColumnDataType, ColumnDescription, ConcreteColumnDescription};
use fitsio::FitsFile;
use tempfile::{tempdir, TempDir};

use oi_imaging::fits::{write_header, Header};

fn column(name: &str, data_type: ColumnDataType, repeat: usize) -> ConcreteColumnDescription {
    ColumnDescription::new(name)
        .with_type(data_type)
        .that_repeats(repeat)
        .create()
        .unwrap()
}

/// Write a small OIFITS file with target, wavelength and squared visibility
/// tables.
pub fn write_oifits(path: &Path) {
    let mut fptr = FitsFile::create(path).open().unwrap();
    let primary = fptr.primary_hdu().unwrap();
    let mut header = Header::new();
    header.set("TELESCOP", "CHARA");
    header.set("INSTRUME", "MIRC");
    header.set("OBJECT", "Bin_Ary");
    write_header(&mut fptr, &primary, &header).unwrap();

    let hdu = fptr
        .create_table(
            "OI_TARGET",
            &[
                column("TARGET_ID", ColumnDataType::Int, 1),
                column("TARGET", ColumnDataType::String, 16),
                column("RAEP0", ColumnDataType::Double, 1),
                column("DECEP0", ColumnDataType::Double, 1),
                column("EQUINOX", ColumnDataType::Float, 1),
            ],
        )
        .unwrap();
    hdu.write_col(&mut fptr, "TARGET_ID", &[1i32]).unwrap();
    hdu.write_col(&mut fptr, "TARGET", &["Bin_Ary".to_string()])
        .unwrap();
    hdu.write_col(&mut fptr, "RAEP0", &[253.5f64]).unwrap();
    hdu.write_col(&mut fptr, "DECEP0", &[-35.2f64]).unwrap();
    hdu.write_col(&mut fptr, "EQUINOX", &[2000.0f32]).unwrap();

    let hdu = fptr
        .create_table(
            "OI_WAVELENGTH",
            &[
                column("EFF_WAVE", ColumnDataType::Float, 1),
                column("EFF_BAND", ColumnDataType::Float, 1),
            ],
        )
        .unwrap();
    let mut header = Header::new();
    header.set("INSNAME", "MIRC_H");
    write_header(&mut fptr, &hdu, &header).unwrap();
    hdu.write_col(&mut fptr, "EFF_WAVE", &[1.5e-6f32, 1.6e-6, 1.7e-6])
        .unwrap();
    hdu.write_col(&mut fptr, "EFF_BAND", &[0.1e-6f32, 0.1e-6, 0.1e-6])
        .unwrap();

    let hdu = fptr
        .create_table(
            "OI_VIS2",
            &[
                column("TARGET_ID", ColumnDataType::Int, 1),
                column("TIME", ColumnDataType::Double, 1),
                column("MJD", ColumnDataType::Double, 1),
                column("INT_TIME", ColumnDataType::Double, 1),
                column("VIS2DATA", ColumnDataType::Double, 3),
                column("VIS2ERR", ColumnDataType::Double, 3),
                column("UCOORD", ColumnDataType::Double, 1),
                column("VCOORD", ColumnDataType::Double, 1),
                column("STA_INDEX", ColumnDataType::Int, 2),
                column("FLAG", ColumnDataType::Logical, 3),
            ],
        )
        .unwrap();
    hdu.write_col(&mut fptr, "TARGET_ID", &[1i32, 1]).unwrap();
    hdu.write_col(&mut fptr, "MJD", &[56000.1f64, 56000.2])
        .unwrap();
}

/// A scratch directory holding "data.oifits".
pub fn oifits_in_tempdir() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.oifits");
    write_oifits(&path);
    (dir, path)
}
