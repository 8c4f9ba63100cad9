// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use anyhow::{bail, ensure};
use log::{info, LevelFilter};
use structopt::{clap::AppSettings, StructOpt};

use oi_imaging::fits::{write_header, Card, Header};
use oi_imaging::image::{GreyImage, ModelSpec, ModelType};
use oi_imaging::time::fits_date_now;
use oi_imaging::INIT_IMG_NAME;

/// Generate a simple model image, e.g. to use as an initial image for OI image
/// reconstruction
#[derive(StructOpt, Debug)]
#[structopt(name = "imgen", global_settings = &[AppSettings::ColoredHelp, AppSettings::ArgRequiredElseHelp])]
struct Args {
    /// Overwrite an existing file.
    #[structopt(short, long)]
    overwrite: bool,

    /// The FITS image to create.
    #[structopt(name = "IMAGEFILE", parse(from_os_str))]
    imagefile: PathBuf,

    /// Image dimension (NAXIS2 == NAXIS1).
    #[structopt(name = "NAXIS1")]
    naxis1: usize,

    /// Pixel size [mas].
    #[structopt(name = "PIXELSIZE")]
    pixelsize: f64,

    /// Image model type.
    #[structopt(short = "t", long, default_value = "blank", possible_values = ModelType::variants(), case_insensitive = true)]
    model_type: ModelType,

    /// Model width [mas]. This is the diameter of a disk, or the FWHM of a
    /// Gaussian.
    #[structopt(short = "w", long, default_value = "10.0")]
    model_width: f64,

    /// Limb-darkening power-law exponent for the "ld" model.
    #[structopt(long, default_value = "0.5")]
    ld_alpha: f64,

    /// More log output. RUST_LOG overrides this.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::from_args();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if !args.overwrite && args.imagefile.exists() {
        bail!(
            "Not creating '{}' as it already exists.",
            args.imagefile.display()
        );
    }
    ensure!(args.naxis1 > 0, "NAXIS1 must be positive");
    ensure!(
        args.pixelsize > 0.0,
        "PIXELSIZE must be positive, but got {}",
        args.pixelsize
    );
    ensure!(
        args.model_width > 0.0,
        "The model width must be positive, but got {}",
        args.model_width
    );
    ensure!(
        args.ld_alpha >= 0.0 && args.ld_alpha.is_finite(),
        "The limb-darkening exponent must be finite and not negative, but got {}",
        args.ld_alpha
    );

    let spec = ModelSpec {
        kind: args.model_type,
        width: args.model_width,
        ld_alpha: args.ld_alpha,
    };
    let img = GreyImage::centred_model(INIT_IMG_NAME, args.naxis1, args.pixelsize, &spec)?;
    let mut fptr = img.write_primary(&args.imagefile, args.overwrite)?;

    let mut header = Header::new();
    header.set("DATE", fits_date_now());
    header.push(Card::commentary(
        "COMMENT",
        format!("Created by imgen {}", env!("CARGO_PKG_VERSION")),
    ));
    let hdu = fptr.primary_hdu()?;
    write_header(&mut fptr, &hdu, &header)?;
    info!(
        "Wrote a {}x{} {} model to {}",
        args.naxis1,
        args.naxis1,
        args.model_type,
        args.imagefile.display()
    );

    Ok(())
}
