// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context};
use log::{info, LevelFilter};
use structopt::{clap::AppSettings, StructOpt};

use oi_imaging::fits::parse_keyword_arg;
use oi_imaging::image::{read_primary_pixels, GreyImage, ModelSpec, ModelType};
use oi_imaging::imaging_file::ImagingFile;
use oi_imaging::schema::validate_file;
use oi_imaging::INIT_IMG_NAME;

/// Manage OI image reconstruction input files
#[derive(StructOpt, Debug)]
#[structopt(name = "image-oi-tool", global_settings = &[AppSettings::ColoredHelp, AppSettings::ArgRequiredElseHelp])]
struct Args {
    /// More log output. Use twice for debug messages, three times for
    /// everything. RUST_LOG overrides this.
    #[structopt(short, long, parse(from_occurrences), global = true)]
    verbose: u8,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Debug)]
enum Command {
    /// Create a new imaging input file from OIFITS data
    Create {
        /// Overwrite an existing file.
        #[structopt(short, long)]
        overwrite: bool,

        /// The OIFITS data file.
        #[structopt(name = "DATAFILE", parse(from_os_str))]
        datafile: PathBuf,

        /// The FITS file to create.
        #[structopt(name = "INPUTFILE", parse(from_os_str))]
        inputfile: PathBuf,

        /// Image dimension (NAXIS2 == NAXIS1).
        #[structopt(name = "NAXIS1")]
        naxis1: usize,

        /// Pixel size [mas].
        #[structopt(name = "PIXELSIZE")]
        pixelsize: f64,

        #[structopt(flatten)]
        model: ModelArgs,

        /// Initial parameter values, e.g. MAXITER=200.
        #[structopt(name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Copy the initial image from the primary HDU of a FITS file
    ///
    /// The existing WCS of the initial image is kept; any WCS in the image
    /// file is ignored.
    Copyinit {
        /// The imaging input file to modify.
        #[structopt(name = "INPUTFILE", parse(from_os_str))]
        inputfile: PathBuf,

        /// FITS file with the image in its primary HDU.
        #[structopt(name = "IMAGEFILE", parse(from_os_str))]
        imagefile: PathBuf,
    },

    /// Copy the prior image from the primary HDU of a FITS file
    ///
    /// The prior image takes the WCS of the existing prior image, or the
    /// initial image if there isn't one yet.
    Copyprior {
        /// The imaging input file to modify.
        #[structopt(name = "INPUTFILE", parse(from_os_str))]
        inputfile: PathBuf,

        /// FITS file with the image in its primary HDU.
        #[structopt(name = "IMAGEFILE", parse(from_os_str))]
        imagefile: PathBuf,
    },

    /// Edit the input parameters of an existing file
    Edit {
        /// The imaging input file to modify.
        #[structopt(name = "INPUTFILE", parse(from_os_str))]
        inputfile: PathBuf,

        /// Replacement parameter values, e.g. MAXITER=200.
        #[structopt(name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// List the parameters in an imaging input/output file
    Show {
        #[structopt(name = "INPUTFILE", parse(from_os_str))]
        inputfile: PathBuf,
    },

    /// Check that an imaging input/output file is well formed
    Validate {
        #[structopt(name = "INPUTFILE", parse(from_os_str))]
        inputfile: PathBuf,
    },
}

#[derive(StructOpt, Debug)]
struct ModelArgs {
    /// Initial image model type.
    #[structopt(short = "t", long, default_value = "blank", possible_values = ModelType::variants(), case_insensitive = true)]
    model_type: ModelType,

    /// Initial image model width [mas].
    #[structopt(short = "w", long, default_value = "10.0")]
    model_width: f64,

    /// Limb-darkening power-law exponent for the "ld" model.
    #[structopt(long, default_value = "0.5")]
    ld_alpha: f64,
}

impl From<&ModelArgs> for ModelSpec {
    fn from(m: &ModelArgs) -> ModelSpec {
        ModelSpec {
            kind: m.model_type,
            width: m.model_width,
            ld_alpha: m.ld_alpha,
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Set each "KEY=VALUE" argument as an input parameter.
fn set_params(imaging_file: &mut ImagingFile, params: &[String]) -> Result<(), anyhow::Error> {
    for arg in params {
        let (keyword, value) = parse_keyword_arg(arg)?;
        info!("Setting {} = {}", keyword, value);
        imaging_file
            .set_input_param(&keyword, value)
            .with_context(|| format!("Couldn't set '{}'", arg))?;
    }
    Ok(())
}

fn create(
    datafile: &Path,
    inputfile: &Path,
    overwrite: bool,
    naxis1: usize,
    pixelsize: f64,
    model: &ModelSpec,
    params: &[String],
) -> Result<(), anyhow::Error> {
    if !overwrite && inputfile.exists() {
        bail!("Not creating '{}' as it already exists.", inputfile.display());
    }
    ensure!(naxis1 > 0, "NAXIS1 must be positive");
    ensure!(
        pixelsize > 0.0,
        "PIXELSIZE must be positive, but got {}",
        pixelsize
    );
    ensure!(
        model.width > 0.0,
        "The model width must be positive, but got {}",
        model.width
    );
    ensure!(
        model.ld_alpha >= 0.0 && model.ld_alpha.is_finite(),
        "The limb-darkening exponent must be finite and not negative, but got {}",
        model.ld_alpha
    );

    let mut result = ImagingFile::from_data(datafile)
        .with_context(|| format!("Couldn't read OIFITS data from '{}'", datafile.display()))?;
    set_params(&mut result, params)?;
    result.set_init_img(GreyImage::centred_model(
        INIT_IMG_NAME,
        naxis1,
        pixelsize,
        model,
    )?);
    result.write_to(inputfile, overwrite)?;
    info!("Created {}", inputfile.display());
    Ok(())
}

fn copyinit(inputfile: &Path, imagefile: &Path) -> Result<(), anyhow::Error> {
    let mut result = ImagingFile::from_file(inputfile)?;
    let pixels = read_primary_pixels(imagefile)?;
    let img = match result.init_img_mut() {
        Some(img) => img,
        None => bail!(
            "Input file '{}' is missing an initial image, hence the pixel size is not defined",
            inputfile.display()
        ),
    };
    img.set_image(pixels)?;
    img.normalise();
    result.write_to(inputfile, true)?;
    Ok(())
}

fn copyprior(inputfile: &Path, imagefile: &Path) -> Result<(), anyhow::Error> {
    let mut result = ImagingFile::from_file(inputfile)?;
    let pixels = read_primary_pixels(imagefile)?;
    if result.prior_img().is_none() && result.init_img().is_none() {
        bail!(
            "Input file '{}' is missing an initial image, hence the pixel size is not defined",
            inputfile.display()
        );
    }
    let img = result.prior_img_or_from_init()?;
    img.set_image(pixels)?;
    img.normalise();
    result.write_to(inputfile, true)?;
    Ok(())
}

fn edit(inputfile: &Path, params: &[String]) -> Result<(), anyhow::Error> {
    let mut result = ImagingFile::from_file(inputfile)?;
    set_params(&mut result, params)?;
    result.write_to(inputfile, true)?;
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::from_args();
    setup_logging(args.verbose);

    match args.command {
        Command::Create {
            overwrite,
            datafile,
            inputfile,
            naxis1,
            pixelsize,
            model,
            params,
        } => create(
            &datafile,
            &inputfile,
            overwrite,
            naxis1,
            pixelsize,
            &ModelSpec::from(&model),
            &params,
        )?,

        Command::Copyinit {
            inputfile,
            imagefile,
        } => copyinit(&inputfile, &imagefile)?,

        Command::Copyprior {
            inputfile,
            imagefile,
        } => copyprior(&inputfile, &imagefile)?,

        Command::Edit { inputfile, params } => edit(&inputfile, &params)?,

        Command::Show { inputfile } => {
            let imaging_file = ImagingFile::from_file(&inputfile)?;
            print!("{}", imaging_file);
        }

        Command::Validate { inputfile } => {
            let report = validate_file(&inputfile)?;
            println!("{}", report);
            if !report.is_valid() {
                bail!("'{}' is not a valid imaging file", inputfile.display());
            }
        }
    }

    Ok(())
}
