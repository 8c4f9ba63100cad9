// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * The known image reconstruction parameters, and checks that an input (or
 * output) file follows the interface standard.
 */

use std::fmt;
use std::path::Path;

use fitsio::FitsFile;
use itertools::Itertools;
use log::debug;
use thiserror::Error;

use crate::fits::{FitsError, HduEntry, HduKind, HduList, Header, Value};
use crate::image::{image_dims, Wcs};
use crate::{INIT_IMG_NAME, INPUT_PARAM_NAME, OUTPUT_PARAM_NAME};

/// Which parameter HDU a keyword lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamSet {
    Input,
    Output,
}

impl ParamSet {
    pub fn hdu_name(self) -> &'static str {
        match self {
            ParamSet::Input => INPUT_PARAM_NAME,
            ParamSet::Output => OUTPUT_PARAM_NAME,
        }
    }

    pub fn specs(self) -> &'static [ParamSpec] {
        match self {
            ParamSet::Input => INPUT_PARAMS,
            ParamSet::Output => OUTPUT_PARAMS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    /// One of a fixed set of strings (case insensitive).
    Choice(&'static [&'static str]),
    Logical,
    Integer,
    /// Integers are accepted too.
    Float,
    /// The HDUNAME of an image in the same file.
    HduName,
}

impl ParamKind {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Undefined) => true,
            (ParamKind::Text, Value::Text(_))
            | (ParamKind::Choice(_), Value::Text(_))
            | (ParamKind::HduName, Value::Text(_))
            | (ParamKind::Logical, Value::Logical(_))
            | (ParamKind::Integer, Value::Integer(_))
            | (ParamKind::Float, Value::Float(_))
            | (ParamKind::Float, Value::Integer(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamKind::Text => write!(f, "a string"),
            ParamKind::Choice(choices) => write!(f, "one of {}", choices.join("/")),
            ParamKind::Logical => write!(f, "a logical"),
            ParamKind::Integer => write!(f, "an integer"),
            ParamKind::Float => write!(f, "a float"),
            ParamKind::HduName => write!(f, "an HDU name"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub keyword: &'static str,
    pub kind: ParamKind,
    pub comment: &'static str,
    pub required: bool,
}

const DATA_CHOICES: &[&str] = &["NONE", "ALL", "AMP", "PHI"];

const fn param(
    keyword: &'static str,
    kind: ParamKind,
    comment: &'static str,
    required: bool,
) -> ParamSpec {
    ParamSpec {
        keyword,
        kind,
        comment,
        required,
    }
}

pub const INPUT_PARAMS: &[ParamSpec] = &[
    param("TARGET", ParamKind::Text, "Identifier of target to select", true),
    param("WAVE_MIN", ParamKind::Float, "[m] Minimum wavelength to select", true),
    param("WAVE_MAX", ParamKind::Float, "[m] Maximum wavelength to select", true),
    param(
        "USE_VIS",
        ParamKind::Choice(DATA_CHOICES),
        "Complex visibility data to use if any",
        true,
    ),
    param("USE_VIS2", ParamKind::Logical, "Use squared visibility data if any", true),
    param(
        "USE_T3",
        ParamKind::Choice(DATA_CHOICES),
        "Triple product data to use if any",
        true,
    ),
    param("INIT_IMG", ParamKind::HduName, "HDUNAME of initial image", false),
    param("MAXITER", ParamKind::Integer, "Maximum number of iterations to run", true),
    param("RGL_NAME", ParamKind::Text, "Name of the regularization method", true),
    param("AUTO_WGT", ParamKind::Logical, "Automatic regularization weight", true),
    param("RGL_WGT", ParamKind::Float, "Weight of the regularization", true),
    param("RGL_PRIO", ParamKind::HduName, "HDUNAME of prior image", false),
    param("FLUX", ParamKind::Float, "Assumed total flux", true),
    param("FLUXERR", ParamKind::Float, "Error bar for total flux", true),
];

pub const OUTPUT_PARAMS: &[ParamSpec] = &[
    param("LAST_IMG", ParamKind::HduName, "HDUNAME of the final image", false),
    param("NITER", ParamKind::Integer, "Number of iterations done", true),
    param("CHISQ", ParamKind::Float, "Reduced chi-squared", false),
    param("FLUX", ParamKind::Float, "Total flux of the final image", false),
    param("CONVERGE", ParamKind::Logical, "Has the reconstruction converged?", true),
];

/// Input parameters that may not be negative.
const NON_NEGATIVE: &[&str] = &["MAXITER", "RGL_WGT", "FLUXERR"];

/// Mandatory columns of each OIFITS data table.
const OI_COLUMNS: &[(&str, &[&str])] = &[
    ("OI_TARGET", &["TARGET_ID", "TARGET", "RAEP0", "DECEP0", "EQUINOX"]),
    ("OI_WAVELENGTH", &["EFF_WAVE", "EFF_BAND"]),
    ("OI_ARRAY", &["TEL_NAME", "STA_NAME", "STA_INDEX", "DIAMETER", "STAXYZ"]),
    (
        "OI_VIS",
        &[
            "TARGET_ID", "TIME", "MJD", "INT_TIME", "VISAMP", "VISAMPERR", "VISPHI", "VISPHIERR",
            "UCOORD", "VCOORD", "STA_INDEX", "FLAG",
        ],
    ),
    (
        "OI_VIS2",
        &[
            "TARGET_ID", "TIME", "MJD", "INT_TIME", "VIS2DATA", "VIS2ERR", "UCOORD", "VCOORD",
            "STA_INDEX", "FLAG",
        ],
    ),
    (
        "OI_T3",
        &[
            "TARGET_ID", "TIME", "MJD", "INT_TIME", "T3AMP", "T3AMPERR", "T3PHI", "T3PHIERR",
            "U1COORD", "V1COORD", "U2COORD", "V2COORD", "STA_INDEX", "FLAG",
        ],
    ),
    ("OI_FLUX", &["TARGET_ID", "MJD", "INT_TIME", "FLUXDATA", "FLUXERR", "FLAG"]),
];

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{keyword} should be {expected}, but got {got} '{value}'")]
    WrongType {
        keyword: String,
        expected: String,
        got: &'static str,
        value: String,
    },

    #[error("{keyword} must be one of {choices}, but got '{value}'")]
    BadChoice {
        keyword: String,
        value: String,
        choices: String,
    },

    #[error("{0}")]
    Fits(#[from] FitsError),

    #[error("{0}")]
    Fitsio(#[from] fitsio::errors::Error),
}

/// Find the description of a known parameter.
pub fn spec_for(set: ParamSet, keyword: &str) -> Option<&'static ParamSpec> {
    set.specs().iter().find(|s| s.keyword == keyword)
}

/// Check the type of a known parameter. Unknown keywords are allowed, as
/// algorithms may define their own.
pub fn check_param(set: ParamSet, keyword: &str, value: &Value) -> Result<(), SchemaError> {
    let spec = match spec_for(set, keyword) {
        Some(s) => s,
        None => return Ok(()),
    };
    if !spec.kind.accepts(value) {
        return Err(SchemaError::WrongType {
            keyword: keyword.to_string(),
            expected: spec.kind.to_string(),
            got: value.type_name(),
            value: value.to_string(),
        });
    }
    if let (ParamKind::Choice(choices), Value::Text(s)) = (spec.kind, value) {
        if !choices.iter().any(|c| c.eq_ignore_ascii_case(s.trim())) {
            return Err(SchemaError::BadChoice {
                keyword: keyword.to_string(),
                value: s.clone(),
                choices: choices.iter().join(", "),
            });
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Issue {
    pub severity: Severity,
    /// The HDU the problem was found in.
    pub hdu: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.hdu, self.message)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    fn push<H: Into<String>, M: Into<String>>(&mut self, severity: Severity, hdu: H, message: M) {
        self.issues.push(Issue {
            severity,
            hdu: hdu.into(),
            message: message.into(),
        });
    }

    fn error<H: Into<String>, M: Into<String>>(&mut self, hdu: H, message: M) {
        self.push(Severity::Error, hdu, message)
    }

    fn warning<H: Into<String>, M: Into<String>>(&mut self, hdu: H, message: M) {
        self.push(Severity::Warning, hdu, message)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Valid when there are no errors; warnings are allowed.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{}", issue)?;
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors().count(),
            self.warnings().count()
        )
    }
}

/// Check an image reconstruction input (or output) file.
pub fn validate_file<T: AsRef<Path>>(path: T) -> Result<ValidationReport, SchemaError> {
    let path = path.as_ref();
    debug!("Validating {}", path.display());
    let mut fptr = FitsFile::open(path)?;
    let hdus = HduList::scan(&mut fptr)?;
    Ok(validate_hdus(&hdus))
}

/// Check the already-scanned HDUs of a file.
pub fn validate_hdus(hdus: &HduList) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_data_tables(hdus, &mut report);

    match hdus.find(INPUT_PARAM_NAME) {
        None => report.error(INPUT_PARAM_NAME, "input parameter HDU not found"),
        Some(entry) => {
            if !entry.is_binary_table() {
                report.error(INPUT_PARAM_NAME, "input parameters are not in a binary table");
            }
            validate_params(ParamSet::Input, &entry.header, &mut report);
            validate_input_values(&entry.header, &mut report);
            validate_image_refs(ParamSet::Input, &entry.header, hdus, &mut report);
            validate_prior_matches_init(&entry.header, hdus, &mut report);
        }
    }

    if let Some(entry) = hdus.find(OUTPUT_PARAM_NAME) {
        if !entry.is_binary_table() {
            report.error(OUTPUT_PARAM_NAME, "output parameters are not in a binary table");
        }
        validate_params(ParamSet::Output, &entry.header, &mut report);
        validate_image_refs(ParamSet::Output, &entry.header, hdus, &mut report);
    }

    report
}

fn validate_data_tables(hdus: &HduList, report: &mut ValidationReport) {
    let mut num_tables = 0;
    for entry in hdus.iter() {
        let extname = match entry.extname() {
            Some(e) if e.trim().to_ascii_uppercase().starts_with("OI_") => {
                e.trim().to_ascii_uppercase()
            }
            _ => continue,
        };
        num_tables += 1;
        let label = format!("{} (HDU {})", extname, entry.number);
        if !entry.is_binary_table() {
            report.error(label, "OIFITS data must be in a binary table");
            continue;
        }
        let required = match OI_COLUMNS.iter().find(|(name, _)| *name == extname) {
            Some((_, columns)) => *columns,
            None => {
                report.warning(label, "unknown OIFITS table type");
                continue;
            }
        };
        let missing: Vec<&str> = required
            .iter()
            .filter(|&&c| !entry.columns().iter().any(|col| col.eq_ignore_ascii_case(c)))
            .copied()
            .collect();
        if !missing.is_empty() {
            report.error(
                label,
                format!("missing mandatory column(s) {}", missing.join(", ")),
            );
        }
    }
    if num_tables == 0 {
        report.warning("data", "no OIFITS data tables in file");
    }
}

fn validate_params(set: ParamSet, header: &Header, report: &mut ValidationReport) {
    let hdu = set.hdu_name();
    for spec in set.specs() {
        match header.get(spec.keyword) {
            None if spec.required => {
                report.error(hdu, format!("required parameter {} is missing", spec.keyword))
            }
            Some(Value::Undefined) if spec.required => report.warning(
                hdu,
                format!("required parameter {} has no value", spec.keyword),
            ),
            Some(value) => {
                if let Err(e) = check_param(set, spec.keyword, value) {
                    report.error(hdu, e.to_string());
                }
            }
            None => (),
        }
    }
}

fn validate_input_values(header: &Header, report: &mut ValidationReport) {
    if let (Some(min), Some(max)) = (header.get_f64("WAVE_MIN"), header.get_f64("WAVE_MAX")) {
        if min >= max {
            report.error(
                INPUT_PARAM_NAME,
                format!("WAVE_MIN ({}) must be less than WAVE_MAX ({})", min, max),
            );
        }
    }
    for keyword in NON_NEGATIVE {
        if let Some(v) = header.get_f64(keyword) {
            if v < 0.0 {
                report.error(
                    INPUT_PARAM_NAME,
                    format!("{} must not be negative, but is {}", keyword, v),
                );
            }
        }
    }
}

/// Check that an image reference points at a 2D image with square pixels.
fn check_image(entry: &HduEntry) -> Result<(), String> {
    match &entry.kind {
        HduKind::Image { shape } => {
            image_dims(shape, &entry.label()).map_err(|e| e.to_string())?;
        }
        _ => return Err("not an image".to_string()),
    }
    Wcs::from_header(&entry.header)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn validate_image_refs(
    set: ParamSet,
    header: &Header,
    hdus: &HduList,
    report: &mut ValidationReport,
) {
    let refs = set
        .specs()
        .iter()
        .filter(|s| s.kind == ParamKind::HduName);
    for spec in refs {
        let name = match header.get_str(spec.keyword) {
            Some(n) => n,
            None => continue,
        };
        match hdus.find(name) {
            None => report.error(
                set.hdu_name(),
                format!("{} refers to '{}', which is not in the file", spec.keyword, name),
            ),
            Some(entry) => {
                if let Err(e) = check_image(entry) {
                    report.error(
                        name,
                        format!("bad image referenced by {}: {}", spec.keyword, e),
                    );
                }
            }
        }
    }
}

fn validate_prior_matches_init(header: &Header, hdus: &HduList, report: &mut ValidationReport) {
    let lookup = |keyword| header.get_str(keyword).and_then(|n| hdus.find(n));
    let (init, prior) = match (lookup("INIT_IMG"), lookup("RGL_PRIO")) {
        (Some(i), Some(p)) => (i, p),
        _ => return,
    };
    if init.kind != prior.kind {
        report.warning(
            INIT_IMG_NAME,
            format!(
                "prior image '{}' and initial image '{}' have different dimensions",
                prior.label(),
                init.label()
            ),
        );
    }
    if let (Ok(a), Ok(b)) = (Wcs::from_header(&init.header), Wcs::from_header(&prior.header)) {
        if a.cdelt != b.cdelt {
            report.warning(
                INIT_IMG_NAME,
                format!(
                    "prior image '{}' and initial image '{}' have different pixel sizes",
                    prior.label(),
                    init.label()
                ),
            );
        }
    }
}
