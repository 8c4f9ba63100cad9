// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Default image reconstruction parameters, and which header keywords are
 * not parameters at all.
 */

use crate::fits::{Header, Value};
use crate::schema::{spec_for, ParamSet};

/// FITS keywords that describe the structure of a HDU rather than being
/// imaging parameters.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "XTENSION", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "PCOUNT", "GCOUNT", "TFIELDS", "EXTNAME",
    "EXTVER", "HDUNAME", "HDUVER",
];

/// More structural keywords, only expected in a primary header.
const PRIMARY_KEYWORDS: &[&str] = &["SIMPLE", "EXTEND", "BSCALE", "BZERO", "END"];

/// Indexed keywords (e.g. NAXIS3, TTYPE1) that are also structural.
const INDEXED_KEYWORDS: &[&str] = &[
    "NAXIS", "TTYPE", "TFORM", "TUNIT", "TDIM", "TNULL", "TSCAL", "TZERO", "TDISP",
];

/// Keywords belonging to the WCS of an image.
const WCS_KEYWORDS: &[&str] = &["CTYPE", "CRPIX", "CRVAL", "CDELT", "CUNIT"];

fn is_indexed(keyword: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| {
        keyword
            .strip_prefix(p)
            .map_or(false, |n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}

/// Is this keyword part of the structure of a HDU, rather than a parameter or
/// descriptive metadata?
pub fn is_reserved(keyword: &str) -> bool {
    RESERVED_KEYWORDS.contains(&keyword)
        || PRIMARY_KEYWORDS.contains(&keyword)
        || is_indexed(keyword, INDEXED_KEYWORDS)
}

/// Is this keyword part of an image's world coordinate system?
pub fn is_wcs(keyword: &str) -> bool {
    keyword == "WCSAXES" || is_indexed(keyword, WCS_KEYWORDS)
}

/// The default input parameters. `None` means the keyword is present but
/// undefined.
pub const DEFAULT_PARAMS: &[(&str, Option<DefaultValue>)] = &[
    ("TARGET", None),
    ("WAVE_MIN", Some(DefaultValue::Float(0.1e-6))),
    ("WAVE_MAX", Some(DefaultValue::Float(50e-6))),
    ("USE_VIS", Some(DefaultValue::Text("ALL"))),
    ("USE_VIS2", Some(DefaultValue::Logical(true))),
    ("USE_T3", Some(DefaultValue::Text("ALL"))),
    ("MAXITER", Some(DefaultValue::Integer(200))),
    ("RGL_NAME", Some(DefaultValue::Text("mem_prior"))),
    ("AUTO_WGT", Some(DefaultValue::Logical(false))),
    ("RGL_WGT", Some(DefaultValue::Float(1e5))),
    ("FLUX", Some(DefaultValue::Float(1.0))),
    ("FLUXERR", Some(DefaultValue::Float(0.0))),
];

/// A `Value` that can live in a constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefaultValue {
    Logical(bool),
    Integer(i64),
    Float(f64),
    Text(&'static str),
}

impl From<DefaultValue> for Value {
    fn from(d: DefaultValue) -> Value {
        match d {
            DefaultValue::Logical(b) => Value::Logical(b),
            DefaultValue::Integer(i) => Value::Integer(i),
            DefaultValue::Float(f) => Value::Float(f),
            DefaultValue::Text(s) => Value::Text(s.to_string()),
        }
    }
}

/// A header holding the default input parameters, in order.
pub fn default_input_params() -> Header {
    let mut header = Header::new();
    for (keyword, default) in DEFAULT_PARAMS {
        let value = default.map_or(Value::Undefined, Value::from);
        header.set(*keyword, value);
    }
    header
}

/// Give each known parameter without a comment its standard comment.
pub fn apply_default_comments(header: &mut Header, set: ParamSet) {
    let keywords: Vec<String> = header.keywords().map(|k| k.to_string()).collect();
    for keyword in keywords {
        let has_comment = header.comment(&keyword).map_or(false, |c| !c.is_empty());
        if has_comment {
            continue;
        }
        if let Some(spec) = spec_for(set, &keyword) {
            header.set_comment(&keyword, spec.comment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved() {
        for k in RESERVED_KEYWORDS {
            assert!(is_reserved(k));
        }
        assert!(is_reserved("SIMPLE"));
        assert!(is_reserved("NAXIS3"));
        assert!(is_reserved("TTYPE12"));
        assert!(!is_reserved("TTYPE"));
        assert!(!is_reserved("MAXITER"));
        assert!(!is_reserved("TELESCOP"));
    }

    #[test]
    fn test_wcs() {
        assert!(is_wcs("WCSAXES"));
        assert!(is_wcs("CDELT1"));
        assert!(is_wcs("CTYPE2"));
        assert!(!is_wcs("CDELT"));
        assert!(!is_wcs("DATE-OBS"));
    }

    #[test]
    fn test_defaults() {
        let header = default_input_params();
        assert_eq!(header.len(), DEFAULT_PARAMS.len());
        assert_eq!(header.get("TARGET"), Some(&Value::Undefined));
        assert_eq!(header.get("WAVE_MIN"), Some(&Value::Float(0.1e-6)));
        assert_eq!(header.get("WAVE_MAX"), Some(&Value::Float(50e-6)));
        assert_eq!(header.get_str("USE_VIS"), Some("ALL"));
        assert_eq!(header.get("USE_VIS2"), Some(&Value::Logical(true)));
        assert_eq!(header.get_str("USE_T3"), Some("ALL"));
        assert_eq!(header.get_i64("MAXITER"), Some(200));
        assert_eq!(header.get_str("RGL_NAME"), Some("mem_prior"));
        assert_eq!(header.get("AUTO_WGT"), Some(&Value::Logical(false)));
        assert_eq!(header.get("RGL_WGT"), Some(&Value::Float(1e5)));
        assert_eq!(header.get("FLUX"), Some(&Value::Float(1.0)));
        assert_eq!(header.get("FLUXERR"), Some(&Value::Float(0.0)));
        assert!(!header.contains("INIT_IMG"));
        assert!(!header.contains("RGL_PRIO"));
    }

    #[test]
    fn test_default_comments() {
        let mut header = default_input_params();
        header.set("MYKEY", 1);
        header.set_comment("FLUX", "my own comment");
        apply_default_comments(&mut header, ParamSet::Input);
        assert_eq!(header.comment("MAXITER"), Some("Maximum number of iterations to run"));
        assert_eq!(header.comment("WAVE_MIN"), Some("[m] Minimum wavelength to select"));
        assert_eq!(header.comment("FLUX"), Some("my own comment"));
        assert_eq!(header.comment("MYKEY"), None);

        let mut output = Header::new();
        output.set("NITER", 100);
        apply_default_comments(&mut output, ParamSet::Output);
        assert!(output.comment("NITER").is_some());
    }
}
