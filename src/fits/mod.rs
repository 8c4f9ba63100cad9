// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Helper fits functions.
 *
 * rust-fitsio can't enumerate the cards of a header, and its `write_key`
 * doesn't overwrite existing keys, so cfitsio is called directly for these
 * things.
 */

pub mod error;
pub mod hdulist;
pub mod header;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};

use fitsio::{errors::check_status as fits_check_status, hdu::FitsHdu, FitsFile};
use log::trace;

pub use error::FitsError;
pub use hdulist::{HduEntry, HduKind, HduList};
pub use header::{is_commentary_keyword, parse_keyword_arg, Card, Header, Value};

/// The length of a header card, plus a null terminator. Keyword names, values
/// and comments all fit within this.
const FLEN_CARD: usize = 81;

/// cfitsio's status for a keyword that isn't in the header.
const KEY_NO_EXIST: c_int = 202;

fn c_buf_to_string(buf: &[c_char]) -> String {
    // The buffers are zero-initialised and cfitsio null-terminates what it
    // writes.
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .trim_end()
        .to_string()
}

/// Read every card of a HDU into a `Header`. CONTINUE cards (long strings)
/// are skipped.
pub fn read_header(fptr: &mut FitsFile, hdu: &FitsHdu) -> Result<Header, FitsError> {
    fptr.hdu(hdu.number)?;

    let mut status = 0;
    let mut num_keys: c_int = 0;
    let mut more_keys: c_int = 0;
    unsafe {
        // ffghsp = fits_get_hdrspace
        fitsio_sys::ffghsp(
            fptr.as_raw(),  /* I - FITS file pointer                     */
            &mut num_keys,  /* O - returned number of existing keywords  */
            &mut more_keys, /* O - how many more keywords will fit       */
            &mut status,    /* IO - error status                         */
        );
    }
    fits_check_status(status)?;
    trace!("HDU {} has {} header cards", hdu.number, num_keys);

    let mut header = Header::new();
    for n in 1..=num_keys {
        let mut keyname: [c_char; FLEN_CARD] = [0; FLEN_CARD];
        let mut value: [c_char; FLEN_CARD] = [0; FLEN_CARD];
        let mut comment: [c_char; FLEN_CARD] = [0; FLEN_CARD];
        unsafe {
            // ffgkyn = fits_read_keyn
            fitsio_sys::ffgkyn(
                fptr.as_raw(),         /* I - FITS file pointer             */
                n,                     /* I - number of the keyword to read */
                keyname.as_mut_ptr(),  /* O - name of the keyword           */
                value.as_mut_ptr(),    /* O - keyword value                 */
                comment.as_mut_ptr(),  /* O - keyword comment               */
                &mut status,           /* IO - error status                 */
            );
        }
        fits_check_status(status)?;

        let keyword = c_buf_to_string(&keyname);
        let value = c_buf_to_string(&value);
        let comment = c_buf_to_string(&comment);
        if keyword == "CONTINUE" {
            continue;
        }
        if is_commentary_keyword(&keyword) {
            header.push(Card::commentary(keyword, comment));
        } else {
            header.push(Card {
                keyword,
                value: Value::parse_fits(&value),
                comment: if comment.is_empty() {
                    None
                } else {
                    Some(comment)
                },
            });
        }
    }

    Ok(header)
}

/// Write all cards of `header` into a HDU. Existing keys are overwritten;
/// commentary cards already present verbatim are not written again.
pub fn write_header(fptr: &mut FitsFile, hdu: &FitsHdu, header: &Header) -> Result<(), FitsError> {
    // This also makes `hdu` the current HDU.
    let existing = read_header(fptr, hdu)?;

    for card in header.cards() {
        if card.is_commentary() {
            if existing.cards().contains(card) {
                continue;
            }
            let text = card.comment.as_deref().unwrap_or("");
            match card.keyword.as_str() {
                "HISTORY" => fits_write_history(fptr, text)?,
                "COMMENT" => fits_write_comment(fptr, text)?,
                _ => trace!("Not writing blank commentary card '{}'", text),
            }
            continue;
        }

        let comment = card.comment.as_deref();
        match &card.value {
            Value::Undefined => fits_write_undefined(fptr, &card.keyword, comment)?,
            Value::Logical(b) => fits_write_logical(fptr, &card.keyword, *b, comment)?,
            Value::Integer(i) => fits_write_int(fptr, &card.keyword, *i, comment)?,
            Value::Float(f) => fits_write_double(fptr, &card.keyword, *f, comment)?,
            Value::Text(s) => fits_write_string(fptr, &card.keyword, s, comment)?,
        }
    }

    Ok(())
}

/// Convert an optional comment to a C string. A null pointer tells cfitsio to
/// keep the existing comment of a key being updated.
fn c_comment(comment: Option<&str>) -> Result<Option<CString>, FitsError> {
    Ok(match comment {
        Some(c) => Some(CString::new(c)?),
        None => None,
    })
}

pub fn fits_write_int(
    fptr: &mut FitsFile,
    keyname: &str,
    value: i64,
    comment: Option<&str>,
) -> Result<(), FitsError> {
    let mut status = 0;
    let keyname = CString::new(keyname)?;
    let comment = c_comment(comment)?;
    unsafe {
        // ffukyj = fits_update_key_lng
        fitsio_sys::ffukyj(
            fptr.as_raw(),                                                 /* I - FITS file pointer  */
            keyname.as_ptr(),                                              /* I - keyword name       */
            value,                                                         /* I - keyword value      */
            comment.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()),     /* I - keyword comment    */
            &mut status,                                                   /* IO - error status      */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

pub fn fits_write_double(
    fptr: &mut FitsFile,
    keyname: &str,
    value: f64,
    comment: Option<&str>,
) -> Result<(), FitsError> {
    let mut status = 0;
    let keyname = CString::new(keyname)?;
    let comment = c_comment(comment)?;
    unsafe {
        // ffukyd = fits_update_key_dbl
        fitsio_sys::ffukyd(
            fptr.as_raw(),                                             /* I - FITS file pointer  */
            keyname.as_ptr(),                                          /* I - keyword name       */
            value,                                                     /* I - keyword value      */
            -17,                                                       /* I - no of decimals     */
            comment.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()), /* I - keyword comment    */
            &mut status,                                               /* IO - error status      */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

pub fn fits_write_logical(
    fptr: &mut FitsFile,
    keyname: &str,
    value: bool,
    comment: Option<&str>,
) -> Result<(), FitsError> {
    let mut status = 0;
    let keyname = CString::new(keyname)?;
    let comment = c_comment(comment)?;
    unsafe {
        // ffukyl = fits_update_key_log
        fitsio_sys::ffukyl(
            fptr.as_raw(),                                             /* I - FITS file pointer  */
            keyname.as_ptr(),                                          /* I - keyword name       */
            value as c_int,                                            /* I - keyword value      */
            comment.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()), /* I - keyword comment    */
            &mut status,                                               /* IO - error status      */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

pub fn fits_write_string(
    fptr: &mut FitsFile,
    keyname: &str,
    value: &str,
    comment: Option<&str>,
) -> Result<(), FitsError> {
    let mut status = 0;
    let keyname = CString::new(keyname)?;
    let value = CString::new(value)?;
    let comment = c_comment(comment)?;
    unsafe {
        // ffukys = fits_update_key_str
        fitsio_sys::ffukys(
            fptr.as_raw(),                                             /* I - FITS file pointer  */
            keyname.as_ptr(),                                          /* I - keyword name       */
            value.as_ptr(),                                            /* I - keyword value      */
            comment.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()), /* I - keyword comment    */
            &mut status,                                               /* IO - error status      */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

/// Write a keyword without a value.
pub fn fits_write_undefined(
    fptr: &mut FitsFile,
    keyname: &str,
    comment: Option<&str>,
) -> Result<(), FitsError> {
    let mut status = 0;
    let keyname = CString::new(keyname)?;
    let comment = c_comment(comment)?;
    unsafe {
        // ffukyu = fits_update_key_null
        fitsio_sys::ffukyu(
            fptr.as_raw(),                                             /* I - FITS file pointer  */
            keyname.as_ptr(),                                          /* I - keyword name       */
            comment.as_ref().map_or(std::ptr::null(), |c| c.as_ptr()), /* I - keyword comment    */
            &mut status,                                               /* IO - error status      */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

/// Delete a key from a HDU. A key that isn't there is not an error.
pub fn fits_delete_key(
    fptr: &mut FitsFile,
    hdu: &FitsHdu,
    keyname: &str,
) -> Result<(), FitsError> {
    fptr.hdu(hdu.number)?;
    let mut status = 0;
    let c_keyname = CString::new(keyname)?;
    unsafe {
        // ffdkey = fits_delete_key
        fitsio_sys::ffdkey(
            fptr.as_raw(),      /* I - FITS file pointer  */
            c_keyname.as_ptr(), /* I - keyword name       */
            &mut status,        /* IO - error status      */
        );
    }
    if status == KEY_NO_EXIST {
        trace!("{} isn't in HDU {}; nothing to delete", keyname, hdu.number);
        return Ok(());
    }
    fits_check_status(status)?;
    Ok(())
}

pub fn fits_write_comment(fptr: &mut FitsFile, comment: &str) -> Result<(), FitsError> {
    let mut status = 0;
    let comment = CString::new(comment)?;
    unsafe {
        // ffpcom = fits_write_comment
        fitsio_sys::ffpcom(
            fptr.as_raw(),    /* I - FITS file pointer   */
            comment.as_ptr(), /* I - comment string      */
            &mut status,      /* IO - error status       */
        );
    }
    fits_check_status(status)?;
    Ok(())
}

pub fn fits_write_history(fptr: &mut FitsFile, history: &str) -> Result<(), FitsError> {
    let mut status = 0;
    let history = CString::new(history)?;
    unsafe {
        // ffphis = fits_write_history
        fitsio_sys::ffphis(
            fptr.as_raw(),    /* I - FITS file pointer  */
            history.as_ptr(), /* I - history string     */
            &mut status,      /* IO - error status      */
        );
    }
    fits_check_status(status)?;
    Ok(())
}
