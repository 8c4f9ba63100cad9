// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Functions to help with time.
 */

use chrono::{DateTime, Utc};

/// Format a time the way the FITS DATE keyword wants it.
///
/// e.g. "2013-10-15T08:30:12".
pub fn fits_date_string(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// The current time as a FITS DATE string.
pub fn fits_date_now() -> String {
    fits_date_string(&Utc::now())
}
