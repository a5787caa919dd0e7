//! Clock-skew guard run before a conditional update.
//!
//! An update is refused only when the stored last-modified instant lies in
//! the future of the request's own clock. Two updates issued at the same
//! moment both pass; this is not a compare-and-swap.

use chrono::NaiveDateTime;

use crate::models::LastModified;

pub fn admits(stored: LastModified, now: NaiveDateTime) -> bool {
    match stored {
        LastModified::Never => true,
        LastModified::At(at) => at <= now,
    }
}
