//! Sequential container names of the form `<prefix>-<NNN>`.
//!
//! The suffix of a new name is one past the highest numeric suffix already in
//! use under the same prefix. Names belonging to other prefixes, or whose
//! suffix is not a plain decimal number, are ignored.

use crate::error::{Result, SkiffError};
use tracing::trace;

/// Largest suffix the naming convention can express.
pub const MAX_SUFFIX: u64 = 999;

/// Compute the next free name for `prefix` given the names currently in use.
pub fn allocate_name<I, S>(prefix: &str, existing: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if prefix.is_empty() {
        return Err(SkiffError::InvalidPrefix);
    }

    let highest = existing
        .into_iter()
        .filter_map(|name| suffix_of(prefix, name.as_ref()))
        .max()
        .unwrap_or(0);

    let next = highest.saturating_add(1);
    Ok(format!("{}-{}", prefix, pad_suffix(next)?))
}

/// Numeric suffix of `name` under `prefix`, if it follows the convention.
fn suffix_of(prefix: &str, name: &str) -> Option<u64> {
    let name = name.trim_start_matches('/');
    let suffix = name.strip_prefix(prefix)?.strip_prefix('-')?;

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        trace!("Skipping name {} (suffix {:?} is not numeric)", name, suffix);
        return None;
    }

    match suffix.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            trace!("Skipping name {} (suffix overflows)", name);
            None
        }
    }
}

/// Format a suffix using the established three-tier padding.
///
/// Values from 100 upward are written as-is, 11..=99 get one leading zero and
/// anything up to 10 gets two, so `10` renders as `0010`.
pub fn pad_suffix(n: u64) -> Result<String> {
    if n > MAX_SUFFIX {
        Err(SkiffError::OutOfRange { value: n })
    } else if n >= 100 {
        Ok(n.to_string())
    } else if n > 10 {
        Ok(format!("0{}", n))
    } else {
        Ok(format!("00{}", n))
    }
}
