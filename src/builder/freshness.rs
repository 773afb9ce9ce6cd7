//! Staleness checks for incremental builds.
//!
//! A build output is fresh when it exists and is not older than its primary
//! source. Only that one source is consulted: headers pulled in with
//! `#include` are not tracked, so editing a header without touching the
//! source that includes it leaves a stale object in place. Touch the source
//! (or run `cbuild clean`) after header edits.

use std::path::Path;

use crate::util::fs::modified_time;

/// Whether `target` exists and is at least as new as `source`.
///
/// Any metadata error on either path counts as stale.
pub fn is_up_to_date(target: &Path, source: &Path) -> bool {
    match (modified_time(target), modified_time(source)) {
        (Some(target_time), Some(source_time)) => target_time >= source_time,
        _ => false,
    }
}
