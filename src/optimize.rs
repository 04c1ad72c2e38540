//! Invalidation path optimization
//!
//! CloudFront bills and rate-limits invalidations per path, so directories
//! with many changed files are collapsed into a single wildcard.

use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Directories with more members than this are invalidated wholesale.
pub const WILDCARD_THRESHOLD: usize = 10;

pub const UNIVERSAL_WILDCARD: &str = "/*";

/// Parent directory of `path`, or `None` for top-level paths.
fn parent_directory(path: &str) -> Option<&str> {
    if !path.trim_matches('/').contains('/') {
        return None;
    }
    path.rsplit_once('/').map(|(directory, _)| directory)
}

/// Collapse `paths` into an equivalent or broader, usually smaller, set.
pub fn optimize(paths: &BTreeSet<String>) -> BTreeSet<String> {
    if paths.contains(UNIVERSAL_WILDCARD) {
        info!("Universal wildcard present, invalidating everything");
        return universal();
    }

    let mut directories: BTreeMap<&str, Vec<&String>> = BTreeMap::new();
    let mut root = Vec::new();
    for path in paths {
        match parent_directory(path) {
            Some(directory) => directories.entry(directory).or_default().push(path),
            None => root.push(path),
        }
    }

    let mut optimized = BTreeSet::new();
    for (directory, members) in directories {
        if members.len() > WILDCARD_THRESHOLD {
            optimized.insert(format!("{}/*", directory));
        } else {
            optimized.extend(members.into_iter().cloned());
        }
    }

    if root.len() > WILDCARD_THRESHOLD {
        optimized.insert(UNIVERSAL_WILDCARD.to_string());
    } else {
        optimized.extend(root.into_iter().cloned());
    }

    if optimized.contains(UNIVERSAL_WILDCARD) {
        optimized = universal();
    }

    info!("Optimized {} paths to {} paths", paths.len(), optimized.len());
    optimized
}

fn universal() -> BTreeSet<String> {
    BTreeSet::from([UNIVERSAL_WILDCARD.to_string()])
}
