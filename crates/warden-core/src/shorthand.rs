//! Shorthand permission expansion.
//!
//! A shorthand node packs several permissions into one string using
//! parenthesised groups: `foo.(a|b)` expands to `foo.a` and `foo.b`,
//! and numeric ranges `rank.(1-3)` expand to `rank.1`, `rank.2`,
//! `rank.3`. Expansion happens at match time and is gated by the
//! resolver's apply-shorthand flag.

use crate::error::{CoreError, Result};

/// Upper bound on the number of strings a single key may expand into.
pub const MAX_EXPANSION: usize = 4096;

/// Whether a key contains at least one shorthand group.
pub fn is_shorthand(key: &str) -> bool {
    key.contains('(') && key.contains(')')
}

/// Expand every shorthand group in `key` into the full set of permission
/// strings it denotes.
///
/// Returns an error when parentheses are unbalanced, a group is empty,
/// or the expansion exceeds [`MAX_EXPANSION`] strings. A key without
/// shorthand groups expands to itself.
pub fn expand(key: &str) -> Result<Vec<String>> {
    let mut results = vec![String::new()];
    let mut rest = key;

    while let Some(open) = rest.find('(') {
        let close = rest[open..]
            .find(')')
            .map(|i| open + i)
            .ok_or_else(|| CoreError::InvalidShorthand(key.to_string()))?;

        let literal = &rest[..open];
        let group = &rest[open + 1..close];
        let options = expand_group(group)
            .ok_or_else(|| CoreError::InvalidShorthand(key.to_string()))?;

        let size = results
            .len()
            .checked_mul(options.len())
            .filter(|n| *n <= MAX_EXPANSION)
            .ok_or_else(|| CoreError::InvalidShorthand(key.to_string()))?;

        let mut next = Vec::with_capacity(size);
        for prefix in &results {
            for option in &options {
                next.push(format!("{}{}{}", prefix, literal, option));
            }
        }
        results = next;
        rest = &rest[close + 1..];
    }

    if rest.contains(')') {
        return Err(CoreError::InvalidShorthand(key.to_string()));
    }

    for r in &mut results {
        r.push_str(rest);
    }
    Ok(results)
}

/// Expand a single group body: either `a|b|c` alternatives or a numeric
/// `lo-hi` range.
fn expand_group(group: &str) -> Option<Vec<String>> {
    if group.is_empty() {
        return None;
    }

    if group.contains('|') {
        let options: Vec<String> = group.split('|').map(str::to_string).collect();
        if options.iter().any(String::is_empty) {
            return None;
        }
        return Some(options);
    }

    if let Some((lo, hi)) = group.split_once('-') {
        if let (Ok(lo), Ok(hi)) = (lo.parse::<u64>(), hi.parse::<u64>()) {
            // Bounds-check before materializing the range.
            if lo <= hi && hi - lo < MAX_EXPANSION as u64 {
                return Some((lo..=hi).map(|n| n.to_string()).collect());
            }
            return None;
        }
    }

    // A single literal option is permitted.
    Some(vec![group.to_string()])
}
