//! Entity ID generation.
//!
//! IDs are a short readable slug of the entity's name followed by eight hex
//! characters, e.g. `call-mom-3f9a01c2`. Names are mutable, so the slug is
//! only a hint; the ID itself never changes once assigned.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum slug length kept in an ID.
const MAX_SLUG_LEN: usize = 24;

/// Per-process sequence mixed into every suffix.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Convert a name to a slug of at most `max_len` characters.
///
/// Non-alphanumeric runs collapse to a single hyphen and no leading or
/// trailing hyphen is kept.
#[must_use]
pub fn slugify(name: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(name.len().min(max_len));
    let mut last_was_hyphen = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    if slug.len() > max_len {
        slug.truncate(max_len);
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[allow(clippy::cast_possible_truncation)]
fn random_suffix() -> String {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(SEQUENCE.fetch_add(1, Ordering::Relaxed));
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64),
    );
    format!("{:08x}", hasher.finish() & 0xFFFF_FFFF)
}

/// Generate an ID for an entity with the given name.
///
/// `fallback` is used as the slug when the name has no usable characters.
#[must_use]
pub fn generate_id(name: &str, fallback: &str) -> String {
    let slug = slugify(name, MAX_SLUG_LEN);
    let suffix = random_suffix();

    if slug.is_empty() {
        format!("{fallback}-{suffix}")
    } else {
        format!("{slug}-{suffix}")
    }
}
