use chrono::Utc;
use rand::Rng;

use crate::models::AssetKind;

/// Upper bound (exclusive) of the random filename suffix
const RANDOM_SUFFIX_BOUND: u32 = 1_000_000_000;

/// Builds `{kind}-{millis}-{random}{extension}` filenames.
///
/// Uniqueness is probabilistic: the namespace is never checked for an existing
/// file, so two uploads in the same millisecond that draw the same suffix collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameAllocator;

impl NameAllocator {
    pub fn allocate(&self, kind: AssetKind, extension: &str) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix = rand::thread_rng().gen_range(0..RANDOM_SUFFIX_BOUND);
        format_filename(kind, millis, suffix, extension)
    }
}

pub fn format_filename(kind: AssetKind, millis: i64, suffix: u32, extension: &str) -> String {
    format!("{}-{}-{}{}", kind.as_str(), millis, suffix, extension)
}
