//! Allocation of the four-digit tag that disambiguates equal usernames.
//!
//! The check-then-insert here is only a fast path: two concurrent
//! registrations can pick the same free tag. The UNIQUE (username,
//! discriminator) constraint decides, and registration retries on it.

use rand::Rng;
use tracing::warn;

use parley_db::{Database, DbError};

/// Number of distinct tags, `0000` through `9999`.
pub const DISCRIMINATOR_SPACE: u16 = 10_000;

/// Random draws attempted before giving up on a username.
pub const MAX_ATTEMPTS: usize = 9_999;

/// Returned when every draw collided. Not guaranteed to be free.
pub const EXHAUSTED_FALLBACK: &str = "0000";

pub fn format_discriminator(value: u16) -> String {
    format!("{:04}", value)
}

/// Draw uniformly random tags until one is free for `username`.
pub fn allocate_discriminator<R: Rng>(
    db: &Database,
    username: &str,
    rng: &mut R,
) -> Result<String, DbError> {
    let candidates = std::iter::repeat_with(|| rng.random_range(0..DISCRIMINATOR_SPACE));
    first_free(candidates, |tag| db.discriminator_taken(username, tag))
}

/// First candidate for which `taken` says no, within [`MAX_ATTEMPTS`] tries.
/// Falls back to [`EXHAUSTED_FALLBACK`] rather than failing.
pub fn first_free<I, F>(candidates: I, mut taken: F) -> Result<String, DbError>
where
    I: IntoIterator<Item = u16>,
    F: FnMut(&str) -> Result<bool, DbError>,
{
    for candidate in candidates.into_iter().take(MAX_ATTEMPTS) {
        let tag = format_discriminator(candidate % DISCRIMINATOR_SPACE);
        if !taken(&tag)? {
            return Ok(tag);
        }
    }

    warn!(
        "No free discriminator after {} attempts, falling back to {}",
        MAX_ATTEMPTS, EXHAUSTED_FALLBACK
    );
    Ok(EXHAUSTED_FALLBACK.to_string())
}
