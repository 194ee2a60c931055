//! Deterministic job identifiers.
//!
//! A media reference (usually an object path such as
//! `s3://bucket/private/u1/videos/lecture1.mp4`) is reduced to a short, key-safe
//! identifier. The same reference always yields the same identifier, so repeated
//! submissions of one upload resolve to the same transcription job and therefore to
//! the same cached artifacts.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Path segment where the stable part of a media reference begins.
pub const MEDIA_MARKER: &str = "videos";

/// Characters allowed in a job identifier.
pub const ALLOWED_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

#[inline]
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Derive the deterministic identifier for a media reference.
///
/// Everything before the first occurrence of [`MEDIA_MARKER`] is ignored, so two
/// references differing only in bucket or user prefix map to the same identifier.
/// References without the marker (including the empty string) are hashed whole.
///
/// # Example
///
/// ```rust
/// use studycast::core::identity::identify;
///
/// let a = identify("s3://bucket-a/videos/lecture1.mp4");
/// let b = identify("s3://bucket-b/videos/lecture1.mp4");
/// assert_eq!(a, b);
/// ```
pub fn identify(reference: &str) -> String {
    let stable = reference
        .find(MEDIA_MARKER)
        .map_or(reference, |index| &reference[index..]);

    let digest = Sha256::digest(stable.as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest);

    encoded.chars().filter(|c| is_allowed(*c)).collect()
}
