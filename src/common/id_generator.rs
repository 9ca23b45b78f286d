// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., J_K7NP3X for queued jobs)
//!
//! Used for storage keys, queued job ids and bearer token secrets.
//! The alphabet excludes I, L, O, U so identifiers stay unambiguous.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of the random part of a bearer token secret (200 bits)
const TOKEN_SECRET_LENGTH: usize = 40;

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Queued background job (J_)
    Job,
    /// Stored product photo (P_)
    Photo,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Job => "J",
            EntityPrefix::Photo => "P",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID with custom length
///
/// # Example
/// ```
/// use catalog_api::common::{generate_id_with_length, EntityPrefix};
///
/// let id = generate_id_with_length(EntityPrefix::Job, 8);
/// assert!(id.starts_with("J_"));
/// assert_eq!(id.len(), 10);
/// ```
pub fn generate_id_with_length(prefix: EntityPrefix, length: usize) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(length))
}

/// Generate a queued job ID (J_XXXXXXXXXX)
pub fn generate_job_id() -> String {
    generate_id_with_length(EntityPrefix::Job, 10)
}

/// Generate a photo storage key stem (P_XXXXXXXXXXXXXXXX)
pub fn generate_photo_key() -> String {
    generate_id_with_length(EntityPrefix::Photo, 16)
}

/// Generate the secret half of a bearer token
pub fn generate_token_secret() -> String {
    generate_crockford_string(TOKEN_SECRET_LENGTH)
}
