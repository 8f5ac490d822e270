/// Proverbs Crypto Library
///
/// Registration activation keys: a salted SHA-256 digest of the username,
/// truncated to 40 hex characters and valid for two days.

pub mod keys;

pub use keys::{ACTIVATION_KEY_LEN, ActivationKey, generate_activation_key, new_activation_key};
