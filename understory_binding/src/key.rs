// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding keys and their generation.

use core::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// URL-safe alphabet used by [`KeyConfig::default`].
pub const DEFAULT_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Key length used by [`KeyConfig::default`].
pub const DEFAULT_KEY_LENGTH: usize = 21;

/// Shortest key length a [`KeyConfig`] accepts.
pub const MIN_KEY_LENGTH: usize = 8;

/// Smallest alphabet a [`KeyConfig`] accepts.
///
/// Together with [`MIN_KEY_LENGTH`] this keeps the key space at 2^32 or more.
pub const MIN_ALPHABET_LEN: usize = 16;

/// Opaque identifier of a dynamic binding.
///
/// Keys are random strings drawn from the registry's [`KeyConfig`]. They
/// are never derived from the feature or field they identify.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingKey(String);

impl BindingKey {
    /// Wraps an existing key string.
    ///
    /// Useful for keys received back from a consumer; the registry only
    /// ever hands out keys it generated itself.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by [`KeyConfigBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The alphabet has fewer than [`MIN_ALPHABET_LEN`] symbols.
    AlphabetTooSmall {
        /// Number of symbols supplied.
        len: usize,
    },
    /// The alphabet contains a character outside ASCII.
    NonAsciiSymbol(char),
    /// The alphabet contains the same symbol twice.
    DuplicateSymbol(char),
    /// The key length is below [`MIN_KEY_LENGTH`].
    KeyTooShort {
        /// Requested length.
        length: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlphabetTooSmall { len } => write!(
                f,
                "key alphabet has {len} symbols, at least {MIN_ALPHABET_LEN} required"
            ),
            Self::NonAsciiSymbol(c) => write!(f, "key alphabet symbol {c:?} is not ASCII"),
            Self::DuplicateSymbol(c) => write!(f, "key alphabet repeats symbol {c:?}"),
            Self::KeyTooShort { length } => write!(
                f,
                "key length {length} is below the minimum of {MIN_KEY_LENGTH}"
            ),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Shape of generated keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyConfig {
    alphabet: Box<[u8]>,
    length: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.as_bytes().into(),
            length: DEFAULT_KEY_LENGTH,
        }
    }
}

impl KeyConfig {
    /// Starts a builder from the default configuration.
    #[must_use]
    pub fn builder() -> KeyConfigBuilder {
        KeyConfigBuilder::default()
    }

    /// Returns the alphabet symbols.
    #[must_use]
    #[inline]
    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    /// Returns the number of symbols per key.
    #[must_use]
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns `true` if `key` has this configuration's length and only
    /// uses its alphabet.
    #[must_use]
    pub fn is_well_formed(&self, key: &BindingKey) -> bool {
        let bytes = key.as_str().as_bytes();
        bytes.len() == self.length && bytes.iter().all(|b| self.alphabet.contains(b))
    }

    /// Draws a key from `rng`, each symbol uniformly from the alphabet.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> BindingKey {
        let key = (0..self.length)
            .map(|_| char::from(self.alphabet[rng.random_range(0..self.alphabet.len())]))
            .collect();
        BindingKey(key)
    }
}

/// Builder for [`KeyConfig`].
///
/// ```rust
/// use understory_binding::{ConfigError, KeyConfig};
///
/// let config = KeyConfig::builder().length(32).build().unwrap();
/// assert_eq!(config.length(), 32);
///
/// assert_eq!(
///     KeyConfig::builder().length(4).build(),
///     Err(ConfigError::KeyTooShort { length: 4 })
/// );
/// ```
#[derive(Clone, Debug)]
pub struct KeyConfigBuilder {
    alphabet: String,
    length: usize,
}

impl Default for KeyConfigBuilder {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.into(),
            length: DEFAULT_KEY_LENGTH,
        }
    }
}

impl KeyConfigBuilder {
    /// Sets the symbols keys are drawn from.
    #[must_use]
    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = alphabet.into();
        self
    }

    /// Sets the number of symbols per key.
    #[must_use]
    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the alphabet is too small, has non-ASCII
    /// or repeated symbols, or if the length is too short.
    pub fn build(self) -> Result<KeyConfig, ConfigError> {
        let mut seen = [false; 128];
        for c in self.alphabet.chars() {
            let byte = match u8::try_from(c) {
                Ok(byte) if byte.is_ascii() => byte,
                _ => return Err(ConfigError::NonAsciiSymbol(c)),
            };
            let slot = &mut seen[usize::from(byte)];
            if *slot {
                return Err(ConfigError::DuplicateSymbol(c));
            }
            *slot = true;
        }
        if self.alphabet.len() < MIN_ALPHABET_LEN {
            return Err(ConfigError::AlphabetTooSmall {
                len: self.alphabet.len(),
            });
        }
        if self.length < MIN_KEY_LENGTH {
            return Err(ConfigError::KeyTooShort {
                length: self.length,
            });
        }
        Ok(KeyConfig {
            alphabet: self.alphabet.into_bytes().into_boxed_slice(),
            length: self.length,
        })
    }
}

/// Source of fresh binding keys.
///
/// Every [`RngCore`] is a key source. Production registries use
/// [`OsKeySource`]; tests inject a seeded generator for reproducible keys.
pub trait KeySource: Send {
    /// Produces the next candidate key for `config`.
    fn next_key(&mut self, config: &KeyConfig) -> BindingKey;
}

impl<R: RngCore + Send> KeySource for R {
    fn next_key(&mut self, config: &KeyConfig) -> BindingKey {
        config.generate(self)
    }
}

/// Cryptographically secure key source seeded from the operating system.
#[derive(Debug)]
pub struct OsKeySource(StdRng);

impl OsKeySource {
    /// Seeds a new generator from the operating system's entropy source.
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl Default for OsKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for OsKeySource {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    #[inline]
    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.0.fill_bytes(dst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = KeyConfig::default();
        assert_eq!(config.alphabet().len(), 64);
        assert_eq!(config.length(), 21);
        assert_eq!(KeyConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn generated_keys_are_well_formed() {
        let config = KeyConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let key = rng.next_key(&config);
            assert!(config.is_well_formed(&key), "{key}");
        }
        assert!(!config.is_well_formed(&BindingKey::new("short")));
        assert!(!config.is_well_formed(&BindingKey::new("!!!!!!!!!!!!!!!!!!!!!")));
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let config = KeyConfig::default();
        let a = StdRng::seed_from_u64(42).next_key(&config);
        let b = StdRng::seed_from_u64(42).next_key(&config);
        assert_eq!(a, b);
    }

    #[test]
    fn os_source_produces_keys() {
        let config = KeyConfig::default();
        let mut source = OsKeySource::new();
        let a = source.next_key(&config);
        let b = source.next_key(&config);
        assert!(config.is_well_formed(&a));
        assert_ne!(a, b);
    }

    #[test]
    fn builder_validation() {
        assert_eq!(
            KeyConfig::builder().alphabet("abc").build(),
            Err(ConfigError::AlphabetTooSmall { len: 3 })
        );
        assert_eq!(
            KeyConfig::builder().alphabet("0123456789abcdeé").build(),
            Err(ConfigError::NonAsciiSymbol('é'))
        );
        assert_eq!(
            KeyConfig::builder().alphabet("0123456789abcdeff").build(),
            Err(ConfigError::DuplicateSymbol('f'))
        );
        let hex = KeyConfig::builder()
            .alphabet("0123456789abcdef")
            .length(8)
            .build()
            .unwrap();
        let key = StdRng::seed_from_u64(1).next_key(&hex);
        assert_eq!(key.as_str().len(), 8);
        assert!(key.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ConfigError::KeyTooShort { length: 3 }.to_string(),
            "key length 3 is below the minimum of 8"
        );
        let err: &dyn core::error::Error = &ConfigError::DuplicateSymbol('a');
        assert!(err.source().is_none());
    }
}
