// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Binding: dynamic property bindings.
//!
//! Some feature properties change over time (a vehicle's position, a
//! blinking highlight). Instead of resolving them to a fixed value, the
//! resolution pipeline registers a sampler for each such field in a
//! [`DynamicPropertyBinder`] and hands consumers a [`BindingKey`]. Consumers
//! read the current value with [`DynamicPropertyBinder::sample`] for as long
//! as the key stays bound.
//!
//! Keys are random strings drawn from a [`KeySource`]. The default source is
//! a cryptographically secure generator seeded from the operating system;
//! keys are unique among live bindings, and colliding candidates are
//! regenerated.
//!
//! ## Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use understory_binding::{DynamicPropertyBinder, KeyConfig};
//! use understory_value::{FeatureId, PropertyValue};
//!
//! // A seeded source makes keys reproducible in tests.
//! let binder = DynamicPropertyBinder::with_source(KeyConfig::default(), StdRng::seed_from_u64(1));
//!
//! let bus = FeatureId::new("bus-7");
//! let binding = binder.bind(bus.clone(), "position", || PropertyValue::from(12.0));
//! assert_eq!(binding.key().as_str().len(), 21);
//! assert_eq!(binder.keys_for_feature(&bus), vec![binding.key().clone()]);
//!
//! assert_eq!(binder.unbind_feature(&bus), 1);
//! assert!(binder.is_empty());
//! ```
//!
//! ## Features
//!
//! - `logging`: logs key collisions at warn level through the `log` facade.

mod key;
mod registry;

pub use key::{
    BindingKey, ConfigError, DEFAULT_ALPHABET, DEFAULT_KEY_LENGTH, KeyConfig, KeyConfigBuilder,
    KeySource, MIN_ALPHABET_LEN, MIN_KEY_LENGTH, OsKeySource,
};
pub use registry::{DynamicBinding, DynamicPropertyBinder, Sampler};
