//! Test fixture generators
//!
//! For deterministic tests, use the `*_seeded` variants with a fixed seed.

use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::security::SecureString;

/// Generate a random string of specified length
///
/// ```
/// use keyval_common::testing::fixtures::random_string;
///
/// let s = random_string(10);
/// assert_eq!(s.len(), 10);
/// ```
pub fn random_string(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a random string of specified length with a seed (deterministic)
///
/// ```
/// use keyval_common::testing::fixtures::random_string_seeded;
///
/// let s1 = random_string_seeded(10, 42);
/// let s2 = random_string_seeded(10, 42);
/// assert_eq!(s1, s2);
/// ```
pub fn random_string_seeded(len: usize, seed: u64) -> String {
    let rng = rand::rngs::StdRng::seed_from_u64(seed);
    rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a 64 character database key
#[must_use]
pub fn random_key() -> SecureString {
    SecureString::new(random_string(64))
}

/// One value of every JSON shape a store must round-trip
#[must_use]
pub fn sample_values() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(42),
        json!(-3.5),
        json!("test"),
        json!(""),
        json!([1, "two", null]),
        json!({"nested": {"list": [1, 2, 3], "flag": false}}),
    ]
}

/// Finite floats that need the full 17 significant digits to round-trip
///
/// A few fixed hard cases followed by `count` seeded random bit patterns.
#[must_use]
pub fn sample_floats(count: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut floats = vec![2.291_712_365_432_881e-9, -1.527_077_339_613_215e-236, 0.1 + 0.2];
    while floats.len() < count + 3 {
        let x = f64::from_bits(rng.gen::<u64>());
        if x.is_finite() {
            floats.push(x);
        }
    }
    floats
}
