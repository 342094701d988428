//! Configuration access port trait.

/// Typed lookups of `[section] key` values; the typed getters fall back to
/// `default` when the key is absent or malformed.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
