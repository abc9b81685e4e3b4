//! Thread-local regex cache for directive and rule-name patterns
//!
//! Batch composition compiles the same header patterns over and over (every
//! grammar in a project tends to share its `extends(...)` directives), so
//! compiled patterns are cached per thread. Worker threads each get their own
//! cache and never contend.

use hashbrown::HashMap;
use regex::Regex;
use std::cell::RefCell;

thread_local! {
    /// Thread-local cache of compiled regex patterns
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Get or compile a regex pattern
///
/// Invalid patterns are not cached; the compile error is returned on every
/// call so the caller can report it.
#[inline]
pub fn get_or_compile(pattern: &str) -> Result<Regex, regex::Error> {
    REGEX_CACHE.with(|cache| {
        if let Some(regex) = cache.borrow().get(pattern) {
            return Ok(regex.clone());
        }

        let regex = Regex::new(pattern)?;
        cache
            .borrow_mut()
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    })
}

/// Compile a pattern that must match a whole rule name
///
/// `extends("...")` patterns are matched against complete rule names, so the
/// pattern is anchored on both ends before compiling.
pub fn get_or_compile_full_match(pattern: &str) -> Result<Regex, regex::Error> {
    get_or_compile(&format!("^(?:{})$", pattern))
}

/// Clear the regex cache
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Get the number of cached patterns
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}
