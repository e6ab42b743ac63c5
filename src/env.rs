use regex::{Captures, Regex};
use std::env as stdenv;
use std::sync::LazyLock;

/// Variables layered on top of the ambient process environment.
///
/// Entries keep their insertion order. Lookups consult the overlay first
/// (the most recently added entry for a name wins) and fall back to the
/// process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: Vec<(String, String)>,
}

impl Environment {
    /// Empty overlay: only the ambient environment is visible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in the overlay first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| stdenv::var(key).ok())
    }

    /// Append an override for `key`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.push((key.into(), val.into()));
    }

    /// Append a `NAME=value` entry. Entries without `=` are skipped.
    pub fn push_entry(&mut self, entry: &str) {
        match entry.split_once('=') {
            Some((key, val)) if !key.is_empty() => self.set_var(key, val),
            _ => log::warn!("ignoring malformed environment entry {entry:?}"),
        }
    }

    /// Overlay entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the overlay has no entries.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Replace `$NAME` and `${NAME}` references in `s`.
    ///
    /// Unknown variables expand to the empty string, as does `${}`. A `$`
    /// that does not start a reference is kept as is. An unterminated `${`
    /// is dropped and the text after it kept, so `${PATH` becomes `PATH`.
    pub fn expand(&self, s: &str) -> String {
        if !s.contains('$') {
            return s.to_string();
        }
        REFERENCE
            .replace_all(s, |caps: &Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map_or("", |m| m.as_str());
                if name.is_empty() {
                    String::new()
                } else {
                    self.get_var(name).unwrap_or_default()
                }
            })
            .into_owned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = Environment::new();
        for (k, v) in iter {
            env.set_var(k, v);
        }
        env
    }
}

// `${...}` up to the closing brace, a bare `${` with no closing brace, a
// single special character, or a name.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([^}]*)\}|\{|([*#$@!?0-9-]|[A-Za-z_][A-Za-z0-9_]*))")
        .expect("variable reference pattern is valid")
});
