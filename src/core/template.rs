//! Manifest template rendering.
//!
//! Substitutes `${KEY}` and `{KEY}` placeholders from the environment store.
//! Resolution is a single pass: a substituted value that itself contains a
//! placeholder is not re-expanded, which bounds render cost and keeps
//! operator-supplied entry values from triggering runaway expansion.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::env::EnvStore;
use crate::error::{Error, Result};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .expect("placeholder pattern is valid")
    })
}

fn placeholder_key<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// Render `template` against the store. Unknown keys render as the empty
/// string; the store's `get` is total, so rendering never fails.
pub fn resolve(template: &str, env: &EnvStore) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            env.get(placeholder_key(caps)).to_string()
        })
        .into_owned()
}

/// Strict-mode rendering: any placeholder without a store entry is an error
/// listing the unresolved keys. Opt-in; permissive [`resolve`] is the default.
pub fn resolve_strict(template: &str, env: &EnvStore) -> Result<String> {
    let mut unresolved = Vec::new();
    for caps in placeholder_pattern().captures_iter(template) {
        let key = placeholder_key(&caps);
        if !env.contains(key) && !unresolved.iter().any(|k| k == key) {
            unresolved.push(key.to_string());
        }
    }
    if !unresolved.is_empty() {
        return Err(Error::Template(unresolved));
    }
    Ok(resolve(template, env))
}
