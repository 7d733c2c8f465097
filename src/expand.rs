//! Variable substitution for `%(option)s` and `${ENV}` references.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::GetError;

/// Upper bound on substitution rounds per pass. Reaching it is reported as a probable cycle.
pub const MAX_SUBSTITUTION_DEPTH: usize = 200;

/// Matches `%(name)s`.
pub(crate) fn option_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%\(([a-zA-Z0-9_.\-]+)\)s").expect("valid regex"))
}

/// Matches `${NAME}`.
pub(crate) fn env_reference() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_.\-]+)\}").expect("valid regex"))
}

/// Repeatedly replace the leftmost match of `pattern` with `lookup(name)`.
///
/// An empty replacement is an error no matter why `lookup` came back empty.
pub(crate) fn expand_vars<F>(
    value: &str,
    pattern: &Regex,
    mut lookup: F,
) -> Result<String, GetError>
where
    F: FnMut(&str) -> String,
{
    let mut result = value.to_owned();

    for _ in 0..MAX_SUBSTITUTION_DEPTH {
        let Some(captures) = pattern.captures(&result) else {
            return Ok(result);
        };

        let range = captures.get(0).map_or(0..0, |m| m.range());
        let name = captures.get(1).map_or("", |m| m.as_str()).to_owned();

        let replacement = lookup(&name);
        if replacement.is_empty() {
            return Err(GetError::VariableNotFound { name });
        }

        log::trace!("substituting {name} -> {replacement:?}");
        result.replace_range(range, &replacement);
    }

    Err(GetError::DepthExceeded {
        depth: MAX_SUBSTITUTION_DEPTH,
    })
}
