//! Signature resolution over the host client's code
//!
//! Patterns are hex bytes with `?`/`??` wildcards, e.g.
//! `"48 89 5C 24 ?? 57"`. A pattern must match the scanned region exactly
//! once; zero or multiple matches fail resolution and the dependent hook is
//! left uninstalled. Signatures are resolved once at startup and never
//! retried.

use purser_engine::ModuleView;

/// Errors that can occur during signature resolution
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// Pattern string could not be parsed
    #[error("Invalid signature pattern: {0}")]
    InvalidPattern(String),

    /// Pattern did not match anywhere in the scanned region
    #[error("Signature not found: {0}")]
    NotFound(String),

    /// Pattern matched more than once
    #[error("Signature is ambiguous (multiple matches): {0}")]
    Ambiguous(String),
}

/// Parse a signature pattern string into bytes
///
/// Supports:
/// - Hex bytes: "55 48 89 E5"
/// - Wildcards: "55 ? 89 E5" or "55 ?? 89 E5"
pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>, SignatureError> {
    let mut result = Vec::new();

    for part in pattern.split_whitespace() {
        if part == "?" || part == "??" {
            result.push(None); // Wildcard
        } else {
            let byte = u8::from_str_radix(part, 16).map_err(|_| {
                SignatureError::InvalidPattern(format!("Invalid hex byte: {}", part))
            })?;
            result.push(Some(byte));
        }
    }

    if result.is_empty() {
        return Err(SignatureError::InvalidPattern(
            "Empty signature pattern".to_string(),
        ));
    }

    Ok(result)
}

/// Scan a byte region for every match of a pattern, stopping after two.
///
/// Two matches are enough to prove ambiguity, so the scan never collects
/// more than that.
fn scan(bytes: &[u8], pattern: &[Option<u8>]) -> Vec<usize> {
    let mut matches = Vec::new();

    if pattern.is_empty() || bytes.len() < pattern.len() {
        return matches;
    }

    let end = bytes.len() - pattern.len();

    'outer: for offset in 0..=end {
        for (i, expected) in pattern.iter().enumerate() {
            if let Some(byte) = expected {
                if bytes[offset + i] != *byte {
                    continue 'outer;
                }
            }
        }
        matches.push(offset);
        if matches.len() > 1 {
            break;
        }
    }

    matches
}

/// Resolve a named signature to an absolute address in the host module.
///
/// Fails with [`SignatureError::NotFound`] on zero matches and
/// [`SignatureError::Ambiguous`] on more than one; both leave the dependent
/// feature inert for the rest of the process lifetime.
pub fn resolve_signature(
    module: &ModuleView<'_>,
    name: &str,
    pattern: &str,
) -> Result<usize, SignatureError> {
    let parsed = parse_pattern(pattern)?;
    let matches = scan(module.bytes(), &parsed);

    match matches.as_slice() {
        [offset] => {
            let addr = module.address_at(*offset);
            tracing::debug!("Resolved signature '{}' to {:#x}", name, addr);
            Ok(addr)
        }
        [] => Err(SignatureError::NotFound(name.to_string())),
        _ => Err(SignatureError::Ambiguous(name.to_string())),
    }
}
