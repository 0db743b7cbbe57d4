//! D-Bus type signature grammar.

use crate::error::SignatureError;

/// Maximum length of a signature in bytes.
pub const MAX_SIGNATURE_LENGTH: usize = 255;

/// Maximum nesting of arrays, and separately of structs.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Basic (non-container) type codes.
const BASIC_CODES: &[u8] = b"ybnqiuxtdsogh";

/// Signatures that map onto a native C representation.
const NATIVE_CONTAINERS: &[&str] = &["ay", "as", "ao", "ag", "aay"];

/// Returns true if `code` is a basic type code.
#[must_use]
pub fn is_basic(code: u8) -> bool {
    BASIC_CODES.contains(&code)
}

/// Validates that `signature` is exactly one complete type.
///
/// # Errors
/// Returns `SignatureError` describing the first grammar violation.
pub fn validate_signature(signature: &str) -> Result<(), SignatureError> {
    if signature.is_empty() {
        return Err(SignatureError::new(signature, "empty signature"));
    }
    if signature.len() > MAX_SIGNATURE_LENGTH {
        return Err(SignatureError::new(
            signature,
            format!("longer than {MAX_SIGNATURE_LENGTH} bytes"),
        ));
    }

    let mut checker = Checker {
        bytes: signature.as_bytes(),
        pos: 0,
        arrays: 0,
        structs: 0,
    };
    checker
        .complete_type()
        .map_err(|reason| SignatureError::new(signature, reason))?;
    if checker.pos != signature.len() {
        return Err(SignatureError::new(
            signature,
            format!(
                "expected a single complete type, trailing data at offset {}",
                checker.pos
            ),
        ));
    }
    Ok(())
}

/// Returns true if values of this type can carry a Unix file descriptor.
#[must_use]
pub fn contains_unix_fd(signature: &str) -> bool {
    signature.contains('h')
}

/// Returns true if the type has a native C mapping rather than a boxed
/// `GVariant`.
#[must_use]
pub fn has_native_mapping(signature: &str) -> bool {
    match signature.as_bytes() {
        [code] => is_basic(*code),
        _ => NATIVE_CONTAINERS.contains(&signature),
    }
}

struct Checker<'a> {
    bytes: &'a [u8],
    pos: usize,
    arrays: usize,
    structs: usize,
}

impl Checker<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn complete_type(&mut self) -> Result<(), String> {
        let Some(code) = self.peek() else {
            return Err("truncated signature".to_string());
        };
        self.pos += 1;

        match code {
            c if is_basic(c) => Ok(()),
            b'v' => Ok(()),
            b'a' => {
                self.arrays += 1;
                if self.arrays > MAX_NESTING_DEPTH {
                    return Err(format!("arrays nested deeper than {MAX_NESTING_DEPTH}"));
                }
                let result = if self.peek() == Some(b'{') {
                    self.pos += 1;
                    self.dict_entry()
                } else {
                    self.complete_type()
                };
                self.arrays -= 1;
                result
            }
            b'(' => {
                self.structs += 1;
                if self.structs > MAX_NESTING_DEPTH {
                    return Err(format!("structs nested deeper than {MAX_NESTING_DEPTH}"));
                }
                if self.peek() == Some(b')') {
                    return Err("empty struct".to_string());
                }
                while self.peek() != Some(b')') {
                    self.complete_type()?;
                }
                self.pos += 1;
                self.structs -= 1;
                Ok(())
            }
            b'{' => Err("dict entry outside of an array".to_string()),
            b')' | b'}' => Err(format!("unbalanced '{}'", code as char)),
            other => Err(format!("unknown type code '{}'", other as char)),
        }
    }

    fn dict_entry(&mut self) -> Result<(), String> {
        match self.peek() {
            Some(key) if is_basic(key) => self.pos += 1,
            Some(b'}') | None => return Err("dict entry without key".to_string()),
            Some(_) => return Err("dict entry key must be a basic type".to_string()),
        }
        if self.peek() == Some(b'}') {
            return Err("dict entry without value".to_string());
        }
        self.complete_type()?;
        if self.peek() != Some(b'}') {
            return Err("dict entry must contain exactly one key and one value".to_string());
        }
        self.pos += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signatures() {
        for sig in [
            "s", "h", "v", "as", "aay", "a{sv}", "a{sh}", "(ii)", "a(sa{sv})", "(s(ii)v)",
        ] {
            assert!(validate_signature(sig).is_ok(), "{sig} should be valid");
        }
    }

    #[test]
    fn test_invalid_signatures() {
        for sig in ["", "a", "()", "{sv}", "a{vs}", "a{s}", "a{sss}", "(ii", "ii", "z", ")"] {
            assert!(validate_signature(sig).is_err(), "{sig:?} should be invalid");
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}s", "a".repeat(MAX_NESTING_DEPTH));
        assert!(validate_signature(&deep).is_ok());
        let too_deep = format!("{}s", "a".repeat(MAX_NESTING_DEPTH + 1));
        assert!(validate_signature(&too_deep).is_err());
    }

    #[test]
    fn test_error_mentions_signature() {
        let err = validate_signature("a{vs}").unwrap_err();
        assert_eq!(err.signature, "a{vs}");
        assert!(err.reason.contains("basic"));
    }

    #[test]
    fn test_native_mapping() {
        assert!(has_native_mapping("s"));
        assert!(has_native_mapping("h"));
        assert!(has_native_mapping("as"));
        assert!(has_native_mapping("aay"));
        assert!(!has_native_mapping("v"));
        assert!(!has_native_mapping("a{sv}"));
        assert!(!has_native_mapping("(ii)"));
    }

    #[test]
    fn test_contains_unix_fd() {
        assert!(contains_unix_fd("h"));
        assert!(contains_unix_fd("a{sh}"));
        assert!(!contains_unix_fd("a{sv}"));
    }
}
