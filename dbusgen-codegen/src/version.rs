//! Version-gated feature policy.
//!
//! The caller states the oldest GLib release the generated code must build
//! against and the newest whose API it may use. Both are resolved once into a
//! [`VersionPolicy`]; emitters branch on its booleans and never look at
//! version numbers themselves.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for version bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Version string that is not `major[.minor[.micro]]`.
    #[error("unrecognized version string '{value}': invalid component '{component}'")]
    Format {
        /// The whole version string.
        value: String,
        /// The offending component.
        component: String,
    },

    /// Version outside the supported or requested range.
    #[error("invalid versions: {message}")]
    Range {
        /// Error message.
        message: String,
    },
}

impl VersionError {
    /// Creates a format error.
    pub fn format(value: impl Into<String>, component: impl Into<String>) -> Self {
        Self::Format {
            value: value.into(),
            component: component.into(),
        }
    }

    /// Creates a range error.
    pub fn range(message: impl Into<String>) -> Self {
        Self::Range {
            message: message.into(),
        }
    }
}

/// A `major.minor.micro` release number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component; odd values denote development snapshots.
    pub minor: u32,
    /// Micro component.
    pub micro: u32,
}

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }

    /// Returns true if this is a development snapshot.
    #[must_use]
    pub const fn is_unstable(&self) -> bool {
        self.minor % 2 == 1
    }

    /// Rounds a development snapshot up to the next stable release.
    ///
    /// Returns `None` when the minor number cannot be incremented.
    #[must_use]
    pub const fn next_stable(self) -> Option<Self> {
        if !self.is_unstable() {
            return Some(self);
        }
        match self.minor.checked_add(1) {
            Some(minor) => Some(Self::new(self.major, minor, 0)),
            None => None,
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionError::format(s, parts[3..].join(".")));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::format(s, *part));
            }
            *slot = part.parse().map_err(|_| VersionError::format(s, *part))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

/// Version constants the policy is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyThresholds {
    /// Oldest supported release; lower bounds below it are rejected.
    pub floor: Version,
    /// Release assumed for `max_allowed` when none is given.
    pub current_release: Version,
    /// First release where handle-typed args alone enable fd lists.
    pub unconditional_fd_list: Version,
    /// First release where call wrappers take flags and a timeout.
    pub call_flags_and_timeout: Version,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            floor: Version::new(2, 30, 0),
            current_release: Version::new(2, 86, 0),
            unconditional_fd_list: Version::new(2, 64, 0),
            call_flags_and_timeout: Version::new(2, 64, 0),
        }
    }
}

/// Resolved feature policy consumed by the emitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Effective oldest release the output must support.
    pub min_required: Version,
    /// Effective newest release whose API the output may use.
    pub max_allowed: Version,
    /// Handle-typed arguments get fd-list parameters without an annotation.
    pub unconditional_fd_list_support: bool,
    /// Method call wrappers take `call_flags` and `timeout_msec`.
    pub call_flags_and_timeout_params: bool,
}

impl Default for VersionPolicy {
    fn default() -> Self {
        let thresholds = PolicyThresholds::default();
        Self::from_bounds(thresholds.floor, thresholds.current_release, &thresholds)
    }
}

impl VersionPolicy {
    /// Resolves the policy from optional version strings with the default
    /// thresholds.
    ///
    /// # Errors
    /// Returns `VersionError::Format` for unparsable strings and
    /// `VersionError::Range` for bounds below the floor or inverted bounds.
    pub fn resolve(
        min_required: Option<&str>,
        max_allowed: Option<&str>,
    ) -> Result<Self, VersionError> {
        Self::resolve_with(min_required, max_allowed, &PolicyThresholds::default())
    }

    /// Resolves the policy against explicit thresholds.
    ///
    /// # Errors
    /// See [`VersionPolicy::resolve`].
    pub fn resolve_with(
        min_required: Option<&str>,
        max_allowed: Option<&str>,
        thresholds: &PolicyThresholds,
    ) -> Result<Self, VersionError> {
        let min = match min_required {
            Some(s) => {
                let version: Version = s.parse()?;
                if version < thresholds.floor {
                    return Err(VersionError::range(format!(
                        "minimum required version {version} is below the oldest supported release {}",
                        thresholds.floor
                    )));
                }
                version
            }
            None => thresholds.floor,
        };

        let max = match max_allowed {
            Some(s) => {
                let version = s.parse::<Version>()?.next_stable().ok_or_else(|| {
                    VersionError::range(format!(
                        "maximum allowed version {s} has no following stable release"
                    ))
                })?;
                if version < thresholds.floor {
                    return Err(VersionError::range(format!(
                        "maximum allowed version {version} is below the oldest supported release {}",
                        thresholds.floor
                    )));
                }
                version
            }
            None => thresholds.current_release.max(min),
        };

        if max < min {
            return Err(VersionError::range(format!(
                "minimum required version ({min}) must be less than or equal to maximum allowed version ({max})"
            )));
        }

        let policy = Self::from_bounds(min, max, thresholds);
        tracing::debug!(
            min_required = %policy.min_required,
            max_allowed = %policy.max_allowed,
            unconditional_fd_list_support = policy.unconditional_fd_list_support,
            call_flags_and_timeout_params = policy.call_flags_and_timeout_params,
            "resolved version policy"
        );
        Ok(policy)
    }

    fn from_bounds(min: Version, max: Version, thresholds: &PolicyThresholds) -> Self {
        Self {
            min_required: min,
            max_allowed: max,
            unconditional_fd_list_support: min >= thresholds.unconditional_fd_list,
            call_flags_and_timeout_params: min >= thresholds.call_flags_and_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("2".parse::<Version>(), Ok(Version::new(2, 0, 0)));
        assert_eq!("2.64".parse::<Version>(), Ok(Version::new(2, 64, 0)));
        assert_eq!("2.46.2".parse::<Version>(), Ok(Version::new(2, 46, 2)));
    }

    #[test]
    fn test_parse_invalid_versions() {
        for s in ["hello mum", "", "2.", ".2", "2.x", "2.64.1.1", "-2", "+2", "2. 64"] {
            assert!(
                matches!(s.parse::<Version>(), Err(VersionError::Format { .. })),
                "{s:?} should not parse"
            );
        }
    }

    #[test]
    fn test_unstable_rounding() {
        assert!(Version::new(2, 63, 0).is_unstable());
        assert_eq!(Version::new(2, 63, 4).next_stable(), Some(Version::new(2, 64, 0)));
        assert_eq!(Version::new(2, 64, 1).next_stable(), Some(Version::new(2, 64, 1)));
        assert_eq!(Version::new(2, u32::MAX, 0).next_stable(), None);
    }

    #[test]
    fn test_max_minor_without_stable_release() {
        let err = VersionPolicy::resolve(None, Some("2.4294967295")).unwrap_err();
        assert!(matches!(err, VersionError::Range { .. }));

        let err = VersionPolicy::resolve(Some("2.4294967296"), None).unwrap_err();
        assert!(matches!(err, VersionError::Format { .. }));
    }

    #[test]
    fn test_default_policy_is_conservative() {
        let policy = VersionPolicy::resolve(None, None).expect("default policy");
        assert_eq!(policy.min_required, Version::new(2, 30, 0));
        assert!(!policy.unconditional_fd_list_support);
        assert!(!policy.call_flags_and_timeout_params);
        assert_eq!(policy, VersionPolicy::default());
    }

    #[test]
    fn test_feature_thresholds() {
        let old = VersionPolicy::resolve(Some("2.32"), None).expect("2.32");
        assert!(!old.unconditional_fd_list_support);
        assert!(!old.call_flags_and_timeout_params);

        let new = VersionPolicy::resolve(Some("2.64"), None).expect("2.64");
        assert!(new.unconditional_fd_list_support);
        assert!(new.call_flags_and_timeout_params);
    }

    #[test]
    fn test_independent_thresholds() {
        let thresholds = PolicyThresholds {
            call_flags_and_timeout: Version::new(2, 70, 0),
            ..PolicyThresholds::default()
        };
        let policy = VersionPolicy::resolve_with(Some("2.66"), None, &thresholds).expect("2.66");
        assert!(policy.unconditional_fd_list_support);
        assert!(!policy.call_flags_and_timeout_params);
    }

    #[test]
    fn test_min_required_invalid() {
        let err = VersionPolicy::resolve(Some("hello mum"), None).expect_err("invalid");
        assert!(matches!(err, VersionError::Format { .. }));
    }

    #[test]
    fn test_min_required_too_low() {
        let err = VersionPolicy::resolve(Some("2.6"), None).expect_err("too low");
        assert!(matches!(err, VersionError::Range { .. }));
    }

    #[test]
    fn test_max_allowed_too_low() {
        let err = VersionPolicy::resolve(None, Some("2.6")).expect_err("too low");
        assert!(matches!(err, VersionError::Range { .. }));
    }

    #[test]
    fn test_major_only() {
        let policy = VersionPolicy::resolve(Some("3"), Some("3.2")).expect("major only");
        assert_eq!(policy.min_required, Version::new(3, 0, 0));
        assert_eq!(policy.max_allowed, Version::new(3, 2, 0));

        let policy = VersionPolicy::resolve(None, Some("3")).expect("max major only");
        assert_eq!(policy.max_allowed, Version::new(3, 0, 0));
    }

    #[test]
    fn test_min_required_without_max_above_current_release() {
        let policy = VersionPolicy::resolve(Some("3"), None).expect("3 without max");
        assert_eq!(policy.max_allowed, Version::new(3, 0, 0));
    }

    #[test]
    fn test_with_micro() {
        assert!(VersionPolicy::resolve(Some("2.46.2"), None).is_ok());
        assert!(VersionPolicy::resolve(None, Some("2.46.2")).is_ok());
    }

    #[test]
    fn test_max_allowed_unstable_rounds_up() {
        let policy = VersionPolicy::resolve(Some("2.64"), Some("2.63")).expect("unstable max");
        assert_eq!(policy.max_allowed, Version::new(2, 64, 0));
    }

    #[test]
    fn test_max_allowed_less_than_min_required() {
        let err = VersionPolicy::resolve(Some("2.64"), Some("2.62")).expect_err("inverted");
        assert!(matches!(err, VersionError::Range { .. }));
    }
}
