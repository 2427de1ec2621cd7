/// Kubernetes `major.minor` version handling
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors parsing a Kubernetes version string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("empty kubernetes version")]
    Empty,

    #[error("kubernetes version {0:?} has no minor component")]
    MissingMinor(String),

    #[error("invalid {part} version {value:?} in {input:?}")]
    InvalidNumber {
        input: String,
        part: &'static str,
        value: String,
    },
}

/// A Kubernetes release line such as 1.27
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KubernetesVersion {
    pub major: u32,
    pub minor: u32,
}

/// `serverVersion` block of `kubectl version -o json`
#[derive(Debug, Deserialize)]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
}

impl KubernetesVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse `1.27`, `v1.27.3` or `1.27+`
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let mut parts = trimmed.split('.');
        let major = parts.next().unwrap_or_default();
        let minor = parts
            .next()
            .ok_or_else(|| VersionError::MissingMinor(input.to_string()))?;

        Self::from_parts_of(input, major, minor)
    }

    /// Build from the separate major/minor strings a cluster reports
    pub fn from_info(info: &VersionInfo) -> Result<Self, VersionError> {
        let input = format!("{}.{}", info.major, info.minor);
        Self::from_parts_of(&input, &info.major, &info.minor)
    }

    fn from_parts_of(input: &str, major: &str, minor: &str) -> Result<Self, VersionError> {
        let number = |part: &'static str, value: &str| {
            // managed clouds report minors like "27+"
            let digits = value.trim().trim_end_matches('+');
            digits
                .parse::<u32>()
                .map_err(|_| VersionError::InvalidNumber {
                    input: input.to_string(),
                    part,
                    value: value.to_string(),
                })
        };

        Ok(Self::new(number("major", major)?, number("minor", minor)?))
    }

    /// Version table key, e.g. `1.27`
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for KubernetesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let expected = KubernetesVersion::new(1, 27);
        assert_eq!(KubernetesVersion::parse("1.27").unwrap(), expected);
        assert_eq!(KubernetesVersion::parse("v1.27.3").unwrap(), expected);
        assert_eq!(KubernetesVersion::parse(" 1.27+ ").unwrap(), expected);
        assert_eq!(expected.major_minor(), "1.27");
        assert_eq!(expected.to_string(), "v1.27");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(KubernetesVersion::parse(""), Err(VersionError::Empty));
        assert_eq!(
            KubernetesVersion::parse("1"),
            Err(VersionError::MissingMinor("1".to_string()))
        );
        let err = KubernetesVersion::parse("1.x").unwrap_err();
        assert_eq!(err.to_string(), r#"invalid minor version "x" in "1.x""#);
    }

    #[test]
    fn test_from_cluster_info() {
        let info: VersionInfo =
            serde_json::from_str(r#"{"major":"1","minor":"28+","gitVersion":"v1.28.9-eks-036c24b"}"#)
                .unwrap();
        assert_eq!(
            KubernetesVersion::from_info(&info).unwrap(),
            KubernetesVersion::new(1, 28)
        );
    }

    #[test]
    fn test_ordering() {
        assert!(KubernetesVersion::new(1, 9) < KubernetesVersion::new(1, 24));
    }
}
