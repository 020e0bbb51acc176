//! Validated identifiers for the upload destination.
//!
//! Both types can only be constructed from a string that passes validation,
//! so holding one is proof the value is acceptable. They deserialize through
//! the same checks, meaning an invalid value in a config file or environment
//! variable is rejected at load time.

use crate::error::{Error, ErrorKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[\w-]+/)+$").unwrap());
static IPV4_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,3}(?:\.\d{1,3}){3}$").unwrap());

/// Key prefix that every uploaded object is stored under.
///
/// One or more segments of word characters or hyphens, each followed by `/`.
///
/// ```
/// use bucketeer_config::Prefix;
///
/// assert!("a/".parse::<Prefix>().is_ok());
/// assert!("a-b/c_d/".parse::<Prefix>().is_ok());
/// assert!("a".parse::<Prefix>().is_err());
/// assert!("/a/".parse::<Prefix>().is_err());
/// assert!("a//".parse::<Prefix>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(String);

impl Prefix {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl TryFrom<String> for Prefix {
    type Error = ErrorKind;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match PREFIX_REGEX.is_match(&value) {
            true => Ok(Self(value)),
            false => Err(ErrorKind::InvalidPrefix(value)),
        }
    }
}
impl FromStr for Prefix {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::try_from(s.to_string())?)
    }
}
impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.0
    }
}
impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the destination bucket, following DNS-compatible bucket naming.
///
/// - 3 to 63 characters long
/// - only lowercase letters, digits, dots and hyphens
/// - begins and ends with a letter or digit
/// - no two adjacent dots
/// - not formatted like an IPv4 address
///
/// ```
/// use bucketeer_config::BucketName;
///
/// assert!("my-bucket".parse::<BucketName>().is_ok());
/// assert!("1.2.3.4".parse::<BucketName>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketName(String);

impl BucketName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn check(value: &str) -> Option<&'static str> {
        let bytes = value.as_bytes();
        if !(3..=63).contains(&bytes.len()) {
            return Some("must be between 3 and 63 characters long");
        }
        if !bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'.' || *b == b'-') {
            return Some("may only contain lowercase letters, digits, dots and hyphens");
        }
        let alphanumeric = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
        if !bytes.first().is_some_and(alphanumeric) || !bytes.last().is_some_and(alphanumeric) {
            return Some("must begin and end with a letter or digit");
        }
        if value.contains("..") {
            return Some("must not contain two adjacent dots");
        }
        if IPV4_REGEX.is_match(value) {
            return Some("must not be formatted as an IP address");
        }
        None
    }
}
impl TryFrom<String> for BucketName {
    type Error = ErrorKind;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match Self::check(&value) {
            None => Ok(Self(value)),
            Some(reason) => Err(ErrorKind::InvalidBucket(value, reason)),
        }
    }
}
impl FromStr for BucketName {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::try_from(s.to_string())?)
    }
}
impl From<BucketName> for String {
    fn from(bucket: BucketName) -> Self {
        bucket.0
    }
}
impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a/")]
    #[case("a-b/c_d/")]
    #[case("my-folder/")]
    #[case("2024/videos/raw_footage/")]
    #[case("über/")]
    fn test_valid_prefix(#[case] input: &str) {
        assert_eq!(input.parse::<Prefix>().unwrap().as_str(), input);
    }

    #[rstest]
    #[case("")]
    #[case("a")]
    #[case("/a/")]
    #[case("a//")]
    #[case("a/b")]
    #[case("a b/")]
    #[case("a.b/")]
    #[case("../")]
    fn test_invalid_prefix(#[case] input: &str) {
        let err = input.parse::<Prefix>().unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidPrefix(input.to_string()));
    }

    #[rstest]
    #[case("my-bucket")]
    #[case("ab.c-d")]
    #[case("abc")]
    #[case("1.2.3.4.5")]
    #[case("bucket-2024.backups")]
    #[case("a23456789012345678901234567890123456789012345678901234567890123")]
    fn test_valid_bucket(#[case] input: &str) {
        assert_eq!(input.parse::<BucketName>().unwrap().as_str(), input);
    }

    #[rstest]
    #[case("AB", "must be between 3 and 63 characters long")]
    #[case("ABC", "may only contain lowercase letters, digits, dots and hyphens")]
    #[case("1.2.3.4", "must not be formatted as an IP address")]
    #[case("a..b", "must not contain two adjacent dots")]
    #[case("-ab", "must begin and end with a letter or digit")]
    #[case("ab-", "must begin and end with a letter or digit")]
    #[case(".ab", "must begin and end with a letter or digit")]
    #[case("my_bucket", "may only contain lowercase letters, digits, dots and hyphens")]
    #[case("a234567890123456789012345678901234567890123456789012345678901234", "must be between 3 and 63 characters long")]
    fn test_invalid_bucket(#[case] input: &str, #[case] reason: &'static str) {
        let err = input.parse::<BucketName>().unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidBucket(input.to_string(), reason));
    }

    #[test]
    fn test_error_message_names_value() {
        let err = "a".parse::<Prefix>().unwrap_err();
        assert!((*err).to_string().starts_with("invalid prefix `a`"));
    }
}
