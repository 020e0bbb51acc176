//! Interactive fallback for settings no other source provided.

use crate::error::{ErrorKind, Result};
use bucketeer_config::error::ErrorKind as ConfigErrorKind;
use bucketeer_config::{BucketName, Prefix};
use dialoguer::Input;
use exn::ResultExt;

pub fn bucket() -> Result<BucketName> {
    ask("Bucket name")
}

pub fn prefix() -> Result<Prefix> {
    ask("Key prefix (e.g. videos/raw/)")
}

/// Asks until the answer is valid. There is no limit on attempts; each
/// rejection shows why the value was refused. Answers are checked exactly as
/// typed, surrounding whitespace included.
fn ask<T>(prompt: &str) -> Result<T>
where
    T: TryFrom<String, Error = ConfigErrorKind>,
{
    let answer: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| check::<T>(input))
        .interact_text()
        .or_raise(|| ErrorKind::Prompt)?;
    T::try_from(answer).or_raise(|| ErrorKind::Prompt)
}

fn check<T>(input: &str) -> std::result::Result<(), String>
where
    T: TryFrom<String, Error = ConfigErrorKind>,
{
    T::try_from(input.to_string()).map(drop).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a/")]
    #[case("a-b/c_d/")]
    #[case("videos/raw/")]
    fn test_prefix_accepted(#[case] input: &str) {
        assert_eq!(check::<Prefix>(input), Ok(()));
    }

    #[rstest]
    #[case("a")]
    #[case("/a/")]
    #[case("a//")]
    #[case("")]
    #[case(" a/ ")]
    #[case("a/ ")]
    fn test_prefix_rejected(#[case] input: &str) {
        let message = check::<Prefix>(input).unwrap_err();
        assert!(message.starts_with("invalid prefix"), "{message}");
    }

    #[rstest]
    #[case("AB", "must be between 3 and 63 characters long")]
    #[case("1.2.3.4", "must not be formatted as an IP address")]
    #[case("a..b", "must not contain two adjacent dots")]
    #[case("-ab", "must begin and end with a letter or digit")]
    fn test_bucket_rejected(#[case] input: &str, #[case] reason: &str) {
        let message = check::<BucketName>(input).unwrap_err();
        assert!(message.ends_with(reason), "{message}");
    }
}
