//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::services::hints::is_hangul_syllable;

const WORD_MIN_CHARS: usize = 2;
const WORD_MAX_CHARS: usize = 10;

/// Validates that a custom word is 2–10 characters, each either a Hangul
/// syllable or an ASCII alphanumeric.
///
/// # Examples
///
/// ```ignore
/// validate_custom_word("사과")    // Ok
/// validate_custom_word("카페24")  // Ok
/// validate_custom_word("가")      // Err - too short
/// validate_custom_word("사 과")   // Err - whitespace
/// ```
pub fn validate_custom_word(word: &str) -> Result<(), ValidationError> {
    let length = word.chars().count();
    if !(WORD_MIN_CHARS..=WORD_MAX_CHARS).contains(&length) {
        let mut err = ValidationError::new("word_length");
        err.message = Some(
            format!(
                "word must be {WORD_MIN_CHARS}-{WORD_MAX_CHARS} characters (got {length})"
            )
            .into(),
        );
        return Err(err);
    }

    if !word
        .chars()
        .all(|c| is_hangul_syllable(c) || c.is_ascii_alphanumeric())
    {
        let mut err = ValidationError::new("word_format");
        err.message =
            Some("word must contain only Hangul syllables or ASCII alphanumerics".into());
        return Err(err);
    }

    Ok(())
}
