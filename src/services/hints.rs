//! Pure helpers choosing which characters of the secret word to disclose and
//! rendering the partially-masked display string. No state of its own; the
//! turn state carries the revealed position sets.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::IndexedRandom;

/// Placeholder glyph shown for positions that have not been revealed.
pub const MASK_GLYPH: &str = "_";

/// Initial consonants (chosung) of the Hangul syllable block, in jamo order.
const CHOSUNG_TABLE: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ',
    'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

const HANGUL_SYLLABLE_FIRST: u32 = 0xAC00; // 가
const HANGUL_SYLLABLE_LAST: u32 = 0xD7A3; // 힣
const SYLLABLES_PER_CHOSUNG: u32 = 588; // 21 medials x 28 finals

/// Whether `c` is a precomposed Hangul syllable with extractable chosung.
pub fn is_hangul_syllable(c: char) -> bool {
    (HANGUL_SYLLABLE_FIRST..=HANGUL_SYLLABLE_LAST).contains(&(c as u32))
}

/// Leading consonant of a Hangul syllable, `None` for any other character.
pub fn chosung(c: char) -> Option<char> {
    if !is_hangul_syllable(c) {
        return None;
    }
    let index = (c as u32 - HANGUL_SYLLABLE_FIRST) / SYLLABLES_PER_CHOSUNG;
    Some(CHOSUNG_TABLE[index as usize])
}

/// Pick the next character position to reveal, uniformly at random among the
/// positions not yet in `revealed`. Returns `None` when the word is
/// exhausted.
pub fn next_reveal_position<R: Rng + ?Sized>(
    word: &str,
    revealed: &BTreeSet<usize>,
    rng: &mut R,
) -> Option<usize> {
    let candidates: Vec<usize> = word
        .chars()
        .enumerate()
        .filter(|(index, _)| !revealed.contains(index))
        .map(|(index, _)| index)
        .collect();

    candidates.choose(rng).copied()
}

/// Render the display mask, one cell per character of the secret word.
///
/// A fully revealed letter wins over a revealed letter-head at the same
/// position. Characters without syllable structure (ASCII letters, digits,
/// punctuation) render as themselves once revealed; they are never reduced to
/// a letter-head.
pub fn render_mask(
    word: &str,
    chosung_positions: &BTreeSet<usize>,
    letter_positions: &BTreeSet<usize>,
) -> Vec<String> {
    word.chars()
        .enumerate()
        .map(|(index, c)| {
            if letter_positions.contains(&index) {
                c.to_string()
            } else if chosung_positions.contains(&index) {
                chosung(c).unwrap_or(c).to_string()
            } else {
                MASK_GLYPH.to_owned()
            }
        })
        .collect()
}
