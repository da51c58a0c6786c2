//! Score computation for correct guesses and the drawer's reward. Pure
//! functions over a per-guess context; callers invoke them exactly once per
//! correct answer, before the guesser is marked correct.

/// Base scores for answer ranks 1 through 5; later ranks fall back to
/// [`LATE_RANK_SCORE`]. Strictly decreasing.
const RANK_BASE_SCORES: [u32; 5] = [100, 80, 60, 50, 40];

/// Base score for every rank past the table above.
const LATE_RANK_SCORE: u32 = 30;

/// Discount applied per revealed letter-head (chosung) position.
const CHOSUNG_REVEAL_DISCOUNT: f64 = 0.05;

/// Discount applied per fully revealed letter; weighted double the
/// letter-head discount since a whole character gives much more away.
const LETTER_REVEAL_DISCOUNT: f64 = 0.10;

/// The combined hint discount never drives a score below half its base.
const HINT_MULTIPLIER_FLOOR: f64 = 0.5;

/// Bonus credited to the drawer for each correct guesser, before scaling.
const DRAWER_BASE_BONUS: f64 = 20.0;

/// Everything the scoring rules need to know about one correct guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessContext {
    /// 1-based position of this guess among the turn's correct answers.
    pub rank: usize,
    /// Number of players in the game, drawer included.
    pub total_players: usize,
    /// Hint level of the turn when the answer landed (0 = no hint yet, 1 =
    /// length shown, 2 = positions being revealed).
    pub hint_level: u8,
    /// Letter-head positions revealed so far this turn.
    pub chosung_reveals: usize,
    /// Full-letter positions revealed so far this turn.
    pub letter_reveals: usize,
}

/// Points awarded to the guesser for this correct answer.
pub fn guesser_score(ctx: &GuessContext) -> u32 {
    let base = rank_base_score(ctx.rank);
    round_half_up(f64::from(base) * hint_multiplier(ctx))
}

/// Bonus credited to the drawer for this correct answer.
///
/// The base bonus is scaled up for small games and down for large ones, then
/// discounted by the same hint multiplier as the guesser's score. While no
/// hint at all has been revealed, an additional early-answer penalty kicks
/// in once a large fraction of the field has answered, so a trivially easy
/// drawing does not pay full price. Any revealed hint disables that penalty
/// — the length-only hint included.
pub fn drawer_bonus(ctx: &GuessContext) -> u32 {
    let mut bonus = DRAWER_BASE_BONUS * player_count_multiplier(ctx.total_players);
    bonus *= hint_multiplier(ctx);
    if ctx.hint_level == 0 {
        bonus *= early_answer_multiplier(ctx.rank, ctx.total_players.saturating_sub(1));
    }
    round_half_up(bonus)
}

fn rank_base_score(rank: usize) -> u32 {
    match rank {
        0 => 0,
        _ => RANK_BASE_SCORES
            .get(rank - 1)
            .copied()
            .unwrap_or(LATE_RANK_SCORE),
    }
}

fn hint_multiplier(ctx: &GuessContext) -> f64 {
    let discount = CHOSUNG_REVEAL_DISCOUNT * ctx.chosung_reveals as f64
        + LETTER_REVEAL_DISCOUNT * ctx.letter_reveals as f64;
    (1.0 - discount).max(HINT_MULTIPLIER_FLOOR)
}

/// Five tiers keyed to the total player count: small games pay the drawer
/// more per guess, big games less.
fn player_count_multiplier(total_players: usize) -> f64 {
    match total_players {
        0..=3 => 1.5,
        4..=5 => 1.2,
        6..=7 => 1.0,
        8..=9 => 0.8,
        _ => 0.6,
    }
}

/// Penalty on no-hint turns, keyed to the fraction of guessers already
/// correct once this answer lands.
fn early_answer_multiplier(rank: usize, guesser_count: usize) -> f64 {
    if guesser_count == 0 {
        return 1.0;
    }
    let fraction = rank as f64 / guesser_count as f64;
    if fraction > 0.75 {
        0.5
    } else if fraction > 0.5 {
        0.75
    } else {
        1.0
    }
}

/// Round-half-up to the nearest integer, clamped at zero.
fn round_half_up(value: f64) -> u32 {
    let rounded = (value + 0.5).floor();
    if rounded <= 0.0 { 0 } else { rounded as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(rank: usize, total_players: usize) -> GuessContext {
        GuessContext {
            rank,
            total_players,
            hint_level: 0,
            chosung_reveals: 0,
            letter_reveals: 0,
        }
    }

    #[test]
    fn rank_table_is_strictly_decreasing_then_flat() {
        let scores: Vec<u32> = (1..=7).map(|rank| guesser_score(&ctx(rank, 10))).collect();
        assert_eq!(scores, vec![100, 80, 60, 50, 40, 30, 30]);
        for window in scores[..5].windows(2) {
            assert!(window[0] > window[1]);
        }
    }

    #[test]
    fn first_guesser_in_three_player_game_no_hints() {
        // 1 drawer + 2 guessers, A answers first: rank-1 base for A, the
        // small-game drawer bonus for the drawer.
        let context = ctx(1, 3);
        assert_eq!(guesser_score(&context), 100);
        assert_eq!(drawer_bonus(&context), 30);
    }

    #[test]
    fn chosung_reveals_discount_the_guesser() {
        let context = GuessContext {
            hint_level: 2,
            chosung_reveals: 1,
            ..ctx(1, 4)
        };
        assert_eq!(guesser_score(&context), 95);

        let context = GuessContext {
            hint_level: 2,
            chosung_reveals: 3,
            ..ctx(1, 4)
        };
        assert_eq!(guesser_score(&context), 85);
    }

    #[test]
    fn letter_reveals_weigh_double_chosung_reveals() {
        let letter = GuessContext {
            hint_level: 2,
            letter_reveals: 1,
            ..ctx(1, 4)
        };
        let chosung = GuessContext {
            hint_level: 2,
            chosung_reveals: 1,
            ..ctx(1, 4)
        };
        assert_eq!(guesser_score(&letter), 90);
        assert!(guesser_score(&letter) < guesser_score(&chosung));
    }

    #[test]
    fn hint_discount_is_floored() {
        let context = GuessContext {
            hint_level: 2,
            chosung_reveals: 4,
            letter_reveals: 6,
            ..ctx(1, 4)
        };
        // 0.05*4 + 0.10*6 = 0.80 of discount, clamped to the 0.5 floor.
        assert_eq!(guesser_score(&context), 50);
        assert_eq!(drawer_bonus(&context), 12);
    }

    #[test]
    fn drawer_bonus_scales_with_player_count_tiers() {
        // Length hint out so the early-answer penalty stays out of the
        // picture and the tier scaling shows through: 20 * tier.
        let bonuses: Vec<u32> = [2, 3, 4, 5, 6, 7, 8, 9, 10, 12]
            .iter()
            .map(|&players| {
                drawer_bonus(&GuessContext {
                    hint_level: 1,
                    ..ctx(1, players)
                })
            })
            .collect();
        assert_eq!(bonuses, vec![30, 30, 24, 24, 20, 20, 16, 16, 12, 12]);
        for window in bonuses.windows(2) {
            assert!(window[0] >= window[1]);
        }
    }

    #[test]
    fn late_no_hint_answers_shrink_the_drawer_bonus() {
        // 3 players, 2 guessers, no hints: the second answer covers the whole
        // field and halves the drawer's reward for it.
        assert_eq!(drawer_bonus(&ctx(2, 3)), 15);

        // 5 players, 4 guessers: ranks 1-2 full, rank 3 at 75%, rank 4 at 50%.
        assert_eq!(drawer_bonus(&ctx(1, 5)), 24);
        assert_eq!(drawer_bonus(&ctx(2, 5)), 24);
        assert_eq!(drawer_bonus(&ctx(3, 5)), 18);
        assert_eq!(drawer_bonus(&ctx(4, 5)), 12);
    }

    #[test]
    fn any_hint_disables_the_early_answer_penalty() {
        // The length-only hint already counts: 3 players, rank 2 covers the
        // whole field, yet the drawer keeps the full 20 * 1.5 = 30.
        let context = GuessContext {
            hint_level: 1,
            ..ctx(2, 3)
        };
        assert_eq!(drawer_bonus(&context), 30);

        // Same with a letter-head revealed, minus its discount:
        // 20 * 1.5 * 0.95 = 28.5, rounded half-up; no early-answer halving.
        let context = GuessContext {
            hint_level: 2,
            chosung_reveals: 1,
            ..ctx(2, 3)
        };
        assert_eq!(drawer_bonus(&context), 29);
    }

    #[test]
    fn scores_are_never_negative() {
        for rank in 1..=12 {
            for total_players in 2..=12 {
                for hint_level in 0..=2 {
                    for chosung_reveals in 0..=8 {
                        for letter_reveals in 0..=8 {
                            let context = GuessContext {
                                rank,
                                total_players,
                                hint_level,
                                chosung_reveals,
                                letter_reveals,
                            };
                            // u32 already forbids negatives; make sure the
                            // floor keeps both rewards meaningful too.
                            assert!(guesser_score(&context) >= 15);
                            assert!(drawer_bonus(&context) >= 3);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up(28.5), 29);
        assert_eq!(round_half_up(28.4), 28);
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(0.0), 0);
    }
}
