//! Word supply collaborator. The engine only depends on the [`WordSupply`]
//! trait; the bundled bank ships a small tiered dictionary so the server is
//! playable without an external dictionary service.

use rand::seq::IndexedRandom;

/// Source of candidate words offered to the drawer.
pub trait WordSupply: Send + Sync {
    /// Return `count` distinct words mixed across difficulty tiers.
    fn word_choices(&self, count: usize) -> Vec<String>;
}

/// Built-in dictionary sampled uniformly within each difficulty tier.
#[derive(Debug, Default)]
pub struct BundledWordBank;

const EASY_WORDS: &[&str] = &[
    "사과", "바나나", "포도", "수박", "딸기", "강아지", "고양이", "토끼", "나무", "구름",
    "바다", "산", "해", "달", "별", "집", "문", "창문", "의자", "책상",
    "가방", "연필", "시계", "우산", "모자", "신발", "양말", "버스", "기차", "비행기",
];

const NORMAL_WORDS: &[&str] = &[
    "자전거", "냉장고", "세탁기", "텔레비전", "컴퓨터", "도서관", "놀이터", "미끄럼틀", "소방차", "경찰서",
    "수영장", "운동장", "김치찌개", "떡볶이", "삼겹살", "아이스크림", "솜사탕", "무지개", "허수아비", "눈사람",
    "선풍기", "에어컨", "청소기", "지하철", "횡단보도", "신호등", "낙하산", "돋보기", "현미경", "망원경",
];

const HARD_WORDS: &[&str] = &[
    "번지점프", "피라미드", "오케스트라", "마라톤", "재활용", "일기예보", "신기루", "부메랑", "모래시계", "만리장성",
    "자외선", "블랙홀", "유성우", "북극성", "잠수함", "헬리콥터", "케이블카", "롤러코스터", "관람차", "분수대",
    "종유석", "간헐천", "오로라", "백야", "해시계", "풍향계", "피뢰침", "등대", "방파제", "소용돌이",
];

impl WordSupply for BundledWordBank {
    fn word_choices(&self, count: usize) -> Vec<String> {
        let mut rng = rand::rng();
        let tiers = [EASY_WORDS, NORMAL_WORDS, HARD_WORDS];
        let mut chosen: Vec<String> = Vec::with_capacity(count);

        // Round-robin across tiers so every candidate set mixes difficulties.
        let mut round = 0;
        while chosen.len() < count && round < count * tiers.len() {
            let tier = tiers[round % tiers.len()];
            round += 1;
            for _ in 0..tier.len() {
                if let Some(word) = tier.choose(&mut rng)
                    && !chosen.iter().any(|existing| existing == word)
                {
                    chosen.push((*word).to_owned());
                    break;
                }
            }
        }

        // Exhausted tiers (absurdly large requests): fill deterministically.
        if chosen.len() < count {
            for word in tiers.iter().flat_map(|tier| tier.iter()) {
                if chosen.len() >= count {
                    break;
                }
                if !chosen.iter().any(|existing| existing == word) {
                    chosen.push((*word).to_owned());
                }
            }
        }

        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_are_distinct() {
        let bank = BundledWordBank;
        for _ in 0..50 {
            let words = bank.word_choices(3);
            assert_eq!(words.len(), 3);
            let mut deduped = words.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), 3);
        }
    }

    #[test]
    fn three_choices_span_all_tiers() {
        let bank = BundledWordBank;
        let words = bank.word_choices(3);
        assert!(EASY_WORDS.contains(&words[0].as_str()));
        assert!(NORMAL_WORDS.contains(&words[1].as_str()));
        assert!(HARD_WORDS.contains(&words[2].as_str()));
    }

    #[test]
    fn oversized_requests_are_capped_by_the_dictionary() {
        let bank = BundledWordBank;
        let total = EASY_WORDS.len() + NORMAL_WORDS.len() + HARD_WORDS.len();
        let words = bank.word_choices(total + 10);
        assert_eq!(words.len(), total);
    }
}
