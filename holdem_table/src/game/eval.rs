//! Hand evaluation.
//!
//! Every 5-card subset of the available cards is scored and the strongest
//! `(rank, kickers)` pair wins. Two scores tie exactly when both the rank
//! and the full kicker list are equal, which is what split pots rely on.

use serde::Serialize;
use std::{cmp::Ordering, fmt};

use super::entities::{ACE, Card, Value, value_char};

/// Hand category, weakest first. `Invalid` only appears when fewer than
/// five cards were available and never wins against a real hand.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Invalid,
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl Rank {
    /// Numeric category, 1 (high card) through 9 (straight flush).
    pub fn category(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Invalid => "invalid",
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandScore {
    pub rank: Rank,
    /// Tie-break values, most significant first.
    pub kickers: Vec<Value>,
    pub label: String,
    /// The five cards making the hand, highest value first.
    pub best_five: Vec<Card>,
}

impl HandScore {
    fn invalid() -> Self {
        Self {
            rank: Rank::Invalid,
            kickers: Vec::new(),
            label: "Invalid Hand (<5 cards)".to_string(),
            best_five: Vec::new(),
        }
    }

    /// Compare hand strength only; labels and chosen cards are ignored.
    pub fn cmp_strength(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.kickers.cmp(&other.kickers))
    }

    pub fn ties(&self, other: &Self) -> bool {
        self.cmp_strength(other) == Ordering::Equal
    }
}

/// Score the best hand available from hole cards plus the board.
pub fn evaluate(hole: &[Card], board: &[Card]) -> HandScore {
    let cards: Vec<Card> = hole.iter().chain(board).copied().collect();
    evaluate_cards(&cards)
}

/// Score the best 5-card hand among `cards`.
pub fn evaluate_cards(cards: &[Card]) -> HandScore {
    if cards.len() < 5 {
        return HandScore::invalid();
    }

    let mut best: Option<HandScore> = None;
    for idx in five_card_subsets(cards.len()) {
        let score = score_five(idx.map(|i| cards[i]));
        if best
            .as_ref()
            .is_none_or(|b| score.cmp_strength(b) == Ordering::Greater)
        {
            best = Some(score);
        }
    }
    best.unwrap_or_else(HandScore::invalid)
}

fn five_card_subsets(n: usize) -> Vec<[usize; 5]> {
    let mut subsets = Vec::new();
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        subsets.push([a, b, c, d, e]);
                    }
                }
            }
        }
    }
    subsets
}

/// Top card of a straight in values sorted high to low. The wheel
/// (A-2-3-4-5) plays as a five-high straight.
fn straight_high(values: &[Value]) -> Option<Value> {
    let distinct = values.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if values[0] - values[4] == 4 {
        Some(values[0])
    } else if values == [ACE, 5, 4, 3, 2] {
        Some(5)
    } else {
        None
    }
}

fn score_five(mut cards: [Card; 5]) -> HandScore {
    cards.sort_unstable_by(|a, b| b.cmp(a));
    let values: Vec<Value> = cards.iter().map(|c| c.0).collect();
    let is_flush = cards.iter().all(|c| c.1 == cards[0].1);
    let straight = straight_high(&values);

    // (count, value), largest groups first and higher values breaking ties.
    let mut groups: Vec<(usize, Value)> = Vec::new();
    for &value in &values {
        match groups.iter_mut().find(|(_, v)| *v == value) {
            Some(group) => group.0 += 1,
            None => groups.push((1, value)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<Value> = groups.iter().map(|&(_, v)| v).collect();
    let second_group = groups.get(1).map(|&(count, _)| count);

    let (rank, kickers) = match (is_flush, straight, groups[0].0, second_group) {
        (true, Some(high), ..) => (Rank::StraightFlush, vec![high]),
        (_, _, 4, _) => (Rank::FourOfAKind, grouped),
        (_, _, 3, Some(2)) => (Rank::FullHouse, grouped),
        (true, None, ..) => (Rank::Flush, values),
        (false, Some(high), ..) => (Rank::Straight, vec![high]),
        (_, _, 3, _) => (Rank::ThreeOfAKind, grouped),
        (_, _, 2, Some(2)) => (Rank::TwoPair, grouped),
        (_, _, 2, _) => (Rank::OnePair, grouped),
        _ => (Rank::HighCard, values),
    };

    HandScore {
        label: label(rank, &kickers),
        rank,
        kickers,
        best_five: cards.to_vec(),
    }
}

fn label(rank: Rank, kickers: &[Value]) -> String {
    let name = |idx: usize| kickers.get(idx).map_or('?', |&v| value_char(v));
    match rank {
        Rank::Invalid => "Invalid Hand (<5 cards)".to_string(),
        Rank::StraightFlush if kickers.first() == Some(&ACE) => "Royal Flush".to_string(),
        Rank::StraightFlush => format!("{}-high Straight Flush", name(0)),
        Rank::FourOfAKind => format!("Four of a Kind, {}s", name(0)),
        Rank::FullHouse => format!("Full House, {}s full of {}s", name(0), name(1)),
        Rank::Flush => format!("{}-high Flush", name(0)),
        Rank::Straight => format!("{}-high Straight", name(0)),
        Rank::ThreeOfAKind => format!("Three of a Kind, {}s", name(0)),
        Rank::TwoPair => format!("Two Pair, {}s & {}s", name(0), name(1)),
        Rank::OnePair => format!("Pair of {}s", name(0)),
        Rank::HighCard => format!("{}-High", name(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(repr: &str) -> Vec<Card> {
        repr.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn score(repr: &str) -> HandScore {
        evaluate_cards(&cards(repr))
    }

    // === Category Tests ===

    #[test]
    fn test_royal_flush() {
        let s = score("As Ks Qs Js Ts 2h 3d");
        assert_eq!(s.rank, Rank::StraightFlush);
        assert_eq!(s.kickers, vec![14]);
        assert_eq!(s.label, "Royal Flush");
        assert_eq!(s.best_five, cards("As Ks Qs Js Ts"));
    }

    #[test]
    fn test_steel_wheel() {
        let s = score("Ah 2h 3h 4h 5h Kc Kd");
        assert_eq!(s.rank, Rank::StraightFlush);
        assert_eq!(s.kickers, vec![5]);
        assert_eq!(s.label, "5-high Straight Flush");
    }

    #[test]
    fn test_four_of_a_kind_keeps_best_kicker() {
        let s = score("9s 9h 9d 9c 2h Kd 3c");
        assert_eq!(s.rank, Rank::FourOfAKind);
        assert_eq!(s.kickers, vec![9, 13]);
        assert_eq!(s.label, "Four of a Kind, 9s");
    }

    #[test]
    fn test_full_house_prefers_higher_trips() {
        let s = score("Ks Kh Kd 7c 7h 7d 2s");
        assert_eq!(s.rank, Rank::FullHouse);
        assert_eq!(s.kickers, vec![13, 7]);
        assert_eq!(s.label, "Full House, Ks full of 7s");
    }

    #[test]
    fn test_flush_uses_five_highest() {
        let s = score("Ad Jd 9d 6d 3d 2d Kc");
        assert_eq!(s.rank, Rank::Flush);
        assert_eq!(s.kickers, vec![14, 11, 9, 6, 3]);
        assert_eq!(s.label, "A-high Flush");
    }

    #[test]
    fn test_wheel_straight_ranks_below_six_high() {
        let wheel = score("Ac 2d 3h 4s 5c");
        let six_high = score("2d 3h 4s 5c 6d");
        assert_eq!(wheel.rank, Rank::Straight);
        assert_eq!(wheel.kickers, vec![5]);
        assert_eq!(wheel.label, "5-high Straight");
        assert_eq!(wheel.best_five[0], Card(14, crate::game::entities::Suit::Club));
        assert_eq!(six_high.cmp_strength(&wheel), Ordering::Greater);
    }

    #[test]
    fn test_no_wraparound_straight() {
        let s = score("Qc Kd Ah 2s 3c");
        assert_eq!(s.rank, Rank::HighCard);
    }

    #[test]
    fn test_two_pair_kickers() {
        let s = score("Kc Kd 7h 7s Ac 2d 3h");
        assert_eq!(s.rank, Rank::TwoPair);
        assert_eq!(s.kickers, vec![13, 7, 14]);
        assert_eq!(s.label, "Two Pair, Ks & 7s");
    }

    #[test]
    fn test_three_pairs_drop_lowest() {
        let s = score("Kc Kd 7h 7s 4c 4d 2h");
        assert_eq!(s.kickers, vec![13, 7, 4]);
    }

    #[test]
    fn test_pair_and_high_card_labels() {
        assert_eq!(score("Tc Td 7h 5s 2c").label, "Pair of Ts");
        assert_eq!(score("Qc 9d 7h 5s 2c").label, "Q-High");
        assert_eq!(score("Qc 9d 7h 5s 2c").rank.category(), 1);
    }

    #[test]
    fn test_too_few_cards_is_invalid() {
        let s = evaluate(&cards("As Ad"), &cards("Ah Ac"));
        assert_eq!(s.rank, Rank::Invalid);
        assert_eq!(s.rank.category(), 0);
        assert_eq!(s.label, "Invalid Hand (<5 cards)");
        assert!(s.best_five.is_empty());
    }

    // === Comparison Tests ===

    #[test]
    fn test_kicker_decides_pairs() {
        let a = score("Ac Ad Kh 7s 2c");
        let b = score("Ah As Qh 7c 2d");
        assert_eq!(a.cmp_strength(&b), Ordering::Greater);
    }

    #[test]
    fn test_board_plays_is_a_tie() {
        let board = cards("As Ks Qs Js Ts");
        let a = evaluate(&cards("2c 3d"), &board);
        let b = evaluate(&cards("4h 5h"), &board);
        assert!(a.ties(&b));
    }

    #[test]
    fn test_flush_beats_straight() {
        let flush = score("2h 5h 8h Jh Kh");
        let straight = score("9c Td Jh Qs Kc");
        assert_eq!(flush.cmp_strength(&straight), Ordering::Greater);
    }

    #[test]
    fn test_subset_count() {
        assert_eq!(five_card_subsets(5).len(), 1);
        assert_eq!(five_card_subsets(6).len(), 6);
        assert_eq!(five_card_subsets(7).len(), 21);
    }
}
