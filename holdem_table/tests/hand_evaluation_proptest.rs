/// Property-based tests for hand evaluation using proptest
///
/// These tests verify that the hand evaluation logic is consistent
/// across a wide range of randomly generated card combinations.
use holdem_table::game::{
    entities::{Card, Suit},
    eval::{Rank, evaluate, evaluate_cards},
};
use proptest::prelude::*;
use std::{cmp::Ordering, collections::BTreeSet};

// Strategy to generate a valid card (values 2-14, aces high)
fn card_strategy() -> impl Strategy<Value = Card> {
    (2u8..=14, 0usize..4).prop_map(|(value, suit_idx)| Card(value, Suit::ALL[suit_idx]))
}

// Strategy to generate a vec of unique cards (no duplicates)
fn unique_cards_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Card>> {
    prop::collection::vec(card_strategy(), min..=max).prop_filter("Cards must be unique", |cards| {
        let set: BTreeSet<_> = cards.iter().collect();
        set.len() == cards.len()
    })
}

fn cards(text: &str) -> Vec<Card> {
    text.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

proptest! {
    #[test]
    fn test_best_five_comes_from_input(cards in unique_cards_strategy(5, 7)) {
        let score = evaluate_cards(&cards);
        prop_assert_eq!(score.best_five.len(), 5);
        for card in &score.best_five {
            prop_assert!(cards.contains(card), "{} not in input", card);
        }
    }

    #[test]
    fn test_order_does_not_matter(
        (cards, shuffled) in unique_cards_strategy(5, 7)
            .prop_flat_map(|cards| (Just(cards.clone()), Just(cards).prop_shuffle()))
    ) {
        let original = evaluate_cards(&cards);
        let permuted = evaluate_cards(&shuffled);
        prop_assert!(original.ties(&permuted));
        prop_assert_eq!(original.label, permuted.label);
    }

    #[test]
    fn test_higher_category_always_wins(
        a in unique_cards_strategy(7, 7),
        b in unique_cards_strategy(7, 7),
    ) {
        let a = evaluate_cards(&a);
        let b = evaluate_cards(&b);
        let expected = match a.rank.cmp(&b.rank) {
            Ordering::Equal => return Ok(()),
            unequal => unequal,
        };
        prop_assert_eq!(a.cmp_strength(&b), expected);
        prop_assert_eq!(b.cmp_strength(&a), expected.reverse());
    }

    #[test]
    fn test_best_five_scores_the_same(cards in unique_cards_strategy(6, 7)) {
        let score = evaluate_cards(&cards);
        let rescored = evaluate_cards(&score.best_five);
        prop_assert_eq!(score.cmp_strength(&rescored), Ordering::Equal);
    }

    #[test]
    fn test_more_cards_never_weaker(cards in unique_cards_strategy(7, 7)) {
        let five = evaluate_cards(&cards[..5]);
        let seven = evaluate_cards(&cards);
        prop_assert_ne!(seven.cmp_strength(&five), Ordering::Less);
    }

    #[test]
    fn test_hole_and_board_split_is_irrelevant(cards in unique_cards_strategy(7, 7)) {
        let split = evaluate(&cards[..2], &cards[2..]);
        let whole = evaluate_cards(&cards);
        prop_assert!(split.ties(&whole));
    }

    #[test]
    fn test_category_in_range(cards in unique_cards_strategy(5, 7)) {
        let category = evaluate_cards(&cards).rank.category();
        prop_assert!((1..=9).contains(&category));
    }
}

// === Category Ordering Tests ===

#[test]
fn test_categories_rank_in_order() {
    let ladder = [
        ("2c 5d 9h Jc Ks", Rank::HighCard),
        ("2c 2d 9h Jc Ks", Rank::OnePair),
        ("2c 2d 9h 9c Ks", Rank::TwoPair),
        ("2c 2d 2h Jc Ks", Rank::ThreeOfAKind),
        ("As 2d 3h 4c 5s", Rank::Straight),
        ("2c 5c 9c Jc Kc", Rank::Flush),
        ("2c 2d 2h Kc Ks", Rank::FullHouse),
        ("2c 2d 2h 2s Ks", Rank::FourOfAKind),
        ("9h Th Jh Qh Kh", Rank::StraightFlush),
    ];
    let scores: Vec<_> = ladder
        .iter()
        .map(|(hand, rank)| {
            let score = evaluate_cards(&cards(hand));
            assert_eq!(score.rank, *rank, "{hand}");
            score
        })
        .collect();
    for pair in scores.windows(2) {
        assert_eq!(pair[0].cmp_strength(&pair[1]), Ordering::Less);
    }
}

#[test]
fn test_wheel_loses_to_six_high_straight() {
    let wheel = evaluate_cards(&cards("As 2d 3h 4c 5s"));
    let six_high = evaluate_cards(&cards("2d 3h 4c 5s 6s"));
    assert_eq!(wheel.cmp_strength(&six_high), Ordering::Less);
    assert_eq!(wheel.label, "5-high Straight");
}

#[test]
fn test_kickers_break_pair_ties() {
    let board = cards("Kd 8s 7c 3h 2d");
    let ace_kicker = evaluate(&cards("Kh As"), &board);
    let queen_kicker = evaluate(&cards("Kc Qs"), &board);
    assert_eq!(ace_kicker.rank, Rank::OnePair);
    assert_eq!(ace_kicker.cmp_strength(&queen_kicker), Ordering::Greater);
}

#[test]
fn test_board_plays_for_both() {
    let board = cards("Ts Js Qs Ks As");
    let ann = evaluate(&cards("2c 3d"), &board);
    let bob = evaluate(&cards("4h 5h"), &board);
    assert!(ann.ties(&bob));
    assert_eq!(ann.label, "Royal Flush");
}
