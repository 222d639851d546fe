//! Main and side pot settlement.
//!
//! Pots are built from each player's total contribution to the hand. Every
//! distinct contribution level among the contenders closes one tier; a tier
//! holds what every player (folded or not) put in between the previous level
//! and this one, and only contenders who reached the level can win it.

use log::warn;
use std::collections::BTreeMap;

use super::{
    entities::{Chips, PlayerId},
    eval::HandScore,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PotTier {
    pub amount: Chips,
    pub eligible: Vec<PlayerId>,
}

/// Who took a tier and how much each of them received.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TierAward {
    pub amount: Chips,
    pub winners: Vec<PlayerId>,
    pub share: Chips,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Settlement {
    pub tiers: Vec<PotTier>,
    pub awards: Vec<TierAward>,
    /// Winnings per player, summed across tiers.
    pub payouts: BTreeMap<PlayerId, Chips>,
    /// Odd chips left over from uneven splits. These go to nobody.
    pub forfeited: Chips,
}

impl Settlement {
    pub fn total_paid(&self) -> Chips {
        self.payouts.values().sum()
    }
}

/// Split `pot_total` into tiers.
///
/// `contributions` holds every player who put chips in this hand, including
/// folded players. `contenders` are the players still eligible to win.
pub fn build_tiers(
    contributions: &BTreeMap<PlayerId, Chips>,
    contenders: &[PlayerId],
    pot_total: Chips,
) -> Vec<PotTier> {
    let mut levels: Vec<Chips> = contenders
        .iter()
        .filter_map(|id| contributions.get(id).copied())
        .filter(|&contribution| contribution > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut tiers = Vec::with_capacity(levels.len());
    let mut previous = 0;
    for level in levels {
        let amount = contributions
            .values()
            .map(|&c| c.min(level) - c.min(previous))
            .sum();
        let eligible = contenders
            .iter()
            .copied()
            .filter(|id| contributions.get(id).is_some_and(|&c| c >= level))
            .collect();
        tiers.push(PotTier { amount, eligible });
        previous = level;
    }

    reconcile(&mut tiers, contenders, pot_total);
    tiers
}

/// Make the tiers add up to the tracked pot by adjusting the last tier.
fn reconcile(tiers: &mut Vec<PotTier>, contenders: &[PlayerId], pot_total: Chips) {
    let tiered: Chips = tiers.iter().map(|tier| tier.amount).sum();
    if tiered == pot_total {
        return;
    }
    warn!("pot tiers sum to ${tiered} but the pot holds ${pot_total}; adjusting last tier");
    match tiers.last_mut() {
        Some(last) => {
            let adjusted = i64::from(last.amount) + i64::from(pot_total) - i64::from(tiered);
            last.amount = Chips::try_from(adjusted.max(0)).unwrap_or(Chips::MAX);
        }
        None => tiers.push(PotTier {
            amount: pot_total,
            eligible: contenders.to_vec(),
        }),
    }
}

/// Build the tiers and award each to the best eligible hand(s).
pub fn settle(
    contributions: &BTreeMap<PlayerId, Chips>,
    scores: &BTreeMap<PlayerId, HandScore>,
    pot_total: Chips,
) -> Settlement {
    let contenders: Vec<PlayerId> = scores.keys().copied().collect();
    let mut settlement = Settlement {
        tiers: build_tiers(contributions, &contenders, pot_total),
        ..Default::default()
    };

    for tier in &settlement.tiers {
        let best = tier
            .eligible
            .iter()
            .filter_map(|id| scores.get(id))
            .max_by(|a, b| a.cmp_strength(b));
        let Some(best) = best else {
            warn!("pot tier of ${} has no eligible winner", tier.amount);
            settlement.forfeited += tier.amount;
            continue;
        };

        let winners: Vec<PlayerId> = tier
            .eligible
            .iter()
            .copied()
            .filter(|id| scores.get(id).is_some_and(|score| score.ties(best)))
            .collect();
        let num_winners = winners.len() as Chips;
        let share = tier.amount / num_winners;
        let remainder = tier.amount % num_winners;
        if remainder > 0 {
            warn!("${remainder} left over from a {num_winners}-way split is forfeited");
            settlement.forfeited += remainder;
        }
        for &winner in &winners {
            *settlement.payouts.entry(winner).or_default() += share;
        }
        settlement.awards.push(TierAward {
            amount: tier.amount,
            winners,
            share,
        });
    }

    settlement
}
