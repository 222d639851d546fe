use thiserror::Error;

use super::entities::{ActionChoice, Chips, PlayerStatus, Stage};

/// Errors caused by a player's command. The display string is sent back
/// to that player as-is.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum UserError {
    #[error("Game is full.")]
    CapacityReached,
    #[error("Unknown player.")]
    UserDoesNotExist,
    #[error("Name cannot be empty.")]
    EmptyName,
    #[error("No betting round in progress.")]
    NoBettingRound,
    #[error("Not your turn.")]
    OutOfTurnAction,
    #[error("Cannot act (Status: {status}).")]
    CannotAct { status: PlayerStatus },
    #[error("Cannot check. Current bet to match is ${to_match}.")]
    CannotCheck { to_match: Chips },
    #[error("Cannot call (already matched bet or nothing to call).")]
    NothingToCall,
    #[error("Invalid bet/raise amount provided.")]
    MissingAmount,
    #[error("Bet/Raise amount (${amount}) must be greater than your current bet (${current}).")]
    NotAnIncrease { amount: Chips, current: Chips },
    #[error("Insufficient stack (${stack}) for bet increase of ${increase} (Total: ${total}).")]
    InsufficientStack {
        stack: Chips,
        increase: Chips,
        total: Chips,
    },
    #[error("Invalid action: Cannot 'bet' when facing a bet (${to_match}). Use 'call' or 'raise'.")]
    BetFacingBet { to_match: Chips },
    #[error("Invalid action: Cannot 'raise' when there is no bet to raise. Use 'bet'.")]
    RaiseWithoutBet,
    #[error("Amount too small. Minimum {action} total is ${minimum}.")]
    BelowMinimum { action: ActionChoice, minimum: Chips },
}

impl UserError {
    /// Rule violations re-prompt the acting player; anything else does not.
    pub fn reprompts(&self) -> bool {
        !matches!(
            self,
            Self::CapacityReached
                | Self::UserDoesNotExist
                | Self::EmptyName
                | Self::NoBettingRound
                | Self::OutOfTurnAction
                | Self::CannotAct { .. }
        )
    }
}

/// Failures while running a hand.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableError {
    #[error("deck ran out of cards during {stage}")]
    DeckExhausted { stage: Stage },
    #[error("need 2+ players with chips and a name")]
    NotEnoughPlayers,
    #[error("hand already in progress ({stage})")]
    HandInProgress { stage: Stage },
}
