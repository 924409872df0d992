//! Per-street betting: validating actions, moving the turn, and deciding when
//! a street is over.

use std::fmt;

use log::debug;
use snafu::ensure;

use crate::error::{
    ActionError, AmountTooLarge, BetTooSmall, IllegalTransition, OutOfTurn, RaiseTooSmall,
    WrongStage,
};
use crate::model::{Card, Chips, ConnectionId, Player, SeatId, Stage};
use crate::table::{next_after, Table};

/// Something the player whose turn it is may do.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    Fold,
    Check,
    Call,
    /// Open the betting with this many chips.
    Bet(Chips),
    /// Put in this many more chips: the call plus the raise.
    Raise(Chips),
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Fold => "fold",
            Action::Check => "check",
            Action::Call => "call",
            Action::Bet(_) => "bet",
            Action::Raise(_) => "raise",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Bet(a) | Action::Raise(a) => write!(f, "{} {}", self.name(), a),
            _ => f.write_str(self.name()),
        }
    }
}

impl Table {
    /// Apply a betting action from `connection`.
    pub fn act(&mut self, connection: ConnectionId, action: Action) -> Result<(), ActionError> {
        let seat = self.seat_of(connection)?;
        let stage = self.hand.stage;
        ensure!(
            stage.is_betting(),
            WrongStage {
                action: action.name(),
                stage
            }
        );
        ensure!(self.hand.turn == Some(seat), OutOfTurn);
        debug!("seat {} attempts to {}", seat, action);

        match action {
            Action::Fold => self.fold(seat),
            Action::Check => self.check(seat),
            Action::Call => self.call(seat),
            Action::Bet(amount) => self.bet(seat, amount),
            Action::Raise(amount) => self.raise(seat, amount),
        }
    }

    fn fold(&mut self, seat: SeatId) -> Result<(), ActionError> {
        self.fold_out(seat);
        self.announce(format!("「{}」 folds.", self.name_of(seat)));
        self.advance_turn(seat);
        Ok(())
    }

    fn check(&mut self, seat: SeatId) -> Result<(), ActionError> {
        let max = self.hand.current_max_bet;
        let p = self.seat_mut(seat)?;
        ensure!(
            p.current_bet == max,
            IllegalTransition {
                reason: "there is a live bet; call, raise or fold"
            }
        );
        p.acted_this_round = true;
        self.announce(format!("「{}」 checks.", self.name_of(seat)));
        self.advance_turn(seat);
        Ok(())
    }

    fn call(&mut self, seat: SeatId) -> Result<(), ActionError> {
        let max = self.hand.current_max_bet;
        let p = self.seat_mut(seat)?;
        let need = max - p.current_bet;
        ensure!(
            need > Chips::ZERO,
            IllegalTransition {
                reason: "there is nothing to call"
            }
        );
        p.commit(need);
        p.acted_this_round = true;
        self.refresh_pots();
        self.announce(format!("「{}」 calls {}.", self.name_of(seat), need));
        self.advance_turn(seat);
        Ok(())
    }

    fn bet(&mut self, seat: SeatId, amount: Chips) -> Result<(), ActionError> {
        let (max, min_bet) = (self.hand.current_max_bet, self.hand.min_bet);
        ensure!(
            max == Chips::ZERO,
            IllegalTransition {
                reason: "there is already a bet; raise instead"
            }
        );
        ensure!(amount >= min_bet, BetTooSmall { min: min_bet });
        self.check_commitment(seat, amount)?;

        let p = self.seat_mut(seat)?;
        p.commit(amount);
        p.acted_this_round = true;
        let new_max = p.current_bet;
        self.hand.current_max_bet = new_max;
        self.hand.min_raise = self.hand.min_raise.max(amount);
        self.reopen_action(seat);
        self.announce(format!("「{}」 bets {}.", self.name_of(seat), amount));
        self.advance_turn(seat);
        Ok(())
    }

    fn raise(&mut self, seat: SeatId, amount: Chips) -> Result<(), ActionError> {
        let (max, min_bet, min_raise) = (
            self.hand.current_max_bet,
            self.hand.min_bet,
            self.hand.min_raise,
        );
        self.check_commitment(seat, amount)?;
        let current = self.seat_mut(seat)?.current_bet;
        let total = current + amount;
        if max > Chips::ZERO {
            ensure!(
                total >= max + min_raise,
                RaiseTooSmall {
                    min_total: max + min_raise
                }
            );
        } else {
            ensure!(amount >= min_bet, BetTooSmall { min: min_bet });
        }

        let p = self.seat_mut(seat)?;
        p.commit(amount);
        p.acted_this_round = true;
        let increment = total - max;
        self.hand.current_max_bet = total;
        self.hand.min_raise = self.hand.min_raise.max(increment);
        self.reopen_action(seat);
        self.announce(format!("「{}」 raises to {}.", self.name_of(seat), total));
        self.advance_turn(seat);
        Ok(())
    }

    /// Refuse amounts that would take the seat past the per-hand ceiling.
    /// Once this passes, every sum the action forms fits in an `i64`.
    fn check_commitment(&self, seat: SeatId, amount: Chips) -> Result<(), ActionError> {
        let max = self.settings.max_commitment;
        let committed = self
            .players
            .get(&seat)
            .map(|p| p.total_committed)
            .unwrap_or_default();
        match committed.0.checked_add(amount.0) {
            Some(total) if total <= max.0 => Ok(()),
            _ => AmountTooLarge { max }.fail(),
        }
    }

    fn seat_mut(&mut self, seat: SeatId) -> Result<&mut Player, ActionError> {
        match self.players.get_mut(&seat) {
            Some(p) => Ok(p),
            None => Err(ActionError::NotSeated),
        }
    }

    /// Take a player out of the hand. Their chips stay in the pot.
    pub(crate) fn fold_out(&mut self, seat: SeatId) {
        if let Some(p) = self.players.get_mut(&seat) {
            p.folded = true;
            p.in_hand = false;
            p.acted_this_round = true;
            p.hole_cards.clear();
        }
        self.refresh_pots();
    }

    /// The aggressor has acted; everyone else must act again.
    fn reopen_action(&mut self, aggressor: SeatId) {
        self.hand.last_aggressor = Some(aggressor);
        self.refresh_pots();
        for p in self.players.values_mut() {
            if p.is_active() && p.seat != aggressor {
                p.acted_this_round = false;
            }
        }
    }

    /// Move on after `from` acted (or left): end the hand, end the street, or
    /// pass the turn to the next active seat.
    pub(crate) fn advance_turn(&mut self, from: SeatId) {
        let active = self.active_seats();
        if active.len() < 2 {
            self.showdown();
            return;
        }
        if self.round_complete() {
            self.next_street();
            return;
        }
        // Someone other than the turn holder may have left; the turn stays.
        self.hand.turn = match self.hand.turn {
            Some(t) if t != from && active.contains(&t) => Some(t),
            _ => next_after(&active, from),
        };
    }

    /// Everyone still in has matched the high bet and acted since the last
    /// bet or raise.
    pub(crate) fn round_complete(&self) -> bool {
        let max = self.hand.current_max_bet;
        self.players
            .values()
            .filter(|p| p.is_active())
            .all(|p| p.current_bet == max && p.acted_this_round)
    }

    fn next_street(&mut self) {
        let (stage, dealt) = match self.hand.stage {
            Stage::Preflop => (Stage::Flop, 3),
            Stage::Flop => (Stage::Turn, 1),
            Stage::Turn => (Stage::River, 1),
            Stage::River => {
                self.showdown();
                return;
            }
            Stage::Idle | Stage::Showdown => return,
        };
        self.hand.deck.burn();
        let cards = self.hand.deck.deal_many(dealt);
        self.hand.community.extend(cards);
        self.hand.stage = stage;

        for p in self.players.values_mut() {
            p.current_bet = Chips::ZERO;
            p.acted_this_round = false;
        }
        self.hand.current_max_bet = Chips::ZERO;
        self.hand.min_raise = self.settings.big_blind;
        self.hand.last_aggressor = None;
        let active = self.active_seats();
        self.hand.turn = match self.hand.dealer {
            Some(dealer) => next_after(&active, dealer),
            None => active.first().cloned(),
        };

        self.announce(format!(
            "On to the {}: {}",
            stage,
            show_cards(&self.hand.community)
        ));
    }
}

pub(crate) fn show_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
