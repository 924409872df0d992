//! Ending a hand: picking winners and paying out the pot.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::betting::show_cards;
use crate::eval::{self, Best};
use crate::model::{Card, Chips, SeatId, Stage};
use crate::pot;
use crate::table::Table;

/// What one winner took from the pot.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub seat: SeatId,
    pub name: String,
    pub amount: Chips,
    /// Category name of the winning hand; absent when everyone else folded.
    pub hand: Option<String>,
    pub best_five: Vec<Card>,
}

impl Table {
    pub(crate) fn showdown(&mut self) {
        self.hand.stage = Stage::Showdown;
        self.hand.turn = None;
        self.refresh_pots();
        self.settle();
    }

    /// Pay the pot to the best hand(s) still contesting it and settle every
    /// participant's ledger.
    fn settle(&mut self) {
        let amount = pot::total(&self.hand.pots);
        let contenders = self.active_seats();
        if contenders.is_empty() {
            debug!("hand ended with nobody contesting {} chips", amount);
            return;
        }

        let winners: Vec<(SeatId, Option<Best>)> = if contenders.len() == 1 {
            vec![(contenders[0], None)]
        } else {
            self.best_hands(&contenders)
        };

        let dealer = self.hand.dealer.unwrap_or(SeatId(0));
        let shares = split(amount, winners.iter().map(|(s, _)| *s), dealer);

        for p in self.players.values_mut() {
            let won = shares
                .iter()
                .find(|(s, _)| *s == p.seat)
                .map(|(_, c)| *c)
                .unwrap_or_default();
            p.ledger += won - p.total_committed;
        }

        let mut results = Vec::with_capacity(winners.len());
        for (seat, best) in winners {
            let amount = shares
                .iter()
                .find(|(s, _)| *s == seat)
                .map(|(_, c)| *c)
                .unwrap_or_default();
            let payout = Payout {
                seat,
                name: self.name_of(seat),
                amount,
                hand: best.as_ref().map(|b| b.score.category().to_string()),
                best_five: best.map(|b| b.cards.to_vec()).unwrap_or_default(),
            };
            self.announce(match &payout.hand {
                Some(hand) => format!(
                    "「{}」 wins {} with {} ({}).",
                    payout.name,
                    payout.amount,
                    hand,
                    show_cards(&payout.best_five)
                ),
                None => format!(
                    "Everyone else folded; 「{}」 wins {}.",
                    payout.name, payout.amount
                ),
            });
            results.push(payout);
        }
        self.hand.results = results;
    }

    /// Score everyone still holding cards; return all seats tied for best.
    fn best_hands(&self, contenders: &[SeatId]) -> Vec<(SeatId, Option<Best>)> {
        let mut scored: Vec<(SeatId, Best)> = vec![];
        for seat in contenders {
            let p = match self.players.get(seat) {
                Some(p) if p.hole_cards.len() == 2 => p,
                _ => continue,
            };
            let mut cards = p.hole_cards.clone();
            cards.extend_from_slice(&self.hand.community);
            if let Some(best) = eval::best_five(&cards) {
                scored.push((*seat, best));
            }
        }

        let top = scored.iter().map(|(_, b)| &b.score).max().cloned();
        match top {
            Some(top) => scored
                .into_iter()
                .filter(|(_, b)| eval::compare(&b.score, &top) == Ordering::Equal)
                .map(|(s, b)| (s, Some(b)))
                .collect(),
            // Not enough cards to evaluate anyone: split between contenders.
            None => contenders.iter().map(|&s| (s, None)).collect(),
        }
    }
}

/// Divide `amount` evenly between `winners`. Leftover chips go one at a time
/// to winners in position order, starting left of the dealer.
pub(crate) fn split<I>(amount: Chips, winners: I, dealer: SeatId) -> Vec<(SeatId, Chips)>
where
    I: IntoIterator<Item = SeatId>,
{
    let mut winners: Vec<SeatId> = winners.into_iter().collect();
    if winners.is_empty() {
        return vec![];
    }
    winners.sort_by_key(|&s| (s <= dealer, s));
    let n = winners.len() as i64;
    let share = amount / n;
    let odd = (amount % n).0 as usize;
    winners
        .into_iter()
        .enumerate()
        .map(|(i, s)| (s, if i < odd { share + Chips(1) } else { share }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::betting::Action;
    use crate::deck::Deck;
    use crate::model::{ConnectionId, Suit, Suit::*};
    use crate::table::testing::*;

    fn c(rank: u8, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    /// Stack the board and deal the given hole cards to connections 1..=n.
    fn rig(table: &mut Table, holes: &[[Card; 2]], board: [Card; 5]) {
        let burn = c(2, Clubs);
        table.hand.deck = Deck::from_cards(vec![
            board[4], burn, board[3], burn, board[2], board[1], board[0], burn,
        ]);
        for (i, hole) in holes.iter().enumerate() {
            let conn = ConnectionId(i as u64 + 1);
            if let Some(p) = table.players.values_mut().find(|p| p.connection == conn) {
                p.hole_cards = hole.to_vec();
            }
        }
    }

    fn check_down(table: &mut Table, order: &[ConnectionId]) {
        while table.stage().is_betting() {
            for &who in order {
                if table.current_turn() == Some(who) {
                    table.act(who, Action::Check).unwrap();
                }
            }
        }
    }

    #[test]
    fn split_gives_odd_chips_left_of_the_dealer() {
        let shares = split(Chips(135), vec![SeatId(1), SeatId(2)], SeatId(1));
        assert_eq!(shares, vec![(SeatId(2), Chips(68)), (SeatId(1), Chips(67))]);

        let shares = split(Chips(10), vec![SeatId(1), SeatId(3), SeatId(5)], SeatId(3));
        assert_eq!(
            shares,
            vec![
                (SeatId(5), Chips(4)),
                (SeatId(1), Chips(3)),
                (SeatId(3), Chips(3))
            ]
        );
        assert!(split(Chips(10), Vec::<SeatId>::new(), SeatId(1)).is_empty());
    }

    #[test]
    fn fold_to_one_pays_without_evaluating() {
        let (mut table, conns) = dealt(3);
        table.act(conns[0], Action::Fold).unwrap();
        table.act(conns[1], Action::Fold).unwrap();
        assert_eq!(table.stage(), Stage::Showdown);
        assert!(table.community_cards().is_empty());

        assert_eq!(seat(&table, conns[0]).ledger, Chips(0));
        assert_eq!(seat(&table, conns[1]).ledger, Chips(-10));
        assert_eq!(seat(&table, conns[2]).ledger, Chips(10));
        assert_eq!(ledger_sum(&table), Chips::ZERO);

        let results = &table.hand.results;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].seat, SeatId(3));
        assert_eq!(results[0].amount, Chips(30));
        assert_eq!(results[0].hand, None);
        assert!(results[0].best_five.is_empty());
    }

    #[test]
    fn best_hand_takes_the_pot() {
        let (mut table, conns) = dealt(2);
        rig(
            &mut table,
            &[[c(14, Spades), c(14, Hearts)], [c(7, Clubs), c(3, Diamonds)]],
            [
                c(13, Diamonds),
                c(9, Spades),
                c(5, Hearts),
                c(4, Clubs),
                c(11, Diamonds),
            ],
        );
        table.act(conns[1], Action::Call).unwrap();
        table.act(conns[0], Action::Check).unwrap();
        check_down(&mut table, &conns);

        assert_eq!(table.stage(), Stage::Showdown);
        assert_eq!(table.community_cards().len(), 5);
        let results = &table.hand.results;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].seat, SeatId(1));
        assert_eq!(results[0].amount, Chips(40));
        assert_eq!(results[0].hand.as_deref(), Some("One Pair"));
        assert_eq!(results[0].best_five.len(), 5);
        assert_eq!(seat(&table, conns[0]).ledger, Chips(20));
        assert_eq!(seat(&table, conns[1]).ledger, Chips(-20));
    }

    #[test]
    fn tied_hands_split_with_the_odd_chip() {
        let (mut table, conns) = dealt(3);
        rig(
            &mut table,
            &[
                [c(10, Hearts), c(2, Clubs)],
                [c(10, Diamonds), c(2, Diamonds)],
                [c(4, Hearts), c(5, Hearts)],
            ],
            [
                c(14, Spades),
                c(13, Hearts),
                c(12, Diamonds),
                c(11, Clubs),
                c(3, Spades),
            ],
        );
        // Everyone ends up with 45 in.
        table.act(conns[0], Action::Raise(Chips(45))).unwrap();
        table.act(conns[1], Action::Call).unwrap();
        table.act(conns[2], Action::Call).unwrap();
        assert_eq!(table.stage(), Stage::Flop);
        check_down(&mut table, &conns);

        assert_eq!(pot::total(table.pots()), Chips(135));
        let results = &table.hand.results;
        assert_eq!(results.len(), 2);
        let won = |s: u32| {
            results
                .iter()
                .find(|p| p.seat == SeatId(s))
                .map(|p| p.amount)
        };
        assert_eq!(won(2), Some(Chips(68)));
        assert_eq!(won(1), Some(Chips(67)));
        assert_eq!(won(3), None);
        assert!(results.iter().all(|p| p.hand.as_deref() == Some("Straight")));

        assert_eq!(seat(&table, conns[0]).ledger, Chips(22));
        assert_eq!(seat(&table, conns[1]).ledger, Chips(23));
        assert_eq!(seat(&table, conns[2]).ledger, Chips(-45));
        assert_eq!(ledger_sum(&table), Chips::ZERO);
    }

    #[test]
    fn folded_hands_cannot_win() {
        let (mut table, conns) = dealt(3);
        rig(
            &mut table,
            &[
                [c(14, Spades), c(14, Hearts)],
                [c(13, Clubs), c(2, Diamonds)],
                [c(8, Clubs), c(3, Diamonds)],
            ],
            [
                c(13, Diamonds),
                c(9, Spades),
                c(5, Hearts),
                c(4, Clubs),
                c(11, Diamonds),
            ],
        );
        // The aces fold, so the kings take it.
        table.act(conns[0], Action::Fold).unwrap();
        table.act(conns[1], Action::Call).unwrap();
        table.act(conns[2], Action::Check).unwrap();
        check_down(&mut table, &conns);

        let results = &table.hand.results;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].seat, SeatId(2));
        assert_eq!(results[0].amount, Chips(40));
        assert_eq!(seat(&table, conns[0]).ledger, Chips::ZERO);
        assert_eq!(ledger_sum(&table), Chips::ZERO);
    }

    #[test]
    fn dealer_moves_on_between_hands() {
        let (mut table, conns) = dealt(3);
        table.act(conns[0], Action::Fold).unwrap();
        table.act(conns[1], Action::Fold).unwrap();
        table.start_next_hand(conns[0]).unwrap();
        assert_eq!(table.stage(), Stage::Idle);
        for &who in &conns {
            table.set_ready(who, true).unwrap();
        }
        assert_eq!(table.hand.dealer, Some(SeatId(2)));
        assert_eq!(table.hand.small_blind, Some(SeatId(3)));
        assert_eq!(table.hand.big_blind, Some(SeatId(1)));
        assert_eq!(table.current_turn(), Some(conns[1]));
        // Ledgers carry over; commitments start fresh.
        assert_eq!(seat(&table, conns[2]).ledger, Chips(10));
        assert_eq!(pot::total(table.pots()), Chips(30));
    }
}
