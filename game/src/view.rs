//! Per-viewer projections of the table.

use serde::{Deserialize, Serialize};

use crate::model::{Card, Chips, ConnectionId, Player, SeatId, Stage};
use crate::pot::Pot;
use crate::showdown::Payout;
use crate::table::Table;

/// Everything one connection is allowed to see.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub stage: Stage,
    pub community_cards: Vec<Card>,
    pub host_id: Option<ConnectionId>,
    pub player_count: usize,
    /// The viewer's own record, if they are seated.
    pub you: Option<PlayerView>,
    pub others: Vec<PlayerView>,
    pub dealer_seat: Option<SeatId>,
    pub small_blind_seat: Option<SeatId>,
    pub big_blind_seat: Option<SeatId>,
    pub current_max_bet: Chips,
    pub min_bet: Chips,
    pub min_raise_increment: Chips,
    pub last_aggressor_seat: Option<SeatId>,
    pub current_turn_id: Option<ConnectionId>,
    pub pots: Vec<Pot>,
    pub results: Vec<Payout>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub seat: SeatId,
    pub connection: ConnectionId,
    pub name: String,
    pub ready: bool,
    pub folded: bool,
    pub in_hand: bool,
    pub connected: bool,
    pub is_host: bool,
    pub is_current_turn: bool,
    /// Empty for other players until showdown.
    pub hole_cards: Vec<Card>,
    pub current_bet: Chips,
    pub total_committed: Chips,
    pub ledger: Chips,
}

impl Table {
    /// Project the table for `viewer`, hiding other players' hole cards
    /// unless the hand has reached showdown.
    pub fn snapshot(&self, viewer: ConnectionId) -> Snapshot {
        let reveal = self.hand.stage == Stage::Showdown;
        let mut you = None;
        let mut others = Vec::with_capacity(self.players.len());
        for p in self.players.values() {
            if p.connected && p.connection == viewer {
                you = Some(self.view_of(p, true));
            } else {
                others.push(self.view_of(p, reveal));
            }
        }

        Snapshot {
            stage: self.hand.stage,
            community_cards: self.hand.community.clone(),
            host_id: self.host,
            player_count: self.players.values().filter(|p| p.connected).count(),
            you,
            others,
            dealer_seat: self.hand.dealer,
            small_blind_seat: self.hand.small_blind,
            big_blind_seat: self.hand.big_blind,
            current_max_bet: self.hand.current_max_bet,
            min_bet: self.hand.min_bet,
            min_raise_increment: self.hand.min_raise,
            last_aggressor_seat: self.hand.last_aggressor,
            current_turn_id: self.current_turn(),
            pots: self.hand.pots.clone(),
            results: self.hand.results.clone(),
        }
    }

    fn view_of(&self, p: &Player, show_cards: bool) -> PlayerView {
        PlayerView {
            seat: p.seat,
            connection: p.connection,
            name: p.name.clone(),
            ready: p.ready,
            folded: p.folded,
            in_hand: p.in_hand,
            connected: p.connected,
            is_host: p.connected && self.host == Some(p.connection),
            is_current_turn: self.hand.turn == Some(p.seat),
            hole_cards: if show_cards {
                p.hole_cards.clone()
            } else {
                vec![]
            },
            current_bet: p.current_bet,
            total_committed: p.total_committed,
            ledger: p.ledger,
        }
    }
}
