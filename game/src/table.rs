//! The one shared table: who is seated, who hosts, and the hand in progress.
//!
//! Every operation either applies completely or returns an [`ActionError`]
//! having changed nothing. Human-readable log lines produced along the way
//! are queued and collected with [`Table::take_notices`].

use std::collections::BTreeMap;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use snafu::{ensure, OptionExt};

use crate::deck::Deck;
use crate::error::{ActionError, NotHost, NotSeated, TableFull};
use crate::model::{Card, Chips, ConnectionId, Player, SeatId, Stage};
use crate::pot::{self, Pot};
use crate::server::Settings;
use crate::showdown::Payout;

const DEFAULT_NAME: &str = "Player";

pub struct Table {
    pub(crate) settings: Settings,
    rng: StdRng,
    /// Seat order is turn order.
    pub(crate) players: BTreeMap<SeatId, Player>,
    pub(crate) host: Option<ConnectionId>,
    last_seat: u32,
    pub(crate) hand: Hand,
    notices: Vec<String>,
}

/// State scoped to a single hand.
#[derive(Debug, Clone)]
pub(crate) struct Hand {
    pub(crate) stage: Stage,
    pub(crate) deck: Deck,
    pub(crate) community: Vec<Card>,
    pub(crate) dealer: Option<SeatId>,
    pub(crate) small_blind: Option<SeatId>,
    pub(crate) big_blind: Option<SeatId>,
    pub(crate) current_max_bet: Chips,
    pub(crate) min_bet: Chips,
    pub(crate) min_raise: Chips,
    pub(crate) last_aggressor: Option<SeatId>,
    pub(crate) turn: Option<SeatId>,
    pub(crate) pots: Vec<Pot>,
    pub(crate) results: Vec<Payout>,
}

impl Hand {
    fn idle(big_blind: Chips) -> Self {
        Hand {
            stage: Stage::Idle,
            deck: Deck::empty(),
            community: vec![],
            dealer: None,
            small_blind: None,
            big_blind: None,
            current_max_bet: Chips::ZERO,
            min_bet: big_blind,
            min_raise: big_blind,
            last_aggressor: None,
            turn: None,
            pots: vec![],
            results: vec![],
        }
    }
}

impl Table {
    pub fn new(settings: Settings) -> Self {
        Table::with_rng(settings, StdRng::from_entropy())
    }

    /// A table whose shuffles come from the given generator.
    pub fn with_rng(settings: Settings, rng: StdRng) -> Self {
        Table {
            settings,
            rng,
            players: BTreeMap::new(),
            host: None,
            last_seat: 0,
            hand: Hand::idle(settings.big_blind),
            notices: vec![],
        }
    }

    pub fn stage(&self) -> Stage {
        self.hand.stage
    }

    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, connection: ConnectionId) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.connected && p.connection == connection)
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.hand.community
    }

    pub fn pots(&self) -> &[Pot] {
        &self.hand.pots
    }

    /// The connection whose turn it is.
    pub fn current_turn(&self) -> Option<ConnectionId> {
        self.hand
            .turn
            .and_then(|seat| self.players.get(&seat))
            .map(|p| p.connection)
    }

    /// Drain the log lines produced since the last call.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn announce(&mut self, notice: String) {
        info!("{}", notice);
        self.notices.push(notice);
    }

    pub(crate) fn seat_of(&self, connection: ConnectionId) -> Result<SeatId, ActionError> {
        self.player(connection).map(|p| p.seat).context(NotSeated)
    }

    pub(crate) fn name_of(&self, seat: SeatId) -> String {
        self.players
            .get(&seat)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    /// Seats still contesting the hand, in seat order.
    pub(crate) fn active_seats(&self) -> Vec<SeatId> {
        self.players
            .values()
            .filter(|p| p.is_active())
            .map(|p| p.seat)
            .collect()
    }

    pub(crate) fn refresh_pots(&mut self) {
        self.hand.pots = pot::collect(self.players.values());
    }

    /// Seat a new connection, or rename an already seated one.
    pub fn join(&mut self, connection: ConnectionId, name: &str) -> Result<SeatId, ActionError> {
        let name = match name.trim() {
            "" => DEFAULT_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        if let Some(p) = self
            .players
            .values_mut()
            .find(|p| p.connected && p.connection == connection)
        {
            let seat = p.seat;
            let old = std::mem::replace(&mut p.name, name.clone());
            self.announce(format!("「{}」 is now known as 「{}」.", old, name));
            return Ok(seat);
        }

        // Stubs from the running hand do not hold a seat.
        let max = self.settings.max_players as usize;
        let connected = self.players.values().filter(|p| p.connected).count();
        ensure!(connected < max, TableFull { max });

        self.last_seat += 1;
        let seat = SeatId(self.last_seat);
        self.players
            .insert(seat, Player::new(seat, connection, name.clone()));
        if self.host.is_none() {
            self.host = Some(connection);
            self.announce(format!(
                "「{}」 joined the table as host, and controls the pace of play.",
                name
            ));
        } else {
            self.announce(format!("「{}」 joined the table.", name));
        }
        Ok(seat)
    }

    /// Mark a player (un)ready; the hand starts once everyone is ready.
    pub fn set_ready(&mut self, connection: ConnectionId, ready: bool) -> Result<(), ActionError> {
        let seat = self.seat_of(connection)?;
        let name = match self.players.get_mut(&seat) {
            Some(p) => {
                p.ready = ready;
                p.name.clone()
            }
            None => return NotSeated.fail(),
        };
        self.announce(if ready {
            format!("「{}」 is ready.", name)
        } else {
            format!("「{}」 is no longer ready.", name)
        });
        self.start_hand_if_ready();
        Ok(())
    }

    /// Clear the finished (or abandoned) hand so players can ready up again.
    pub fn start_next_hand(&mut self, connection: ConnectionId) -> Result<(), ActionError> {
        ensure!(
            self.host == Some(connection),
            NotHost {
                what: "start the next hand"
            }
        );
        let dealer = self.hand.dealer;
        self.clear_hand();
        self.hand.dealer = dealer;
        self.announce("Next hand prepared; everyone press ready to deal.".to_string());
        Ok(())
    }

    /// Force the table back to idle regardless of stage. Ledgers survive.
    pub fn reset_game(&mut self, connection: ConnectionId) -> Result<(), ActionError> {
        ensure!(
            self.host == Some(connection),
            NotHost {
                what: "reset the game"
            }
        );
        self.clear_hand();
        self.announce("The game has been reset; everyone can ready up again.".to_string());
        Ok(())
    }

    fn clear_hand(&mut self) {
        self.players.retain(|_, p| p.connected);
        for p in self.players.values_mut() {
            p.ready = false;
            p.clear_hand();
        }
        self.hand = Hand::idle(self.settings.big_blind);
    }

    /// A connection went away. Returns whether the table changed.
    ///
    /// Once a hand is dealt, a player with chips in the pot is kept as a
    /// disconnected stub until the hand is cleared, folding first if the
    /// betting is still open; anyone else is removed outright.
    pub fn disconnect(&mut self, connection: ConnectionId) -> bool {
        let seat = match self.player(connection) {
            Some(p) => p.seat,
            None => return false,
        };
        let keep_stub = match self.players.get(&seat) {
            Some(p) => {
                self.hand.stage != Stage::Idle && (p.in_hand || p.total_committed > Chips::ZERO)
            }
            None => false,
        };
        let name = self.name_of(seat);
        if keep_stub {
            let was_active = match self.players.get_mut(&seat) {
                Some(p) => {
                    p.connected = false;
                    p.ready = false;
                    p.is_active()
                }
                None => false,
            };
            let was_active = was_active && self.hand.stage.is_betting();
            if was_active {
                self.fold_out(seat);
                self.announce(format!("「{}」 disconnected and folds.", name));
                self.advance_turn(seat);
            } else {
                self.announce(format!("「{}」 disconnected.", name));
            }
        } else {
            self.players.remove(&seat);
            self.announce(format!("「{}」 disconnected.", name));
        }

        if self.host == Some(connection) {
            self.host = self
                .players
                .values()
                .find(|p| p.connected)
                .map(|p| p.connection);
            let new_host = self
                .host
                .and_then(|c| self.player(c))
                .map(|p| p.name.clone());
            match new_host {
                Some(host_name) => self.announce(format!("「{}」 is now the host.", host_name)),
                None => {
                    debug!("no connected players left; resetting the table");
                    self.players.clear();
                    self.hand = Hand::idle(self.settings.big_blind);
                }
            }
        }
        true
    }

    /// Deal a new hand if at least two players are seated and all are ready.
    fn start_hand_if_ready(&mut self) -> bool {
        if self.hand.stage != Stage::Idle
            || self.players.len() < 2
            || !self.players.values().all(|p| p.ready)
        {
            return false;
        }

        let seats: Vec<SeatId> = self.players.keys().cloned().collect();
        let n = seats.len();
        let dealer = self
            .hand
            .dealer
            .and_then(|prev| next_after(&seats, prev))
            .unwrap_or(seats[0]);
        let d = seats.iter().position(|&s| s == dealer).unwrap_or(0);
        let small_blind = seats[(d + 1) % n];
        let big_blind = seats[(d + 2) % n];
        let first_to_act = seats[(d + 3) % n];

        let mut deck = Deck::new();
        deck.shuffle(&mut self.rng);
        for p in self.players.values_mut() {
            p.clear_hand();
            p.in_hand = true;
            p.hole_cards = deck.deal_many(2);
        }

        let (sb, bb) = (self.settings.small_blind, self.settings.big_blind);
        if let Some(p) = self.players.get_mut(&small_blind) {
            p.commit(sb);
        }
        if let Some(p) = self.players.get_mut(&big_blind) {
            p.commit(bb);
        }

        self.hand = Hand {
            stage: Stage::Preflop,
            deck,
            community: vec![],
            dealer: Some(dealer),
            small_blind: Some(small_blind),
            big_blind: Some(big_blind),
            current_max_bet: bb,
            min_bet: bb,
            min_raise: bb,
            last_aggressor: Some(big_blind),
            turn: Some(first_to_act),
            pots: vec![],
            results: vec![],
        };
        self.refresh_pots();

        self.announce(format!(
            "{} players, all ready: dealing hole cards! 「{}」 posts {}, 「{}」 posts {}.",
            n,
            self.name_of(small_blind),
            sb,
            self.name_of(big_blind),
            bb
        ));
        true
    }
}

/// The first seat strictly after `seat`, wrapping around.
pub(crate) fn next_after(seats: &[SeatId], seat: SeatId) -> Option<SeatId> {
    seats
        .iter()
        .find(|&&s| s > seat)
        .or_else(|| seats.first())
        .cloned()
}
