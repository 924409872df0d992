use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Rem, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Identifies one live connection to the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A seat at the table, assigned on first join and stable for the session.
///
/// Seat ids order the turn rotation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct SeatId(pub u32);

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// For simplicity, chips are represented as discrete, indivisible units.
/// Ledgers may go negative, so this is signed.
#[derive(
    Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct Chips(pub i64);

impl Chips {
    pub const ZERO: Chips = Chips(0);
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Chips {
    type Output = Chips;
    fn add(self, rhs: Chips) -> Chips {
        Chips(self.0 + rhs.0)
    }
}

impl Sub for Chips {
    type Output = Chips;
    fn sub(self, rhs: Chips) -> Chips {
        Chips(self.0 - rhs.0)
    }
}

impl AddAssign for Chips {
    fn add_assign(&mut self, rhs: Chips) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Chips {
    fn sub_assign(&mut self, rhs: Chips) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Chips {
    type Output = Chips;
    fn mul(self, rhs: i64) -> Chips {
        Chips(self.0 * rhs)
    }
}

impl Div<i64> for Chips {
    type Output = Chips;
    fn div(self, rhs: i64) -> Chips {
        Chips(self.0 / rhs)
    }
}

impl Rem<i64> for Chips {
    type Output = Chips;
    fn rem(self, rhs: i64) -> Chips {
        Chips(self.0 % rhs)
    }
}

impl Sum for Chips {
    fn sum<I: Iterator<Item = Chips>>(iter: I) -> Chips {
        iter.fold(Chips::ZERO, Add::add)
    }
}

/// Card rank, 2 through 14 (ace high).
pub type Rank = u8;

pub const RANK_MIN: Rank = 2;
pub const RANK_MAX: Rank = 14;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Suit {
    #[serde(rename = "♠")]
    Spades,
    #[serde(rename = "♥")]
    Hearts,
    #[serde(rename = "♦")]
    Diamonds,
    #[serde(rename = "♣")]
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn symbol(self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        }
    }
}

/// An immutable playing card.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Card { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank = match self.rank {
            10 => "T".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            14 => "A".to_string(),
            r => r.to_string(),
        };
        write!(f, "{}{}", rank, self.suit.symbol())
    }
}

/// Where the hand currently stands.
///
/// Stages only ever move forward, `Idle` through `Showdown`, and then back to
/// `Idle` when the host prepares the next hand.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Stage {
    /// Whether betting actions are accepted in this stage.
    pub fn is_betting(self) -> bool {
        !matches!(self, Stage::Idle | Stage::Showdown)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Preflop => "preflop",
            Stage::Flop => "flop",
            Stage::Turn => "turn",
            Stage::River => "river",
            Stage::Showdown => "showdown",
        };
        f.write_str(name)
    }
}

/// One seated participant. Created on first join and destroyed on disconnect;
/// the ledger is carried across hands.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Player {
    pub seat: SeatId,
    pub connection: ConnectionId,
    pub name: String,
    pub ready: bool,
    /// False once the player's connection has gone away mid-hand; such a
    /// player is folded and only kept until the hand is cleared.
    pub connected: bool,
    pub in_hand: bool,
    pub folded: bool,
    pub hole_cards: Vec<Card>,
    /// Chips put in on the current street.
    pub current_bet: Chips,
    /// Chips put in over the whole hand.
    pub total_committed: Chips,
    pub acted_this_round: bool,
    /// Net chips won or lost across all settled hands.
    pub ledger: Chips,
}

impl Player {
    pub fn new(seat: SeatId, connection: ConnectionId, name: String) -> Self {
        Player {
            seat,
            connection,
            name,
            ready: false,
            connected: true,
            in_hand: false,
            folded: false,
            hole_cards: vec![],
            current_bet: Chips::ZERO,
            total_committed: Chips::ZERO,
            acted_this_round: false,
            ledger: Chips::ZERO,
        }
    }

    /// Still contesting the pot.
    pub fn is_active(&self) -> bool {
        self.in_hand && !self.folded
    }

    /// Put chips in front of the player for this street.
    pub fn commit(&mut self, amount: Chips) {
        self.current_bet += amount;
        self.total_committed += amount;
    }

    pub fn clear_hand(&mut self) {
        self.in_hand = false;
        self.folded = false;
        self.hole_cards.clear();
        self.current_bet = Chips::ZERO;
        self.total_committed = Chips::ZERO;
        self.acted_this_round = false;
    }
}
