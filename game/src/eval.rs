//! Hand strength evaluation.
//!
//! A hand's strength is a [`Score`]: a category followed by tie-break ranks,
//! most significant first. Scores compare lexicographically, with missing
//! trailing elements counting as zero.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::model::{Card, Rank};

/// The kind of hand, weakest first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    Trips = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    Quads = 7,
    StraightFlush = 8,
}

impl Category {
    fn from_value(value: u8) -> Self {
        use Category::*;
        match value {
            1 => OnePair,
            2 => TwoPair,
            3 => Trips,
            4 => Straight,
            5 => Flush,
            6 => FullHouse,
            7 => Quads,
            8 => StraightFlush,
            _ => HighCard,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Category::*;
        let name = match self {
            HighCard => "High Card",
            OnePair => "One Pair",
            TwoPair => "Two Pair",
            Trips => "Three of a Kind",
            Straight => "Straight",
            Flush => "Flush",
            FullHouse => "Full House",
            Quads => "Four of a Kind",
            StraightFlush => "Straight Flush",
        };
        f.write_str(name)
    }
}

/// `[category, tiebreak...]`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Score(Vec<u8>);

impl Score {
    fn new(category: Category, tiebreak: &[Rank]) -> Self {
        let mut values = Vec::with_capacity(1 + tiebreak.len());
        values.push(category as u8);
        values.extend_from_slice(tiebreak);
        Score(values)
    }

    pub fn category(&self) -> Category {
        Category::from_value(self.0.first().cloned().unwrap_or(0))
    }

    pub fn values(&self) -> &[u8] {
        &self.0
    }
}

/// Element-wise comparison; the first difference decides.
pub fn compare(a: &Score, b: &Score) -> Ordering {
    let len = a.0.len().max(b.0.len());
    for i in 0..len {
        let av = a.0.get(i).cloned().unwrap_or(0);
        let bv = b.0.get(i).cloned().unwrap_or(0);
        if av != bv {
            return av.cmp(&bv);
        }
    }
    Ordering::Equal
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare(self, other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

/// Score exactly five cards.
pub fn evaluate5(cards: &[Card; 5]) -> Score {
    let mut counts = [0u8; 15];
    for card in cards.iter() {
        counts[card.rank as usize] += 1;
    }

    // (count, rank), biggest groups first, then highest rank.
    let mut groups: Vec<(u8, Rank)> = (2..=14u8)
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));
    let by_group: Vec<Rank> = groups.iter().map(|&(_, r)| r).collect();

    let is_flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = straight_high(&groups);

    if let (true, Some(high)) = (is_flush, straight_high) {
        return Score::new(Category::StraightFlush, &[high]);
    }
    match (groups[0].0, groups.get(1).map(|g| g.0)) {
        (4, _) => return Score::new(Category::Quads, &by_group),
        (3, Some(2)) => return Score::new(Category::FullHouse, &by_group),
        _ => {}
    }
    if is_flush {
        return Score::new(Category::Flush, &by_group);
    }
    if let Some(high) = straight_high {
        return Score::new(Category::Straight, &[high]);
    }
    let category = match (groups[0].0, groups.get(1).map(|g| g.0)) {
        (3, _) => Category::Trips,
        (2, Some(2)) => Category::TwoPair,
        (2, _) => Category::OnePair,
        _ => Category::HighCard,
    };
    Score::new(category, &by_group)
}

// Five distinct ranks in a run. The wheel (A-2-3-4-5) plays five-high.
fn straight_high(groups: &[(u8, Rank)]) -> Option<Rank> {
    if groups.len() != 5 {
        return None;
    }
    let high = groups[0].1;
    let low = groups[4].1;
    if high - low == 4 {
        Some(high)
    } else if high == 14 && groups[1].1 == 5 && low == 2 {
        Some(5)
    } else {
        None
    }
}

/// The strongest five-card hand found among some cards.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Best {
    pub score: Score,
    pub cards: [Card; 5],
}

/// Exhaustively pick the best five of seven cards (all 21 subsets).
pub fn evaluate_best_of_7(cards: &[Card; 7]) -> Best {
    search(cards)
}

/// Like [`evaluate_best_of_7`], for any number of cards. `None` when there
/// are fewer than five to choose from.
pub fn best_five(cards: &[Card]) -> Option<Best> {
    if cards.len() < 5 {
        None
    } else {
        Some(search(cards))
    }
}

fn search(cards: &[Card]) -> Best {
    let n = cards.len();
    let first = [cards[0], cards[1], cards[2], cards[3], cards[4]];
    let mut best = Best {
        score: evaluate5(&first),
        cards: first,
    };
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                for d in (c + 1)..n {
                    for e in (d + 1)..n {
                        let five = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                        let score = evaluate5(&five);
                        if score > best.score {
                            best = Best { score, cards: five };
                        }
                    }
                }
            }
        }
    }
    best
}
