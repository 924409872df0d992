use rand::Rng;

use crate::model::{Card, Suit, RANK_MAX, RANK_MIN};

/// An ordered pile of cards. Cards are dealt and burned from the end.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A full 52-card deck, rank-major and suit-minor: 2♠ 2♥ 2♦ 2♣ 3♠ ...
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(52);
        for rank in RANK_MIN..=RANK_MAX {
            for &suit in Suit::ALL.iter() {
                cards.push(Card::new(rank, suit));
            }
        }
        Deck { cards }
    }

    /// An empty deck, for when no hand is running.
    pub fn empty() -> Self {
        Deck { cards: vec![] }
    }

    /// A deck that deals `cards` from the end backwards.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Deck { cards }
    }

    /// Fisher-Yates, walking from the last card to the first.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        for i in (1..self.cards.len()).rev() {
            let j = rng.gen_range(0, i + 1);
            self.cards.swap(i, j);
        }
    }

    /// Remove and return the last card.
    pub fn deal(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Deal up to `n` cards, fewer only if the deck runs out.
    pub fn deal_many(&mut self, n: usize) -> Vec<Card> {
        (0..n).filter_map(|_| self.deal()).collect()
    }

    /// Discard the last card without exposing it.
    pub fn burn(&mut self) {
        self.cards.pop();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}
