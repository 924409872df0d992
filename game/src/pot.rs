use serde::{Deserialize, Serialize};

use crate::model::{Chips, Player, SeatId};

/// Chips payable at showdown, and who may win them.
///
/// The table keeps a single aggregated pot: unequal contributions are not
/// split into side pots.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pot {
    pub amount: Chips,
    pub eligible_seats: Vec<SeatId>,
}

/// Rebuild the pot from scratch out of everyone's commitments this hand.
///
/// Chips from folded players stay in as dead money; only players still
/// contesting the hand are eligible.
pub fn collect<'a, I>(players: I) -> Vec<Pot>
where
    I: IntoIterator<Item = &'a Player>,
{
    let mut amount = Chips::ZERO;
    let mut eligible_seats = vec![];
    for p in players {
        amount += p.total_committed;
        if p.is_active() {
            eligible_seats.push(p.seat);
        }
    }
    vec![Pot {
        amount,
        eligible_seats,
    }]
}

pub fn total(pots: &[Pot]) -> Chips {
    pots.iter().map(|p| p.amount).sum()
}
