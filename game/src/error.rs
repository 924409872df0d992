use snafu::Snafu;

use crate::model::{Chips, Stage};

/// Why the table refused a request.
///
/// A refused request leaves the table untouched; the message goes back to the
/// caller only.
#[derive(Debug, Clone, Eq, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ActionError {
    #[snafu(display("join the table first"))]
    NotSeated,

    #[snafu(display("the table is full ({} players)", max))]
    TableFull { max: usize },

    #[snafu(display("only the host can {}", what))]
    NotHost { what: &'static str },

    #[snafu(display("cannot {} during {}", action, stage))]
    WrongStage { action: &'static str, stage: Stage },

    #[snafu(display("it is not your turn"))]
    OutOfTurn,

    #[snafu(display("the minimum bet is {}", min))]
    BetTooSmall { min: Chips },

    #[snafu(display("the minimum raise is to {}", min_total))]
    RaiseTooSmall { min_total: Chips },

    #[snafu(display("no player may put more than {} chips into one hand", max))]
    AmountTooLarge { max: Chips },

    #[snafu(display("{}", reason))]
    IllegalTransition { reason: &'static str },
}
