#![warn(rust_2018_idioms)]

//! A shared Texas Hold'em table: seating, betting, showdown, and the
//! per-connection views that keep hole cards private.

pub mod betting;
pub mod deck;
pub mod error;
pub mod eval;
pub mod model;
pub mod pot;
pub mod protocol;
pub mod server;
pub mod showdown;
pub mod table;
pub mod view;

pub use betting::Action;
pub use error::ActionError;
pub use table::Table;
pub use view::{PlayerView, Snapshot};
