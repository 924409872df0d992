#![warn(rust_2018_idioms)]

pub mod settings;

mod server;

pub use server::{run, Stats};
