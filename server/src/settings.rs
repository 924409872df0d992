use std::default::Default;
use std::env;

use config::{Config, ConfigError, Environment, File};
use log::warn;
use pokertable_game::model::Chips;
use serde::Deserialize;

/// Layer the configuration sources, later ones overriding earlier ones.
pub fn load() -> Result<Settings, ConfigError> {
    let mut s = Config::new();
    s.merge(File::with_name(DEFAULT_CFG_PATH).required(false))?;
    let env = env::var(RUN_MODE_ENV).unwrap_or_else(|_| "development".into());
    s.merge(File::with_name(&format!("config/{}", env)).required(false))?;
    s.merge(File::with_name(LOCAL_CFG_PATH).required(false))?;
    s.merge(Environment::with_prefix(ENV_PREFIX).separator("__"))?;
    if let Some(port) = port_from_env()? {
        s.set("server.port", i64::from(port))?;
    }
    s.try_into()
}

// Hosting platforms hand out the listen port as a bare `PORT`.
fn port_from_env() -> Result<Option<u16>, ConfigError> {
    match env::var(PORT_ENV) {
        Ok(port) => port
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::Message(format!("invalid {}={:?}: {}", PORT_ENV, port, e))),
        Err(_) => Ok(None),
    }
}

/// Repair table settings that could never deal a hand, or whose pot could
/// outgrow an `i64` with every seat at the commitment ceiling.
pub fn check_game(mut g: pokertable_game::server::Settings) -> pokertable_game::server::Settings {
    if g.max_players < 2 {
        warn!("max_players must be at least 2; adjusting");
        g.max_players = 2;
    }
    if g.small_blind < Chips(1) {
        warn!("small_blind must be positive; adjusting to 1");
        g.small_blind = Chips(1);
    }
    if g.big_blind < g.small_blind {
        warn!(
            "big_blind must be at least small_blind; adjusting to {}",
            g.small_blind
        );
        g.big_blind = g.small_blind;
    }
    let ceiling = Chips(i64::MAX / i64::from(g.max_players));
    if g.max_commitment > ceiling {
        warn!(
            "max_commitment is too large for {} seats; adjusting to {}",
            g.max_players, ceiling
        );
        g.max_commitment = ceiling;
    }
    if g.max_commitment < g.big_blind {
        warn!(
            "max_commitment must cover the big blind; adjusting to {}",
            g.big_blind
        );
        g.max_commitment = g.big_blind;
    }
    g
}

const DEFAULT_CFG_PATH: &str = "config/default";
const LOCAL_CFG_PATH: &str = "config/local";
const RUN_MODE_ENV: &str = "POKERTABLE_SERVER_RUN_MODE";
const ENV_PREFIX: &str = "pokertable_server";
const PORT_ENV: &str = "PORT";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: Logging,
    pub runtime: Runtime,
    pub server: Server,
    pub game: pokertable_game::server::Settings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Runtime {
    pub threaded: bool,
    pub core_threads: usize,
    pub max_threads: usize,
    pub thread_name: String,
}

impl Default for Runtime {
    fn default() -> Self {
        let num_cores = num_cpus::get_physical();
        Runtime {
            threaded: true,
            core_threads: num_cores,
            max_threads: num_cores * 2,
            thread_name: "async-worker".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            bind_addr: "0.0.0.0".into(),
            port: 3000,
        }
    }
}
