//! The core business logic of the server.

use std::collections::BTreeMap;
use std::default::Default;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::channel::mpsc;
use futures::lock::Mutex;
use log::{debug, error};
use serde::Deserialize;

use crate::model::{Chips, ConnectionId};
use crate::protocol::{Request, Response};
use crate::table::Table;

/// Owns the table and every connected member's response channel.
///
/// Requests are applied one at a time under a single lock, and the resulting
/// broadcast goes out before the lock is released.
pub struct Core {
    next_connection_id: AtomicU64,
    shared: Mutex<Shared>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_players: u8,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Ceiling on what one player may commit to a single hand.
    pub max_commitment: Chips,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_players: 10,
            small_blind: Chips(10),
            big_blind: Chips(20),
            max_commitment: Chips(1_000_000_000),
        }
    }
}

impl Core {
    /// Create a new server core around an empty table.
    pub fn new(settings: Settings) -> Self {
        Core::with_table(Table::new(settings))
    }

    pub fn with_table(table: Table) -> Self {
        Core {
            next_connection_id: AtomicU64::new(1),
            shared: Mutex::new(Shared {
                table,
                members: BTreeMap::new(),
            }),
        }
    }

    /// Register a new connection with the core.
    ///
    /// The response channel should have a consumer that somehow delivers the
    /// responses to the client. In the actual server, this would involve
    /// serializing and writing the response to a WebSocket; in a test, the
    /// client would have the receiving channel.
    ///
    /// The connection immediately receives one snapshot of the table.
    pub async fn register(&self, response_tx: mpsc::UnboundedSender<Response>) -> Context<'_> {
        let connection_id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::SeqCst));
        let mut shared = self.shared.lock().await;
        shared
            .members
            .insert(connection_id, Member { response_tx });
        shared.send_state(connection_id);
        debug!("registered connection {}", connection_id);
        Context {
            core: self,
            connection_id,
        }
    }
}

/// The handle by which connection tasks may send requests to the core.
pub struct Context<'core> {
    core: &'core Core,
    connection_id: ConnectionId,
}

impl<'core> Context<'core> {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Send a request to the core.
    ///
    /// This does not return a value: accepted requests are broadcast to every
    /// member, and refusals go back to this connection only, through the
    /// channel provided to `Core::register`.
    pub async fn execute(&mut self, req: Request) {
        let mut shared = self.core.shared.lock().await;
        shared.dispatch(self.connection_id, req);
    }

    /// Remove this connection from the core, e.g. due to disconnection.
    ///
    /// This would be better done as a Drop destructor, but, unfortunately,
    /// those don't support async yet.
    pub async fn cleanup(&mut self) {
        let mut shared = self.core.shared.lock().await;
        shared.members.remove(&self.connection_id);
        if shared.table.disconnect(self.connection_id) {
            shared.broadcast();
        }
    }
}

struct Shared {
    table: Table,
    members: BTreeMap<ConnectionId, Member>,
}

impl Shared {
    fn dispatch(&mut self, connection: ConnectionId, req: Request) {
        debug!("request from {}: {:?}", connection, req);
        let table = &mut self.table;
        let result = match req {
            Request::Join(join) => table.join(connection, &join.name).map(|_| ()),
            Request::SetReady(ready) => table.set_ready(connection, ready),
            Request::StartNextHand => table.start_next_hand(connection),
            Request::ResetGame => table.reset_game(connection),
            Request::Play(play) => table.act(connection, play.into()),
        };
        match result {
            Ok(()) => self.broadcast(),
            Err(e) => {
                debug!("rejected request from {}: {}", connection, e);
                self.send(connection, Response::ActionError(e.to_string()));
            }
        }
    }

    /// Log lines to everyone, then each member's own view of the table.
    fn broadcast(&mut self) {
        let notices = self.table.take_notices();
        for (&id, member) in &self.members {
            for notice in &notices {
                member.send(id, Response::Message(notice.clone()));
            }
            member.send(id, self.table.snapshot(id).into());
        }
    }

    fn send_state(&self, connection: ConnectionId) {
        self.send(connection, self.table.snapshot(connection).into());
    }

    fn send(&self, connection: ConnectionId, response: Response) {
        if let Some(member) = self.members.get(&connection) {
            member.send(connection, response);
        }
    }
}

struct Member {
    response_tx: mpsc::UnboundedSender<Response>,
}

impl Member {
    fn send(&self, id: ConnectionId, response: Response) {
        if let Err(e) = self.response_tx.unbounded_send(response) {
            error!("while sending response to {}: {}", id, e);
        }
    }
}
