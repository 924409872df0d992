use std::error::Error;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::channel::mpsc as response_channel;
use futures::SinkExt;
use log::{debug, error, info};
use tokio::stream::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use warp::filters::ws::{Message, WebSocket};
use warp::Filter;

use pokertable_game::protocol::{Request, Response};
use pokertable_game::server::Core;

use crate::settings;

/// Execute the entire life-cycle of the table server.
///
/// Runs until `shutdown_rx` fires (or its sender is dropped), then waits for
/// every connection task to finish.
pub async fn run(
    server: settings::Server,
    game: pokertable_game::server::Settings,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<Stats, Box<dyn Error + Send + Sync>> {
    let bind_addr = (server.bind_addr.as_str(), server.port)
        .to_socket_addrs()?
        .next()
        .ok_or("no address to bind to")?;

    // Channel to indicate that all connection tasks have terminated.
    let (terminated_tx, mut terminated_rx) = mpsc::channel::<()>(1);
    // Tells connection tasks to stop.
    let (stop_tx, stop_rx) = watch::channel(false);

    // Keep track of some basic statistics.
    let total_accepted_connections = Arc::new(AtomicUsize::new(0));

    let core = Arc::new(Core::new(game));
    let accepted = total_accepted_connections.clone();
    let table = warp::path("table")
        .and(warp::ws())
        .and(warp::addr::remote())
        .map(move |ws: warp::ws::Ws, addr: Option<SocketAddr>| {
            let core = core.clone();
            let stop_rx = stop_rx.clone();
            let terminated_tx = terminated_tx.clone();
            let accepted = accepted.clone();
            ws.on_upgrade(move |stream| async move {
                if let Some(addr) = addr {
                    accepted.fetch_add(1, Ordering::Release);
                    info!("accepted connection from {}", addr);
                    handle_client(core, stop_rx, stream, addr).await;
                } else {
                    error!("no address for incoming connection")
                }
                // notify main task that we're done.
                drop(terminated_tx);
            })
        });

    let (addr, server) =
        warp::serve(table).try_bind_with_graceful_shutdown(bind_addr, async move {
            shutdown_rx.await.ok();
            info!("received shutdown notice");
            if stop_tx.broadcast(true).is_err() {
                debug!("no connection tasks to notify");
            }
        })?;
    info!("running on {}", addr);

    // Wait for the server to stop.
    server.await;
    info!("web server stopped; waiting for connection tasks to terminate");
    terminated_rx.recv().await;

    Ok(Stats {
        total_accepted_connections: total_accepted_connections.load(Ordering::Acquire),
    })
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Stats {
    pub total_accepted_connections: usize,
}

async fn handle_client(
    core: Arc<Core>,
    mut stop_rx: watch::Receiver<bool>,
    mut stream: WebSocket,
    addr: SocketAddr,
) {
    let (response_tx, mut response_rx) = response_channel::unbounded();
    let mut context = core.register(response_tx).await;
    let mut hard_stop = false;

    debug!(
        "starting connection loop for {} as {}",
        addr,
        context.connection_id()
    );
    loop {
        tokio::select! {
            // Server shutting down
            Some(true) = stop_rx.next() => {
                debug!("received notification to stop handling {}", addr);
                hard_stop = true;
                break;
            },
            // Write out response to socket
            Some(resp) = response_rx.next() =>
                send_response(&resp, &mut stream, &addr).await,
            // Receive request from socket
            msg = stream.next() => match read_request(msg, &addr) {
                Inbound::Request(req) => context.execute(req).await,
                Inbound::Skip => {}
                Inbound::Closed => break,
            },
        }
    }

    if !hard_stop {
        debug!("cleaning up {}", addr);
        context.cleanup().await;
    }
    info!("finished handling {}", addr);
}

async fn send_response(resp: &Response, stream: &mut WebSocket, addr: &SocketAddr) {
    match serde_json::to_string(resp) {
        Ok(json) => {
            if let Err(e) = stream.send(Message::text(json)).await {
                error!("while sending response to {}: {}", addr, e);
            }
        }
        Err(e) => error!("while serializing response to {}: {}", addr, e),
    }
}

enum Inbound {
    Request(Request),
    Skip,
    Closed,
}

fn read_request(msg: Option<Result<Message, warp::Error>>, addr: &SocketAddr) -> Inbound {
    let msg = match msg {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            error!("reading from {}: {}", addr, e);
            return Inbound::Closed;
        }
        None => return Inbound::Closed,
    };
    if msg.is_close() {
        return Inbound::Closed;
    }
    if !(msg.is_text() || msg.is_binary()) {
        return Inbound::Skip;
    }
    match serde_json::from_slice::<Request>(msg.as_bytes()) {
        Ok(req) => Inbound::Request(req),
        Err(e) => {
            error!("parsing request from {}: {}", addr, e);
            Inbound::Skip
        }
    }
}
