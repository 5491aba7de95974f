//! WebSocket server: accept loop and per-session lifecycle.
//!
//! Each accepted connection is upgraded to a WebSocket and handled in its
//! own Tokio task:
//!
//! 1. **Handshake** — when authentication is enabled the host sends
//!    `auth_required` and waits (bounded) for credentials.  Command frames
//!    arriving before authentication are answered with an error and never
//!    routed.
//! 2. **Push** — on successful authentication the host pushes `app_detected`
//!    for the current foreground application.
//! 3. **Command loop** — frames are processed strictly in arrival order; a
//!    command's response is sent before the next frame is read, so
//!    per-session ordering is the transport's guarantee, not the client's
//!    problem.
//!
//! The accept loop polls a shared `running` flag (set by the Ctrl+C handler
//! in `main.rs`) between short-timeout accepts, so shutdown never waits on a
//! quiet socket.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Instant};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use artremote_core::{AckStatus, ClientMessage, HostMessage};

use crate::application::dispatch::Dispatcher;
use crate::application::sessions::SessionManager;

type WsConn = WebSocketStream<TcpStream>;

/// Shared host services handed to every session task.
pub struct HostContext {
    pub sessions: Arc<SessionManager>,
    pub dispatcher: Arc<Dispatcher>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the accept loop until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (port in use,
/// missing permission).
pub async fn run_server(
    bind_addr: SocketAddr,
    ctx: Arc<HostContext>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {bind_addr}"))?;
    serve(listener, ctx, running).await
}

/// Accept loop over an already-bound listener.  Split out of [`run_server`]
/// so tests can bind an ephemeral port first.
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<HostContext>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("listening for remote devices on {addr}");
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the loop can re-check the shutdown flag even when
        // no devices are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("new device connection from {peer_addr}");
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    handle_device_session(stream, peer_addr, ctx).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error; keep serving.
                warn!("accept error: {e}");
            }
            Err(_) => {
                // Timeout, nothing to accept; loop back to the flag check.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Entry point for each session task; wraps [`run_session`] and logs the
/// outcome.
async fn handle_device_session(raw_stream: TcpStream, peer_addr: SocketAddr, ctx: Arc<HostContext>) {
    match run_session(raw_stream, peer_addr, ctx).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<HostContext>,
) -> anyhow::Result<()> {
    let mut ws = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let session_id = ctx.sessions.open_session();
    debug!(session = %session_id, "session registered for {peer_addr}");

    let result = drive_session(&mut ws, session_id, &ctx).await;

    ctx.sessions.close_session(session_id);
    // Best effort close frame; the peer may already be gone.
    let _ = ws.close(None).await;
    result
}

async fn drive_session(
    ws: &mut WsConn,
    session_id: Uuid,
    ctx: &HostContext,
) -> anyhow::Result<()> {
    if ctx.sessions.auth_enabled() {
        send(ws, &HostMessage::auth_required()).await?;
        ctx.sessions.begin_auth(session_id);
        if !authenticate(ws, session_id, ctx).await? {
            return Ok(());
        }
    } else if ctx.sessions.handle_auth(session_id, None, None, None).is_err() {
        // Unregistered mid-handshake; nothing left to drive.
        return Ok(());
    }

    // Authenticated (or auth disabled): tell the device what it is driving.
    let (app, table) = ctx.dispatcher.active_context().await;
    send(ws, &HostMessage::app_detected(app, &table)).await?;

    command_loop(ws, session_id, ctx).await
}

/// Runs the authentication handshake within the configured window.
///
/// Returns `Ok(true)` when the session authenticated, `Ok(false)` when it
/// must be closed (bad credentials, timeout, peer disconnect).
async fn authenticate(ws: &mut WsConn, session_id: Uuid, ctx: &HostContext) -> anyhow::Result<bool> {
    let deadline = Instant::now() + ctx.sessions.auth_timeout();

    loop {
        let frame = match tokio::time::timeout_at(deadline, ws.next()).await {
            Ok(frame) => frame,
            Err(_) => {
                info!(session = %session_id, "authentication window expired");
                send(ws, &HostMessage::auth_response(false, "Authentication timed out")).await?;
                return Ok(false);
            }
        };

        let text = match next_text(frame, session_id) {
            FrameOutcome::Text(text) => text,
            FrameOutcome::Ignored => continue,
            FrameOutcome::Closed => return Ok(false),
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Authenticate {
                token,
                pin,
                client_info,
                ..
            }) => {
                let accepted = ctx
                    .sessions
                    .handle_auth(
                        session_id,
                        token.as_deref(),
                        pin.as_deref(),
                        client_info,
                    )
                    .is_ok();
                if accepted {
                    send(ws, &HostMessage::auth_response(true, "Authentication successful"))
                        .await?;
                    return Ok(true);
                }
                send(
                    ws,
                    &HostMessage::auth_response(false, "Invalid authentication credentials"),
                )
                .await?;
                return Ok(false);
            }
            Ok(ClientMessage::Command { action, .. }) => {
                // Never routed: the session has not proven itself yet.
                debug!(session = %session_id, action, "command before authentication");
                send(
                    ws,
                    &HostMessage::ack_with_message(
                        AckStatus::Error,
                        action,
                        "authentication required",
                    ),
                )
                .await?;
            }
            Err(e) => {
                debug!(session = %session_id, "malformed frame during handshake: {e}");
                send(
                    ws,
                    &HostMessage::ack_with_message(AckStatus::Error, "unknown", "malformed message"),
                )
                .await?;
            }
        }
    }
}

/// Processes command frames until the peer disconnects.  Strictly
/// sequential: each response is sent before the next frame is read.
async fn command_loop(ws: &mut WsConn, session_id: Uuid, ctx: &HostContext) -> anyhow::Result<()> {
    loop {
        let text = match next_text(ws.next().await, session_id) {
            FrameOutcome::Text(text) => text,
            FrameOutcome::Ignored => continue,
            FrameOutcome::Closed => return Ok(()),
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Command { action, value }) => {
                let response = ctx.dispatcher.dispatch(&action, value.as_ref()).await;
                ctx.sessions.touch(session_id);
                send(ws, &response).await?;
            }
            Ok(ClientMessage::Authenticate { .. }) => {
                // Harmless retry from an already-trusted device.
                send(ws, &HostMessage::auth_response(true, "Already authenticated")).await?;
            }
            Err(e) => {
                debug!(session = %session_id, "malformed command frame: {e}");
                send(
                    ws,
                    &HostMessage::ack_with_message(AckStatus::Error, "unknown", "malformed message"),
                )
                .await?;
            }
        }
    }
}

// ── Frame plumbing ────────────────────────────────────────────────────────────

enum FrameOutcome {
    Text(String),
    Ignored,
    Closed,
}

/// Normalizes one raw WebSocket frame: text passes through, protocol frames
/// are ignored, everything terminal maps to `Closed`.
fn next_text(frame: Option<Result<WsMessage, WsError>>, session_id: Uuid) -> FrameOutcome {
    match frame {
        Some(Ok(WsMessage::Text(text))) => FrameOutcome::Text(text),
        Some(Ok(WsMessage::Binary(_))) => {
            // The device protocol is JSON-only.
            warn!(session = %session_id, "unexpected binary frame (ignored)");
            FrameOutcome::Ignored
        }
        Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
            FrameOutcome::Ignored
        }
        Some(Ok(WsMessage::Close(_))) => {
            debug!(session = %session_id, "close frame received");
            FrameOutcome::Closed
        }
        Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
            debug!(session = %session_id, "connection closed");
            FrameOutcome::Closed
        }
        Some(Err(e)) => {
            warn!(session = %session_id, "websocket error: {e}");
            FrameOutcome::Closed
        }
        None => FrameOutcome::Closed,
    }
}

async fn send(ws: &mut WsConn, message: &HostMessage) -> anyhow::Result<()> {
    let json = serde_json::to_string(message).context("failed to serialize host message")?;
    ws.send(WsMessage::Text(json))
        .await
        .context("failed to send frame")?;
    Ok(())
}
