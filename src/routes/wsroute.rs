use crate::services::CallService;
use crate::state::AppState;
use crate::websocket::events::ServerEvent;
use crate::websocket::message_types::ClientEvent;
use crate::websocket::presence::PresenceBroadcaster;
use crate::websocket::router::DeliveryRouter;
use crate::websocket::SessionId;
use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub user_id: Uuid,
}

// Outbound frame bridged from the registry channel into the session actor.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct OutboundFrame(String);

// Tells an actor whose registry entry is gone to close its socket. Reaches
// a live actor only after a newer connection superseded this one.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct SessionReplaced;

// WebSocket actor for one connected user.
struct WsSession {
    user_id: Uuid,
    session_id: SessionId,
    presence: PresenceBroadcaster,
    router: DeliveryRouter,
    calls: CallService,
    hb: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

// Standalone async function for handling client events (avoids borrow checker issues)
async fn handle_client_event(
    user_id: Uuid,
    evt: ClientEvent,
    router: DeliveryRouter,
    calls: CallService,
) {
    match evt {
        ClientEvent::Typing {
            receiver_id,
            is_typing,
        } => {
            router
                .notify(
                    receiver_id,
                    &ServerEvent::TypingUpdate {
                        sender_id: user_id,
                        is_typing,
                    },
                )
                .await;
        }
        ClientEvent::CallOffer {
            user_to_call,
            signal,
            name,
        } => {
            calls.offer(user_id, user_to_call, name, signal).await;
        }
        ClientEvent::CallAnswer { to, signal } => {
            calls.answer(to, signal).await;
        }
        ClientEvent::CallReject { to } => {
            calls.reject(user_id, to).await;
        }
        ClientEvent::CallEnd { to } => {
            calls.end(user_id, to).await;
        }
    }
}

impl WsSession {
    fn new(user_id: Uuid, session_id: SessionId, state: &AppState) -> Self {
        Self {
            user_id,
            session_id,
            presence: state.presence.clone(),
            router: state.router.clone(),
            calls: state.calls.clone(),
            hb: Instant::now(),
            heartbeat_interval: Duration::from_secs(state.config.ws_heartbeat_secs),
            client_timeout: Duration::from_secs(state.config.ws_client_timeout_secs),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let timeout = self.client_timeout;
        ctx.run_interval(self.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > timeout {
                tracing::warn!(user_id = %act.user_id, "WebSocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "WebSocket session started");
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(user_id = %self.user_id, "WebSocket session stopped");

        // Cleanup is keyed on the session id, so a socket that was already
        // superseded by a newer connection leaves the registry untouched.
        let presence = self.presence.clone();
        let user_id = self.user_id;
        let session_id = self.session_id;
        actix::spawn(async move {
            presence.disconnect(user_id, session_id).await;
        });
    }
}

// Push frames queued by the delivery router out on the socket.
impl Handler<OutboundFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Handler<SessionReplaced> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: SessionReplaced, ctx: &mut Self::Context) {
        tracing::debug!(user_id = %self.user_id, "closing superseded WebSocket session");
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Normal,
            description: Some("session replaced".into()),
        }));
        ctx.stop();
    }
}

// Handle WebSocket protocol messages
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(evt) => {
                    let user_id = self.user_id;
                    let router = self.router.clone();
                    let calls = self.calls.clone();
                    actix::spawn(async move {
                        handle_client_event(user_id, evt, router, calls).await;
                    });
                }
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, "Failed to parse WS message: {:?}", e);
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(user_id = %self.user_id, "WebSocket close received: {:?}", reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}

/// GET /api/v1/ws?user_id=...
///
/// Registers the user's presence before the handshake completes, so the
/// first frame the new socket sees is the presence snapshot that includes
/// itself.
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<WsParams>,
) -> Result<HttpResponse, Error> {
    let user_id = query.into_inner().user_id;

    let (session_id, mut rx) = state.presence.connect(user_id).await;

    let session = WsSession::new(user_id, session_id, state.get_ref());
    let (addr, resp) = match ws::WsResponseBuilder::new(session, &req, stream).start_with_addr() {
        Ok(pair) => pair,
        Err(e) => {
            // Handshake failed after registration, roll presence back.
            state.presence.disconnect(user_id, session_id).await;
            return Err(e);
        }
    };

    // Bridge the registry's outbound channel into the actor mailbox. The
    // loop ends when the registry entry is dropped: on a normal disconnect
    // the actor is already stopping, after a supersede it has to be told
    // to close the stale socket.
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            addr.do_send(OutboundFrame(frame));
        }
        addr.do_send(SessionReplaced);
    });

    Ok(resp)
}
