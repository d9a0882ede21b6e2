//! WebSocket upgrade + message loop. Each socket owns one authoring wizard.
//! Messages are handled one at a time and every request gets exactly one
//! JSON reply, so a session never has two store calls in flight.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::catalog;
use crate::domain::GameType;
use crate::error::{AuthoringError, Result};
use crate::logic::parse_subject;
use crate::protocol::{to_view, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::trunc_for_log;
use crate::wizard::{Mode, Wizard};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!(target: "levelcraft", "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!(target: "levelcraft", "WebSocket connected");
    let mut wizard = Wizard::new(Mode::Create);
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(txt) => {
                let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
                    Ok(incoming) => {
                        debug!(
                            target: "levelcraft",
                            payload = %trunc_for_log(&txt, 256),
                            "WS received"
                        );
                        handle_client_ws(incoming, &mut wizard, &state).await
                    }
                    Err(e) => {
                        let e = AuthoringError::InvalidRequest(format!("invalid JSON: {e}"));
                        ServerWsMessage::from(&e)
                    }
                };

                let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
                    serde_json::json!({
                        "type": "error",
                        "code": "INTERNAL",
                        "message": format!("Serialization error: {}", e)
                    })
                    .to_string()
                });

                if let Err(e) = socket.send(Message::Text(out)).await {
                    error!(target: "levelcraft", error = %e, "WS send error");
                    break;
                }
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    info!(target: "levelcraft", step = wizard.step().as_str(), "WebSocket disconnected");
}

async fn handle_client_ws(
    msg: ClientWsMessage,
    wizard: &mut Wizard,
    state: &AppState,
) -> ServerWsMessage {
    match apply(msg, wizard, state).await {
        Ok(reply) => reply,
        Err(e) => {
            if e.status().is_server_error() {
                error!(target: "authoring", code = e.code(), error = %e, "WS action failed");
            } else {
                info!(
                    target: "authoring",
                    code = e.code(),
                    error = %e,
                    step = wizard.step().as_str(),
                    "WS action rejected"
                );
            }
            ServerWsMessage::from(&e)
        }
    }
}

#[instrument(level = "info", skip(wizard, state), fields(step = wizard.step().as_str()))]
async fn apply(
    msg: ClientWsMessage,
    wizard: &mut Wizard,
    state: &AppState,
) -> Result<ServerWsMessage> {
    let store = state.store.as_ref();
    match msg {
        ClientWsMessage::Ping => return Ok(ServerWsMessage::Pong),
        ClientWsMessage::Start { mode } => *wizard = Wizard::new(mode),
        ClientWsMessage::GetSession => {}
        ClientWsMessage::ChooseSubject { subject } => {
            let subject = parse_subject(&subject)?;
            wizard.choose_subject(store, subject).await?;
        }
        ClientWsMessage::ChooseSection { section_id } => {
            wizard.choose_section(store, &section_id).await?
        }
        ClientWsMessage::CreateSection { section } => wizard.create_section(store, section).await?,
        ClientWsMessage::ChooseGameType { game_type } => {
            let parsed = match wizard.subject() {
                Some(subject) => catalog::resolve(subject, &game_type)?,
                None => GameType::parse(&game_type).ok_or_else(|| {
                    AuthoringError::InvalidRequest(format!("unknown game type '{game_type}'"))
                })?,
            };
            wizard.choose_game_type(parsed)?;
        }
        ClientWsMessage::ChooseLevel { level_id } => wizard.choose_level(&level_id)?,
        ClientWsMessage::SetDetails { name, title, icon } => {
            wizard.builder_mut()?.set_details(name, title, icon)
        }
        ClientWsMessage::AddStage { stage } => {
            wizard.builder_mut()?.stages_mut().add(&stage)?;
        }
        ClientWsMessage::ReplaceStage { index, stage } => {
            wizard.builder_mut()?.stages_mut().replace(index, &stage)?;
        }
        ClientWsMessage::RemoveStage { index } => {
            wizard.builder_mut()?.stages_mut().remove(index)?;
        }
        ClientWsMessage::Save => {
            let level = wizard.save(store).await?;
            info!(
                target: "authoring",
                id = %level.id,
                level_index = level.level_index,
                "WS level saved"
            );
            return Ok(ServerWsMessage::Saved { level, session: to_view(wizard) });
        }
        ClientWsMessage::Back => wizard.back()?,
        ClientWsMessage::Cancel => wizard.cancel(),
    }
    Ok(ServerWsMessage::Session { session: to_view(wizard) })
}
