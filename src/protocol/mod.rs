use std::time::Instant;

use serde_json::{json, Value};

use crate::services::anki::AnkiClient;
use crate::services::session::Session;
use crate::services::store;

mod command;
use command::Command;

/// Estado mutável do loop: no máximo uma sessão aberta por processo
/// (o shell roda um core por aba observada).
pub struct SessionState {
    session: Option<Session>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState { session: None }
    }
}

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload<'a>(req: &'a Value) -> &'a Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn session_mut(state: &mut SessionState) -> Result<&mut Session, String> {
    state
        .session
        .as_mut()
        .ok_or_else(|| "no open session".to_string())
}

pub fn handle(state: &mut SessionState, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd = Command::from(get_cmd(&req));
    let payload = get_payload(&req);

    match cmd {
        Command::Ping => ok(id, json!({ "message": "kotoba-core alive" })),

        Command::SessionOpen => {
            let url = get_str(payload, "url");
            if url.is_empty() {
                return err(id, "payload.url is required");
            }

            match Session::open(url) {
                Ok(session) => {
                    let snapshot = session.snapshot();
                    let kind = session.kind();
                    state.session = Some(session);
                    ok(id, json!({ "kind": kind, "record": snapshot }))
                }
                Err(e) => err(id, e),
            }
        }

        Command::SessionNavigate => {
            let url = get_str(payload, "url");
            if url.is_empty() {
                return err(id, "payload.url is required");
            }

            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };
            match session.navigate(url) {
                Ok(()) => ok(id, json!({ "kind": session.kind() })),
                Err(e) => err(id, e),
            }
        }

        Command::SessionNetwork => {
            let url = get_str(payload, "url");
            let body = get_str(payload, "body");
            if url.is_empty() {
                return err(id, "payload.url is required");
            }

            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };
            session.ingest_network(url, body);
            ok(id, json!({}))
        }

        Command::SessionDocument => {
            let html = get_str(payload, "html");
            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };
            session.ingest_document(html);
            ok(id, json!({}))
        }

        Command::SessionInsight => {
            let data = get_str(payload, "data");
            if data.is_empty() {
                return err(id, "payload.data is required");
            }

            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };
            session.ingest_insight(data);
            ok(id, json!({}))
        }

        Command::SessionPoll => {
            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };

            let now = Instant::now();
            let settings = store::load_settings();
            if session.should_auto_save(&settings) {
                if let Err(e) = session.save(None, None, &settings, now) {
                    eprintln!("[session] auto save failed: {e}");
                }
            }

            let status = session.poll(now);
            ok(id, serde_json::to_value(status).unwrap_or(json!({})))
        }

        Command::SessionSnapshot => {
            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };
            ok(id, json!({ "record": session.snapshot() }))
        }

        Command::SessionSave => {
            let html = payload.get("html").and_then(|v| v.as_str());
            let voice = payload.get("voice").and_then(|v| v.as_str());

            let session = match session_mut(state) {
                Ok(s) => s,
                Err(e) => return err(id, e),
            };

            let settings = store::load_settings();
            match session.save(html, voice, &settings, Instant::now()) {
                Ok(outcome) => ok(id, serde_json::to_value(outcome).unwrap_or(json!({}))),
                Err(e) => err(id, e),
            }
        }

        Command::SettingsGet => {
            let settings = store::load_settings();
            ok(id, serde_json::to_value(settings).unwrap_or(json!({})))
        }

        Command::SettingsSet => {
            let partial = payload.get("settings").cloned().unwrap_or(Value::Null);
            if partial.is_null() {
                return err(id, "payload.settings is required");
            }

            match store::save_settings(&partial) {
                Ok(merged) => ok(id, serde_json::to_value(merged).unwrap_or(json!({}))),
                Err(e) => err(id, e),
            }
        }

        Command::StatsGet => ok(id, json!({ "card_count": store::card_count() })),

        Command::AnkiPing => {
            let connected = match AnkiClient::new() {
                Ok(client) => client.probe(),
                Err(_) => false,
            };
            ok(id, json!({ "connected": connected }))
        }

        Command::AnkiDecks => {
            let client = match AnkiClient::new() {
                Ok(c) => c,
                Err(e) => return err(id, e),
            };
            match client.deck_names() {
                Ok(decks) => ok(id, json!({ "decks": decks })),
                Err(e) => err(id, e),
            }
        }

        Command::AnkiEnsureModels => {
            let client = match AnkiClient::new() {
                Ok(c) => c,
                Err(e) => return err(id, e),
            };
            match client.ensure_models() {
                Ok(()) => ok(id, json!({})),
                Err(e) => err(id, e),
            }
        }

        Command::Unknown => err(id, "unknown command"),
    }
}
