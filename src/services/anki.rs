use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

use std::time::Duration;

const ANKI_CONNECT_URL: &str = "http://127.0.0.1:8765";
const API_VERSION: u64 = 6;
const TIMEOUT_SECS: u64 = 10;

pub const TRANSLATION_MODEL: &str = "Kotoba Translation";
pub const DICTIONARY_MODEL: &str = "Kotoba Dictionary";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    pub options: NoteOptions,
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<NoteAudio>,
}

#[derive(Debug, Serialize)]
pub struct NoteFields {
    #[serde(rename = "Front")]
    pub front: String,

    #[serde(rename = "Back")]
    pub back: String,

    // Preenchido pelo anexo de áudio (campo alvo), nunca direto.
    #[serde(rename = "Audio")]
    pub audio: String,

    #[serde(rename = "SourceLang")]
    pub source_lang: String,

    #[serde(rename = "TargetLang")]
    pub target_lang: String,

    #[serde(rename = "Quality")]
    pub quality: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
    pub duplicate_scope: String,
}

impl Default for NoteOptions {
    fn default() -> Self {
        NoteOptions {
            allow_duplicate: false,
            duplicate_scope: "deck".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteAudio {
    pub data: String,
    pub filename: String,
    pub fields: Vec<String>,
}

pub struct AnkiClient {
    client: Client,
}

impl AnkiClient {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| e.to_string())?;

        Ok(AnkiClient { client })
    }

    /// Dispatch único do AnkiConnect: {action, version, params} → {result, error}.
    /// `error` não-nulo é falha de domínio; transporte/HTTP é falha de conectividade.
    pub fn invoke(&self, action: &str, params: Value) -> Result<Value, String> {
        let mut body = json!({ "action": action, "version": API_VERSION });
        if !params.is_null() {
            body["params"] = params;
        }

        let res = self
            .client
            .post(ANKI_CONNECT_URL)
            .json(&body)
            .send()
            .map_err(|e| format!("Failed to connect to Anki: {e}"))?;

        let status = res.status();
        let text = res
            .text()
            .map_err(|e| format!("Failed to connect to Anki: {e}"))?;

        if !status.is_success() {
            return Err(extract_error_message(status, &text));
        }

        let v: Value = serde_json::from_str(&text).map_err(|_| "Invalid JSON from Anki".to_string())?;

        if let Some(error) = v.get("error").and_then(|e| e.as_str()) {
            return Err(error.to_string());
        }

        Ok(v.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Probe de conectividade. Nunca erra: indisponível é só `false`.
    pub fn probe(&self) -> bool {
        self.invoke("version", Value::Null).is_ok()
    }

    pub fn deck_names(&self) -> Result<Vec<String>, String> {
        let result = self.invoke("deckNames", Value::Null)?;
        serde_json::from_value(result).map_err(|_| "Invalid deck list from Anki".to_string())
    }

    pub fn ensure_models(&self) -> Result<(), String> {
        let mut invoke = |action: &str, params: Value| self.invoke(action, params);
        ensure_model_with(&mut invoke, TRANSLATION_MODEL)?;
        ensure_model_with(&mut invoke, DICTIONARY_MODEL)?;
        Ok(())
    }

    pub fn can_add_note(&self, note: &Note) -> Result<bool, String> {
        let result = self.invoke("canAddNotes", json!({ "notes": [note] }))?;
        Ok(result
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    pub fn add_note(&self, note: &Note) -> Result<i64, String> {
        let result = self.invoke("addNote", json!({ "note": note }))?;
        result
            .as_i64()
            .ok_or_else(|| "Invalid note id from Anki".to_string())
    }
}

/// Criação idempotente de um note model: nome já existente (no inventário ou
/// como erro "already exists" do createModel) é sucesso, não erro.
/// Genérica sobre o invoke para ser testável sem um Anki rodando.
pub fn ensure_model_with<F>(invoke: &mut F, model_name: &str) -> Result<(), String>
where
    F: FnMut(&str, Value) -> Result<Value, String>,
{
    let existing = invoke("modelNames", Value::Null)?;
    let exists = existing
        .as_array()
        .map(|models| models.iter().any(|m| m.as_str() == Some(model_name)))
        .unwrap_or(false);

    if exists {
        return Ok(());
    }

    match invoke("createModel", model_params(model_name)) {
        Ok(_) => Ok(()),
        Err(e) if e.contains("already exists") => Ok(()),
        Err(e) => Err(e),
    }
}

fn model_params(model_name: &str) -> Value {
    json!({
        "modelName": model_name,
        "inOrderFields": ["Front", "Back", "Audio", "SourceLang", "TargetLang", "Quality"],
        "css": MODEL_CSS,
        "cardTemplates": [
            {
                "Name": "Card 1",
                "Front": "<div class=\"front\">{{Front}}</div>",
                "Back": "<div class=\"back\">\n  {{Back}}\n  {{Audio}}\n</div>"
            }
        ]
    })
}

fn extract_error_message(status: StatusCode, body_text: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body_text) {
        if let Some(msg) = v.get("error").and_then(|e| e.as_str()) {
            return format!("HTTP {}: {}", status.as_u16(), msg);
        }
    }

    let trimmed = body_text.trim();
    let snippet = if trimmed.len() > 200 {
        format!("{}...", &trimmed[..200])
    } else {
        trimmed.to_string()
    };

    format!("HTTP {}: {}", status.as_u16(), snippet)
}

const MODEL_CSS: &str = r#".card {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  font-size: 16px;
  text-align: center;
  color: #e0e0e0;
  background-color: #1a1a1a;
  padding: 20px;
}

.front {
  font-size: 1.8em;
  font-weight: bold;
  padding: 40px 20px;
}

.back {
  text-align: left;
}

@media (prefers-color-scheme: light) {
  .card {
    color: #1a1a1a;
    background-color: #ffffff;
  }
}"#;
