use serde::Serialize;

use crate::model::record::CaptureRecord;
use crate::model::settings::Settings;
use crate::services::anki::{
    AnkiClient, Note, NoteAudio, NoteFields, NoteOptions, DICTIONARY_MODEL, TRANSLATION_MODEL,
};
use crate::services::audio::{self, AudioAttachment};
use crate::services::{card, store};

#[derive(Debug, Serialize)]
pub struct SaveOutcome {
    pub note_id: i64,
    pub card_count: u64,
    pub summary: String,
}

/// Pipeline de export: valida → áudio (opcional, tolerante a falha) →
/// formata → garante schema → checa aceitação → insere → conta.
/// Sem estado parcial exposto: o resultado é um único sucesso/falha.
pub fn run(
    record: &CaptureRecord,
    origin: &str,
    voice: &str,
    settings: &Settings,
) -> Result<SaveOutcome, String> {
    // Valida antes de qualquer chamada de rede.
    if !record.is_complete() {
        return Err(match record {
            CaptureRecord::Translation(_) => "Translation data is incomplete".to_string(),
            CaptureRecord::Dictionary(_) => "Dictionary entry is incomplete".to_string(),
        });
    }

    let plan = build_plan(record, settings);

    let attachment = if settings.include_audio {
        fetch_attachment(&plan, origin, voice)
    } else {
        None
    };

    let note = Note {
        deck_name: settings.deck.clone(),
        model_name: plan.model_name.to_string(),
        fields: NoteFields {
            front: plan.front.clone(),
            back: plan.back.clone(),
            audio: String::new(),
            source_lang: plan.source_lang.clone(),
            target_lang: plan.target_lang.clone(),
            quality: plan.quality.clone(),
        },
        options: NoteOptions::default(),
        tags: plan.tags.clone(),
        audio: attachment
            .map(|a| {
                vec![NoteAudio {
                    data: a.data,
                    filename: a.filename,
                    fields: vec!["Audio".to_string()],
                }]
            })
            .unwrap_or_default(),
    };

    let client = AnkiClient::new()?;

    // Criação é idempotente; falha aqui não aborta (o addNote acusa se o
    // model realmente não existir).
    if let Err(e) = client.ensure_models() {
        eprintln!("[export] ensure models failed: {e}");
    }

    if !client.can_add_note(&note)? {
        return Err("Anki rejected this card (already in the deck?)".to_string());
    }

    let note_id = client.add_note(&note)?;
    let card_count = store::increment_card_count();

    Ok(SaveOutcome {
        note_id,
        card_count,
        summary: summary_for(record),
    })
}

struct NotePlan {
    model_name: &'static str,
    front: String,
    back: String,
    source_lang: String,
    target_lang: String,
    quality: String,
    tags: Vec<String>,
    speech_text: String,
    speech_lang: String,
}

fn build_plan(record: &CaptureRecord, settings: &Settings) -> NotePlan {
    match record {
        CaptureRecord::Translation(t) => {
            let mut tags = settings.custom_tags.clone();
            tags.push(format!("{}-{}", t.source_lang, t.target_lang));
            tags.push(t.quality.as_str().to_string());

            NotePlan {
                model_name: TRANSLATION_MODEL,
                front: card::format_translation_front(t),
                back: card::format_translation_back(t),
                source_lang: t.source_lang.clone(),
                target_lang: t.target_lang.clone(),
                quality: t.quality.as_str().to_string(),
                tags,
                speech_text: t.target_text.clone(),
                speech_lang: t.target_lang.clone(),
            }
        }

        CaptureRecord::Dictionary(d) => {
            let mut tags = settings.custom_tags.clone();
            tags.push(d.language.clone());
            tags.push("dictionary".to_string());

            NotePlan {
                model_name: DICTIONARY_MODEL,
                front: card::format_dictionary_front(d),
                back: card::format_dictionary_back(d),
                source_lang: d.language.clone(),
                target_lang: d.language.clone(),
                quality: settings.default_quality.as_str().to_string(),
                tags,
                speech_text: d.word.clone(),
                speech_lang: d.language.clone(),
            }
        }
    }
}

fn fetch_attachment(plan: &NotePlan, origin: &str, voice: &str) -> Option<AudioAttachment> {
    let (data, mime) = audio::fetch_speech(origin, &plan.speech_text, &plan.speech_lang, voice)?;

    Some(AudioAttachment {
        filename: audio::audio_filename(&plan.speech_text, &plan.source_lang, &plan.target_lang, &mime),
        data,
    })
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn summary_for(record: &CaptureRecord) -> String {
    let mut details: Vec<String> = Vec::new();

    match record {
        CaptureRecord::Translation(t) => {
            if !t.insights.is_empty() {
                details.push(plural(t.insights.len(), "word insight"));
            }
            if !t.alternatives.is_empty() {
                details.push(plural(t.alternatives.len(), "alternative"));
            }
        }
        CaptureRecord::Dictionary(d) => {
            if !d.definitions.is_empty() {
                details.push(plural(d.definitions.len(), "definition"));
            }
            if !d.synonyms.is_empty() {
                details.push(plural(d.synonyms.len(), "synonym"));
            }
        }
    }

    if details.is_empty() {
        "Saved to Anki!".to_string()
    } else {
        format!("Saved to Anki! • {}", details.join(", "))
    }
}
