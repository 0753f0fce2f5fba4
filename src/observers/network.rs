use regex::Regex;
use serde::Deserialize;

use crate::model::record::{Alternative, Definition, Example, Synonym, TextAlignment, WordInsight};
use crate::services::accumulator::{
    DictionaryPatch, ListUpdate, Patch, TextCandidate, TranslationPatch,
};

/// Famílias de endpoint reconhecidas no tráfego interceptado pelo shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    WordInsights,
    AlternativeTranslations,
    TextAlignments,
    Dictionary,
}

pub fn classify(url: &str) -> Option<Endpoint> {
    if url.contains("/api/word-insights") {
        Some(Endpoint::WordInsights)
    } else if url.contains("/api/alternative-translations") {
        Some(Endpoint::AlternativeTranslations)
    } else if url.contains("/api/text-alignments") {
        Some(Endpoint::TextAlignments)
    } else if url.contains("/api/dictionary") {
        Some(Endpoint::Dictionary)
    } else {
        None
    }
}

#[derive(Deserialize)]
struct WordInsightsResponse {
    #[serde(default)]
    insights: Vec<WordInsight>,

    #[serde(default)]
    marked_translation: String,
}

#[derive(Deserialize)]
struct AlternativesResponse {
    #[serde(default)]
    original_description: String,

    #[serde(default)]
    elements: Vec<Alternative>,
}

// Resposta do dicionário tem shape instável: cada campo é checado
// individualmente por presença ("parse, don't trust").
#[derive(Deserialize)]
struct DictionaryResponse {
    definitions: Option<Vec<Definition>>,
    synonyms: Option<Vec<Synonym>>,
    examples: Option<Vec<Example>>,
    pronunciation: Option<String>,
    etymology: Option<String>,
}

/// Remove os marcadores posicionais <<INSIGHT_n>> da variante "marcada"
/// do texto traduzido.
fn strip_insight_markers(marked: &str) -> String {
    let re = Regex::new(r"<<INSIGHT_\d+>>").unwrap();
    re.replace_all(marked, "").trim().to_string()
}

/// Projeta o corpo JSON de um endpoint conhecido em um patch.
/// Falha de parse vira Err e é engolida (com log) pelo chamador — nunca
/// pode afetar a entrega da resposta original à página.
pub fn parse(endpoint: Endpoint, body: &str) -> Result<Patch, String> {
    match endpoint {
        Endpoint::WordInsights => {
            let data: WordInsightsResponse =
                serde_json::from_str(body).map_err(|e| format!("word-insights: {e}"))?;

            let target_text = if data.marked_translation.is_empty() {
                None
            } else {
                // Só refina se o candidato for estritamente mais longo
                // (evidência de estar mais completo). Heurística do original.
                Some(TextCandidate::IfLonger(strip_insight_markers(
                    &data.marked_translation,
                )))
            };

            Ok(Patch::Translation(TranslationPatch {
                insights: data.insights,
                target_text,
                ..Default::default()
            }))
        }

        Endpoint::AlternativeTranslations => {
            let data: AlternativesResponse =
                serde_json::from_str(body).map_err(|e| format!("alternative-translations: {e}"))?;

            Ok(Patch::Translation(TranslationPatch {
                description: Some(data.original_description),
                alternatives: Some(data.elements),
                ..Default::default()
            }))
        }

        Endpoint::TextAlignments => {
            let data: TextAlignment =
                serde_json::from_str(body).map_err(|e| format!("text-alignments: {e}"))?;

            // Se ainda não temos texto alvo, sintetiza pela sequência de blocos.
            let synthesized = data.target_blocks.concat();
            let target_text = if synthesized.is_empty() {
                None
            } else {
                Some(TextCandidate::IfUnset(synthesized))
            };

            Ok(Patch::Translation(TranslationPatch {
                alignment: Some(data),
                target_text,
                ..Default::default()
            }))
        }

        Endpoint::Dictionary => {
            let data: DictionaryResponse =
                serde_json::from_str(body).map_err(|e| format!("dictionary: {e}"))?;

            // Cada campo presente substitui a lista inteira: o endpoint é
            // autoritativo e já entrega o conjunto completo.
            Ok(Patch::Dictionary(DictionaryPatch {
                definitions: data.definitions.map(ListUpdate::Replace),
                synonyms: data.synonyms.map(ListUpdate::Replace),
                examples: data.examples.map(ListUpdate::Replace),
                pronunciation: data.pronunciation,
                etymology: data.etymology,
                ..Default::default()
            }))
        }
    }
}
