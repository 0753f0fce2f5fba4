use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Tipo de página observada. Decide qual variante de registro a sessão monta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Translate,
    Dictionary,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Standard,
    Best,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Best
    }
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::Best => "best",
        }
    }

    pub fn parse(s: &str) -> Option<Quality> {
        match s {
            "standard" => Some(Quality::Standard),
            "best" => Some(Quality::Best),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Variation {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub explanation: String,
}

/// Anotação estruturada sobre uma palavra/trecho traduzido.
/// O `id` é a chave natural de deduplicação (ver Accumulator).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WordInsight {
    pub id: String,

    #[serde(default)]
    pub original_text: String,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub variations: Vec<Variation>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Alternative {
    #[serde(default)]
    pub translation: String,

    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TextAlignment {
    #[serde(default)]
    pub source_blocks: Vec<String>,

    #[serde(default)]
    pub target_blocks: Vec<String>,

    #[serde(default)]
    pub source_roles: Vec<String>,

    #[serde(default)]
    pub target_roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Definition {
    // O endpoint usa camelCase, o DOM scraper monta em snake_case.
    #[serde(default, alias = "partOfSpeech")]
    pub part_of_speech: String,

    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Synonym {
    #[serde(default)]
    pub word: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Example {
    #[serde(default)]
    pub sentence: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranslationRecord {
    #[serde(default)]
    pub source_text: String,

    #[serde(default)]
    pub source_lang: String,

    #[serde(default)]
    pub target_text: String,

    #[serde(default)]
    pub target_lang: String,

    #[serde(default)]
    pub quality: Quality,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub alternatives: Vec<Alternative>,

    #[serde(default)]
    pub insights: Vec<WordInsight>,

    #[serde(default)]
    pub alignment: Option<TextAlignment>,

    #[serde(default)]
    pub created_at: u64,
}

impl TranslationRecord {
    pub fn new() -> Self {
        TranslationRecord {
            created_at: now_ms(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.source_text.trim().is_empty()
            && !self.target_text.trim().is_empty()
            && !self.source_lang.trim().is_empty()
            && !self.target_lang.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DictionaryRecord {
    #[serde(default)]
    pub word: String,

    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub pronunciation: String,

    #[serde(default)]
    pub definitions: Vec<Definition>,

    #[serde(default)]
    pub synonyms: Vec<Synonym>,

    #[serde(default)]
    pub examples: Vec<Example>,

    #[serde(default)]
    pub etymology: String,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub related_words: Vec<String>,

    #[serde(default)]
    pub created_at: u64,
}

impl DictionaryRecord {
    pub fn new() -> Self {
        DictionaryRecord {
            created_at: now_ms(),
            ..Default::default()
        }
    }

    // Definições são enriquecimento best-effort: podem chegar só depois
    // do botão já precisar estar visível. Não entram no gate.
    pub fn is_complete(&self) -> bool {
        !self.word.trim().is_empty() && !self.language.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CaptureRecord {
    Translation(TranslationRecord),
    Dictionary(DictionaryRecord),
}

impl CaptureRecord {
    pub fn new(kind: PageKind) -> Self {
        match kind {
            PageKind::Translate => CaptureRecord::Translation(TranslationRecord::new()),
            PageKind::Dictionary => CaptureRecord::Dictionary(DictionaryRecord::new()),
        }
    }

    pub fn kind(&self) -> PageKind {
        match self {
            CaptureRecord::Translation(_) => PageKind::Translate,
            CaptureRecord::Dictionary(_) => PageKind::Dictionary,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            CaptureRecord::Translation(t) => t.is_complete(),
            CaptureRecord::Dictionary(d) => d.is_complete(),
        }
    }

    pub fn created_at(&self) -> u64 {
        match self {
            CaptureRecord::Translation(t) => t.created_at,
            CaptureRecord::Dictionary(d) => d.created_at,
        }
    }
}
