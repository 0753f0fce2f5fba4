use std::collections::HashSet;

use crate::model::record::{
    Alternative, CaptureRecord, Definition, Example, PageKind, Quality, Synonym, TextAlignment,
    WordInsight,
};

/// Política de escrita para target_text. Os observers anunciam a intenção,
/// o Accumulator decide.
/// - Replace: fonte autoritativa, substitui se não-vazio
/// - IfLonger: heurística "texto mais longo = mais completo" (mantida
///   como no original, sem reforçar nem enfraquecer)
/// - IfUnset: fallback, só preenche campo vazio
#[derive(Debug, Clone, PartialEq)]
pub enum TextCandidate {
    Replace(String),
    IfLonger(String),
    IfUnset(String),
}

#[derive(Debug, Default)]
pub struct TranslationPatch {
    pub source_text: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub quality: Option<Quality>,
    pub target_text: Option<TextCandidate>,
    pub description: Option<String>,
    pub alternatives: Option<Vec<Alternative>>,
    pub insights: Vec<WordInsight>,
    pub alignment: Option<TextAlignment>,
}

impl TranslationPatch {
    pub fn is_empty(&self) -> bool {
        self.source_text.is_none()
            && self.source_lang.is_none()
            && self.target_lang.is_none()
            && self.quality.is_none()
            && self.target_text.is_none()
            && self.description.is_none()
            && self.alternatives.is_none()
            && self.insights.is_empty()
            && self.alignment.is_none()
    }
}

/// Política de escrita para as listas do dicionário. O endpoint entrega o
/// campo inteiro e substitui (fonte autoritativa); o scraping de markup
/// soma com dedup por chave natural.
#[derive(Debug, PartialEq)]
pub enum ListUpdate<T> {
    Replace(Vec<T>),
    Merge(Vec<T>),
}

#[derive(Debug, Default)]
pub struct DictionaryPatch {
    pub word: Option<String>,
    pub language: Option<String>,
    pub pronunciation: Option<String>,
    pub etymology: Option<String>,
    pub notes: Option<String>,
    pub definitions: Option<ListUpdate<Definition>>,
    pub synonyms: Option<ListUpdate<Synonym>>,
    pub examples: Option<ListUpdate<Example>>,
    pub related_words: Option<Vec<String>>,
}

impl DictionaryPatch {
    pub fn is_empty(&self) -> bool {
        self.word.is_none()
            && self.language.is_none()
            && self.pronunciation.is_none()
            && self.etymology.is_none()
            && self.notes.is_none()
            && self.definitions.is_none()
            && self.synonyms.is_none()
            && self.examples.is_none()
            && self.related_words.is_none()
    }
}

#[derive(Debug)]
pub enum Patch {
    Translation(TranslationPatch),
    Dictionary(DictionaryPatch),
}

/// Registro parcial montado por vários observers ao longo do tempo.
/// Merge monotônico: campo não-vazio nunca regride para vazio, lista
/// nunca duplica item com a mesma chave natural.
pub struct Accumulator {
    record: CaptureRecord,
    seen_insights: HashSet<String>,
}

fn set_string(current: &mut String, incoming: Option<String>) {
    if let Some(v) = incoming {
        if !v.trim().is_empty() {
            *current = v;
        }
    }
}

impl Accumulator {
    pub fn new(kind: PageKind) -> Self {
        Accumulator {
            record: CaptureRecord::new(kind),
            seen_insights: HashSet::new(),
        }
    }

    pub fn record(&self) -> &CaptureRecord {
        &self.record
    }

    pub fn is_complete(&self) -> bool {
        self.record.is_complete()
    }

    /// Cópia imutável para consumo downstream (export, snapshot do shell).
    pub fn snapshot(&self) -> CaptureRecord {
        self.record.clone()
    }

    pub fn reset(&mut self) {
        self.record = CaptureRecord::new(self.record.kind());
        self.seen_insights.clear();
    }

    pub fn apply(&mut self, patch: Patch) {
        match (&mut self.record, patch) {
            (CaptureRecord::Translation(rec), Patch::Translation(p)) => {
                set_string(&mut rec.source_text, p.source_text);
                set_string(&mut rec.source_lang, p.source_lang);
                set_string(&mut rec.target_lang, p.target_lang);
                set_string(&mut rec.description, p.description);

                if let Some(q) = p.quality {
                    rec.quality = q;
                }

                if let Some(candidate) = p.target_text {
                    Self::apply_target_text(&mut rec.target_text, candidate);
                }

                // Endpoint de alternativas é autoritativo para a lista inteira.
                if let Some(alts) = p.alternatives {
                    if !alts.is_empty() {
                        rec.alternatives = alts;
                    }
                }

                for insight in p.insights {
                    if insight.id.is_empty() {
                        continue;
                    }
                    if self.seen_insights.insert(insight.id.clone()) {
                        rec.insights.push(insight);
                    }
                }

                if let Some(alignment) = p.alignment {
                    rec.alignment = Some(alignment);
                }
            }

            (CaptureRecord::Dictionary(rec), Patch::Dictionary(p)) => {
                set_string(&mut rec.word, p.word);
                set_string(&mut rec.language, p.language);
                set_string(&mut rec.pronunciation, p.pronunciation);
                set_string(&mut rec.etymology, p.etymology);
                set_string(&mut rec.notes, p.notes);

                if let Some(update) = p.definitions {
                    apply_list(&mut rec.definitions, update, |d| d.definition.clone());
                }
                if let Some(update) = p.synonyms {
                    apply_list(&mut rec.synonyms, update, |s| s.word.clone());
                }
                if let Some(update) = p.examples {
                    apply_list(&mut rec.examples, update, |e| e.sentence.clone());
                }
                if let Some(words) = p.related_words {
                    merge_by_key(&mut rec.related_words, words, |w| w.clone());
                }
            }

            // Patch da variante errada: alguém roteou errado. Loga e descarta,
            // nunca corrompe o registro.
            (rec, patch) => {
                eprintln!(
                    "[acc] dropped mismatched patch ({:?}) for {:?} record",
                    patch_kind(&patch),
                    rec.kind()
                );
            }
        }
    }

    fn apply_target_text(current: &mut String, candidate: TextCandidate) {
        match candidate {
            TextCandidate::Replace(text) => {
                if !text.trim().is_empty() {
                    *current = text;
                }
            }
            TextCandidate::IfLonger(text) => {
                if text.trim().len() > current.trim().len() {
                    *current = text;
                }
            }
            TextCandidate::IfUnset(text) => {
                if current.trim().is_empty() && !text.trim().is_empty() {
                    *current = text;
                }
            }
        }
    }
}

fn patch_kind(patch: &Patch) -> PageKind {
    match patch {
        Patch::Translation(_) => PageKind::Translate,
        Patch::Dictionary(_) => PageKind::Dictionary,
    }
}

/// Replace descarta o que veio antes (lista vazia não regride campo
/// preenchido); Merge soma sem duplicar.
fn apply_list<T, K, F>(current: &mut Vec<T>, update: ListUpdate<T>, key: F)
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    match update {
        ListUpdate::Replace(items) => {
            if !items.is_empty() {
                *current = items;
            }
        }
        ListUpdate::Merge(items) => merge_by_key(current, items, key),
    }
}

/// União com dedup por chave natural. Item já presente nunca é re-anexado.
fn merge_by_key<T, K, F>(current: &mut Vec<T>, incoming: Vec<T>, key: F)
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut seen: HashSet<K> = current.iter().map(&key).collect();
    for item in incoming {
        if seen.insert(key(&item)) {
            current.push(item);
        }
    }
}
