use std::time::Instant;

use reqwest::Url;
use serde::Serialize;

use crate::model::record::{CaptureRecord, PageKind};
use crate::model::settings::Settings;
use crate::observers::{location, network, structure};
use crate::services::accumulator::{Accumulator, Patch, TranslationPatch};
use crate::services::audio;
use crate::services::export::{self, SaveOutcome};
use crate::services::presentation::{Presentation, ToastKind};

#[derive(Debug, Serialize)]
pub struct ToastView {
    pub message: String,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PollStatus {
    pub complete: bool,
    pub button: &'static str,
    pub toast: Option<ToastView>,
}

/// Uma sessão = uma aba observada. Dona do registro em montagem, do estado
/// de apresentação e da voz detectada. Todos os eventos crus chegam aqui e
/// são roteados para o observer certo.
pub struct Session {
    kind: PageKind,
    url: Url,
    accumulator: Accumulator,
    presentation: Presentation,
    voice: Option<String>,
    embedded_attempted: bool,
    auto_saved: bool,
}

impl Session {
    pub fn open(url: &str) -> Result<Session, String> {
        let parsed = Url::parse(url).map_err(|e| format!("invalid session url: {e}"))?;
        let kind = location::page_kind(&parsed);

        let mut session = Session {
            kind,
            url: parsed,
            accumulator: Accumulator::new(kind),
            presentation: Presentation::new(),
            voice: None,
            embedded_attempted: false,
            auto_saved: false,
        };
        session.apply_location();
        Ok(session)
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn snapshot(&self) -> CaptureRecord {
        self.accumulator.snapshot()
    }

    fn apply_location(&mut self) {
        if let Some(patch) = location::extract(self.kind, &self.url) {
            self.accumulator.apply(patch);
        }
    }

    /// URL mudou: registro novo, affordance escondida, extração refeita.
    /// URL idêntica é um no-op (o shell re-emite em alguns eventos de SPA).
    pub fn navigate(&mut self, url: &str) -> Result<(), String> {
        let parsed = Url::parse(url).map_err(|e| format!("invalid session url: {e}"))?;
        if parsed == self.url {
            return Ok(());
        }

        self.url = parsed;
        self.kind = location::page_kind(&self.url);
        self.accumulator = Accumulator::new(self.kind);
        self.presentation.hide();
        self.embedded_attempted = false;
        self.auto_saved = false;
        self.apply_location();
        Ok(())
    }

    pub fn ingest_network(&mut self, url: &str, body: &str) {
        let Some(endpoint) = network::classify(url) else {
            return;
        };
        match network::parse(endpoint, body) {
            Ok(patch) => self.accumulator.apply(patch),
            Err(e) => eprintln!("[net] {url}: {e}"),
        }
    }

    pub fn ingest_document(&mut self, html: &str) {
        if let Some(voice) = structure::detect_voice(html) {
            self.voice = Some(voice);
        }

        let snapshot = self.accumulator.snapshot();
        match &snapshot {
            CaptureRecord::Translation(rec) => {
                let patch = structure::scrape_translation(html, rec);
                if !patch.is_empty() {
                    self.accumulator.apply(Patch::Translation(patch));
                }
            }
            CaptureRecord::Dictionary(rec) => {
                // Estado inicial embutido: tentado uma única vez por sessão,
                // só enquanto a palavra ainda não chegou por outra via.
                if rec.word.trim().is_empty() && !self.embedded_attempted {
                    self.embedded_attempted = true;
                    if let Some(embedded) = location::extract_embedded(html) {
                        self.accumulator.apply(Patch::Dictionary(embedded));
                    }
                }

                let patch = structure::scrape_dictionary(html, rec);
                if !patch.is_empty() {
                    self.accumulator.apply(Patch::Dictionary(patch));
                }
            }
        }
    }

    /// Replay de um insight clicado (payload percent-encoded). Para sessão
    /// de dicionário o patch é descartado pelo Accumulator.
    pub fn ingest_insight(&mut self, data: &str) {
        match structure::parse_insight_payload(data) {
            Ok(insight) => {
                self.accumulator.apply(Patch::Translation(TranslationPatch {
                    insights: vec![insight],
                    ..Default::default()
                }));
            }
            Err(e) => eprintln!("[dom] insight payload: {e}"),
        }
    }

    pub fn poll(&mut self, now: Instant) -> PollStatus {
        let complete = self.accumulator.is_complete();
        if complete {
            self.presentation.show();
        } else {
            self.presentation.hide();
        }

        PollStatus {
            complete,
            button: self.presentation.button_str(),
            toast: self.presentation.toast(now).map(|t| ToastView {
                message: t.message.clone(),
                kind: t.kind.as_str(),
            }),
        }
    }

    pub fn should_auto_save(&self, settings: &Settings) -> bool {
        settings.auto_save && !self.auto_saved && self.accumulator.is_complete()
    }

    /// Export completo. Um `html` opcional força uma última passada de
    /// scraping antes do snapshot.
    pub fn save(
        &mut self,
        html: Option<&str>,
        voice_override: Option<&str>,
        settings: &Settings,
        now: Instant,
    ) -> Result<SaveOutcome, String> {
        self.presentation.begin_save()?;

        if let Some(html) = html {
            self.ingest_document(html);
        }

        let record = self.accumulator.snapshot();
        let voice = audio::normalize_voice(voice_override.or(self.voice.as_deref()));
        let origin = self.origin();

        let result = export::run(&record, &origin, &voice, settings);
        match &result {
            Ok(outcome) => {
                self.auto_saved = true;
                self.presentation
                    .finish_save(now, outcome.summary.clone(), ToastKind::Success);
            }
            Err(e) => {
                self.presentation
                    .finish_save(now, e.clone(), ToastKind::Error);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSLATE_URL: &str =
        "https://translate.kagi.com/?text=hola%20mundo&from=es&to=en&quality=best";

    #[test]
    fn open_extracts_location_fields() {
        let session = Session::open(TRANSLATE_URL).unwrap();
        assert_eq!(session.kind(), PageKind::Translate);
        assert_eq!(session.origin(), "https://translate.kagi.com");

        match session.snapshot() {
            CaptureRecord::Translation(t) => {
                assert_eq!(t.source_text, "hola mundo");
                assert_eq!(t.source_lang, "es");
                assert_eq!(t.target_lang, "en");
                assert!(t.target_text.is_empty());
            }
            _ => panic!("expected translation session"),
        }
    }

    #[test]
    fn poll_shows_button_only_once_complete() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        let status = session.poll(Instant::now());
        assert!(!status.complete);
        assert_eq!(status.button, "hidden");

        session.ingest_network(
            "https://translate.kagi.com/api/text-alignments",
            r#"{"source_blocks":["hola mundo"],"target_blocks":["hello world"],"source_roles":[],"target_roles":[]}"#,
        );

        let status = session.poll(Instant::now());
        assert!(status.complete);
        assert_eq!(status.button, "visible");
    }

    #[test]
    fn navigation_resets_record_and_hides_button() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        session.ingest_network(
            "https://translate.kagi.com/api/text-alignments",
            r#"{"source_blocks":[],"target_blocks":["hello world"],"source_roles":[],"target_roles":[]}"#,
        );
        assert!(session.poll(Instant::now()).complete);

        session
            .navigate("https://translate.kagi.com/dictionary/?word=casa&lang=es")
            .unwrap();

        assert_eq!(session.kind(), PageKind::Dictionary);
        let status = session.poll(Instant::now());
        // Dicionário com word + lang na URL já nasce completo.
        assert!(status.complete);
        match session.snapshot() {
            CaptureRecord::Dictionary(d) => {
                assert_eq!(d.word, "casa");
                assert_eq!(d.language, "es");
            }
            _ => panic!("expected dictionary session"),
        }
    }

    #[test]
    fn navigate_to_same_url_keeps_record() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        session.ingest_insight("%7B%22id%22%3A%22i1%22%2C%22original_text%22%3A%22hola%22%2C%22type%22%3A%22greeting%22%2C%22variations%22%3A%5B%5D%7D");
        session.navigate(TRANSLATE_URL).unwrap();

        match session.snapshot() {
            CaptureRecord::Translation(t) => assert_eq!(t.insights.len(), 1),
            _ => panic!("expected translation session"),
        }
    }

    #[test]
    fn insight_replay_is_deduplicated() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        let payload = "%7B%22id%22%3A%22i1%22%2C%22original_text%22%3A%22hola%22%2C%22type%22%3A%22greeting%22%2C%22variations%22%3A%5B%5D%7D";
        session.ingest_insight(payload);
        session.ingest_insight(payload);

        match session.snapshot() {
            CaptureRecord::Translation(t) => assert_eq!(t.insights.len(), 1),
            _ => panic!("expected translation session"),
        }
    }

    #[test]
    fn malformed_network_body_is_contained() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        session.ingest_network(
            "https://translate.kagi.com/api/word-insights",
            "not json at all",
        );
        assert!(!session.poll(Instant::now()).complete);
    }

    #[test]
    fn save_on_incomplete_record_raises_error_toast() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        let now = Instant::now();

        let err = session
            .save(None, None, &Settings::default(), now)
            .unwrap_err();
        assert_eq!(err, "Translation data is incomplete");

        let status = session.poll(now);
        let toast = status.toast.expect("error toast");
        assert_eq!(toast.kind, "error");
        assert_eq!(toast.message, "Translation data is incomplete");
    }

    #[test]
    fn auto_save_arms_only_when_enabled_and_complete() {
        let mut session = Session::open(TRANSLATE_URL).unwrap();
        let mut settings = Settings::default();
        settings.auto_save = true;
        assert!(!session.should_auto_save(&settings));

        session.ingest_network(
            "https://translate.kagi.com/api/text-alignments",
            r#"{"source_blocks":[],"target_blocks":["hello world"],"source_roles":[],"target_roles":[]}"#,
        );
        assert!(session.should_auto_save(&settings));

        settings.auto_save = false;
        assert!(!session.should_auto_save(&settings));
    }
}
