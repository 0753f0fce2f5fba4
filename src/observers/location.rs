use regex::Regex;
use reqwest::Url;

use crate::model::record::{PageKind, Quality};
use crate::services::accumulator::{DictionaryPatch, Patch, TranslationPatch};

pub fn page_kind(url: &Url) -> PageKind {
    if url.path().starts_with("/dictionary") {
        PageKind::Dictionary
    } else {
        PageKind::Translate
    }
}

fn query_param(url: &Url, names: &[&str]) -> Option<String> {
    // Primeiro alias presente e não-vazio ganha.
    for name in names {
        if let Some(value) = url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
        {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Deriva os campos de identidade do registro a partir do endereço atual.
/// Retorna None quando a URL ainda não carrega o assunto da página.
pub fn extract(kind: PageKind, url: &Url) -> Option<Patch> {
    match kind {
        PageKind::Translate => {
            let text = query_param(url, &["text"])?;
            let from = query_param(url, &["from"])?;
            let to = query_param(url, &["to"])?;

            let quality = query_param(url, &["quality"])
                .and_then(|q| Quality::parse(&q))
                .unwrap_or_default();

            Some(Patch::Translation(TranslationPatch {
                source_text: Some(text),
                source_lang: Some(from),
                target_lang: Some(to),
                quality: Some(quality),
                ..Default::default()
            }))
        }

        PageKind::Dictionary => {
            let word = query_param(url, &["word", "text", "q"])?;
            let language = query_param(url, &["lang", "language", "from"])
                .unwrap_or_else(|| "auto".to_string());

            Some(Patch::Dictionary(DictionaryPatch {
                word: Some(word),
                language: Some(language),
                ..Default::default()
            }))
        }
    }
}

/// Extração best-effort do payload de estado inicial embutido na página
/// (objeto serializado dentro de <script>, ordem de chaves imprevisível).
/// Tentada uma única vez por sessão, quando a URL ainda não entregou o
/// assunto; primeiro padrão que casar encerra a busca.
pub fn extract_embedded(html: &str) -> Option<DictionaryPatch> {
    // (ordem_language_primeiro, padrão)
    let patterns: [(bool, &str); 3] = [
        (
            true,
            r#"data:\s*\{\s*language:\s*["']([^"']+)["'],\s*word:\s*["']([^"']+)["']"#,
        ),
        (
            false,
            r#"data:\s*\{\s*word:\s*["']([^"']+)["'],\s*language:\s*["']([^"']+)["']"#,
        ),
        (
            false,
            r#""word":\s*["']([^"']+)["'].*?"language":\s*["']([^"']+)["']"#,
        ),
    ];

    for (language_first, pattern) in patterns {
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                eprintln!("[loc] bad embedded pattern: {e}");
                continue;
            }
        };

        if let Some(caps) = re.captures(html) {
            let (language, word) = if language_first {
                (caps[1].to_string(), caps[2].to_string())
            } else {
                (caps[2].to_string(), caps[1].to_string())
            };

            if word.is_empty() {
                continue;
            }

            let language = if language.is_empty() {
                "auto".to_string()
            } else {
                language
            };

            return Some(DictionaryPatch {
                word: Some(word),
                language: Some(language),
                ..Default::default()
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn detects_page_kind_from_path() {
        assert_eq!(
            page_kind(&url("https://translate.example.com/?text=hola")),
            PageKind::Translate
        );
        assert_eq!(
            page_kind(&url("https://translate.example.com/dictionary?word=casa")),
            PageKind::Dictionary
        );
    }

    #[test]
    fn translate_needs_text_from_and_to() {
        let partial = url("https://translate.example.com/?text=hola&from=es");
        assert!(extract(PageKind::Translate, &partial).is_none());

        let full = url("https://translate.example.com/?text=hola&from=es&to=en&quality=standard");
        match extract(PageKind::Translate, &full) {
            Some(Patch::Translation(p)) => {
                assert_eq!(p.source_text.as_deref(), Some("hola"));
                assert_eq!(p.source_lang.as_deref(), Some("es"));
                assert_eq!(p.target_lang.as_deref(), Some("en"));
                assert_eq!(p.quality, Some(Quality::Standard));
            }
            other => panic!("unexpected patch: {other:?}"),
        }
    }

    #[test]
    fn dictionary_word_aliases() {
        for u in [
            "https://translate.example.com/dictionary?word=casa&lang=es",
            "https://translate.example.com/dictionary?text=casa&language=es",
            "https://translate.example.com/dictionary?q=casa&from=es",
        ] {
            match extract(PageKind::Dictionary, &url(u)) {
                Some(Patch::Dictionary(p)) => {
                    assert_eq!(p.word.as_deref(), Some("casa"), "url: {u}");
                    assert_eq!(p.language.as_deref(), Some("es"), "url: {u}");
                }
                other => panic!("unexpected patch for {u}: {other:?}"),
            }
        }
    }

    #[test]
    fn dictionary_language_defaults_to_auto() {
        match extract(
            PageKind::Dictionary,
            &url("https://translate.example.com/dictionary?word=casa"),
        ) {
            Some(Patch::Dictionary(p)) => assert_eq!(p.language.as_deref(), Some("auto")),
            other => panic!("unexpected patch: {other:?}"),
        }
    }

    #[test]
    fn embedded_payload_any_key_order() {
        let a = r#"<script>export const init = { data: { language: "es", word: "casa" } };</script>"#;
        let b = r#"<script>export const init = { data: { word: "casa", language: "es" } };</script>"#;
        let c = r#"<script>{"props":{"word": "casa", "extra": 1, "language": "es"}}</script>"#;

        for html in [a, b, c] {
            let p = extract_embedded(html).expect(html);
            assert_eq!(p.word.as_deref(), Some("casa"));
            assert_eq!(p.language.as_deref(), Some("es"));
        }
    }

    #[test]
    fn embedded_payload_absent() {
        assert!(extract_embedded("<script>var x = 1;</script>").is_none());
    }
}
