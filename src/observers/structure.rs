use regex::Regex;

use crate::model::record::{
    Alternative, Definition, DictionaryRecord, Example, Synonym, TranslationRecord, WordInsight,
};
use crate::services::accumulator::{DictionaryPatch, ListUpdate, TextCandidate, TranslationPatch};
use crate::services::audio::VOICES;

// Limiares anti-ruído: fragmento curto demais não é conteúdo.
const MIN_DEFINITION_LEN: usize = 10;
const MIN_EXAMPLE_LEN: usize = 5;
const MAX_WORD_LEN: usize = 50;

/// Lê conteúdo renderizado quando a interceptação de rede não entregou nada
/// (conteúdo server-rendered, ou corrida de timing). Só propõe valores para
/// campos que o registro ainda não tem — o Accumulator garante o resto.
pub fn scrape_translation(html: &str, rec: &TranslationRecord) -> TranslationPatch {
    let mut patch = TranslationPatch::default();

    // Insights sempre: dedup por id acontece no Accumulator.
    patch.insights = scrape_insights(html);

    if rec.target_text.trim().is_empty() {
        if let Some(text) = scrape_target_text(html, &rec.source_text) {
            patch.target_text = Some(TextCandidate::IfUnset(text));
        }
    }

    if rec.alternatives.is_empty() {
        let alts = scrape_alternatives(html);
        if !alts.is_empty() {
            patch.alternatives = Some(alts);
        }
    }

    if rec.description.trim().is_empty() {
        patch.description = scrape_description(html);
    }

    patch
}

pub fn scrape_dictionary(html: &str, rec: &DictionaryRecord) -> DictionaryPatch {
    let mut patch = DictionaryPatch::default();

    if rec.definitions.is_empty() {
        let defs = scrape_definitions(html);
        if !defs.is_empty() {
            patch.definitions = Some(ListUpdate::Merge(defs));
        }
    }

    if rec.synonyms.is_empty() {
        let syns = scrape_synonyms(html);
        if !syns.is_empty() {
            patch.synonyms = Some(ListUpdate::Merge(syns));
        }
    }

    if rec.examples.is_empty() {
        let exs = scrape_examples(html);
        if !exs.is_empty() {
            patch.examples = Some(ListUpdate::Merge(exs));
        }
    }

    if rec.pronunciation.trim().is_empty() {
        patch.pronunciation = scrape_pronunciation(html);
    }

    if rec.etymology.trim().is_empty() {
        patch.etymology = region(html, "id=\"etymology\"")
            .and_then(|r| tag_blocks(r, "p").into_iter().find(|t| !t.is_empty()));
    }

    if rec.notes.trim().is_empty() {
        if let Some(r) = region(html, "id=\"notes\"") {
            let notes: Vec<String> = tag_blocks(r, "p")
                .into_iter()
                .filter(|t| !t.is_empty())
                .collect();
            if !notes.is_empty() {
                patch.notes = Some(notes.join("\n"));
            }
        }
    }

    if rec.related_words.is_empty() {
        if let Some(r) = region(html, "id=\"related-words\"") {
            let mut words: Vec<String> = Vec::new();
            for w in tag_blocks(r, "button") {
                if !w.is_empty() && w.len() < MAX_WORD_LEN && !words.contains(&w) {
                    words.push(w);
                }
            }
            if !words.is_empty() {
                patch.related_words = Some(words);
            }
        }
    }

    patch
}

/// Estratégia em camadas para o texto traduzido:
/// 1. container específico de word insights (spans posicionais)
/// 2. container genérico selecionável
/// 3. container básico de tradução
/// Para na primeira que render conteúdo não-trivial. Nunca aceita texto
/// idêntico ao source (artefato de auto-match).
fn scrape_target_text(html: &str, source_text: &str) -> Option<String> {
    if let Some(r) = region(html, "word-insights-content") {
        let re = Regex::new(r#"(?is)<span\b[^>]*data-absolute-pos[^>]*>(.*?)</span\s*>"#).unwrap();
        let joined: String = re
            .captures_iter(r)
            .map(|c| c[1].to_string())
            .collect::<Vec<_>>()
            .concat();
        let text = strip_tags(&joined);
        if !text.is_empty() && text != source_text {
            return Some(text);
        }
    }

    for marker in ["user-select-text", "translation-content"] {
        if let Some(r) = region(html, marker) {
            let text = strip_tags(r);
            if !text.is_empty() && text != source_text {
                return Some(text);
            }
        }
    }

    None
}

/// Insights embutidos como JSON percent-encoded em atributos data-insight.
fn scrape_insights(html: &str) -> Vec<WordInsight> {
    let mut insights = Vec::new();

    for (_, tag) in opening_tags(html, "data-insight=\"") {
        let Some(raw) = attr(tag, "data-insight") else {
            continue;
        };
        let decoded = percent_decode(raw);
        match serde_json::from_str::<WordInsight>(&decoded) {
            Ok(insight) => insights.push(insight),
            Err(e) => eprintln!("[dom] bad data-insight payload: {e}"),
        }
    }

    insights
}

fn scrape_alternatives(html: &str) -> Vec<Alternative> {
    let mut alternatives = Vec::new();

    for (_, tag) in opening_tags(html, "alternative-button") {
        let Some(translation) = attr(tag, "data-alternative") else {
            continue;
        };
        let Some(label) = attr(tag, "aria-label") else {
            continue;
        };

        // aria-label no formato "Tradução - Explicação"
        let parts: Vec<&str> = label.split(" - ").collect();
        let explanation = if parts.len() > 1 {
            parts[1..].join(" - ")
        } else {
            String::new()
        };

        alternatives.push(Alternative {
            translation: decode_entities(translation),
            explanation: decode_entities(&explanation),
        });
    }

    alternatives
}

fn scrape_description(html: &str) -> Option<String> {
    let r = region(html, "alternatives-section")?;
    tag_blocks(r, "p").into_iter().find(|t| !t.is_empty())
}

fn scrape_definitions(html: &str) -> Vec<Definition> {
    let mut definitions: Vec<Definition> = Vec::new();

    // Significado principal: badge de classe gramatical + parágrafos.
    if let Some(r) = region(html, "id=\"primary-meaning\"") {
        let pos_re = Regex::new(r#"(?is)<span\b[^>]*class="[^"]*bg-[^"]*"[^>]*>(.*?)</span\s*>"#)
            .unwrap();
        let part_of_speech = pos_re
            .captures(r)
            .map(|c| strip_tags(&c[1]))
            .unwrap_or_default();

        for (i, text) in tag_blocks(r, "p").into_iter().enumerate() {
            if text.len() > MIN_DEFINITION_LEN && !definitions.iter().any(|d| d.definition == text)
            {
                definitions.push(Definition {
                    part_of_speech: if i == 0 {
                        part_of_speech.clone()
                    } else {
                        String::new()
                    },
                    definition: text,
                });
            }
        }
    }

    if let Some(r) = region(html, "id=\"other-meanings\"") {
        for text in tag_blocks(r, "p") {
            if text.len() > MIN_DEFINITION_LEN && !definitions.iter().any(|d| d.definition == text)
            {
                definitions.push(Definition {
                    part_of_speech: String::new(),
                    definition: text,
                });
            }
        }
    }

    definitions
}

fn scrape_synonyms(html: &str) -> Vec<Synonym> {
    let mut synonyms: Vec<Synonym> = Vec::new();

    for marker in ["id=\"primary-meaning\"", "id=\"other-meanings\""] {
        if let Some(r) = region(html, marker) {
            for word in tag_blocks(r, "button") {
                if !word.is_empty()
                    && word.len() < MAX_WORD_LEN
                    && !synonyms.iter().any(|s| s.word == word)
                {
                    synonyms.push(Synonym { word });
                }
            }
        }
    }

    synonyms
}

fn scrape_examples(html: &str) -> Vec<Example> {
    let mut examples = Vec::new();

    if let Some(r) = region(html, "id=\"examples\"") {
        for text in tag_blocks(r, "p") {
            if text.len() > MIN_EXAMPLE_LEN {
                examples.push(Example { sentence: text });
            }
        }
    }

    // Último recurso: busca ampla por atributos que sugerem exemplo de uso.
    if examples.is_empty() {
        let hint_re = Regex::new(
            r#"(?is)<[a-z][a-z0-9]*\b[^>]*class="[^"]*(?:example|usage|sentence)[^"]*"[^>]*>([^<]+)<"#,
        )
        .unwrap();
        for caps in hint_re.captures_iter(html) {
            let text = strip_tags(&caps[1]);
            if text.len() > MIN_EXAMPLE_LEN {
                examples.push(Example { sentence: text });
            }
        }

        for text in tag_blocks(html, "blockquote") {
            if text.len() > MIN_EXAMPLE_LEN {
                examples.push(Example { sentence: text });
            }
        }
    }

    examples
}

fn scrape_pronunciation(html: &str) -> Option<String> {
    if let Some(r) = region(html, "pronunciation-pill") {
        if let Some(text) = tag_blocks(r, "span").into_iter().find(|t| !t.is_empty()) {
            return Some(text);
        }
    }

    // Fallback: qualquer elemento cuja classe sugira fonética.
    let hint_re = Regex::new(
        r#"(?is)<[a-z][a-z0-9]*\b[^>]*class="[^"]*(?:pronunciation|phonetic|ipa)[^"]*"[^>]*>([^<]+)<"#,
    )
    .unwrap();
    hint_re
        .captures(html)
        .map(|c| strip_tags(&c[1]))
        .filter(|t| !t.is_empty())
}

/// Voz selecionada no seletor de fala da página (option com aria-selected).
pub fn detect_voice(html: &str) -> Option<String> {
    for (end, tag) in opening_tags(html, "aria-selected=\"true\"") {
        if !tag.contains("role=\"option\"") {
            continue;
        }
        let window: String = html[end + 1..].chars().take(200).collect();
        let text = strip_tags(&window).to_lowercase();
        let text = text.trim_start();
        for voice in VOICES {
            if text.starts_with(voice) {
                return Some(voice.to_string());
            }
        }
    }
    None
}

/// Decodifica um insight vindo de replay de clique do shell
/// (JSON percent-encoded, igual ao atributo data-insight).
pub fn parse_insight_payload(encoded: &str) -> Result<WordInsight, String> {
    let decoded = percent_decode(encoded);
    serde_json::from_str(&decoded).map_err(|e| format!("invalid insight payload: {e}"))
}

// ---------------------------------------------------------------------------
// Varredura de markup. Sem parser de DOM: o corpus inteiro resolve scraping
// com regex e string scanning, e os marcadores aqui são rasos o bastante.

/// Conteúdo do elemento cuja tag de abertura contém `marker`
/// (ex.: `id="examples"`, ou um nome de classe). Conta aninhamento da
/// mesma tag para achar o fechamento correspondente.
fn region<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let mut search = 0;
    while let Some(found) = html[search..].find(marker) {
        let pos = search + found;
        search = pos + marker.len();

        // Marcador em texto corrido (fora de uma tag de abertura) não
        // conta: segue para a próxima ocorrência.
        let Some(tag_start) = html[..pos].rfind('<') else {
            continue;
        };
        if html[tag_start..pos].contains('>') {
            continue;
        }

        let after = &html[tag_start + 1..];
        let Some(name_end) = after.find(|c: char| c.is_whitespace() || c == '>' || c == '/') else {
            continue;
        };
        let name = &after[..name_end];
        if name.is_empty() {
            continue;
        }

        let Some(gt) = html[tag_start..].find('>') else {
            continue;
        };
        let content_start = tag_start + gt + 1;

        let mut depth = 1usize;
        let mut i = content_start;
        while let Some((at, is_close)) = next_tag(html, i, name) {
            if is_close {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[content_start..at]);
                }
            } else {
                depth += 1;
            }
            i = at + 1;
        }

        // Fechamento não encontrado: devolve até o fim (markup truncado).
        return Some(&html[content_start..]);
    }

    None
}

/// Próxima ocorrência de `<name` ou `</name` a partir de `from`,
/// exigindo fronteira de nome (evita <d casar com <div).
fn next_tag(html: &str, from: usize, name: &str) -> Option<(usize, bool)> {
    let mut offset = from;
    loop {
        let lt = html[offset..].find('<')? + offset;
        let rest = &html[lt + 1..];
        let (is_close, body) = match rest.strip_prefix('/') {
            Some(b) => (true, b),
            None => (false, rest),
        };

        let b = body.as_bytes();
        if b.len() >= name.len() && b[..name.len()].eq_ignore_ascii_case(name.as_bytes()) {
            let boundary = match b.get(name.len()) {
                None => true,
                Some(c) => matches!(c, b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r'),
            };
            if boundary {
                return Some((lt, is_close));
            }
        }

        offset = lt + 1;
    }
}

/// Tags de abertura completas (`<...>`) que contêm `needle`, com a posição
/// do `>` final de cada uma.
fn opening_tags<'a>(html: &'a str, needle: &str) -> Vec<(usize, &'a str)> {
    let mut out = Vec::new();
    let mut from = 0;

    while from < html.len() {
        let Some(p) = html[from..].find(needle).map(|p| p + from) else {
            break;
        };
        let next = p + needle.len();

        let Some(tag_start) = html[..p].rfind('<') else {
            from = next;
            continue;
        };
        if html[tag_start..p].contains('>') {
            from = next;
            continue;
        }
        let Some(tag_end) = html[p..].find('>').map(|e| e + p) else {
            break;
        };

        out.push((tag_end, &html[tag_start..=tag_end]));
        from = tag_end + 1;
    }

    out
}

/// Conteúdo (já sem tags) de cada elemento `<tag>...</tag>` do trecho.
fn tag_blocks(fragment: &str, tag: &str) -> Vec<String> {
    let re = Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>")).unwrap();
    re.captures_iter(fragment)
        .map(|c| strip_tags(&c[1]))
        .collect()
}

fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')? + start;
    Some(&tag[start..end])
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    let decoded = decode_entities(&out);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_handles_nesting() {
        let html = r#"<div id="examples"><div><p>uno</p></div><p>dos</p></div><p>fora</p>"#;
        let r = region(html, "id=\"examples\"").unwrap();
        assert!(r.contains("uno"));
        assert!(r.contains("dos"));
        assert!(!r.contains("fora"));
    }

    #[test]
    fn region_skips_marker_occurrences_in_text() {
        let html = r#"<p>set id="examples" on the container</p><div id="examples"><p>uno</p></div>"#;
        let r = region(html, "id=\"examples\"").unwrap();
        assert!(r.contains("uno"));
        assert!(!r.contains("container"));
    }

    #[test]
    fn target_text_from_positional_spans() {
        let html = r#"
            <div class="word-insights-content">
              <span data-absolute-pos="0">the </span>
              <span data-absolute-pos="4"><b>cat</b> sat</span>
            </div>"#;
        let rec = TranslationRecord::new();
        let patch = scrape_translation(html, &rec);
        assert_eq!(
            patch.target_text,
            Some(TextCandidate::IfUnset("the cat sat".into()))
        );
    }

    #[test]
    fn target_text_falls_back_through_containers() {
        let html = r#"<div class="translation-content">el gato se sentó</div>"#;
        let rec = TranslationRecord::new();
        let patch = scrape_translation(html, &rec);
        assert_eq!(
            patch.target_text,
            Some(TextCandidate::IfUnset("el gato se sentó".into()))
        );
    }

    #[test]
    fn target_text_never_echoes_source() {
        let html = r#"<div class="translation-content">hola</div>"#;
        let mut rec = TranslationRecord::new();
        rec.source_text = "hola".into();
        let patch = scrape_translation(html, &rec);
        assert!(patch.target_text.is_none());
    }

    #[test]
    fn target_text_skipped_when_already_set() {
        let html = r#"<div class="translation-content">algo</div>"#;
        let mut rec = TranslationRecord::new();
        rec.target_text = "hello".into();
        let patch = scrape_translation(html, &rec);
        assert!(patch.target_text.is_none());
    }

    #[test]
    fn insights_from_data_attributes() {
        let encoded = "%7B%22id%22%3A%22i1%22%2C%22original_text%22%3A%22gato%22%2C%22type%22%3A%22noun%22%2C%22variations%22%3A%5B%5D%7D";
        let html = format!(r#"<button class="word-insight" data-insight="{encoded}">gato</button>"#);
        let rec = TranslationRecord::new();
        let patch = scrape_translation(&html, &rec);
        assert_eq!(patch.insights.len(), 1);
        assert_eq!(patch.insights[0].id, "i1");
        assert_eq!(patch.insights[0].kind, "noun");
    }

    #[test]
    fn alternatives_from_buttons() {
        let html = r#"
            <button class="alternative-button" data-alternative="hello there"
                    aria-label="hello there - More formal greeting">x</button>
            <button class="alternative-button" data-alternative="hey"
                    aria-label="hey">x</button>"#;
        let rec = TranslationRecord::new();
        let patch = scrape_translation(html, &rec);
        let alts = patch.alternatives.unwrap();
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].translation, "hello there");
        assert_eq!(alts[0].explanation, "More formal greeting");
        assert_eq!(alts[1].explanation, "");
    }

    #[test]
    fn definitions_with_pos_badge_and_thresholds() {
        let html = r#"
            <div id="primary-meaning">
              <span class="pill bg-blue">noun</span>
              <div><div>
                <p>a building where people live</p>
                <p>short</p>
              </div></div>
            </div>
            <div id="other-meanings">
              <p>a family or household unit</p>
              <p>a building where people live</p>
            </div>"#;
        let rec = DictionaryRecord::new();
        let patch = scrape_dictionary(html, &rec);
        let defs = match patch.definitions {
            Some(ListUpdate::Merge(d)) => d,
            other => panic!("unexpected definitions update: {other:?}"),
        };
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].part_of_speech, "noun");
        assert_eq!(defs[0].definition, "a building where people live");
        assert_eq!(defs[1].part_of_speech, "");
        assert_eq!(defs[1].definition, "a family or household unit");
    }

    #[test]
    fn examples_fall_back_to_attribute_hints() {
        let html = r#"
            <div class="usage-note">Se vende la casa.</div>
            <blockquote>Mi casa es tu casa.</blockquote>"#;
        let rec = DictionaryRecord::new();
        let patch = scrape_dictionary(html, &rec);
        let exs = match patch.examples {
            Some(ListUpdate::Merge(e)) => e,
            other => panic!("unexpected examples update: {other:?}"),
        };
        assert_eq!(exs.len(), 2);
        assert_eq!(exs[0].sentence, "Se vende la casa.");
        assert_eq!(exs[1].sentence, "Mi casa es tu casa.");
    }

    #[test]
    fn pronunciation_pill_then_class_hint() {
        let pill = r#"<div class="pronunciation-pill"><span>/ˈkasa/</span></div>"#;
        let rec = DictionaryRecord::new();
        assert_eq!(
            scrape_dictionary(pill, &rec).pronunciation.as_deref(),
            Some("/ˈkasa/")
        );

        let hint = r#"<span class="phonetic-spelling">/ˈkasa/</span>"#;
        assert_eq!(
            scrape_dictionary(hint, &rec).pronunciation.as_deref(),
            Some("/ˈkasa/")
        );
    }

    #[test]
    fn notes_and_related_words() {
        let html = r#"
            <div id="notes"><p>Feminine noun.</p><p>Common word.</p></div>
            <div id="related-words">
              <button>casero</button><button>caserío</button><button>casero</button>
            </div>"#;
        let rec = DictionaryRecord::new();
        let patch = scrape_dictionary(html, &rec);
        assert_eq!(patch.notes.as_deref(), Some("Feminine noun.\nCommon word."));
        assert_eq!(
            patch.related_words.unwrap(),
            vec!["casero".to_string(), "caserío".to_string()]
        );
    }

    #[test]
    fn detects_selected_voice() {
        let html = r#"
            <button role="option" aria-selected="false"><span>Nova</span></button>
            <button role="option" aria-selected="true"><span>Sage (default)</span></button>"#;
        assert_eq!(detect_voice(html).as_deref(), Some("sage"));
        assert_eq!(detect_voice("<div>nothing selected</div>"), None);
    }

    #[test]
    fn percent_decode_roundtrip() {
        assert_eq!(percent_decode("caf%C3%A9%20com%20leite"), "café com leite");
        assert_eq!(percent_decode("50%"), "50%");
    }

    #[test]
    fn insight_payload_errors_are_messages() {
        assert!(parse_insight_payload("%7Bnot-json").is_err());
    }
}
