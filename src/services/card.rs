use crate::model::record::{DictionaryRecord, TranslationRecord};

/// Escapa todo valor interpolado no HTML do cartão. O conteúdo vem de
/// scraping de uma página de terceiros: nada entra cru.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

pub fn format_translation_front(rec: &TranslationRecord) -> String {
    escape_html(&rec.source_text)
}

pub fn format_translation_back(rec: &TranslationRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(CARD_CSS.to_string());

    parts.push(format!(
        "<div class=\"kotoba-flashcard\">\n  <div class=\"main-translation\">\n    <span class=\"translation-text\">{}</span>\n  </div>",
        escape_html(&rec.target_text)
    ));

    if !rec.description.trim().is_empty() {
        parts.push(format!(
            "  <div class=\"insight-box\">\n    <div class=\"insight-text\">{}</div>\n  </div>",
            escape_html(&rec.description)
        ));
    }

    // Word insights antes das alternativas.
    if !rec.insights.is_empty() {
        parts.push("  <div class=\"word-insights\">\n    <h4>Word Details</h4>".to_string());

        for insight in &rec.insights {
            parts.push(format!(
                "    <div class=\"word-insight\">\n      <div class=\"word-header\">\n        <strong>{}</strong>\n        <span class=\"word-type\">({})</span>\n      </div>\n      <ul class=\"variations\">",
                escape_html(&insight.original_text),
                escape_html(&insight.kind)
            ));

            for variation in &insight.variations {
                parts.push(format!(
                    "        <li><strong>{}</strong> - {}</li>",
                    escape_html(&variation.text),
                    escape_html(&variation.explanation)
                ));
            }

            parts.push("      </ul>\n    </div>".to_string());
        }

        parts.push("  </div>".to_string());
    }

    if !rec.alternatives.is_empty() {
        parts.push(
            "  <div class=\"alternatives\">\n    <h4>Alternative Translations</h4>\n    <ul>"
                .to_string(),
        );

        for alt in &rec.alternatives {
            parts.push(format!(
                "      <li>\n        <strong>{}</strong><br>\n        <span class=\"explanation\">{}</span>\n      </li>",
                escape_html(&alt.translation),
                escape_html(&alt.explanation)
            ));
        }

        parts.push("    </ul>\n  </div>".to_string());
    }

    parts.push(format!(
        "  <div class=\"metadata\">\n    <small>{} → {} | Quality: {}</small>\n  </div>\n</div>",
        escape_html(&rec.source_lang),
        escape_html(&rec.target_lang),
        rec.quality.as_str()
    ));

    parts.join("\n")
}

pub fn format_dictionary_front(rec: &DictionaryRecord) -> String {
    escape_html(&rec.word)
}

pub fn format_dictionary_back(rec: &DictionaryRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(CARD_CSS.to_string());
    parts.push("<div class=\"kotoba-flashcard\">".to_string());

    if !rec.pronunciation.trim().is_empty() {
        parts.push(format!(
            "  <div class=\"pronunciation\">{}</div>",
            escape_html(&rec.pronunciation)
        ));
    }

    if !rec.definitions.is_empty() {
        parts.push("  <div class=\"definitions\">\n    <h4>Definitions</h4>\n    <ol>".to_string());
        for def in &rec.definitions {
            let pos = if def.part_of_speech.trim().is_empty() {
                String::new()
            } else {
                format!(
                    "<span class=\"word-type\">({})</span> ",
                    escape_html(&def.part_of_speech)
                )
            };
            parts.push(format!(
                "      <li>{}{}</li>",
                pos,
                escape_html(&def.definition)
            ));
        }
        parts.push("    </ol>\n  </div>".to_string());
    }

    if !rec.synonyms.is_empty() {
        let words: Vec<String> = rec.synonyms.iter().map(|s| escape_html(&s.word)).collect();
        parts.push(format!(
            "  <div class=\"synonyms\">\n    <h4>Synonyms</h4>\n    <p>{}</p>\n  </div>",
            words.join(", ")
        ));
    }

    if !rec.examples.is_empty() {
        parts.push("  <div class=\"examples\">\n    <h4>Examples</h4>\n    <ul>".to_string());
        for example in &rec.examples {
            parts.push(format!("      <li>{}</li>", escape_html(&example.sentence)));
        }
        parts.push("    </ul>\n  </div>".to_string());
    }

    if !rec.etymology.trim().is_empty() {
        parts.push(format!(
            "  <div class=\"insight-box\">\n    <div class=\"insight-text\">{}</div>\n  </div>",
            escape_html(&rec.etymology)
        ));
    }

    if !rec.notes.trim().is_empty() {
        let lines: Vec<String> = rec
            .notes
            .lines()
            .map(escape_html)
            .collect();
        parts.push(format!(
            "  <div class=\"notes\">\n    <h4>Notes</h4>\n    <p>{}</p>\n  </div>",
            lines.join("<br>")
        ));
    }

    if !rec.related_words.is_empty() {
        let words: Vec<String> = rec.related_words.iter().map(|w| escape_html(w)).collect();
        parts.push(format!(
            "  <div class=\"related-words\">\n    <h4>Related Words</h4>\n    <p>{}</p>\n  </div>",
            words.join(", ")
        ));
    }

    parts.push(format!(
        "  <div class=\"metadata\">\n    <small>{} | dictionary</small>\n  </div>\n</div>",
        escape_html(&rec.language)
    ));

    parts.join("\n")
}

const CARD_CSS: &str = r#"<style>
.kotoba-flashcard {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
  line-height: 1.6;
  padding: 20px;
}

.main-translation {
  font-size: 1.5em;
  font-weight: bold;
  margin-bottom: 20px;
}

.pronunciation {
  opacity: 0.7;
  margin-bottom: 16px;
}

.insight-box {
  background: rgba(83, 82, 255, 0.05);
  border-left: 4px solid #5352FF;
  padding: 15px;
  margin: 15px 0;
  border-radius: 4px;
}

.insight-text {
  opacity: 0.8;
}

.alternatives, .word-insights, .definitions, .synonyms, .examples, .notes, .related-words {
  margin: 20px 0;
}

h4 {
  margin-bottom: 10px;
  font-size: 1.1em;
  font-weight: 600;
}

.alternatives ul, .examples ul {
  list-style: none;
  padding: 0;
}

.alternatives li, .examples li {
  background: rgba(83, 82, 255, 0.05);
  border-left: 2px solid rgba(83, 82, 255, 0.3);
  padding: 12px;
  margin: 8px 0;
  border-radius: 4px;
}

.explanation {
  opacity: 0.7;
  font-size: 0.95em;
  display: block;
  margin-top: 4px;
}

.word-insight {
  background: rgba(66, 186, 153, 0.05);
  border-left: 2px solid rgba(66, 186, 153, 0.3);
  padding: 15px;
  margin: 10px 0;
  border-radius: 4px;
}

.word-type {
  opacity: 0.6;
  font-size: 0.9em;
  font-weight: normal;
  margin-left: 4px;
}

.variations {
  list-style: none;
  padding-left: 15px;
}

.variations li {
  margin: 6px 0;
}

.metadata {
  margin-top: 20px;
  padding-top: 15px;
  border-top: 1px solid rgba(0, 0, 0, 0.1);
  opacity: 0.6;
  text-align: center;
  font-size: 0.9em;
}
</style>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::{Alternative, Definition, Variation, WordInsight};

    fn unescape_html(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#039;", "'")
            .replace("&amp;", "&")
    }

    #[test]
    fn escape_covers_all_special_chars() {
        let raw = r#"a & b < c > d "e" 'f'"#;
        let escaped = escape_html(raw);
        assert_eq!(
            escaped,
            "a &amp; b &lt; c &gt; d &quot;e&quot; &#039;f&#039;"
        );
        assert_eq!(unescape_html(&escaped), raw);
    }

    #[test]
    fn escape_unescape_roundtrip_on_tricky_input() {
        // Entrada que já parece escapada precisa sobreviver ao ciclo.
        let raw = "&amp; <script>alert(\"x\")</script> & 'fim'";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn translation_back_escapes_every_field() {
        let mut rec = TranslationRecord::new();
        rec.source_text = "hola".into();
        rec.source_lang = "es".into();
        rec.target_lang = "en".into();
        rec.target_text = "<b>hello</b>".into();
        rec.description = "greeting & salutation".into();
        rec.alternatives = vec![Alternative {
            translation: "\"hi\"".into(),
            explanation: "it's casual".into(),
        }];
        rec.insights = vec![WordInsight {
            id: "1".into(),
            original_text: "<hola>".into(),
            kind: "interjection".into(),
            variations: vec![Variation {
                text: "hey".into(),
                explanation: "a & b".into(),
            }],
        }];

        let back = format_translation_back(&rec);
        assert!(back.contains("&lt;b&gt;hello&lt;/b&gt;"));
        assert!(back.contains("greeting &amp; salutation"));
        assert!(back.contains("&quot;hi&quot;"));
        assert!(back.contains("it&#039;s casual"));
        assert!(back.contains("&lt;hola&gt;"));
        assert!(back.contains("a &amp; b"));
        assert!(!back.contains("<b>hello</b>"));
    }

    #[test]
    fn translation_back_is_deterministic_and_ordered() {
        let mut rec = TranslationRecord::new();
        rec.source_text = "hola".into();
        rec.target_text = "hello".into();
        rec.source_lang = "es".into();
        rec.target_lang = "en".into();
        rec.description = "desc".into();
        rec.insights = vec![WordInsight {
            id: "1".into(),
            original_text: "hola".into(),
            kind: "x".into(),
            variations: Vec::new(),
        }];
        rec.alternatives = vec![Alternative {
            translation: "hi".into(),
            explanation: "e".into(),
        }];

        let a = format_translation_back(&rec);
        let b = format_translation_back(&rec);
        assert_eq!(a, b);

        // insights antes das alternativas, metadata por último
        let insights_at = a.find("Word Details").unwrap();
        let alts_at = a.find("Alternative Translations").unwrap();
        let meta_at = a.find("class=\"metadata\"").unwrap();
        assert!(insights_at < alts_at);
        assert!(alts_at < meta_at);
    }

    #[test]
    fn dictionary_back_sections() {
        let mut rec = DictionaryRecord::new();
        rec.word = "casa".into();
        rec.language = "es".into();
        rec.pronunciation = "/ˈkasa/".into();
        rec.definitions = vec![Definition {
            part_of_speech: "noun".into(),
            definition: "a building for living in".into(),
        }];
        rec.notes = "line one\nline two".into();

        let back = format_dictionary_back(&rec);
        assert!(back.contains("/ˈkasa/"));
        assert!(back.contains("(noun)"));
        assert!(back.contains("a building for living in"));
        assert!(back.contains("line one<br>line two"));
        // seções vazias ficam de fora
        assert!(!back.contains("Synonyms"));
        assert!(!back.contains("Examples"));
    }

    #[test]
    fn fronts_are_escaped() {
        let mut t = TranslationRecord::new();
        t.source_text = "a < b".into();
        assert_eq!(format_translation_front(&t), "a &lt; b");

        let mut d = DictionaryRecord::new();
        d.word = "it's".into();
        assert_eq!(format_dictionary_front(&d), "it&#039;s");
    }
}
