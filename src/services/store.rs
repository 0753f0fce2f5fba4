use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::model::settings::Settings;

const SETTINGS_FILE: &str = "settings.json";
const STATS_FILE: &str = "stats.json";

/// Lê as preferências: defaults mesclados sob qualquer override gravado.
/// Arquivo ausente ou corrompido degrada para defaults (com log).
pub fn load_settings() -> Settings {
    if !Path::new(SETTINGS_FILE).exists() {
        return Settings::default();
    }

    let data = match fs::read_to_string(SETTINGS_FILE) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[store] failed to read {SETTINGS_FILE}: {e}");
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&data) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[store] failed to parse {SETTINGS_FILE}: {e}");
            Settings::default()
        }
    }
}

/// Mescla um update parcial (objeto JSON) no estado atual, chave a chave.
/// Puro, para ser testável sem filesystem.
pub fn merge_settings(current: &Settings, partial: &Value) -> Result<Settings, String> {
    let obj = partial
        .as_object()
        .ok_or_else(|| "settings must be a json object".to_string())?;

    let mut merged = serde_json::to_value(current).map_err(|e| e.to_string())?;
    let merged_obj = merged
        .as_object_mut()
        .ok_or_else(|| "settings did not serialize to an object".to_string())?;

    for (key, value) in obj {
        merged_obj.insert(key.clone(), value.clone());
    }

    serde_json::from_value(merged).map_err(|e| format!("invalid settings: {e}"))
}

pub fn save_settings(partial: &Value) -> Result<Settings, String> {
    let merged = merge_settings(&load_settings(), partial)?;

    let json = serde_json::to_string_pretty(&merged).map_err(|e| e.to_string())?;
    fs::write(SETTINGS_FILE, json).map_err(|e| format!("failed to write {SETTINGS_FILE}: {e}"))?;

    Ok(merged)
}

fn read_card_count() -> u64 {
    if !Path::new(STATS_FILE).exists() {
        return 0;
    }

    let data = match fs::read_to_string(STATS_FILE) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[store] failed to read {STATS_FILE}: {e}");
            return 0;
        }
    };

    serde_json::from_str::<Value>(&data)
        .ok()
        .and_then(|v| v.get("card_count").and_then(|c| c.as_u64()))
        .unwrap_or(0)
}

pub fn card_count() -> u64 {
    read_card_count()
}

/// Read-increment-write. Ambiente é single-threaded cooperativo: sem
/// proteção contra escritor concorrente por contrato.
pub fn increment_card_count() -> u64 {
    let count = read_card_count() + 1;

    let json = serde_json::json!({ "card_count": count }).to_string();
    if let Err(e) = fs::write(STATS_FILE, json) {
        eprintln!("[store] failed to write {STATS_FILE}: {e}");
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overrides_only_given_keys() {
        let merged = merge_settings(
            &Settings::default(),
            &json!({ "deck": "Spanish", "include_audio": false }),
        )
        .unwrap();

        assert_eq!(merged.deck, "Spanish");
        assert!(!merged.include_audio);
        // não tocados continuam com default
        assert_eq!(merged.custom_tags, vec!["kotoba".to_string()]);
        assert!(!merged.auto_save);
    }

    #[test]
    fn merge_is_cumulative() {
        let first = merge_settings(&Settings::default(), &json!({ "deck": "Spanish" })).unwrap();
        let second = merge_settings(&first, &json!({ "auto_save": true })).unwrap();

        assert_eq!(second.deck, "Spanish");
        assert!(second.auto_save);
    }

    #[test]
    fn merge_rejects_non_objects() {
        assert!(merge_settings(&Settings::default(), &json!([1, 2])).is_err());
        assert!(merge_settings(&Settings::default(), &json!("deck")).is_err());
    }

    #[test]
    fn merge_rejects_wrong_types() {
        assert!(merge_settings(&Settings::default(), &json!({ "include_audio": "yes" })).is_err());
    }
}
