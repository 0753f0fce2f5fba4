use serde::{Deserialize, Serialize};

use crate::model::record::Quality;

fn default_deck() -> String {
    "Default".to_string()
}

fn default_custom_tags() -> Vec<String> {
    vec!["kotoba".to_string()]
}

fn default_include_audio() -> bool {
    true
}

/// Preferências do usuário. Tudo tem default: um settings.json parcial
/// (ou ausente) sempre produz um estado válido.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_deck")]
    pub deck: String,

    #[serde(default)]
    pub auto_save: bool,

    #[serde(default = "default_custom_tags")]
    pub custom_tags: Vec<String>,

    #[serde(default)]
    pub default_quality: Quality,

    #[serde(default = "default_include_audio")]
    pub include_audio: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            deck: default_deck(),
            auto_save: false,
            custom_tags: default_custom_tags(),
            default_quality: Quality::default(),
            include_audio: default_include_audio(),
        }
    }
}
