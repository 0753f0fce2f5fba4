#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    SessionOpen,
    SessionNavigate,
    SessionNetwork,
    SessionDocument,
    SessionInsight,
    SessionPoll,
    SessionSnapshot,
    SessionSave,
    SettingsGet,
    SettingsSet,
    StatsGet,
    AnkiPing,
    AnkiDecks,
    AnkiEnsureModels,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "session.open" => Command::SessionOpen,
            "session.navigate" => Command::SessionNavigate,
            "session.network" => Command::SessionNetwork,
            "session.document" => Command::SessionDocument,
            "session.insight" => Command::SessionInsight,
            "session.poll" => Command::SessionPoll,
            "session.snapshot" => Command::SessionSnapshot,
            "session.save" => Command::SessionSave,
            "settings.get" => Command::SettingsGet,
            "settings.set" => Command::SettingsSet,
            "stats.get" => Command::StatsGet,
            "anki.ping" => Command::AnkiPing,
            "anki.decks" => Command::AnkiDecks,
            "anki.ensure_models" => Command::AnkiEnsureModels,
            _ => Command::Unknown,
        }
    }
}
