use std::time::{Duration, Instant};

const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Hidden,
    Idle,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

/// Máquina de estados da affordance de save + notificação transiente.
/// Nada aqui renderiza: o shell espelha o estado devolvido pelo poll.
pub struct Presentation {
    button: ButtonState,
    toast: Option<Toast>,
}

impl Presentation {
    pub fn new() -> Self {
        Presentation {
            button: ButtonState::Hidden,
            toast: None,
        }
    }

    pub fn button(&self) -> ButtonState {
        self.button
    }

    pub fn button_str(&self) -> &'static str {
        match self.button {
            ButtonState::Hidden => "hidden",
            ButtonState::Idle => "visible",
            ButtonState::Busy => "busy",
        }
    }

    /// Poll de completude deu positivo: revela o botão.
    /// Não mexe em um save em andamento.
    pub fn show(&mut self) {
        if self.button == ButtonState::Hidden {
            self.button = ButtonState::Idle;
        }
    }

    /// Reset de navegação: esconde o botão. Um save em andamento roda até o
    /// fim (não há cancelamento mid-flight), mas a affordance some.
    pub fn hide(&mut self) {
        if self.button != ButtonState::Busy {
            self.button = ButtonState::Hidden;
        }
    }

    /// Busy suprime reinvocação do callback de save.
    pub fn begin_save(&mut self) -> Result<(), String> {
        match self.button {
            ButtonState::Busy => Err("save already in progress".to_string()),
            _ => {
                self.button = ButtonState::Busy;
                Ok(())
            }
        }
    }

    /// Volta para Idle e levanta o toast do resultado. Toast novo
    /// simplesmente reinicia o timer do anterior.
    pub fn finish_save(&mut self, now: Instant, message: String, kind: ToastKind) {
        if self.button == ButtonState::Busy {
            self.button = ButtonState::Idle;
        }
        self.toast = Some(Toast {
            message,
            kind,
            shown_at: now,
        });
    }

    /// Toast visível neste instante, se houver (auto-dismiss após 3s).
    pub fn toast(&self, now: Instant) -> Option<&Toast> {
        self.toast
            .as_ref()
            .filter(|t| now.duration_since(t.shown_at) < TOAST_DURATION)
    }
}
