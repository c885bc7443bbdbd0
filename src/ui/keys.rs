use eframe::egui;

const ESCAPE_CODE: u32 = 27;
const TILDE_CODE: u32 = 192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Tilde,
    Char(char),
}

/// A key press routed through the panels. Handlers call
/// [`KeyEvent::stop_propagation`] to keep later handlers from seeing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub alt: bool,
    propagating: bool,
}

impl KeyEvent {
    pub fn new(key: Key, alt: bool) -> Self {
        Self {
            key,
            alt,
            propagating: true,
        }
    }

    pub fn alt(key: Key) -> Self {
        Self::new(key, true)
    }

    /// Builds an event from a raw key code (27 is escape, 192 tilde, anything
    /// else its character).
    pub fn from_code(code: u32, alt: bool) -> Option<Self> {
        let key = match code {
            ESCAPE_CODE => Key::Escape,
            TILDE_CODE => Key::Tilde,
            other => Key::Char(char::from_u32(other)?),
        };
        Some(Self::new(key, alt))
    }

    pub fn from_egui(key: egui::Key, modifiers: egui::Modifiers) -> Option<Self> {
        let key = match key {
            egui::Key::Escape => Key::Escape,
            egui::Key::Backtick => Key::Tilde,
            other => {
                let mut chars = other.name().chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Key::Char(ch),
                    _ => return None,
                }
            }
        };
        Some(Self::new(key, modifiers.alt))
    }

    pub fn stop_propagation(&mut self) {
        self.propagating = false;
    }

    pub fn is_propagating(&self) -> bool {
        self.propagating
    }

    /// The character of a character key, for shortcut matching.
    pub fn char(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) => Some(ch),
            _ => None,
        }
    }
}
