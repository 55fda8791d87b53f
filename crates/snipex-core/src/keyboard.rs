use rdev::{self, EventType, Key as RdevKey};

/// Keys that end the current word and empty the typed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKey {
    Return,
    Tab,
    Escape,
    Space,
    Left,
    Right,
    Up,
    Down,
}

/// A key-down event reduced to what the matcher cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Text produced by a plain (unmodified) key press
    Character(String),
    Reset(ResetKey),
    Backspace,
    /// Anything else: modifiers, function keys, shortcut chords
    Other,
}

impl KeyInput {
    pub fn character(c: char) -> Self {
        KeyInput::Character(c.to_string())
    }
}

/// Convert rdev::Key to a reset key, if it is one
pub fn rdev_key_to_reset(key: &RdevKey) -> Option<ResetKey> {
    match key {
        RdevKey::Return | RdevKey::KpReturn => Some(ResetKey::Return),
        RdevKey::Tab => Some(ResetKey::Tab),
        RdevKey::Escape => Some(ResetKey::Escape),
        RdevKey::Space => Some(ResetKey::Space),
        RdevKey::LeftArrow => Some(ResetKey::Left),
        RdevKey::RightArrow => Some(ResetKey::Right),
        RdevKey::UpArrow => Some(ResetKey::Up),
        RdevKey::DownArrow => Some(ResetKey::Down),
        _ => None,
    }
}

/// Text a key press produced, as reported by the platform layout
pub fn rdev_event_text(event: &rdev::Event) -> Option<String> {
    let name = event.name.as_ref()?;
    let text: String = name.chars().filter(|c| !c.is_control()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Turns raw rdev events into `KeyInput`, tracking held modifiers.
///
/// rdev reports modifiers as ordinary key presses, so chords like Cmd+C are
/// only recognizable by remembering which modifier keys are down.
#[derive(Debug, Default)]
pub struct KeyTranslator {
    meta: bool,
    control: bool,
    alt: bool,
}

impl KeyTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a key-down event; releases and non-keyboard events yield `None`
    pub fn translate(&mut self, event: &rdev::Event) -> Option<KeyInput> {
        match &event.event_type {
            EventType::KeyPress(key) => {
                if self.set_modifier(key, true) {
                    return Some(KeyInput::Other);
                }
                Some(self.classify_press(key, event))
            }
            EventType::KeyRelease(key) => {
                self.set_modifier(key, false);
                None
            }
            _ => None,
        }
    }

    fn classify_press(&self, key: &RdevKey, event: &rdev::Event) -> KeyInput {
        if let Some(reset) = rdev_key_to_reset(key) {
            return KeyInput::Reset(reset);
        }

        if *key == RdevKey::Backspace {
            return KeyInput::Backspace;
        }

        if self.meta || self.control || self.alt {
            return KeyInput::Other;
        }

        match rdev_event_text(event) {
            Some(text) => KeyInput::Character(text),
            None => KeyInput::Other,
        }
    }

    fn set_modifier(&mut self, key: &RdevKey, down: bool) -> bool {
        match key {
            RdevKey::MetaLeft | RdevKey::MetaRight => self.meta = down,
            RdevKey::ControlLeft | RdevKey::ControlRight => self.control = down,
            // Option types characters on Mac layouts (@, [, ~ on German/French)
            RdevKey::Alt if cfg!(target_os = "macos") => {}
            RdevKey::Alt => self.alt = down,
            // AltGr selects characters on many layouts, like Shift
            RdevKey::AltGr | RdevKey::ShiftLeft | RdevKey::ShiftRight | RdevKey::CapsLock => {}
            _ => return false,
        }
        true
    }
}
