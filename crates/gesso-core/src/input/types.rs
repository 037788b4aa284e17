/// Key character reported when the pressed key has no character mapping
/// (arrows, function keys). The numeric `code` field identifies it instead.
pub const CODED: char = '\u{ffff}';

/// Escape key character. A key-press carrying it requests a graceful exit;
/// a `key_pressed` callback may overwrite the sketch's key field to swallow
/// the interrupt.
pub const ESC: char = '\u{1b}';

/// Pointer action identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerAction {
    Press,
    Release,
    Click,
    Drag,
    Move,
    Enter,
    Exit,
    Wheel,
}

/// Key action identifier.
///
/// `Type` carries the character produced by a press (after layout and
/// modifier resolution), mirroring the press/release pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KeyAction {
    Press,
    Release,
    Type,
}

/// Pointer button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PointerButton {
    Left,
    Center,
    Right,
}

/// Modifier keys state.
///
/// This is stored as booleans rather than bitflags to keep it explicit and stable.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer event in sketch pixel coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub x: i32,
    pub y: i32,
    /// Button involved in the action; `None` for plain moves.
    pub button: Option<PointerButton>,
    /// Scroll amount in detents, positive toward the user. Zero for
    /// non-wheel actions.
    pub wheel: f32,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(action: PointerAction, x: i32, y: i32) -> Self {
        Self {
            action,
            x,
            y,
            button: None,
            wheel: 0.0,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_wheel(mut self, wheel: f32) -> Self {
        self.wheel = wheel;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Key event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    /// Character for the key, or [`CODED`] when there is none.
    pub key: char,
    /// Platform key code (letters use their ASCII uppercase value).
    pub code: u32,
    /// Whether this event was synthesized by key auto-repeat.
    pub repeat: bool,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(action: KeyAction, key: char, code: u32) -> Self {
        Self {
            action,
            key,
            code,
            repeat: false,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_repeat(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Inbound event union consumed by the dispatcher.
///
/// Events are immutable once constructed; the dispatcher consumes each one
/// exactly once.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        InputEvent::Pointer(event)
    }
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        InputEvent::Key(event)
    }
}
