//! Key bindings: terminal events to abstract inputs.

use crate::game::Dir;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Clickable on-screen buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Ranking,
    Submit,
    Back,
    Retry,
    EnterName,
}

/// Input independent of key codes. Printable keys (space, p, r, letters) all
/// arrive as `Text`; the current screen decides what they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Press(Dir),
    Release(Dir),
    Rotate,
    Text(char),
    Enter,
    Escape,
    Backspace,
    Interrupt,
    Click(Button),
}

/// Map a key event to an input. Terminal auto-repeat (`Repeat`) is dropped; held
/// keys repeat from the game's own timers.
pub fn key_to_input(key: KeyEvent) -> Option<Input> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    let held = match code {
        KeyCode::Left => Some(Dir::Left),
        KeyCode::Right => Some(Dir::Right),
        KeyCode::Down => Some(Dir::Down),
        _ => None,
    };
    match kind {
        KeyEventKind::Release => return held.map(Input::Release),
        KeyEventKind::Repeat => return None,
        KeyEventKind::Press => {}
    }
    if let Some(dir) = held {
        return Some(Input::Press(dir));
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Input::Interrupt),
            _ => None,
        };
    }
    if modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) {
        return None;
    }
    match code {
        KeyCode::Up => Some(Input::Rotate),
        KeyCode::Enter => Some(Input::Enter),
        KeyCode::Esc => Some(Input::Escape),
        KeyCode::Backspace => Some(Input::Backspace),
        KeyCode::Char(c) if !c.is_control() => Some(Input::Text(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, modifiers, kind)
    }

    fn press(code: KeyCode) -> KeyEvent {
        key(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn test_arrows() {
        assert_eq!(key_to_input(press(KeyCode::Left)), Some(Input::Press(Dir::Left)));
        assert_eq!(key_to_input(press(KeyCode::Down)), Some(Input::Press(Dir::Down)));
        assert_eq!(key_to_input(press(KeyCode::Up)), Some(Input::Rotate));
        let release = key(KeyCode::Right, KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(key_to_input(release), Some(Input::Release(Dir::Right)));
    }

    #[test]
    fn test_repeat_and_other_releases_ignored() {
        let repeat = key(KeyCode::Left, KeyModifiers::NONE, KeyEventKind::Repeat);
        assert_eq!(key_to_input(repeat), None);
        let release = key(KeyCode::Char('p'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(key_to_input(release), None);
    }

    #[test]
    fn test_printable_keys_are_text() {
        assert_eq!(key_to_input(press(KeyCode::Char(' '))), Some(Input::Text(' ')));
        assert_eq!(key_to_input(press(KeyCode::Char('p'))), Some(Input::Text('p')));
        let shifted = key(KeyCode::Char('R'), KeyModifiers::SHIFT, KeyEventKind::Press);
        assert_eq!(key_to_input(shifted), Some(Input::Text('R')));
    }

    #[test]
    fn test_control_keys() {
        let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(key_to_input(ctrl_c), Some(Input::Interrupt));
        let ctrl_p = key(KeyCode::Char('p'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(key_to_input(ctrl_p), None);
        assert_eq!(key_to_input(press(KeyCode::Esc)), Some(Input::Escape));
        assert_eq!(key_to_input(press(KeyCode::Enter)), Some(Input::Enter));
        assert_eq!(key_to_input(press(KeyCode::Backspace)), Some(Input::Backspace));
    }
}
