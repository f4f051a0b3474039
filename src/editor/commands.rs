//! Keyboard command table and resolution

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Shift,
    Control,
    Alt,
}

/// Modifier snapshot carried by every input event.
///
/// Passed explicitly with each event so two coexisting editor instances
/// never share keyboard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Where a binding listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The editor element has input focus.
    Local,
    /// Document-wide while the editor is the active view.
    Global,
}

/// A key transition with its modifier snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyEvent {
    Down(Key, InputState),
    Up(Key, InputState),
}

/// Editor operations reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Arm the marquee selection chord.
    BeginAreaSelection,
    /// Release the marquee selection chord.
    EndAreaSelection,
    SelectAll,
    ExecuteFlow,
    /// Open the saved-layout chooser.
    ChooseLayout,
    SaveLayout,
    /// Dismiss result overlays and clear the selection.
    DismissAndClear,
    /// Prompt for a node id and select it.
    SelectNodeById,
    /// Log the current selection for debugging.
    LogSelection,
}

impl Command {
    /// Every command in the table.
    pub const ALL: &'static [Command] = &[
        Command::BeginAreaSelection,
        Command::EndAreaSelection,
        Command::SelectAll,
        Command::ExecuteFlow,
        Command::ChooseLayout,
        Command::SaveLayout,
        Command::DismissAndClear,
        Command::SelectNodeById,
        Command::LogSelection,
    ];
}

/// Resolves one key event against the binding table.
///
/// Returns `None` when nothing is bound, or when the surface is read-only
/// (no command may fire then).
pub fn resolve(event: KeyEvent, scope: Scope, read_only: bool) -> Option<Command> {
    if read_only {
        return None;
    }
    match (scope, event) {
        (Scope::Local, KeyEvent::Down(key, state)) => {
            if state.shift && state.ctrl {
                return Some(Command::BeginAreaSelection);
            }
            match key {
                Key::Char('a') if state.ctrl => Some(Command::SelectAll),
                _ => None,
            }
        }
        (Scope::Global, KeyEvent::Down(key, state)) => match key {
            Key::Char('x') if state.alt => Some(Command::ExecuteFlow),
            Key::Char('l') if state.alt => Some(Command::ChooseLayout),
            Key::Char('s') if state.alt => Some(Command::SaveLayout),
            Key::Char('p') if state.alt => Some(Command::SelectNodeById),
            Key::Char('o') if state.alt => Some(Command::LogSelection),
            Key::Escape => Some(Command::DismissAndClear),
            _ => None,
        },
        (Scope::Global, KeyEvent::Up(key, _)) => match key {
            Key::Shift | Key::Control => Some(Command::EndAreaSelection),
            _ => None,
        },
        (Scope::Local, KeyEvent::Up(_, _)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTRL: InputState = InputState {
        shift: false,
        ctrl: true,
        alt: false,
    };
    const CTRL_SHIFT: InputState = InputState {
        shift: true,
        ctrl: true,
        alt: false,
    };
    const ALT: InputState = InputState {
        shift: false,
        ctrl: false,
        alt: true,
    };
    const NONE: InputState = InputState {
        shift: false,
        ctrl: false,
        alt: false,
    };

    #[test]
    fn test_local_bindings() {
        assert_eq!(
            resolve(KeyEvent::Down(Key::Shift, CTRL_SHIFT), Scope::Local, false),
            Some(Command::BeginAreaSelection)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('a'), CTRL), Scope::Local, false),
            Some(Command::SelectAll)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('a'), NONE), Scope::Local, false),
            None
        );
    }

    #[test]
    fn test_global_bindings() {
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('x'), ALT), Scope::Global, false),
            Some(Command::ExecuteFlow)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('l'), ALT), Scope::Global, false),
            Some(Command::ChooseLayout)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('s'), ALT), Scope::Global, false),
            Some(Command::SaveLayout)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('p'), ALT), Scope::Global, false),
            Some(Command::SelectNodeById)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Char('o'), ALT), Scope::Global, false),
            Some(Command::LogSelection)
        );
        assert_eq!(
            resolve(KeyEvent::Down(Key::Escape, NONE), Scope::Global, false),
            Some(Command::DismissAndClear)
        );
    }

    #[test]
    fn test_chord_release_ends_area_selection() {
        assert_eq!(
            resolve(KeyEvent::Up(Key::Shift, NONE), Scope::Global, false),
            Some(Command::EndAreaSelection)
        );
        assert_eq!(
            resolve(KeyEvent::Up(Key::Control, NONE), Scope::Global, false),
            Some(Command::EndAreaSelection)
        );
        assert_eq!(
            resolve(KeyEvent::Up(Key::Char('x'), NONE), Scope::Global, false),
            None
        );
    }

    #[test]
    fn test_read_only_suppresses_everything() {
        let events = [
            (KeyEvent::Down(Key::Shift, CTRL_SHIFT), Scope::Local),
            (KeyEvent::Down(Key::Char('a'), CTRL), Scope::Local),
            (KeyEvent::Down(Key::Char('x'), ALT), Scope::Global),
            (KeyEvent::Down(Key::Escape, NONE), Scope::Global),
            (KeyEvent::Up(Key::Shift, NONE), Scope::Global),
        ];
        for (event, scope) in events {
            assert_eq!(resolve(event, scope, true), None);
        }
    }

    #[test]
    fn test_every_command_is_reachable() {
        let reachable: Vec<Option<Command>> = vec![
            resolve(KeyEvent::Down(Key::Shift, CTRL_SHIFT), Scope::Local, false),
            resolve(KeyEvent::Up(Key::Shift, NONE), Scope::Global, false),
            resolve(KeyEvent::Down(Key::Char('a'), CTRL), Scope::Local, false),
            resolve(KeyEvent::Down(Key::Char('x'), ALT), Scope::Global, false),
            resolve(KeyEvent::Down(Key::Char('l'), ALT), Scope::Global, false),
            resolve(KeyEvent::Down(Key::Char('s'), ALT), Scope::Global, false),
            resolve(KeyEvent::Down(Key::Escape, NONE), Scope::Global, false),
            resolve(KeyEvent::Down(Key::Char('p'), ALT), Scope::Global, false),
            resolve(KeyEvent::Down(Key::Char('o'), ALT), Scope::Global, false),
        ];
        for command in Command::ALL {
            assert!(
                reachable.contains(&Some(*command)),
                "unreachable command {:?}",
                command
            );
        }
    }
}
