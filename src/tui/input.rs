use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::Focus;

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    SwitchFocus,
    DismissNotice,
    // Port panel
    NextPort,
    PrevPort,
    RefreshPorts,
    ToggleOpen,
    CycleBaud,
    CycleDataBits,
    CycleStopBits,
    CycleParity,
    CycleFlowControl,
    // Send field
    Submit,
    Type(char),
    Backspace,
    CursorLeft,
    CursorRight,
    // Global
    ToggleSendMode,
    ToggleRecvMode,
    ToggleRepeat,
    PeriodDown,
    PeriodUp,
    ClearLog,
    ResetReceived,
    ResetSent,
    None,
}

pub fn map_key(key: KeyEvent, focus: Focus) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Tab | KeyCode::BackTab => return Action::SwitchFocus,
        KeyCode::Esc => return Action::DismissNotice,
        KeyCode::F(2) => return Action::ToggleSendMode,
        KeyCode::F(3) => return Action::ToggleRecvMode,
        KeyCode::F(4) => return Action::ToggleRepeat,
        KeyCode::F(5) => return Action::PeriodDown,
        KeyCode::F(6) => return Action::PeriodUp,
        KeyCode::F(7) => return Action::ClearLog,
        KeyCode::F(8) => return Action::ResetReceived,
        KeyCode::F(9) => return Action::ResetSent,
        KeyCode::F(10) => return Action::Quit,
        _ => {}
    }

    match focus {
        Focus::Ports => match key.code {
            KeyCode::Down | KeyCode::Char('j') => Action::NextPort,
            KeyCode::Up | KeyCode::Char('k') => Action::PrevPort,
            KeyCode::Enter | KeyCode::Char('o') => Action::ToggleOpen,
            KeyCode::Char('r') => Action::RefreshPorts,
            KeyCode::Char('b') => Action::CycleBaud,
            KeyCode::Char('d') => Action::CycleDataBits,
            KeyCode::Char('s') => Action::CycleStopBits,
            KeyCode::Char('p') => Action::CycleParity,
            KeyCode::Char('f') => Action::CycleFlowControl,
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        },
        Focus::SendField => match key.code {
            KeyCode::Enter => Action::Submit,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Left => Action::CursorLeft,
            KeyCode::Right => Action::CursorRight,
            KeyCode::Char(c) => Action::Type(c),
            _ => Action::None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn letters_depend_on_focus() {
        assert_eq!(map_key(key(KeyCode::Char('o')), Focus::Ports), Action::ToggleOpen);
        assert_eq!(
            map_key(key(KeyCode::Char('o')), Focus::SendField),
            Action::Type('o')
        );
        assert_eq!(map_key(key(KeyCode::Char('q')), Focus::SendField), Action::Type('q'));
    }

    #[test]
    fn function_keys_are_global() {
        for focus in [Focus::Ports, Focus::SendField] {
            assert_eq!(map_key(key(KeyCode::F(2)), focus), Action::ToggleSendMode);
            assert_eq!(map_key(key(KeyCode::F(10)), focus), Action::Quit);
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c, Focus::SendField), Action::Quit);
    }
}
