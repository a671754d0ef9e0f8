use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nodewatch_client::NodeId;

/// What the key handler is currently capturing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Browse,
    /// Keys go to the rename draft.
    Editing,
    /// Waiting for y/n on deleting this node.
    ConfirmDelete { id: NodeId, prompt: String },
    /// Read-only view of the last exported document.
    ViewExport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Start,
    Stop,
    Recheck,
    BeginEdit,
    BeginDelete,
    ToggleRow,
    ToggleAll,
    Export,
    WriteExport,
    CopyExport,
    ShowImportLink,
    ViewExport,
    CloseExport,
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
    // Editing
    Insert(char),
    Backspace,
    SaveEdit,
    CancelEdit,
    // Delete prompt
    ConfirmDelete,
    DeclineDelete,
}

/// Translate a key press for the given mode.
pub fn action_for(key: KeyEvent, mode: &InputMode) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    match mode {
        InputMode::Editing => match key.code {
            KeyCode::Enter => Some(Action::SaveEdit),
            KeyCode::Esc => Some(Action::CancelEdit),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(c) => Some(Action::Insert(c)),
            _ => None,
        },
        InputMode::ConfirmDelete { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmDelete),
            _ => Some(Action::DeclineDelete),
        },
        InputMode::ViewExport => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => Some(Action::CloseExport),
            KeyCode::Char('w') => Some(Action::WriteExport),
            KeyCode::Char('c') => Some(Action::CopyExport),
            KeyCode::Char('i') => Some(Action::ShowImportLink),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::Home => Some(Action::Top),
            KeyCode::End => Some(Action::Bottom),
            _ => None,
        },
        InputMode::Browse => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('s') => Some(Action::Start),
            KeyCode::Char('x') => Some(Action::Stop),
            KeyCode::Char('r') => Some(Action::Recheck),
            KeyCode::Char('e') => Some(Action::BeginEdit),
            KeyCode::Char('d') => Some(Action::BeginDelete),
            KeyCode::Char(' ') => Some(Action::ToggleRow),
            KeyCode::Char('a') => Some(Action::ToggleAll),
            KeyCode::Char('E') => Some(Action::Export),
            KeyCode::Char('w') => Some(Action::WriteExport),
            KeyCode::Char('c') => Some(Action::CopyExport),
            KeyCode::Char('i') => Some(Action::ShowImportLink),
            KeyCode::Char('v') => Some(Action::ViewExport),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::Up),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Down),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::Home => Some(Action::Top),
            KeyCode::End => Some(Action::Bottom),
            _ => None,
        },
    }
}
