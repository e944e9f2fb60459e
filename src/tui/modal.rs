// Modal overlays
//
// Modals own their input: App holds Option<Modal>, the event loop routes keys
// here first and acts on the returned ModalAction.

use crate::actions::BlockKey;
use crossterm::event::KeyCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// Input consumed, nothing to do
    None,
    Close,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    /// Open the link at this index in the system browser
    OpenLink(usize),
}

#[derive(Debug, Clone)]
pub enum Modal {
    /// Keyboard shortcuts
    Help,
    /// Recent log lines, newest last
    Diagnostics { scroll: usize },
    /// Links of the selected answer as `(label, url)`
    Links(Vec<(String, String)>),
    /// An open HTML preview of this code block
    Preview { key: BlockKey, scroll: usize },
}

impl Modal {
    pub fn diagnostics() -> Self {
        Modal::Diagnostics { scroll: 0 }
    }

    pub fn preview(key: BlockKey) -> Self {
        Modal::Preview { key, scroll: 0 }
    }

    pub fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        match self {
            Modal::Help => match key {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => ModalAction::Close,
                _ => ModalAction::None,
            },
            Modal::Links(links) => match key {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('o') => ModalAction::Close,
                KeyCode::Char(c @ '1'..='9') => {
                    let index = (c as usize) - ('1' as usize);
                    if index < links.len() {
                        ModalAction::OpenLink(index)
                    } else {
                        ModalAction::None
                    }
                }
                _ => ModalAction::None,
            },
            Modal::Diagnostics { .. } | Modal::Preview { .. } => match key {
                KeyCode::Esc | KeyCode::Char('q') => ModalAction::Close,
                KeyCode::Up | KeyCode::Char('k') => ModalAction::ScrollUp,
                KeyCode::Down | KeyCode::Char('j') => ModalAction::ScrollDown,
                KeyCode::PageUp => ModalAction::PageUp,
                KeyCode::PageDown => ModalAction::PageDown,
                _ => ModalAction::None,
            },
        }
    }

    /// Apply a scroll action to the modal's own offset
    pub fn scroll(&mut self, action: &ModalAction, page: usize) {
        let offset = match self {
            Modal::Diagnostics { scroll } | Modal::Preview { scroll, .. } => scroll,
            _ => return,
        };
        match action {
            ModalAction::ScrollUp => *offset = offset.saturating_sub(1),
            ModalAction::ScrollDown => *offset += 1,
            ModalAction::PageUp => *offset = offset.saturating_sub(page),
            ModalAction::PageDown => *offset += page,
            _ => {}
        }
    }
}
