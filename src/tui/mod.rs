// TUI module - Terminal User Interface
//
// This module manages the terminal UI using ratatui. It handles:
// - Terminal initialization and cleanup
// - The event loop (terminal input, redraw ticks, stream fragments)
// - Layered key dispatch: modal, then global keys, then the focused pane

pub mod app;
pub mod components;
pub mod highlight;
pub mod input;
pub mod markdown;
pub mod modal;
pub mod scroll;
pub mod streaming;
pub mod views;

use crate::chat::ChatSession;
use crate::config::Config;
use crate::logging::LogBuffer;
use anyhow::{Context, Result};
use app::{App, Focus};
use crossterm::{
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use modal::{Modal, ModalAction};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};

/// Lines moved per mouse wheel notch
const WHEEL_LINES: usize = 3;

/// Run the TUI
///
/// Sets up the terminal, runs the event loop and restores the terminal even
/// when the loop fails.
pub async fn run_tui(session: ChatSession, config: &Config, log_buffer: LogBuffer) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )
    .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(session, config, log_buffer);

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Any open preview is discarded on the way out
    app.close_preview();

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Main event loop
///
/// Waits on three sources with tokio::select!:
/// 1. Terminal input (keys, mouse, paste)
/// 2. A redraw tick (spinner, "Copied!" revert, toast expiry)
/// 3. The next step of the active answer stream
///
/// A fragment is applied before the stream is polled again, so fragments
/// land in the order the backend produced them.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| views::draw(f, app))
            .context("Failed to draw terminal")?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key_event))) => handle_key_event(app, key_event),
                Some(Ok(Event::Mouse(mouse_event))) => handle_mouse_event(app, mouse_event),
                Some(Ok(Event::Paste(text))) => handle_paste(app, &text),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => break,
            },

            _ = tick_interval.tick() => app.tick(),

            event = app.session.next_event() => app.on_stream_event(event),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle keyboard input
///
/// Layered dispatch:
/// 1. Modal (absorbs everything while open)
/// 2. Global keys (work in both panes)
/// 3. The focused pane
fn handle_key_event(app: &mut App, key_event: KeyEvent) {
    if key_event.kind != KeyEventKind::Press {
        return;
    }

    if handle_modal_input(app, &key_event) {
        return;
    }

    if handle_global_keys(app, &key_event) {
        return;
    }

    match app.focus {
        Focus::Input => handle_input_keys(app, &key_event),
        Focus::Transcript => handle_transcript_keys(app, &key_event),
    }
}

/// Handle modal input - returns true if a modal absorbed the input
fn handle_modal_input(app: &mut App, key_event: &KeyEvent) -> bool {
    let Some(modal) = app.modal.as_mut() else {
        return false;
    };

    let action = modal.handle_input(key_event.code);
    match action {
        ModalAction::None => {}
        ModalAction::Close => {
            if matches!(app.modal, Some(Modal::Preview { .. })) {
                app.close_preview();
            }
            app.modal = None;
        }
        ModalAction::OpenLink(index) => {
            let url = match &app.modal {
                Some(Modal::Links(links)) => links.get(index).map(|(_, url)| url.clone()),
                _ => None,
            };
            app.modal = None;
            if let Some(url) = url {
                app.open_link(&url);
            }
        }
        ModalAction::ScrollUp
        | ModalAction::ScrollDown
        | ModalAction::PageUp
        | ModalAction::PageDown => modal.scroll(&action, 10),
    }

    true
}

/// Handle global keys - returns true if handled
fn handle_global_keys(app: &mut App, key_event: &KeyEvent) -> bool {
    let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

    match key_event.code {
        KeyCode::Char('q') if ctrl => app.should_quit = true,
        KeyCode::Char('c') if ctrl => {
            if app.session.is_streaming() {
                app.cancel_stream();
            } else {
                app.should_quit = true;
            }
        }
        KeyCode::Char('l') if ctrl => app.modal = Some(Modal::diagnostics()),
        KeyCode::F(n @ 1..=4) => app.use_example(usize::from(n) - 1),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::PageUp => app.scroll.page_up(),
        KeyCode::PageDown => app.scroll.page_down(),
        _ => return false,
    }
    true
}

/// Keys while the prompt has focus
fn handle_input_keys(app: &mut App, key_event: &KeyEvent) {
    let modifiers = key_event.modifiers;

    match key_event.code {
        KeyCode::Enter
            if modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
        {
            app.input.newline()
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => app.input.clear_line(),
        KeyCode::Char(_) if modifiers.contains(KeyModifiers::CONTROL) => {}
        KeyCode::Char(c) => app.input.insert(c),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.home(),
        KeyCode::End => app.input.end(),
        KeyCode::Up => app.scroll.scroll_up(1),
        KeyCode::Down => app.scroll.scroll_down(1),
        KeyCode::Esc => app.selected = None,
        _ => {}
    }
}

/// Keys while the transcript has focus
fn handle_transcript_keys(app: &mut App, key_event: &KeyEvent) {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => app.scroll.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll.scroll_down(1),
        KeyCode::Home | KeyCode::Char('g') => app.scroll.scroll_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.scroll.scroll_to_bottom(),
        KeyCode::Char(']') => app.select_next_block(),
        KeyCode::Char('[') => app.select_prev_block(),
        KeyCode::Char('c') => app.copy_block(Instant::now()),
        KeyCode::Char('p') => app.preview_block(),
        KeyCode::Char('o') => app.show_links(),
        KeyCode::Char('?') => app.modal = Some(Modal::Help),
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('i') => {
            app.selected = None;
            app.focus = Focus::Input;
        }
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, mouse_event: MouseEvent) {
    if app.modal.is_some() {
        return;
    }
    match mouse_event.kind {
        MouseEventKind::ScrollUp => app.scroll.scroll_up(WHEEL_LINES),
        MouseEventKind::ScrollDown => app.scroll.scroll_down(WHEEL_LINES),
        _ => {}
    }
}

/// Pasted text goes into the prompt as-is, newlines included
fn handle_paste(app: &mut App, text: &str) {
    if app.modal.is_none() {
        app.focus = Focus::Input;
        app.input.insert_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Clipboard, PreviewHandle, PreviewSurface};
    use crate::backend::DemoBackend;
    use crate::theme::Theme;
    use std::sync::Arc;

    struct NoClipboard;

    impl Clipboard for NoClipboard {
        fn set_text(&mut self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("unavailable")
        }
    }

    struct NoSurface;

    impl PreviewSurface for NoSurface {
        fn open(&mut self, _html: &str) -> anyhow::Result<PreviewHandle> {
            anyhow::bail!("unavailable")
        }
    }

    fn test_app() -> App {
        let backend = Arc::new(DemoBackend::with_delay(Duration::ZERO));
        App::with_capabilities(
            ChatSession::new(backend, ""),
            Theme::dark(),
            "base16-ocean.dark".to_string(),
            LogBuffer::new(),
            Box::new(NoClipboard),
            Box::new(NoSurface),
        )
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_key_event(app, KeyEvent::new(code, modifiers));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch), KeyModifiers::NONE);
        }
    }

    #[tokio::test]
    async fn test_enter_submits_and_shift_enter_inserts_newline() {
        let mut app = test_app();
        type_text(&mut app, "line one");
        press(&mut app, KeyCode::Enter, KeyModifiers::SHIFT);
        type_text(&mut app, "two");
        assert_eq!(app.input.text(), "line one\ntwo");

        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.input.is_blank());
        assert!(app.session.is_streaming());
        assert_eq!(app.session.conversation().messages()[0].content, "line one\ntwo");
    }

    #[tokio::test]
    async fn test_ctrl_c_cancels_before_quitting() {
        let mut app = test_app();
        type_text(&mut app, "hello");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(!app.session.is_streaming());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_letters_type_in_prompt_but_act_in_transcript() {
        let mut app = test_app();
        type_text(&mut app, "c?o");
        assert_eq!(app.input.text(), "c?o");
        assert!(app.modal.is_none());

        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.focus, Focus::Transcript);
        press(&mut app, KeyCode::Char('?'), KeyModifiers::NONE);
        assert!(matches!(app.modal, Some(Modal::Help)));

        // Modal swallows keys until closed
        press(&mut app, KeyCode::Char('i'), KeyModifiers::NONE);
        assert_eq!(app.focus, Focus::Transcript);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_function_keys_fill_examples() {
        let mut app = test_app();
        press(&mut app, KeyCode::F(4), KeyModifiers::NONE);
        assert_eq!(app.input.text(), crate::chat::EXAMPLE_PROMPTS[3]);
    }

    #[test]
    fn test_ctrl_l_opens_diagnostics() {
        let mut app = test_app();
        press(&mut app, KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert!(matches!(app.modal, Some(Modal::Diagnostics { .. })));
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let mut app = test_app();
        handle_paste(&mut app, "a\r\nb\rc");
        assert_eq!(app.input.text(), "a\nb\nc");
    }
}
