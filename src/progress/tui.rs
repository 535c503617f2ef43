//! Interactive terminal frontend
//!
//! Draws the copy display inline (no alternate screen) with Ratatui:
//! - Spinner and headline
//! - Gradient progress bar with percentage
//! - Key hint line
//!
//! Key bindings: q, Esc or Ctrl+C request quit. Keys are read on a
//! listener thread and forwarded into the render loop inbox.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{Sender, TrySendError};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
    TerminalOptions, Viewport,
};

use crate::progress::{Frontend, UiMessage, UiState};

/// Rows reserved for the inline display
const VIEWPORT_HEIGHT: u16 = 5;

/// How long the key listener blocks before checking for shutdown
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Spinner color (ANSI 205, pink)
const ACCENT: Color = Color::Indexed(205);

/// Bar gradient endpoints, scaled over the filled part
const GRADIENT_START: (u8, u8, u8) = (0xFF, 0x7C, 0xCB);
const GRADIENT_END: (u8, u8, u8) = (0xFD, 0xFF, 0x8C);

/// Cells reserved after the bar for the percentage
const LABEL_WIDTH: u16 = 5;

/// The interactive frontend
pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    area: Rect,
    listener: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    restored: bool,
}

impl TerminalFrontend {
    /// Put the terminal in raw mode, reserve the inline viewport and start
    /// forwarding quit keys into `inbox`.
    ///
    /// # Errors
    ///
    /// Fails when stdout is not a usable terminal.
    pub fn new(inbox: Sender<UiMessage>) -> io::Result<Self> {
        enable_raw_mode()?;
        let terminal = match Terminal::with_options(
            CrosstermBackend::new(io::stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(VIEWPORT_HEIGHT),
            },
        ) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                return Err(e);
            }
        };

        let shutdown = Arc::new(AtomicBool::new(false));
        let listener = spawn_key_listener(inbox, Arc::clone(&shutdown));

        Ok(Self {
            terminal,
            area: Rect::default(),
            listener: Some(listener),
            shutdown,
            restored: false,
        })
    }

    fn stop_listener(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.listener.take() {
            if handle.join().is_err() {
                tracing::warn!("Key listener panicked");
            }
        }
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.stop_listener();

        // leave the cursor on the last row so the shell prompt lands below
        let last_row = self.area.bottom().saturating_sub(1);
        self.terminal.set_cursor_position((0, last_row))?;
        self.terminal.show_cursor()?;
        disable_raw_mode()?;
        println!();
        Ok(())
    }
}

impl Frontend for TerminalFrontend {
    fn draw(&mut self, state: &UiState) -> io::Result<()> {
        let mut area = self.area;
        self.terminal.draw(|frame| {
            area = frame.area();
            draw_ui(frame, state);
        })?;
        self.area = area;
        Ok(())
    }

    fn finish(&mut self, state: &UiState) -> io::Result<()> {
        self.draw(state)?;
        self.restore()
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("Failed to restore terminal: {}", e);
        }
    }
}

fn spawn_key_listener(inbox: Sender<UiMessage>, shutdown: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut pending_quit = false;

        while !shutdown.load(Ordering::SeqCst) {
            if pending_quit {
                match inbox.try_send(UiMessage::QuitRequested) {
                    Ok(()) => pending_quit = false,
                    Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }

            match event::poll(KEY_POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if is_quit_key(&key) => pending_quit = true,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Failed to poll terminal events: {}", e);
                    break;
                }
            }
        }
    })
}

/// True for the keys that stop the copy
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Color at position `t` in `[0, 1]` along the bar gradient
pub fn gradient_color(t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color::Rgb(
        mix(GRADIENT_START.0, GRADIENT_END.0),
        mix(GRADIENT_START.1, GRADIENT_END.1),
        mix(GRADIENT_START.2, GRADIENT_END.2),
    )
}

/// Bar of `width` cells followed by the percentage. The gradient spans the
/// filled cells only, so a full bar always ends on the end color.
fn gradient_bar(ratio: f64, width: usize) -> Line<'static> {
    let filled = (ratio * width as f64).round() as usize;
    let mut spans: Vec<Span<'static>> = (0..filled)
        .map(|i| {
            let t = if filled > 1 {
                i as f64 / (filled - 1) as f64
            } else {
                0.0
            };
            Span::styled("█", Style::default().fg(gradient_color(t)))
        })
        .collect();

    spans.push(Span::styled(
        "░".repeat(width - filled),
        Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::raw(format!(" {:>3.0}%", ratio * 100.0)));
    Line::from(spans)
}

fn draw_ui(frame: &mut Frame, state: &UiState) {
    if let Some(error) = state.error() {
        let message = Paragraph::new(error.to_string())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false });
        frame.render_widget(message, frame.area());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Spinner + headline
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Bar
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Key hint
        ])
        .split(frame.area());

    let glyph_style = if state.is_complete() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(ACCENT)
    };
    let headline = Line::from(vec![
        Span::styled(state.glyph(), glyph_style),
        Span::raw(" "),
        Span::raw(state.headline()),
    ]);
    frame.render_widget(Paragraph::new(headline), chunks[0]);

    let width = chunks[2].width.saturating_sub(LABEL_WIDTH) as usize;
    frame.render_widget(Paragraph::new(gradient_bar(state.display_ratio(), width)), chunks[2]);

    if state.is_running() {
        let hint = Paragraph::new(" q: quit").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, chunks[4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CopyRequest, CopyStats};
    use crate::error::CopyError;
    use ratatui::backend::TestBackend;

    fn state() -> UiState {
        UiState::new(&CopyRequest::new("in.bin", "out.bin"))
    }

    fn render(state: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, VIEWPORT_HEIGHT)).unwrap();
        terminal.draw(|frame| draw_ui(frame, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_quit_keys() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);
        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Enter, KeyModifiers::NONE)));

        let mut release = press(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&release));
    }

    #[test]
    fn test_draw_running_frame() {
        let mut s = state();
        s.update(UiMessage::Progress(0.5));
        let text = render(&s);

        assert!(text.contains("Copying in.bin to out.bin..."));
        assert!(text.contains(s.spinner().glyph()));
        assert!(text.contains("50%"));
        assert!(text.contains("q: quit"));
    }

    #[test]
    fn test_draw_completed_frame() {
        let mut s = state();
        s.update(UiMessage::Progress(1.0));
        s.update(UiMessage::Finished(Ok(CopyStats::default())));
        let text = render(&s);

        assert!(text.contains("Copied in.bin to out.bin"));
        assert!(text.contains(crate::progress::DONE_GLYPH));
        assert!(text.contains("100%"));
        assert!(!text.contains("q: quit"));
    }

    #[test]
    fn test_draw_error_frame() {
        let mut s = state();
        s.update(UiMessage::Progress(0.5));
        s.update(UiMessage::Finished(Err(CopyError::invalid_source(
            "in.bin",
            "is a directory",
        ))));
        let text = render(&s);

        assert!(text.contains("invalid source 'in.bin': is a directory"));
        assert!(!text.contains("Copying"));
        assert!(!text.contains("50%"));
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(gradient_color(0.0), Color::Rgb(0xFF, 0x7C, 0xCB));
        assert_eq!(gradient_color(1.0), Color::Rgb(0xFD, 0xFF, 0x8C));
        assert_eq!(gradient_color(-3.0), gradient_color(0.0));
        assert_eq!(gradient_color(0.5), Color::Rgb(0xFE, 0xBE, 0xAC));
    }

    #[test]
    fn test_full_bar_spans_gradient() {
        let mut s = state();
        s.update(UiMessage::Progress(1.0));
        let mut terminal = Terminal::new(TestBackend::new(60, VIEWPORT_HEIGHT)).unwrap();
        terminal.draw(|frame| draw_ui(frame, &s)).unwrap();
        let buffer = terminal.backend().buffer();

        let last: u16 = 60 - LABEL_WIDTH - 1;
        assert_eq!(buffer[(0u16, 2u16)].symbol(), "█");
        assert_eq!(buffer[(0u16, 2u16)].fg, gradient_color(0.0));
        assert_eq!(buffer[(last, 2u16)].symbol(), "█");
        assert_eq!(buffer[(last, 2u16)].fg, gradient_color(1.0));
        assert_eq!(buffer[(last + 1, 2u16)].symbol(), " ");
    }

    #[test]
    fn test_partial_bar_is_padded() {
        let line = gradient_bar(0.5, 10);
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "█████░░░░░  50%");
    }

    #[test]
    fn test_draw_survives_out_of_range_progress() {
        let mut s = state();
        s.update(UiMessage::Progress(3.0));
        let text = render(&s);
        assert!(text.contains("100%"));
    }
}
