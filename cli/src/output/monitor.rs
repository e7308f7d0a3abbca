//! Full-screen status monitor.
//!
//! Redraws the registry snapshot on a fixed cadence and reads keys through
//! crossterm's `EventStream`, so neither side blocks the other. Leaving the
//! monitor never cancels workers.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures_util::StreamExt;
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;

use crate::application::StatusRegistry;
use crate::domain::{HostStatus, Tone};

const TITLE: &str = "Fleet Status Monitor";
const HELP: &str = "Press 'q' to quit, 'c' to collect logs";

/// Requests the monitor sends back to the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    CollectLogs,
}

/// How the monitor loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// Operator pressed `q` or `Esc`.
    Quit,
    /// Operator pressed Ctrl-C; the caller should exit the process.
    Interrupted,
    /// Input stream closed.
    InputClosed,
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    CollectLogs,
    Interrupt,
    None,
}

/// Map a key event to an action. Releases and repeats are ignored.
#[must_use]
pub fn key_action(key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Interrupt,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c' | 'C') => KeyAction::CollectLogs,
        _ => KeyAction::None,
    }
}

#[must_use]
pub fn tone_style(tone: Tone) -> Style {
    let color = match tone {
        Tone::Success => Color::Green,
        Tone::Failure => Color::Red,
        Tone::Pending => Color::Yellow,
    };
    Style::default().fg(color)
}

/// Draw one frame of the monitor.
pub fn render(frame: &mut Frame, snapshot: &[(String, HostStatus)]) {
    let mut lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(HELP),
        Line::default(),
    ];
    for (host, status) in snapshot {
        lines.push(Line::from(Span::styled(
            format!("{host}: {}", status.label()),
            tone_style(status.phase.tone()),
        )));
        for output in status.output.lines() {
            lines.push(Line::from(Span::styled(
                format!("  {output}"),
                Style::default().add_modifier(Modifier::BOLD),
            )));
        }
    }
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        frame.area(),
    );
}

/// Restores the terminal on drop, including on early return or panic unwind.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("cannot enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e).context("cannot enter alternate screen");
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))
            .context("cannot initialize terminal")?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the monitor until the operator quits.
///
/// `c` sends one `CollectLogs` request per run; later presses are ignored.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up or drawn.
pub async fn run(
    registry: Arc<StatusRegistry>,
    refresh: Duration,
    commands: UnboundedSender<MonitorCommand>,
) -> Result<MonitorExit> {
    let mut guard = TerminalGuard::enter()?;
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(refresh);
    let mut collect_requested = false;

    loop {
        let snapshot = registry.snapshot_all();
        guard
            .terminal
            .draw(|frame| render(frame, &snapshot))
            .context("cannot draw monitor")?;

        tokio::select! {
            _ = ticker.tick() => {}
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    return Ok(MonitorExit::InputClosed);
                };
                let Ok(Event::Key(key)) = event else {
                    continue;
                };
                match key_action(key) {
                    KeyAction::Quit => return Ok(MonitorExit::Quit),
                    KeyAction::Interrupt => return Ok(MonitorExit::Interrupted),
                    KeyAction::CollectLogs if !collect_requested => {
                        collect_requested = true;
                        if commands.send(MonitorCommand::CollectLogs).is_err() {
                            tracing::warn!("launcher gone; log collection request dropped");
                        }
                    }
                    KeyAction::CollectLogs | KeyAction::None => {}
                }
            }
        }
    }
}
