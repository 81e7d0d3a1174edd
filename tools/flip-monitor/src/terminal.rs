//! Full-screen renderer on ratatui + crossterm

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use flip_clock::{Face, FlipError, Layout, Renderer};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout as Split};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use tokio::sync::mpsc;

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub card: Color,
    pub digit: Color,
    pub flipping: Color,
    pub heading: Color,
}

const DARK: Palette = Palette {
    background: Color::Black,
    card: Color::DarkGray,
    digit: Color::White,
    flipping: Color::Yellow,
    heading: Color::Gray,
};

const LIGHT: Palette = Palette {
    background: Color::White,
    card: Color::Gray,
    digit: Color::Black,
    flipping: Color::Blue,
    heading: Color::DarkGray,
};

impl Palette {
    /// Unknown themes get the dark palette
    pub fn for_theme(theme: &str) -> Self {
        match theme {
            "light" => LIGHT,
            _ => DARK,
        }
    }
}

/// Terminal columns taken by a group of `rotors` cards
pub fn group_width(rotors: usize) -> usize {
    (rotors * 4).saturating_sub(1)
}

/// Heading centered over a group, cut to fit
pub fn heading_cell(heading: &str, width: usize) -> String {
    let cut: String = heading.chars().take(width).collect();
    format!("{cut:^width$}")
}

fn render_error(err: io::Error) -> FlipError {
    FlipError::Render(format!("terminal: {err}"))
}

/// Is this key press a request to quit?
pub fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Poll the keyboard until a quit key arrives or `done` is set. Runs on a blocking thread.
pub fn watch_keys(quit: mpsc::Sender<()>, done: Arc<AtomicBool>) -> io::Result<()> {
    while !done.load(Ordering::Relaxed) {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if is_quit(&key) {
                    let _ = quit.blocking_send(());
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

/// Draws the rotor grid in the alternate screen
pub struct TerminalRenderer {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    layout: Option<Layout>,
    palette: Palette,
    caption: String,
    top: Vec<char>,
    rear: Vec<char>,
    flipped: Vec<bool>,
}

impl TerminalRenderer {
    pub fn new(caption: String) -> Self {
        Self {
            terminal: None,
            layout: None,
            palette: DARK,
            caption,
            top: Vec::new(),
            rear: Vec::new(),
            flipped: Vec::new(),
        }
    }
}

impl Renderer for TerminalRenderer {
    fn mount(&mut self, layout: &Layout) -> Result<(), FlipError> {
        let count = layout.rotor_count();
        self.top = vec!['0'; count];
        self.rear = vec!['0'; count];
        self.flipped = vec![false; count];
        self.palette = Palette::for_theme(&layout.theme);
        self.layout = Some(layout.clone());

        enable_raw_mode().map_err(render_error)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide).map_err(render_error)?;
        self.terminal = Some(Terminal::new(CrosstermBackend::new(stdout)).map_err(render_error)?);
        Ok(())
    }

    fn set_face(&mut self, position: usize, face: Face, digit: char) {
        let row = match face {
            Face::Top => &mut self.top,
            Face::Rear => &mut self.rear,
            Face::Front | Face::Bottom => return,
        };
        if let Some(slot) = row.get_mut(position) {
            *slot = digit;
        }
    }

    fn set_flipped(&mut self, position: usize, flipped: bool) {
        if let Some(marker) = self.flipped.get_mut(position) {
            *marker = flipped;
        }
    }

    fn present(&mut self) -> Result<(), FlipError> {
        let Self { terminal, layout, palette, caption, top, rear, flipped } = self;
        let (Some(terminal), Some(layout)) = (terminal.as_mut(), layout.as_ref()) else {
            return Ok(());
        };
        let palette = *palette;

        let mut headings = Vec::new();
        let mut digits = Vec::new();
        for (i, group) in layout.groups.iter().enumerate() {
            if i > 0 {
                headings.push(Span::raw("   "));
                digits.push(Span::raw("   "));
            }
            let width = group_width(group.positions.len());
            headings.push(Span::styled(
                heading_cell(&group.heading, width),
                Style::default().fg(palette.heading),
            ));
            for (n, position) in group.positions.clone().enumerate() {
                if n > 0 {
                    digits.push(Span::raw(" "));
                }
                let is_flipped = flipped.get(position).copied().unwrap_or(false);
                let (digit, fg) = if is_flipped {
                    (rear.get(position).copied().unwrap_or('0'), palette.flipping)
                } else {
                    (top.get(position).copied().unwrap_or('0'), palette.digit)
                };
                digits.push(Span::styled(
                    format!(" {digit} "),
                    Style::default().fg(fg).bg(palette.card).add_modifier(Modifier::BOLD),
                ));
            }
        }

        let lines = vec![
            Line::from(headings),
            Line::from(""),
            Line::from(digits),
            Line::from(""),
            Line::from(Span::styled(caption.clone(), Style::default().fg(palette.heading))),
        ];
        let title = format!(" {} · {} ", layout.target, layout.theme);

        terminal.draw(|frame| {
            let area = frame.size();
            let rows = Split::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(35), Constraint::Length(7), Constraint::Min(0)])
                .split(area);

            frame.render_widget(
                Block::default().style(Style::default().bg(palette.background)),
                area,
            );
            let clock = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(clock, rows[1]);
        })
        .map_err(render_error)?;
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(mut terminal) = self.terminal.take() {
            let restored = disable_raw_mode()
                .and_then(|_| execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show));
            if let Err(e) = restored {
                tracing::warn!("Failed to restore terminal: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_theme_falls_back_to_dark() {
        assert_eq!(Palette::for_theme("light"), LIGHT);
        assert_eq!(Palette::for_theme("dark"), DARK);
        assert_eq!(Palette::for_theme("sepia"), DARK);
    }

    #[test]
    fn test_heading_cell_fits_group() {
        assert_eq!(group_width(3), 11);
        assert_eq!(group_width(1), 3);
        assert_eq!(heading_cell("Days", 11), "   Days    ");
        assert_eq!(heading_cell("Years", 3), "Yea");
    }

    #[test]
    fn test_terminal_failures_reported_as_render_errors() {
        let err = render_error(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(matches!(&err, FlipError::Render(msg) if msg.contains("closed")));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
    }
}
