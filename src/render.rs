use crossterm::{
    cursor,
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, Write};

use crate::panel::{Field, PanelState};

const FIELD_WIDTH: usize = 30;
const LABEL_WIDTH: usize = 16;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn setup(&self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(())
    }

    pub fn teardown(&self) -> io::Result<()> {
        execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn draw(&self, state: &PanelState) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let mid_row = rows / 2;
        let form_width = (LABEL_WIDTH + FIELD_WIDTH + 2) as u16;
        let left = cols.saturating_sub(form_width) / 2;

        let mut stdout = io::stdout();
        execute!(stdout, terminal::Clear(ClearType::All))?;

        // Title: bold, centered
        let title = "nudge";
        execute!(
            stdout,
            cursor::MoveTo(cols.saturating_sub(title.len() as u16) / 2, mid_row.saturating_sub(5)),
            SetForegroundColor(Color::White),
            SetAttribute(Attribute::Bold),
            Print(title),
            SetAttribute(Attribute::Reset),
            ResetColor,
        )?;

        let locked = state.is_active();
        let focused = |field: Field| !locked && state.focus == field;
        self.draw_field(left, mid_row.saturating_sub(3), "Task:", &state.task, focused(Field::Task), locked)?;
        self.draw_field(
            left,
            mid_row.saturating_sub(1),
            "Interval (sec):",
            &state.interval,
            focused(Field::Interval),
            locked,
        )?;

        // Status: green when active, red when idle
        let (status, active) = state.status_line();
        let status = if active {
            format!("{status} ({} sent)", state.fires)
        } else {
            status
        };
        execute!(
            stdout,
            cursor::MoveTo(cols.saturating_sub(status.len() as u16) / 2, mid_row + 1),
            SetForegroundColor(if active { Color::Green } else { Color::Red }),
            Print(&status),
            ResetColor,
        )?;

        if let Some(warning) = &state.warning {
            execute!(
                stdout,
                cursor::MoveTo(cols.saturating_sub(warning.len() as u16) / 2, mid_row + 3),
                SetForegroundColor(Color::Yellow),
                Print(warning),
                ResetColor,
            )?;
        }

        let hints = if active {
            "[esc] stop  [ctrl+c] quit"
        } else {
            "[tab] switch field  [enter] start  [esc] quit"
        };
        execute!(
            stdout,
            cursor::MoveTo(cols.saturating_sub(hints.len() as u16) / 2, mid_row + 5),
            SetForegroundColor(Color::DarkGrey),
            Print(hints),
            ResetColor,
        )?;

        stdout.flush()?;
        Ok(())
    }

    fn draw_field(
        &self,
        col: u16,
        row: u16,
        label: &str,
        value: &str,
        focused: bool,
        locked: bool,
    ) -> io::Result<()> {
        let shown = fit(value, FIELD_WIDTH);
        let color = if locked {
            Color::DarkGrey
        } else if focused {
            Color::Cyan
        } else {
            Color::White
        };

        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::MoveTo(col, row),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("{label:<LABEL_WIDTH$}")),
            SetForegroundColor(color),
            Print(format!("[{shown:<FIELD_WIDTH$}]")),
            ResetColor,
        )?;
        if focused {
            execute!(stdout, SetAttribute(Attribute::Bold), Print("<"), SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }
}

/// Last `width` characters of `value`, so the cursor end stays visible.
fn fit(value: &str, width: usize) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(width)).collect()
}
