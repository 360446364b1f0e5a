mod app;

use std::{
    io,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use color_eyre::Result;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use daybook_core::{clock::Clock, storage::KeyValueStore, view::DisplayMode};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

pub use app::App;
use app::Focus;

use crate::theme::Theme;

/// Interactive task list. Ctrl-C, or `q`/`Esc` from the list, exits.
pub fn launch<S: KeyValueStore, C: Clock>(mut app: App<S, C>) -> Result<()> {
    // Guard restores the terminal even if we early-return.
    let guard = TerminalGuard::enter()?;
    let mut terminal = guard.terminal()?;
    let mut last_second = Local::now().timestamp();

    loop {
        app.tick(Instant::now());

        let second = Local::now().timestamp();
        if second != last_second {
            app.watch_day();
        }
        if app.take_dirty() || second != last_second {
            last_second = second;
            terminal.draw(|frame| render(frame, &app))?;
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now())
                }
                Event::FocusGained => app.focus_gained(),
                Event::FocusLost => app.focus_lost(Instant::now()),
                Event::Resize(..) => app.mark_dirty(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Header clock, e.g. `Friday, October 16, 2026 09:41:07 AM`.
pub fn format_clock(now: DateTime<Local>) -> String {
    now.format("%A, %B %-d, %Y %I:%M:%S %p").to_string()
}

struct Palette {
    base: Style,
    accent: Color,
    muted: Color,
    done: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            base: Style::default().fg(Color::Black).bg(Color::White),
            accent: Color::Blue,
            muted: Color::DarkGray,
            done: Color::Green,
        },
        Theme::Dark => Palette {
            base: Style::default().fg(Color::White).bg(Color::Black),
            accent: Color::Cyan,
            muted: Color::Gray,
            done: Color::LightGreen,
        },
    }
}

fn render<S: KeyValueStore, C: Clock>(frame: &mut Frame, app: &App<S, C>) {
    let colors = palette(app.theme);
    frame.render_widget(Block::default().style(colors.base), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Daybook",
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(format_clock(Local::now())),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    frame.render_widget(header, chunks[0]);

    let input_style = if app.focus == Focus::Input {
        Style::default().fg(colors.accent)
    } else {
        Style::default().fg(colors.muted)
    };
    let input = Paragraph::new(Line::from(vec![
        Span::raw(app.input.as_str()),
        Span::styled("_", Style::default().fg(colors.muted)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(input_style)
            .title(format!("New task [{}] (Up/Down: category)", app.category())),
    );
    frame.render_widget(input, chunks[1]);

    render_tasks(frame, app, &colors, chunks[2]);

    let counts = app.tasks.view().counts;
    let stats = Paragraph::new(Line::from(vec![
        Span::raw(format!("Total {}", counts.total)),
        Span::raw("   "),
        Span::styled(
            format!("Completed {}", counts.completed),
            Style::default().fg(colors.done),
        ),
        Span::raw("   "),
        Span::raw(format!("Pending {}", counts.pending)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Stats"));
    frame.render_widget(stats, chunks[3]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        "Tab focus  Space toggle  e edit  d delete  c clear done  C clear all  f filter  t theme  q quit",
        Style::default().fg(colors.muted),
    )]))
    .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    if let Some(confirm) = &app.confirm {
        let area = centered(frame.area(), 50, 5);
        frame.render_widget(Clear, area);
        let dialog = Paragraph::new(vec![
            Line::from(confirm.prompt()),
            Line::from(Span::styled("y / n", Style::default().fg(colors.accent))),
        ])
        .style(colors.base)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Confirm"),
        );
        frame.render_widget(dialog, area);
    }
}

fn render_tasks<S: KeyValueStore, C: Clock>(
    frame: &mut Frame,
    app: &App<S, C>,
    colors: &Palette,
    area: Rect,
) {
    let view = app.tasks.view();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if app.focus == Focus::List {
            Style::default().fg(colors.accent)
        } else {
            Style::default().fg(colors.muted)
        })
        .title(format!("Tasks [{}] (f: filter)", app.filter_label()));

    if view.mode == DisplayMode::Empty {
        let placeholder = Paragraph::new("No tasks here yet. Add one above.")
            .style(Style::default().fg(colors.muted))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| {
            let task = row.task;
            let checkbox = if task.completed { "[x] " } else { "[ ] " };
            let text = if row.editing {
                Span::styled(
                    format!("{}_", app.edit_buffer),
                    Style::default()
                        .fg(colors.accent)
                        .add_modifier(Modifier::UNDERLINED),
                )
            } else if task.completed {
                Span::styled(
                    task.text.as_str(),
                    Style::default()
                        .fg(colors.done)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                Span::raw(task.text.as_str())
            };
            ListItem::new(Line::from(vec![
                Span::styled(checkbox, Style::default().fg(colors.done)),
                text,
                Span::raw("  "),
                Span::styled(
                    format!("#{}", task.category),
                    Style::default().fg(colors.muted),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if app.focus == Focus::List {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        // Focus events drive the daily reset check and edit blur.
        execute!(io::stdout(), EnterAlternateScreen, EnableFocusChange)?;
        Ok(Self)
    }

    fn terminal(&self) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(Terminal::new(backend)?)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup; errors are logged but not propagated from Drop.
        if let Err(err) = disable_raw_mode() {
            eprintln!("failed to disable raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen) {
            eprintln!("failed to restore terminal: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn clock_uses_long_twelve_hour_format() {
        let now = Local
            .with_ymd_and_hms(2026, 10, 16, 21, 5, 9)
            .single()
            .expect("unambiguous local time");
        assert_eq!(format_clock(now), "Friday, October 16, 2026 09:05:09 PM");
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered(area, 50, 5);
        assert_eq!(rect.width, 40);
        assert_eq!(rect.y, 2);
    }
}
