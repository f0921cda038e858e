pub mod components;
pub mod format;
pub mod view;
pub mod views;

use crate::app::{App, Mode};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  draw_header(frame, chunks[0], app);
  app.render_current_view(frame, chunks[1]);
  draw_status_bar(frame, chunks[2], app);

  if *app.mode() == Mode::Command {
    draw_command_overlay(frame, chunks[1], app);
  }
}

/// Header bar: logo, workspace, breadcrumb, and the running timer
fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
  let mut spans = vec![
    Span::styled(" m9s ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", app.display_title()),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", app.breadcrumb()),
      Style::default().fg(Color::Yellow).bold(),
    ),
  ];

  // The locally extrapolated timer; no network involved per frame
  if let Some(elapsed) = app.timer_elapsed() {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" ⏱ {} ", format::format_timer(elapsed)),
      Style::default().fg(Color::Green).bold(),
    ));
  }

  spans.push(Span::raw("  "));
  spans.push(Span::styled("<:>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" command", Style::default().fg(Color::DarkGray)));
  spans.push(Span::raw("   "));
  spans.push(Span::styled("<q>", Style::default().fg(Color::Cyan)));
  spans.push(Span::styled(" back", Style::default().fg(Color::DarkGray)));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.mode() {
    Mode::Normal => {
      let hint = " :command  /search  j/k:nav  Enter:select  q:back  Ctrl-C:quit";
      (hint.to_string(), Style::default().fg(Color::DarkGray))
    }
    Mode::Command => {
      let cmd = format!(":{}", app.command_input());
      (cmd, Style::default().fg(Color::Yellow))
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

/// Autocomplete suggestions for the command palette
fn draw_command_overlay(frame: &mut Frame, area: Rect, app: &App) {
  let suggestions = app.autocomplete_suggestions();
  if suggestions.is_empty() {
    return;
  }

  let width = (area.width * 50 / 100).clamp(30, 50);
  let height = (suggestions.len() as u16 + 2).min(area.height);
  let x = area.x + 1;
  let y = area.y + area.height.saturating_sub(height);
  let overlay_area = Rect::new(x, y, width, height);

  frame.render_widget(Clear, overlay_area);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(" Command ");
  let inner = block.inner(overlay_area);
  frame.render_widget(block, overlay_area);

  let lines: Vec<Line> = suggestions
    .iter()
    .enumerate()
    .take(inner.height as usize)
    .map(|(i, cmd)| {
      let selected = i == app.selected_suggestion();
      let style = if selected {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default()
      };
      Line::from(vec![
        Span::styled(format!("{:<14}", cmd.name), style),
        Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
      ])
    })
    .collect();

  frame.render_widget(Paragraph::new(lines), inner);
}

/// Clamp a list selection into bounds after the underlying data changed
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    None if len > 0 => state.select(Some(0)),
    Some(_) if len == 0 => state.select(None),
    Some(selected) if selected >= len => state.select(Some(len - 1)),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_starts_at_zero() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn test_selection_clamps_after_shrink() {
    let mut state = ListState::default();
    state.select(Some(5));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));
  }

  #[test]
  fn test_selection_clears_when_empty() {
    let mut state = ListState::default();
    state.select(Some(1));
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
