use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::Spending;
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::format::{format_amount, truncate};
use crate::ui::view::{View, ViewAction};
use chrono::{Datelike, NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Spending by category, year to date
pub struct SpendingsView {
  query: Query<Vec<Spending>>,
  list_state: ListState,
}

impl SpendingsView {
  pub fn new(client: CachedMiddayClient) -> Self {
    let mut query = Query::new(move || {
      let client = client.clone();
      async move {
        let to = Utc::now().date_naive();
        // Jan 1 always exists
        let from = NaiveDate::from_ymd_opt(to.year(), 1, 1).unwrap_or(to);
        client.spendings(from, to).await
      }
    });
    query.fetch();

    Self {
      query,
      list_state: ListState::default(),
    }
  }

  fn spendings(&self) -> &[Spending] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.spendings().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Spendings YTD (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Spendings YTD (error: {}) ", e),
      _ => format!(" Spendings YTD ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.spendings().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load spendings. Press 'r' to retry."
      } else {
        "No spending recorded this year."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .spendings()
      .iter()
      .map(|spending| {
        let share = spending
          .percentage
          .map(|p| format!("{:>5.1}%", p))
          .unwrap_or_else(|| "     -".to_string());
        let line = Line::from(vec![
          Span::raw(format!("{:<36}", truncate(&spending.name, 34))),
          Span::styled(format!("{:<8}", share), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!(
              "{:>14}",
              format_amount(spending.amount, &spending.currency)
            ),
            Style::default().fg(Color::Red),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for SpendingsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Spendings".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
