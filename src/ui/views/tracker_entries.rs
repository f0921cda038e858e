use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::TrackerEntry;
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::format::{format_hours, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::TrackerEntryFormView;
use chrono::{Duration, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Recent entries for one project, last 30 days
pub struct TrackerEntriesView {
  client: CachedMiddayClient,
  project_id: String,
  project_name: String,
  query: Query<Vec<TrackerEntry>>,
  list_state: ListState,
}

impl TrackerEntriesView {
  pub fn new(client: CachedMiddayClient, project_id: String, project_name: String) -> Self {
    let query = Self::build_query(client.clone(), project_id.clone());
    Self {
      client,
      project_id,
      project_name,
      query,
      list_state: ListState::default(),
    }
  }

  fn build_query(client: CachedMiddayClient, project_id: String) -> Query<Vec<TrackerEntry>> {
    let mut query = Query::new(move || {
      let client = client.clone();
      let project_id = project_id.clone();
      async move {
        let to = Utc::now().date_naive();
        let from = to - Duration::days(30);
        client.tracker_entries(from, to, project_id).await
      }
    });
    query.fetch();
    query
  }

  fn entries(&self) -> &[TrackerEntry] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.entries().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => format!(" {} entries (loading...) ", self.project_name),
      QueryState::Error(e) => format!(" {} entries (error: {}) ", self.project_name, e),
      _ => format!(" {} entries ({}) ", self.project_name, len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.entries().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load entries. Press 'r' to retry."
      } else {
        "No entries in the last 30 days. Press 'n' to log one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .entries()
      .iter()
      .map(|entry| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<12}", entry.date.as_deref().unwrap_or("-")),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(format!(
            "{:<48}",
            truncate(entry.description.as_deref().unwrap_or("(no description)"), 46)
          )),
          Span::styled(
            format!("{:>8}", format_hours(entry.duration)),
            Style::default().fg(Color::Cyan),
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

impl View for TrackerEntriesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('n') => {
        return ViewAction::Push(Box::new(TrackerEntryFormView::new(
          self.client.clone(),
          self.project_id.clone(),
          self.project_name.clone(),
        )));
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("{} entries", self.project_name)
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
