use crate::midday::api_types::SearchResult;
use crate::midday::cached_client::CachedMiddayClient;
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::format::{amount_color, format_amount, truncate};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Cross-entity search over the whole workspace.
///
/// Every hit carries its kind tag, so the list mixes transactions,
/// invoices, customers, inbox items and vault documents in one ranking.
pub struct GlobalSearchView {
  client: CachedMiddayClient,
  term: String,
  query: Query<Vec<SearchResult>>,
  list_state: ListState,
  search: SearchInput,
}

impl GlobalSearchView {
  pub fn new(client: CachedMiddayClient) -> Self {
    let query = Self::build_query(client.clone(), None);
    let mut search = SearchInput::new();
    search.activate();
    Self {
      client,
      term: String::new(),
      query,
      list_state: ListState::default(),
      search,
    }
  }

  fn build_query(client: CachedMiddayClient, term: Option<String>) -> Query<Vec<SearchResult>> {
    let mut query = Query::new(move || {
      let client = client.clone();
      let term = term.clone();
      async move { client.global_search(term).await }
    });
    query.fetch();
    query
  }

  fn results(&self) -> &[SearchResult] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn result_line(result: &SearchResult) -> Line<'static> {
    let kind = |label: &'static str, color: Color| {
      Span::styled(format!("{:<12}", label), Style::default().fg(color))
    };
    match result {
      SearchResult::Transaction { data } => Line::from(vec![
        kind("transaction", Color::Yellow),
        Span::raw(format!("{:<40}", truncate(&data.name, 38))),
        Span::styled(
          format!("{:>14}", format_amount(data.amount, &data.currency)),
          Style::default().fg(amount_color(data.amount)),
        ),
      ]),
      SearchResult::Invoice { data } => Line::from(vec![
        kind("invoice", Color::Magenta),
        Span::raw(format!(
          "{:<40}",
          truncate(
            data
              .invoice_number
              .as_deref()
              .or(data.customer_name.as_deref())
              .unwrap_or("-"),
            38
          )
        )),
        Span::raw(format!(
          "{:>14}",
          format_amount(data.amount, &data.currency)
        )),
      ]),
      SearchResult::Customer { data } => Line::from(vec![
        kind("customer", Color::Cyan),
        Span::raw(format!("{:<40}", truncate(&data.name, 38))),
        Span::styled(
          data.email.as_deref().unwrap_or("-").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
      SearchResult::Vault { data } => Line::from(vec![
        kind("vault", Color::Blue),
        Span::raw(format!(
          "{:<40}",
          truncate(if data.title.is_empty() { &data.name } else { &data.title }, 38)
        )),
        Span::styled(
          data.path_tokens.join("/"),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
      SearchResult::Inbox { data } => Line::from(vec![
        kind("inbox", Color::Green),
        Span::raw(format!(
          "{:<40}",
          truncate(data.file_name.as_deref().unwrap_or("-"), 38)
        )),
        Span::styled(
          data.date.as_deref().unwrap_or("-").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.results().len();
    ensure_valid_selection(&mut self.list_state, len);

    let scope = if self.term.is_empty() {
      " Search ".to_string()
    } else {
      format!(" Search /{} ", self.term)
    };
    let title = match self.query.state() {
      QueryState::Loading => format!("{}(loading...) ", scope),
      QueryState::Error(e) => format!("{}(error: {}) ", scope, e),
      _ => format!("{}({}) ", scope, len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.results().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Search failed. Press 'r' to retry."
      } else {
        "No results. Press '/' to search."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .results()
      .iter()
      .map(|result| ListItem::new(Self::result_line(result)))
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

impl View for GlobalSearchView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Submitted(term)) => {
        self.term = term.trim().to_string();
        let term = if self.term.is_empty() {
          None
        } else {
          Some(self.term.clone())
        };
        self.query = Self::build_query(self.client.clone(), term);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Changed(_)) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

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
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    if self.term.is_empty() {
      "Search".to_string()
    } else {
      format!("Search /{}", self.term)
    }
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
