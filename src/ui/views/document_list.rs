use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::Document;
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::format::truncate;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::DocumentDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for browsing vault documents, with `/` server-side search
pub struct DocumentListView {
  client: CachedMiddayClient,
  query: Query<Vec<Document>>,
  term: Option<String>,
  list_state: ListState,
  search: SearchInput,
}

impl DocumentListView {
  pub fn new(client: CachedMiddayClient) -> Self {
    let query = Self::build_query(client.clone(), None);
    Self {
      client,
      query,
      term: None,
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  fn build_query(client: CachedMiddayClient, term: Option<String>) -> Query<Vec<Document>> {
    let mut query = Query::new(move || {
      let client = client.clone();
      let term = term.clone();
      async move { client.documents(term).await }
    });
    query.fetch();
    query
  }

  fn documents(&self) -> &[Document] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.documents().len();
    ensure_valid_selection(&mut self.list_state, len);

    let scope = match &self.term {
      Some(term) => format!(" Vault /{} ", term),
      None => " Vault ".to_string(),
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

    if self.documents().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load documents. Press 'r' to retry."
      } else {
        "No documents found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .documents()
      .iter()
      .map(|doc| {
        let display_name = doc
          .title
          .as_deref()
          .or(doc.name.as_deref())
          .unwrap_or("(untitled)");
        let line = Line::from(vec![
          Span::raw(format!("{:<48}", truncate(display_name, 46))),
          Span::styled(
            format!("{:<24}", doc.mime_type.as_deref().unwrap_or("-")),
            Style::default().fg(Color::DarkGray),
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

impl View for DocumentListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Submitted(term)) => {
        let term = term.trim().to_string();
        self.term = if term.is_empty() { None } else { Some(term) };
        self.query = Self::build_query(self.client.clone(), self.term.clone());
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Changed(_)) => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(doc) = self.documents().get(idx) {
            return ViewAction::Push(Box::new(DocumentDetailView::new(
              doc.id.clone(),
              self.client.clone(),
            )));
          }
        }
      }
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
    "Vault".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
