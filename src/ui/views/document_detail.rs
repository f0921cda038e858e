use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::Document;
use crate::query::{Query, QueryState};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// View for a single vault document
pub struct DocumentDetailView {
  id: String,
  query: Query<Document>,
}

impl DocumentDetailView {
  pub fn new(id: String, client: CachedMiddayClient) -> Self {
    let doc_id = id.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      let id = doc_id.clone();
      async move { client.document(id).await }
    });
    query.fetch();

    Self { id, query }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => " Document (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Document (error: {}) ", e),
      _ => " Document ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if self.query.is_loading() {
      let paragraph =
        Paragraph::new("Loading document...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    if let Some(error) = self.query.error() {
      let paragraph = Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", error))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let doc = match self.query.data() {
      Some(doc) => doc,
      None => return,
    };

    let size = doc
      .size
      .map(|bytes| format!("{:.1} KiB", bytes as f64 / 1024.0))
      .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
      Line::from(vec![
        Span::styled("Title: ", Style::default().fg(Color::DarkGray)),
        Span::raw(doc.title.as_deref().or(doc.name.as_deref()).unwrap_or("-")),
      ]),
      Line::from(vec![
        Span::styled("Type:  ", Style::default().fg(Color::DarkGray)),
        Span::raw(doc.mime_type.as_deref().unwrap_or("-")),
      ]),
      Line::from(vec![
        Span::styled("Size:  ", Style::default().fg(Color::DarkGray)),
        Span::raw(size),
      ]),
    ];

    if let Some(summary) = &doc.summary {
      lines.push(Line::raw(""));
      lines.push(Line::from(Span::raw(summary.as_str())));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
  }
}

impl View for DocumentDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self
      .query
      .data()
      .and_then(|d| d.title.clone().or_else(|| d.name.clone()))
      .unwrap_or_else(|| self.id.clone())
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
