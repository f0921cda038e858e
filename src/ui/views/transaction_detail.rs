use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::{AttachmentUrl, Transaction};
use crate::query::{Mutation, MutationState, Query, QueryState};
use crate::ui::format::{amount_color, format_amount};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// View for a single transaction, including its attached receipts.
pub struct TransactionDetailView {
  id: String,
  client: CachedMiddayClient,
  query: Query<Transaction>,
  selected_attachment: usize,
  /// Pre-signed link fetch for the selected attachment; the id it was
  /// requested for, so a stale link is never shown under another row.
  link: Mutation<AttachmentUrl>,
  link_for: Option<String>,
}

impl TransactionDetailView {
  pub fn new(id: String, client: CachedMiddayClient) -> Self {
    let tx_id = id.clone();
    let query_client = client.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      let id = tx_id.clone();
      async move { client.transaction(id).await }
    });
    query.fetch();

    Self {
      id,
      client,
      query,
      selected_attachment: 0,
      link: Mutation::new(),
      link_for: None,
    }
  }

  fn attachment_count(&self) -> usize {
    self.query.data().map(|tx| tx.attachments.len()).unwrap_or(0)
  }

  fn select_next_attachment(&mut self) {
    let count = self.attachment_count();
    if count > 0 {
      self.selected_attachment = (self.selected_attachment + 1) % count;
    }
  }

  fn fetch_selected_link(&mut self) {
    let attachment_id = match self
      .query
      .data()
      .and_then(|tx| tx.attachments.get(self.selected_attachment))
    {
      Some(attachment) => attachment.id.clone(),
      None => return,
    };

    let client = self.client.clone();
    let tx_id = self.id.clone();
    let id = attachment_id.clone();
    self.link_for = Some(attachment_id);
    self
      .link
      .mutate(async move { client.transaction_attachment_url(&tx_id, &id).await });
  }

  fn attachment_lines(&self, tx: &Transaction) -> Vec<Line<'static>> {
    let mut lines = vec![
      Line::raw(""),
      Line::from(Span::styled(
        format!("Attachments ({})", tx.attachments.len()),
        Style::default().fg(Color::DarkGray),
      )),
    ];

    for (i, attachment) in tx.attachments.iter().enumerate() {
      let selected = i == self.selected_attachment;
      let marker = if selected { "▸ " } else { "  " };
      let style = if selected {
        Style::default().fg(Color::Yellow)
      } else {
        Style::default()
      };
      lines.push(Line::from(Span::styled(
        format!("{}{}", marker, attachment.label()),
        style,
      )));

      if selected && self.link_for.as_deref() == Some(attachment.id.as_str()) {
        match self.link.state() {
          MutationState::Pending => lines.push(Line::from(Span::styled(
            "    fetching link...".to_string(),
            Style::default().fg(Color::DarkGray),
          ))),
          MutationState::Success(link) => lines.push(Line::from(Span::styled(
            format!("    {}", link.url),
            Style::default().fg(Color::Cyan),
          ))),
          MutationState::Error(e) => lines.push(Line::from(Span::styled(
            format!("    link failed: {}", e),
            Style::default().fg(Color::Red),
          ))),
          MutationState::Idle => {}
        }
      }
    }

    lines.push(Line::from(Span::styled(
      "  <Tab> next  <o> get link".to_string(),
      Style::default().fg(Color::DarkGray),
    )));
    lines
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => " Transaction (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Transaction (error: {}) ", e),
      _ => " Transaction ".to_string(),
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
        Paragraph::new("Loading transaction...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    if let Some(error) = self.query.error() {
      let paragraph = Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", error))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let tx = match self.query.data() {
      Some(tx) => tx,
      None => return,
    };

    let category = tx
      .category
      .as_ref()
      .map(|c| c.name.as_str())
      .unwrap_or("Uncategorized");

    let mut lines = vec![
      Line::from(vec![
        Span::styled("Name:     ", Style::default().fg(Color::DarkGray)),
        Span::raw(&tx.name),
      ]),
      Line::from(vec![
        Span::styled("Amount:   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          format_amount(tx.amount, &tx.currency),
          Style::default().fg(amount_color(tx.amount)).bold(),
        ),
      ]),
      Line::from(vec![
        Span::styled("Date:     ", Style::default().fg(Color::DarkGray)),
        Span::raw(tx.date.as_deref().unwrap_or("-")),
      ]),
      Line::from(vec![
        Span::styled("Category: ", Style::default().fg(Color::DarkGray)),
        Span::styled(category, Style::default().fg(Color::Cyan)),
      ]),
      Line::from(vec![
        Span::styled("Method:   ", Style::default().fg(Color::DarkGray)),
        Span::raw(tx.method.as_deref().unwrap_or("-")),
      ]),
      Line::from(vec![
        Span::styled("Status:   ", Style::default().fg(Color::DarkGray)),
        Span::raw(tx.status.as_deref().unwrap_or("-")),
      ]),
    ];

    if let Some(description) = &tx.description {
      lines.push(Line::raw(""));
      lines.push(Line::from(Span::raw(description.as_str())));
    }

    if !tx.attachments.is_empty() {
      lines.extend(self.attachment_lines(tx));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
  }
}

impl View for TransactionDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.link.reset();
        self.link_for = None;
        self.query.refetch();
        ViewAction::None
      }
      KeyCode::Tab => {
        self.select_next_attachment();
        ViewAction::None
      }
      KeyCode::Char('o') => {
        self.fetch_selected_link();
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
      .map(|tx| tx.name.clone())
      .unwrap_or_else(|| self.id.clone())
  }

  fn tick(&mut self) {
    self.query.poll();
    self.link.poll();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::TokenStore;
  use crate::cache::{CacheLayer, CachePolicy};
  use crate::config::Config;
  use crate::midday::client::MiddayClient;

  fn view() -> TransactionDetailView {
    let config = Config::default();
    let inner = MiddayClient::new(&config, TokenStore::new()).unwrap();
    let client = CachedMiddayClient::new(inner, CacheLayer::new(CachePolicy::default()));
    TransactionDetailView::new("t1".into(), client)
  }

  #[tokio::test]
  async fn attachment_keys_are_inert_without_data() {
    let mut view = view();
    // No transaction loaded yet; Tab and 'o' must not panic or start
    // a link fetch.
    view.select_next_attachment();
    view.fetch_selected_link();
    assert_eq!(view.selected_attachment, 0);
    assert!(view.link_for.is_none());
    assert!(matches!(view.link.state(), MutationState::Idle));
  }
}
