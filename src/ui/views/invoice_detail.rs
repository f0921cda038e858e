use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::Invoice;
use crate::query::{Query, QueryState};
use crate::ui::format::{format_amount, invoice_status_color};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// View for a single invoice
pub struct InvoiceDetailView {
  id: String,
  query: Query<Invoice>,
}

impl InvoiceDetailView {
  pub fn new(id: String, client: CachedMiddayClient) -> Self {
    let invoice_id = id.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      let id = invoice_id.clone();
      async move { client.invoice(id).await }
    });
    query.fetch();

    Self { id, query }
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => " Invoice (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Invoice (error: {}) ", e),
      _ => " Invoice ".to_string(),
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
        Paragraph::new("Loading invoice...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    if let Some(error) = self.query.error() {
      let paragraph = Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", error))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let invoice = match self.query.data() {
      Some(invoice) => invoice,
      None => return,
    };

    let lines = vec![
      Line::from(vec![
        Span::styled("Number:   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          invoice.invoice_number.as_deref().unwrap_or("-"),
          Style::default().fg(Color::Cyan),
        ),
      ]),
      Line::from(vec![
        Span::styled("Status:   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          invoice.status.as_str(),
          Style::default().fg(invoice_status_color(&invoice.status)),
        ),
      ]),
      Line::from(vec![
        Span::styled("Customer: ", Style::default().fg(Color::DarkGray)),
        Span::raw(invoice.customer_name.as_deref().unwrap_or("-")),
      ]),
      Line::from(vec![
        Span::styled("Amount:   ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          format_amount(invoice.amount, &invoice.currency),
          Style::default().bold(),
        ),
      ]),
      Line::from(vec![
        Span::styled("Due:      ", Style::default().fg(Color::DarkGray)),
        Span::raw(invoice.due_date.as_deref().unwrap_or("-")),
      ]),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
  }
}

impl View for InvoiceDetailView {
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
      .and_then(|i| i.invoice_number.clone())
      .unwrap_or_else(|| self.id.clone())
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
