use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::Invoice;
use crate::query::{Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::format::{format_amount, invoice_status_color, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::InvoiceDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for browsing invoices
pub struct InvoiceListView {
  client: CachedMiddayClient,
  query: Query<Vec<Invoice>>,
  list_state: ListState,
}

impl InvoiceListView {
  pub fn new(client: CachedMiddayClient) -> Self {
    let query_client = client.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      async move { client.invoices().await }
    });
    query.fetch();

    Self {
      client,
      query,
      list_state: ListState::default(),
    }
  }

  fn invoices(&self) -> &[Invoice] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.invoices().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Invoices (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Invoices (error: {}) ", e),
      _ => format!(" Invoices ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.invoices().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load invoices. Press 'r' to retry."
      } else {
        "No invoices found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .invoices()
      .iter()
      .map(|invoice| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<12}", invoice.invoice_number.as_deref().unwrap_or("-")),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            format!("{:<10}", truncate(&invoice.status, 10)),
            Style::default().fg(invoice_status_color(&invoice.status)),
          ),
          Span::raw(format!(
            "{:<32}",
            truncate(invoice.customer_name.as_deref().unwrap_or("-"), 30)
          )),
          Span::styled(
            format!("{:<12}", invoice.due_date.as_deref().unwrap_or("-")),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(format!(
            "{:>14}",
            format_amount(invoice.amount, &invoice.currency)
          )),
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

impl View for InvoiceListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(invoice) = self.invoices().get(idx) {
            return ViewAction::Push(Box::new(InvoiceDetailView::new(
              invoice.id.clone(),
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
  }

  fn breadcrumb_label(&self) -> String {
    "Invoices".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
