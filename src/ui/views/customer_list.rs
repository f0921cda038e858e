use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::Customer;
use crate::query::{Mutation, MutationState, Query, QueryState};
use crate::ui::ensure_valid_selection;
use crate::ui::format::truncate;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::CustomerFormView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for managing customers: browse, create, edit, delete
pub struct CustomerListView {
  client: CachedMiddayClient,
  query: Query<Vec<Customer>>,
  list_state: ListState,
  /// Customer id pending a `y` delete confirmation
  confirm_delete: Option<String>,
  delete: Mutation<Customer>,
}

impl CustomerListView {
  pub fn new(client: CachedMiddayClient) -> Self {
    let query_client = client.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      async move { client.customers().await }
    });
    query.fetch();

    Self {
      client,
      query,
      list_state: ListState::default(),
      confirm_delete: None,
      delete: Mutation::new(),
    }
  }

  fn customers(&self) -> &[Customer] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_customer(&self) -> Option<&Customer> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.customers().get(idx))
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.customers().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Customers (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Customers (error: {}) ", e),
      _ => format!(" Customers ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.customers().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load customers. Press 'r' to retry."
      } else {
        "No customers yet. Press 'n' to create one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .customers()
      .iter()
      .map(|customer| {
        let pending = self.confirm_delete.as_deref() == Some(customer.id.as_str());
        let name_style = if pending {
          Style::default().fg(Color::Red).bold()
        } else {
          Style::default()
        };
        let location = match (&customer.city, &customer.country) {
          (Some(city), Some(country)) => format!("{}, {}", city, country),
          (Some(city), None) => city.clone(),
          (None, Some(country)) => country.clone(),
          (None, None) => "-".to_string(),
        };
        let line = Line::from(vec![
          Span::styled(format!("{:<32}", truncate(&customer.name, 30)), name_style),
          Span::styled(
            format!("{:<32}", customer.email.as_deref().unwrap_or("-")),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(location, Style::default().fg(Color::DarkGray)),
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

    if self.confirm_delete.is_some() {
      let hint = Paragraph::new(" delete customer? y:confirm  any other key:cancel ")
        .style(Style::default().fg(Color::Red));
      let hint_area = Rect::new(area.x + 1, area.y + area.height.saturating_sub(1), 60, 1);
      frame.render_widget(hint, hint_area.intersection(area));
    }
  }
}

impl View for CustomerListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(id) = self.confirm_delete.take() {
      if key.code == KeyCode::Char('y') {
        let client = self.client.clone();
        self
          .delete
          .mutate(async move { client.delete_customer(&id).await });
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('n') => {
        return ViewAction::Push(Box::new(CustomerFormView::create(self.client.clone())));
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(customer) = self.selected_customer() {
          return ViewAction::Push(Box::new(CustomerFormView::edit(
            self.client.clone(),
            customer.clone(),
          )));
        }
      }
      KeyCode::Char('d') => {
        if let Some(customer) = self.selected_customer() {
          self.confirm_delete = Some(customer.id.clone());
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
    "Customers".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
    if self.delete.poll() {
      match self.delete.state() {
        // The mutation invalidated the cached list; refetch shows it
        MutationState::Success(_) => self.query.refetch(),
        MutationState::Error(e) => tracing::warn!(error = %e, "customer delete failed"),
        _ => {}
      }
      self.delete.reset();
    }
  }
}
