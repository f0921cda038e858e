use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::{Customer, CustomerPayload};
use crate::query::{Mutation, MutationState};
use crate::ui::components::{Form, FormField, FormResult};
use crate::ui::view::{View, ViewAction};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

enum FormMode {
  Create,
  Edit(String),
}

/// Form for creating or editing a customer.
///
/// Validation runs before the mutation, so an empty required field
/// never produces a network call.
pub struct CustomerFormView {
  client: CachedMiddayClient,
  mode: FormMode,
  form: Form,
  mutation: Mutation<Customer>,
  error: Option<String>,
  saved: bool,
}

impl CustomerFormView {
  pub fn create(client: CachedMiddayClient) -> Self {
    let form = Form::new(vec![
      FormField::new("Name").required(),
      FormField::new("Email"),
      FormField::new("Website"),
      FormField::new("Country"),
      FormField::new("City"),
    ]);
    Self {
      client,
      mode: FormMode::Create,
      form,
      mutation: Mutation::new(),
      error: None,
      saved: false,
    }
  }

  pub fn edit(client: CachedMiddayClient, customer: Customer) -> Self {
    let form = Form::new(vec![
      FormField::new("Name").required().with_value(&customer.name),
      FormField::new("Email").with_value(customer.email.as_deref().unwrap_or("")),
      FormField::new("Website").with_value(customer.website.as_deref().unwrap_or("")),
      FormField::new("Country").with_value(customer.country.as_deref().unwrap_or("")),
      FormField::new("City").with_value(customer.city.as_deref().unwrap_or("")),
    ]);
    Self {
      client,
      mode: FormMode::Edit(customer.id),
      form,
      mutation: Mutation::new(),
      error: None,
      saved: false,
    }
  }

  fn payload(&self) -> CustomerPayload {
    CustomerPayload {
      name: self.form.value("Name").to_string(),
      email: self.form.optional("Email"),
      website: self.form.optional("Website"),
      country: self.form.optional("Country"),
      city: self.form.optional("City"),
    }
  }

  fn submit(&mut self) {
    if let Err(e) = self.form.validate() {
      self.error = Some(e.to_string());
      return;
    }
    self.error = None;

    let payload = self.payload();
    let client = self.client.clone();
    match &self.mode {
      FormMode::Create => {
        self
          .mutation
          .mutate(async move { client.create_customer(&payload).await });
      }
      FormMode::Edit(id) => {
        let id = id.clone();
        self
          .mutation
          .mutate(async move { client.update_customer(&id, &payload).await });
      }
    }
  }
}

impl View for CustomerFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.saved {
      return ViewAction::Pop;
    }
    if self.mutation.is_pending() {
      return ViewAction::None;
    }

    match self.form.handle_key(key) {
      FormResult::Submitted => {
        self.submit();
        ViewAction::None
      }
      FormResult::Cancelled => ViewAction::Pop,
      FormResult::Editing => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match &self.mode {
      FormMode::Create => "New customer",
      FormMode::Edit(_) => "Edit customer",
    };
    let status = if self.saved {
      Some("Saved. Press any key to go back.".to_string())
    } else if self.mutation.is_pending() {
      Some("Saving...".to_string())
    } else {
      self.error.clone()
    };
    self.form.render(frame, area, title, status.as_deref());
  }

  fn breadcrumb_label(&self) -> String {
    match &self.mode {
      FormMode::Create => "New customer".to_string(),
      FormMode::Edit(_) => "Edit customer".to_string(),
    }
  }

  fn tick(&mut self) {
    if self.mutation.poll() {
      match self.mutation.state() {
        MutationState::Success(_) => self.saved = true,
        MutationState::Error(e) => self.error = Some(e.to_string()),
        _ => {}
      }
    }
  }
}
