use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::error::{Error, Result};

use super::TextInput;

/// One labelled field in a form
#[derive(Debug, Clone)]
pub struct FormField {
  pub label: &'static str,
  pub required: bool,
  pub input: TextInput,
}

impl FormField {
  pub fn new(label: &'static str) -> Self {
    Self {
      label,
      required: false,
      input: TextInput::new(),
    }
  }

  pub fn required(mut self) -> Self {
    self.required = true;
    self
  }

  pub fn with_value(mut self, value: &str) -> Self {
    self.input = TextInput::with_value(value);
    self
  }
}

/// Result of handling a key event in a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResult {
  /// Key consumed, keep editing
  Editing,
  /// Ctrl-free Enter on the submit row, caller should validate and submit
  Submitted,
  /// Escape pressed
  Cancelled,
}

/// Vertical stack of labelled text fields with tab navigation.
///
/// Validation is the caller's last line of defense before a mutation:
/// `validate()` rejects empty required fields with `Error::Validation`
/// so bad input never reaches the network.
#[derive(Debug, Clone)]
pub struct Form {
  fields: Vec<FormField>,
  focused: usize,
}

impl Form {
  pub fn new(fields: Vec<FormField>) -> Self {
    Self { fields, focused: 0 }
  }

  /// Get a field's trimmed value by label
  pub fn value(&self, label: &str) -> &str {
    self
      .fields
      .iter()
      .find(|f| f.label == label)
      .map(|f| f.input.value().trim())
      .unwrap_or("")
  }

  /// Get a field's value as Option, None if empty after trimming
  pub fn optional(&self, label: &str) -> Option<String> {
    let value = self.value(label);
    if value.is_empty() {
      None
    } else {
      Some(value.to_string())
    }
  }

  /// Check all required fields are filled
  pub fn validate(&self) -> Result<()> {
    for field in &self.fields {
      if field.required && field.input.value().trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field.label)));
      }
    }
    Ok(())
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> FormResult {
    match key.code {
      KeyCode::Esc => FormResult::Cancelled,
      KeyCode::Enter => FormResult::Submitted,
      KeyCode::Tab | KeyCode::Down => {
        self.focused = (self.focused + 1) % self.fields.len();
        FormResult::Editing
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focused = if self.focused == 0 {
          self.fields.len() - 1
        } else {
          self.focused - 1
        };
        FormResult::Editing
      }
      _ => {
        if let Some(field) = self.fields.get_mut(self.focused) {
          field.input.handle_key(key);
        }
        FormResult::Editing
      }
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, title: &str, error: Option<&str>) {
    let block = Block::default()
      .title(format!(" {} ", title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints: Vec<Constraint> =
      self.fields.iter().map(|_| Constraint::Length(1)).collect();
    constraints.push(Constraint::Length(1)); // Error / hint line
    constraints.push(Constraint::Min(0));

    let rows = Layout::default()
      .direction(Direction::Vertical)
      .constraints(constraints)
      .split(inner);

    for (i, field) in self.fields.iter().enumerate() {
      let focused = i == self.focused;
      let marker = if focused { "> " } else { "  " };
      let label_style = if field.required {
        Style::default().fg(Color::White)
      } else {
        Style::default().fg(Color::DarkGray)
      };
      let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<14}", field.label), label_style),
        Span::raw(field.input.value()),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      frame.render_widget(Paragraph::new(Line::from(spans)), rows[i]);
    }

    let footer = match error {
      Some(message) => Line::from(Span::styled(
        format!(" {} ", message),
        Style::default().fg(Color::Red),
      )),
      None => Line::from(Span::styled(
        " Tab:next field  Enter:save  Esc:cancel",
        Style::default().fg(Color::DarkGray),
      )),
    };
    frame.render_widget(Paragraph::new(footer), rows[self.fields.len()]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn form() -> Form {
    Form::new(vec![
      FormField::new("Name").required(),
      FormField::new("Email"),
    ])
  }

  #[test]
  fn test_required_field_blocks_validation() {
    let form = form();
    let err = form.validate().unwrap_err();
    assert_eq!(err, Error::Validation("Name is required".to_string()));
  }

  #[test]
  fn test_filled_form_validates() {
    let mut form = form();
    for c in "Acme".chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
    assert!(form.validate().is_ok());
    assert_eq!(form.value("Name"), "Acme");
    assert_eq!(form.optional("Email"), None);
  }

  #[test]
  fn test_whitespace_only_is_still_empty() {
    let mut form = form();
    form.handle_key(key(KeyCode::Char(' ')));
    assert!(form.validate().is_err());
  }

  #[test]
  fn test_tab_cycles_focus() {
    let mut form = form();
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Char('a')));
    assert_eq!(form.value("Email"), "a");
    assert_eq!(form.value("Name"), "");
  }

  #[test]
  fn test_enter_and_escape() {
    let mut form = form();
    assert_eq!(form.handle_key(key(KeyCode::Enter)), FormResult::Submitted);
    assert_eq!(form.handle_key(key(KeyCode::Esc)), FormResult::Cancelled);
  }
}
