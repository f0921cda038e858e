use crate::error::{Error, Result};
use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::{NewTrackerEntry, TrackerEntry};
use crate::query::{Mutation, MutationState};
use crate::ui::components::{Form, FormField, FormResult};
use crate::ui::view::{View, ViewAction};
use chrono::{DateTime, NaiveDateTime, Utc};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Form for logging a tracker entry against a project.
///
/// Start and stop are typed as local wall-clock strings and validated
/// before the mutation: unparseable timestamps and stop-before-start
/// both fail with `Error::Validation` without touching the network.
pub struct TrackerEntryFormView {
  client: CachedMiddayClient,
  project_id: String,
  project_name: String,
  form: Form,
  mutation: Mutation<TrackerEntry>,
  error: Option<String>,
  saved: bool,
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn parse_time(label: &str, value: &str) -> Result<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(value, TIME_FORMAT)
    .map(|naive| naive.and_utc())
    .map_err(|_| {
      Error::Validation(format!(
        "{} must look like 2024-03-01 09:00",
        label
      ))
    })
}

impl TrackerEntryFormView {
  pub fn new(client: CachedMiddayClient, project_id: String, project_name: String) -> Self {
    let now = Utc::now().format(TIME_FORMAT).to_string();
    let form = Form::new(vec![
      FormField::new("Description"),
      FormField::new("Start").required().with_value(&now),
      FormField::new("Stop").required().with_value(&now),
    ]);
    Self {
      client,
      project_id,
      project_name,
      form,
      mutation: Mutation::new(),
      error: None,
      saved: false,
    }
  }

  fn build_entry(&self) -> Result<NewTrackerEntry> {
    self.form.validate()?;
    let start = parse_time("Start", self.form.value("Start"))?;
    let stop = parse_time("Stop", self.form.value("Stop"))?;
    if stop <= start {
      return Err(Error::Validation("Stop must be after start".to_string()));
    }
    Ok(NewTrackerEntry {
      project_id: self.project_id.clone(),
      description: self.form.optional("Description"),
      start,
      stop,
    })
  }

  fn submit(&mut self) {
    match self.build_entry() {
      Ok(entry) => {
        self.error = None;
        let client = self.client.clone();
        self
          .mutation
          .mutate(async move { client.create_tracker_entry(&entry).await });
      }
      Err(e) => self.error = Some(e.to_string()),
    }
  }
}

impl View for TrackerEntryFormView {
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
    let title = format!("Log time on {}", self.project_name);
    let status = if self.saved {
      Some("Saved. Press any key to go back.".to_string())
    } else if self.mutation.is_pending() {
      Some("Saving...".to_string())
    } else {
      self.error.clone()
    };
    self.form.render(frame, area, &title, status.as_deref());
  }

  fn breadcrumb_label(&self) -> String {
    "New entry".to_string()
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_time_accepts_wall_clock() {
    let parsed = parse_time("Start", "2024-03-01 09:30").unwrap();
    assert_eq!(parsed.to_rfc3339(), "2024-03-01T09:30:00+00:00");
  }

  #[test]
  fn test_parse_time_rejects_garbage() {
    let err = parse_time("Stop", "yesterday-ish").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn test_parse_time_rejects_date_only() {
    assert!(parse_time("Start", "2024-03-01").is_err());
  }
}
