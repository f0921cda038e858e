use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::TimerStatus;
use crate::query::{Mutation, MutationState};
use crate::timer::TimerReconciler;
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{
  CustomerListView, DocumentListView, GlobalSearchView, InvoiceListView, SpendingsView,
  TrackerProjectsView, TransactionListView,
};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Application configuration
  config: Config,

  /// Midday client with the query cache in front
  client: CachedMiddayClient,

  /// Drives the local timer record from server ground truth
  reconciler: TimerReconciler,

  /// In-flight reconciliation status poll, at most one at a time
  timer_poll: Mutation<TimerStatus>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(
    config: Config,
    client: CachedMiddayClient,
    reconciler: TimerReconciler,
    initial_view: Option<&str>,
  ) -> Self {
    let mut app = Self {
      view_stack: Vec::new(),
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      config,
      client,
      reconciler,
      timer_poll: Mutation::new(),
      should_quit: false,
    };
    let root = app
      .build_root_view(initial_view.unwrap_or("transactions"))
      .unwrap_or_else(|| Box::new(TransactionListView::new(app.client.clone())));
    app.view_stack.push(root);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new();

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => self.handle_key(key),
          Event::Tick => self.tick(),
        }
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
    self.reconcile_tick();
  }

  /// One reconciliation step per tick: settle any in-flight status
  /// poll, then start a new one if the record has gone stale for the
  /// current phase.
  fn reconcile_tick(&mut self) {
    if self.timer_poll.poll() {
      match self.timer_poll.state() {
        MutationState::Success(status) => {
          if let Err(e) = self.reconciler.apply_status(status) {
            tracing::warn!(error = %e, "failed to persist timer record");
          }
        }
        MutationState::Error(e) => {
          tracing::warn!(error = %e, "timer status poll failed");
          if let Err(e) = self.reconciler.defer() {
            tracing::warn!(error = %e, "failed to defer timer poll");
          }
        }
        _ => {}
      }
      self.timer_poll.reset();
    }

    if self.timer_poll.is_pending() {
      return;
    }
    match self.reconciler.needs_poll() {
      Ok(true) => {
        let client = self.client.clone();
        self
          .timer_poll
          .mutate(async move { client.timer_status().await });
      }
      Ok(false) => {}
      Err(e) => tracing::warn!(error = %e, "timer store unavailable"),
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    // Global bindings first
    match key.code {
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
        return;
      }
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
        self.selected_suggestion = 0;
        return;
      }
      _ => {}
    }

    // Delegate to the active view
    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Execute either the selected suggestion or the raw input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    if cmd == "quit" {
      self.should_quit = true;
    } else if let Some(root) = self.build_root_view(&cmd) {
      self.view_stack.clear();
      self.view_stack.push(root);
    }
    self.command_input.clear();
  }

  fn build_root_view(&self, name: &str) -> Option<Box<dyn View>> {
    let client = self.client.clone();
    match name {
      "transactions" => Some(Box::new(TransactionListView::new(client))),
      "customers" => Some(Box::new(CustomerListView::new(client))),
      "invoices" => Some(Box::new(InvoiceListView::new(client))),
      "vault" => Some(Box::new(DocumentListView::new(client))),
      "tracker" => Some(Box::new(TrackerProjectsView::new(
        client,
        self.reconciler.clone(),
      ))),
      "search" => Some(Box::new(GlobalSearchView::new(client))),
      "spendings" => Some(Box::new(SpendingsView::new(client))),
      _ => None,
    }
  }

  // Accessors for UI rendering

  pub fn render_current_view(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, area);
    }
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn display_title(&self) -> String {
    self.config.display_title()
  }

  pub fn breadcrumb(&self) -> String {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect::<Vec<_>>()
      .join(" › ")
  }

  /// Locally extrapolated elapsed seconds, `None` while no timer runs
  pub fn timer_elapsed(&self) -> Option<u64> {
    self.reconciler.elapsed().ok().flatten()
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}
