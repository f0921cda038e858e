use crate::midday::cached_client::CachedMiddayClient;
use crate::midday::types::{TimerStatus, TrackerProjectWithTimer};
use crate::query::{Mutation, MutationState, Query, QueryState};
use crate::timer::TimerReconciler;
use crate::ui::ensure_valid_selection;
use crate::ui::format::{format_hours, format_timer, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::TrackerEntriesView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// View for tracker projects with timer control.
///
/// `s` starts the timer on the selected project, `x` stops whichever
/// timer is running. Both mutations report the new server status; it is
/// applied to the local timer record so the header clock follows
/// without waiting for the next reconciliation poll.
pub struct TrackerProjectsView {
  client: CachedMiddayClient,
  reconciler: TimerReconciler,
  query: Query<Vec<TrackerProjectWithTimer>>,
  timer: Mutation<TimerStatus>,
  list_state: ListState,
}

impl TrackerProjectsView {
  pub fn new(client: CachedMiddayClient, reconciler: TimerReconciler) -> Self {
    let query_client = client.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      async move { client.tracker_projects().await }
    });
    query.fetch();

    Self {
      client,
      reconciler,
      query,
      timer: Mutation::new(),
      list_state: ListState::default(),
    }
  }

  fn projects(&self) -> &[TrackerProjectWithTimer] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_project(&self) -> Option<&TrackerProjectWithTimer> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.projects().get(idx))
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.projects().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Tracker (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Tracker (error: {}) ", e),
      _ => format!(" Tracker ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.projects().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load projects. Press 'r' to retry."
      } else {
        "No tracker projects found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .projects()
      .iter()
      .map(|project| {
        let running = project
          .timer
          .as_ref()
          .map(|t| t.is_running)
          .unwrap_or(false);
        let indicator = if running {
          Span::styled("● ", Style::default().fg(Color::Green))
        } else {
          Span::raw("  ")
        };
        let tracked = match &project.timer {
          Some(timer) if timer.is_running => Span::styled(
            format!("{:>10}", format_timer(timer.elapsed_time)),
            Style::default().fg(Color::Green).bold(),
          ),
          _ => Span::styled(
            format!(
              "{:>10}",
              format_hours(project.project.total_duration.unwrap_or(0))
            ),
            Style::default().fg(Color::DarkGray),
          ),
        };
        let line = Line::from(vec![
          indicator,
          Span::raw(format!("{:<40}", truncate(&project.project.name, 38))),
          Span::styled(
            format!(
              "{:<12}",
              project.project.status.as_deref().unwrap_or("-")
            ),
            Style::default().fg(Color::Cyan),
          ),
          tracked,
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

    let hint = Paragraph::new(" s:start timer  x:stop timer  Enter:entries  n:new entry ")
      .style(Style::default().fg(Color::DarkGray));
    let hint_area = Rect::new(area.x + 1, area.y + area.height.saturating_sub(1), 60, 1);
    frame.render_widget(hint, hint_area.intersection(area));
  }
}

impl View for TrackerProjectsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('s') => {
        if !self.timer.is_pending() {
          if let Some(project) = self.selected_project() {
            let client = self.client.clone();
            let project_id = project.project.id.clone();
            self
              .timer
              .mutate(async move { client.start_timer(&project_id).await });
          }
        }
      }
      KeyCode::Char('x') => {
        if !self.timer.is_pending() {
          let client = self.client.clone();
          self.timer.mutate(async move { client.stop_timer().await });
        }
      }
      KeyCode::Enter | KeyCode::Char('n') => {
        if let Some(project) = self.selected_project() {
          return ViewAction::Push(Box::new(TrackerEntriesView::new(
            self.client.clone(),
            project.project.id.clone(),
            project.project.name.clone(),
          )));
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
    "Tracker".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
    if self.timer.poll() {
      match self.timer.state() {
        MutationState::Success(status) => {
          if let Err(e) = self.reconciler.apply_status(status) {
            tracing::warn!(error = %e, "failed to persist timer record");
          }
          self.query.refetch();
        }
        MutationState::Error(e) => tracing::warn!(error = %e, "timer mutation failed"),
        _ => {}
      }
      self.timer.reset();
    }
  }
}
