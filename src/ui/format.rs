use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Format a monetary amount with its currency code, e.g. "-42.50 EUR"
pub fn format_amount(amount: f64, currency: &str) -> String {
  format!("{:.2} {}", amount, currency)
}

/// Color for a signed amount: income green, expense red
pub fn amount_color(amount: f64) -> Color {
  if amount < 0.0 {
    Color::Red
  } else {
    Color::Green
  }
}

/// Format elapsed seconds as a running clock, "HH:MM:SS"
pub fn format_timer(elapsed_secs: u64) -> String {
  let hours = elapsed_secs / 3600;
  let minutes = (elapsed_secs % 3600) / 60;
  let seconds = elapsed_secs % 60;
  format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a duration in seconds as "Xh Ym" for list columns
pub fn format_hours(secs: i64) -> String {
  let secs = secs.max(0);
  format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

/// Color for an invoice status
pub fn invoice_status_color(status: &str) -> Color {
  match status {
    "paid" => Color::Green,
    "overdue" => Color::Red,
    "unpaid" | "pending" => Color::Yellow,
    "draft" | "canceled" => Color::DarkGray,
    _ => Color::White,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_format_amount() {
    assert_eq!(format_amount(-42.5, "EUR"), "-42.50 EUR");
    assert_eq!(format_amount(1200.0, "USD"), "1200.00 USD");
  }

  #[test]
  fn test_format_timer() {
    assert_eq!(format_timer(0), "00:00:00");
    assert_eq!(format_timer(65), "00:01:05");
    assert_eq!(format_timer(3 * 3600 + 25 * 60 + 9), "03:25:09");
  }

  #[test]
  fn test_format_hours() {
    assert_eq!(format_hours(0), "0h 0m");
    assert_eq!(format_hours(28800), "8h 0m");
    assert_eq!(format_hours(5400), "1h 30m");
    assert_eq!(format_hours(-60), "0h 0m");
  }

  #[test]
  fn test_invoice_status_color() {
    assert_eq!(invoice_status_color("paid"), Color::Green);
    assert_eq!(invoice_status_color("overdue"), Color::Red);
    assert_eq!(invoice_status_color("unpaid"), Color::Yellow);
    assert_eq!(invoice_status_color("mystery"), Color::White);
  }
}
