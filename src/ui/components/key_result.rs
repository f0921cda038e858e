/// Outcome of offering a key press to an embedded component.
///
/// Views own the key loop; a search bar or form field only gets first
/// refusal. `T` carries the component's domain event (a submitted
/// search term, a completed form) back up to the owning view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed with nothing further for the view to do
  Handled,
  /// Consumed, and produced an event the view must act on
  Event(T),
  /// Not for this component; the view handles the key itself
  NotHandled,
}

impl<T> KeyResult<T> {
  /// True unless the component declined the key.
  pub fn consumed(&self) -> bool {
    !matches!(self, KeyResult::NotHandled)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_unhandled_keys_fall_through() {
    assert!(KeyResult::<()>::Handled.consumed());
    assert!(KeyResult::Event("go").consumed());
    assert!(!KeyResult::<()>::NotHandled.consumed());
  }
}
