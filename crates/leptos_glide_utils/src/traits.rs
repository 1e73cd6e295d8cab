use leptos::provide_context;
use leptos::use_context;
use leptos::Scope;

/// A value shared through the leptos context tree.
pub trait ContextProvider: Clone + 'static {
  /// Create a fresh value for the scope.
  fn from_leptos_scope(cx: Scope) -> Self;

  /// Get the value already provided to this scope or one of its parents,
  /// creating and providing it when there is none.
  fn provide(cx: Scope) -> Self {
    match use_context::<Self>(cx) {
      Some(value) => value,
      None => {
        let value = Self::from_leptos_scope(cx);
        provide_context(cx, value.clone());
        value
      }
    }
  }
}
