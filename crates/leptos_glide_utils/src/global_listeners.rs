use leptos::js_sys;
use leptos::wasm_bindgen;
use leptos::web_sys;
use leptos::JsCast;

type Closure = wasm_bindgen::closure::Closure<dyn Fn(web_sys::Event)>;

struct Listener {
  target: web_sys::EventTarget,
  event_type: String,
  function: js_sys::Function,
  // Kept so the javascript function stays callable while attached.
  _closure: Closure,
}

/// A set of event listeners that can be detached together.
#[derive(Default)]
pub struct GlobalListeners(Vec<Listener>);

impl GlobalListeners {
  /// Add a closure as an event listener.
  ///
  /// Passive listeners can't call `preventDefault()`. Scroll blocking input
  /// like `wheel` and `touchmove` must be attached with `passive = false`.
  pub fn add_listener(
    &mut self,
    target: impl AsRef<web_sys::EventTarget>,
    type_: impl Into<String>,
    closure: Closure,
    passive: bool,
  ) {
    let target = target.as_ref().clone();
    let event_type = type_.into();
    let function = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();
    let mut options = web_sys::AddEventListenerOptions::new();
    options.passive(passive);

    if target
      .add_event_listener_with_callback_and_add_event_listener_options(
        event_type.as_str(),
        &function,
        &options,
      )
      .is_err()
    {
      log::warn!("failed to add `{event_type}` listener");
      return;
    }

    self.0.push(Listener {
      target,
      event_type,
      function,
      _closure: closure,
    });
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Remove all the generated listeners.
  pub fn remove_all_listeners(&mut self) {
    for listener in self.0.drain(..) {
      listener
        .target
        .remove_event_listener_with_callback(listener.event_type.as_str(), &listener.function)
        .ok();
    }
  }
}

impl Drop for GlobalListeners {
  fn drop(&mut self) {
    self.remove_all_listeners();
  }
}
