use leptos::web_sys;
use leptos::web_sys::Element;
use leptos::web_sys::Event;
use leptos::web_sys::HtmlElement;
use leptos::web_sys::TouchEvent;
use leptos::web_sys::WheelEvent;
use once_cell::unsync::OnceCell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::ElementIds;
use crate::ElementKey;
use crate::FrameHandle;
use crate::GlobalListeners;
use crate::Host;
use crate::InputEvent;
use crate::InputHandler;
use crate::InputSubscription;

/// A [`Host`] backed by the real DOM.
///
/// Every method degrades to a no-op or a zero value when there is no
/// `window`, e.g. while rendering on the server.
#[derive(Default)]
pub struct BrowserHost {
  ids: OnceCell<ElementIds>,
}

impl BrowserHost {
  pub fn new() -> Self {
    Default::default()
  }
}

fn window() -> Option<web_sys::Window> {
  // `web_sys` imports panic when called outside of wasm.
  if cfg!(target_arch = "wasm32") {
    web_sys::window()
  } else {
    None
  }
}

fn document() -> Option<web_sys::Document> {
  window().and_then(|window| window.document())
}

impl Host for BrowserHost {
  type Element = Element;

  fn is_browser(&self) -> bool {
    document().is_some()
  }

  fn query_selector(&self, selector: &str) -> Option<Element> {
    document()?.query_selector(selector).ok().flatten()
  }

  fn query_selector_all(&self, selector: &str) -> Vec<Element> {
    let Some(list) = document().and_then(|document| document.query_selector_all(selector).ok())
    else {
      return Vec::new();
    };

    (0..list.length())
      .filter_map(|index| list.get(index))
      .filter_map(|node| node.dyn_into::<Element>().ok())
      .collect()
  }

  fn query_selector_all_in(&self, parent: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = parent.query_selector_all(selector) else {
      return Vec::new();
    };

    (0..list.length())
      .filter_map(|index| list.get(index))
      .filter_map(|node| node.dyn_into::<Element>().ok())
      .collect()
  }

  fn element_key(&self, element: &Element) -> ElementKey {
    self.ids.get_or_init(ElementIds::default).key(element)
  }

  fn bounding_top(&self, element: &Element) -> f64 {
    element.get_bounding_client_rect().top()
  }

  fn attribute(&self, element: &Element, name: &str) -> Option<String> {
    element.get_attribute(name)
  }

  fn text(&self, element: &Element) -> Option<String> {
    element.text_content()
  }

  fn set_text(&self, element: &Element, text: &str) {
    element.set_text_content(Some(text));
  }

  fn style(&self, element: &Element, name: &str) -> Option<String> {
    element
      .dyn_ref::<HtmlElement>()?
      .style()
      .get_property_value(name)
      .ok()
      .filter(|value| !value.is_empty())
  }

  fn set_style(&self, element: &Element, name: &str, value: &str) {
    let Some(element) = element.dyn_ref::<HtmlElement>() else {
      return;
    };

    if element.style().set_property(name, value).is_err() {
      log::warn!("unable to set style `{name}: {value}`");
    }
  }

  fn scroll_y(&self) -> f64 {
    window()
      .and_then(|window| window.scroll_y().ok())
      .unwrap_or_default()
  }

  fn set_scroll_y(&self, value: f64) {
    if let Some(window) = window() {
      let x = window.scroll_x().unwrap_or_default();
      window.scroll_to_with_x_and_y(x, value);
    }
  }

  fn viewport_height(&self) -> f64 {
    window()
      .and_then(|window| window.inner_height().ok())
      .and_then(|height| height.as_f64())
      .unwrap_or_default()
  }

  fn scroll_height(&self) -> f64 {
    document()
      .and_then(|document| document.document_element())
      .map(|element| element.scroll_height() as f64)
      .unwrap_or_default()
  }

  fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Option<FrameHandle> {
    let window = window()?;
    let closure = Closure::once_into_js(move |time: f64| callback(time));

    window
      .request_animation_frame(closure.unchecked_ref())
      .ok()
      .map(FrameHandle)
  }

  fn cancel_frame(&self, handle: FrameHandle) {
    if let Some(window) = window() {
      window.cancel_animation_frame(handle.0).ok();
    }
  }

  fn listen_input(&self, handler: InputHandler) -> Option<InputSubscription> {
    let window = window()?;
    let mut listeners = GlobalListeners::default();

    let on_wheel = {
      let handler = handler.clone();
      move |event: Event| {
        let Some(wheel) = event.dyn_ref::<WheelEvent>() else {
          return;
        };

        let input = InputEvent::Wheel {
          delta_x: wheel.delta_x(),
          delta_y: wheel.delta_y(),
          delta_mode: wheel.delta_mode().into(),
          ctrl_key: wheel.ctrl_key(),
        };

        dispatch(&handler, &event, &input);
      }
    };

    let on_touch_start = {
      let handler = handler.clone();
      move |event: Event| {
        if let Some((x, y)) = first_touch(&event) {
          dispatch(&handler, &event, &InputEvent::TouchStart { x, y });
        }
      }
    };

    let on_touch_move = {
      let handler = handler.clone();
      move |event: Event| {
        if let Some((x, y)) = first_touch(&event) {
          dispatch(&handler, &event, &InputEvent::TouchMove { x, y });
        }
      }
    };

    let on_touch_end = {
      let handler = handler.clone();
      move |event: Event| dispatch(&handler, &event, &InputEvent::TouchEnd)
    };

    let on_scroll = move |event: Event| dispatch(&handler, &event, &InputEvent::Scroll);

    listeners.add_listener(&window, "wheel", Closure::new(on_wheel), false);
    listeners.add_listener(&window, "touchstart", Closure::new(on_touch_start), false);
    listeners.add_listener(&window, "touchmove", Closure::new(on_touch_move), false);
    listeners.add_listener(&window, "touchend", Closure::new(on_touch_end), true);
    listeners.add_listener(&window, "scroll", Closure::new(on_scroll), true);

    Some(InputSubscription::new(move || {
      let mut listeners = listeners;
      listeners.remove_all_listeners();
    }))
  }
}

fn dispatch(handler: &InputHandler, event: &Event, input: &InputEvent) {
  if handler(input) && event.cancelable() {
    event.prevent_default();
  }
}

fn first_touch(event: &Event) -> Option<(f64, f64)> {
  let touch = event.dyn_ref::<TouchEvent>()?.touches().get(0)?;

  Some((touch.client_x() as f64, touch.client_y() as f64))
}
