use std::cell::Cell;

use leptos::js_sys::Object;
use leptos::js_sys::WeakMap;
use leptos::web_sys::Element;
use wasm_bindgen::JsValue;

use crate::ElementKey;

/// `web_sys::Element` is not hashable, so it can't be used as a `HashMap`
/// key. This hands out a stable [`ElementKey`] per element object instead,
/// remembered in a javascript `WeakMap` so detached elements can still be
/// garbage collected.
pub struct ElementIds {
  ids: WeakMap,
  next: Cell<u64>,
}

impl Default for ElementIds {
  fn default() -> Self {
    Self {
      ids: WeakMap::new(),
      next: Cell::new(0),
    }
  }
}

impl ElementIds {
  pub fn key(&self, element: &Element) -> ElementKey {
    let object: &Object = element.as_ref();

    if self.ids.has(object) {
      if let Some(id) = self.ids.get(object).as_f64() {
        return ElementKey(id as u64);
      }
    }

    let id = self.next.get();
    self.next.set(id + 1);
    self.ids.set(object, &JsValue::from_f64(id as f64));

    ElementKey(id)
  }
}
