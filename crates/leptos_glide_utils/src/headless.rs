use std::cell::Cell;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use slotmap::DefaultKey;
use slotmap::SlotMap;

use crate::ElementKey;
use crate::FrameHandle;
use crate::Host;
use crate::InputEvent;
use crate::InputHandler;
use crate::InputSubscription;

/// An element living inside a [`HeadlessHost`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeadlessElement(usize);

#[derive(Default)]
struct ElementData {
  selectors: Vec<String>,
  top: f64,
  parent: Option<usize>,
  attributes: BTreeMap<String, String>,
  text: Option<String>,
  styles: BTreeMap<String, String>,
}

type FrameCallback = Box<dyn FnOnce(f64)>;

/// An in-memory [`Host`].
///
/// There's no layout engine: elements are registered with the selectors they
/// match and their offset from the top of the document. Frames only run when
/// [`HeadlessHost::run_frame`] is called, which makes it a deterministic
/// frame source for tests. By default it reports that no browser is present,
/// which is what server rendering sees.
pub struct HeadlessHost {
  browser: Cell<bool>,
  elements: RefCell<Vec<ElementData>>,
  scroll_y: Cell<f64>,
  viewport_height: Cell<f64>,
  scroll_height: Cell<f64>,
  frames: RefCell<Vec<(FrameHandle, FrameCallback)>>,
  next_frame: Cell<i32>,
  input: Rc<RefCell<SlotMap<DefaultKey, InputHandler>>>,
}

impl Default for HeadlessHost {
  fn default() -> Self {
    Self {
      browser: Cell::new(false),
      elements: Default::default(),
      scroll_y: Cell::new(0.0),
      viewport_height: Cell::new(800.0),
      scroll_height: Cell::new(800.0),
      frames: Default::default(),
      next_frame: Cell::new(1),
      input: Default::default(),
    }
  }
}

impl HeadlessHost {
  pub fn new() -> Self {
    Default::default()
  }

  /// A host that pretends to be a browser with a 800px viewport over a
  /// document of the given height.
  pub fn browser(document_height: f64) -> Self {
    let host = Self::new();
    host.browser.set(true);
    host.scroll_height.set(document_height);
    host
  }

  pub fn set_browser(&self, browser: bool) {
    self.browser.set(browser);
  }

  pub fn set_viewport_height(&self, height: f64) {
    self.viewport_height.set(height);
  }

  pub fn set_document_height(&self, height: f64) {
    self.scroll_height.set(height);
  }

  /// Add an element matching `selectors`, placed `top` pixels from the top
  /// of the document.
  pub fn insert(&self, selectors: &[&str], top: f64) -> HeadlessElement {
    self.push(selectors, top, None)
  }

  /// Add an element nested inside `parent`. Only elements added this way are
  /// found by [`Host::query_selector_all_in`].
  pub fn insert_into(
    &self,
    parent: &HeadlessElement,
    selectors: &[&str],
    top: f64,
  ) -> HeadlessElement {
    self.push(selectors, top, Some(parent.0))
  }

  fn push(&self, selectors: &[&str], top: f64, parent: Option<usize>) -> HeadlessElement {
    let mut elements = self.elements.borrow_mut();
    elements.push(ElementData {
      selectors: selectors.iter().map(|selector| selector.to_string()).collect(),
      top,
      parent,
      ..Default::default()
    });

    HeadlessElement(elements.len() - 1)
  }

  pub fn set_attribute(&self, element: &HeadlessElement, name: &str, value: &str) {
    if let Some(data) = self.elements.borrow_mut().get_mut(element.0) {
      data.attributes.insert(name.to_string(), value.to_string());
    }
  }

  fn matching(&self, selector: &str, parent: Option<usize>) -> Vec<HeadlessElement> {
    self
      .elements
      .borrow()
      .iter()
      .enumerate()
      .filter(|(_, data)| parent.is_none() || data.parent == parent)
      .filter(|(_, data)| data.selectors.iter().any(|value| value == selector))
      .map(|(index, _)| HeadlessElement(index))
      .collect()
  }

  /// The number of frame callbacks waiting to run.
  pub fn pending_frames(&self) -> usize {
    self.frames.borrow().len()
  }

  /// Run every frame callback that was requested before this call, passing
  /// `now` as the timestamp in milliseconds. Returns how many ran.
  pub fn run_frame(&self, now: f64) -> usize {
    let frames = std::mem::take(&mut *self.frames.borrow_mut());
    let count = frames.len();

    for (_, callback) in frames {
      callback(now);
    }

    count
  }

  /// Deliver an input event to every listener. Returns `true` when any of
  /// them asked to prevent the default behaviour.
  pub fn dispatch(&self, event: &InputEvent) -> bool {
    let handlers: Vec<InputHandler> = self.input.borrow().values().cloned().collect();

    handlers
      .into_iter()
      .fold(false, |prevented, handler| handler(event) || prevented)
  }

  /// Simulate the user scrolling natively: move the scroll position and fire
  /// a scroll event.
  pub fn user_scroll(&self, value: f64) {
    self.set_scroll_y(value);
    self.dispatch(&InputEvent::Scroll);
  }

  pub fn input_listeners(&self) -> usize {
    self.input.borrow().len()
  }
}

impl Host for HeadlessHost {
  type Element = HeadlessElement;

  fn is_browser(&self) -> bool {
    self.browser.get()
  }

  fn query_selector(&self, selector: &str) -> Option<HeadlessElement> {
    self.query_selector_all(selector).into_iter().next()
  }

  fn query_selector_all(&self, selector: &str) -> Vec<HeadlessElement> {
    self.matching(selector, None)
  }

  fn query_selector_all_in(&self, parent: &HeadlessElement, selector: &str) -> Vec<HeadlessElement> {
    self.matching(selector, Some(parent.0))
  }

  fn element_key(&self, element: &HeadlessElement) -> ElementKey {
    ElementKey(element.0 as u64)
  }

  fn bounding_top(&self, element: &HeadlessElement) -> f64 {
    let top = self
      .elements
      .borrow()
      .get(element.0)
      .map_or(0.0, |data| data.top);

    top - self.scroll_y.get()
  }

  fn attribute(&self, element: &HeadlessElement, name: &str) -> Option<String> {
    self
      .elements
      .borrow()
      .get(element.0)
      .and_then(|data| data.attributes.get(name).cloned())
  }

  fn text(&self, element: &HeadlessElement) -> Option<String> {
    self
      .elements
      .borrow()
      .get(element.0)
      .and_then(|data| data.text.clone())
  }

  fn set_text(&self, element: &HeadlessElement, text: &str) {
    if let Some(data) = self.elements.borrow_mut().get_mut(element.0) {
      data.text = Some(text.to_string());
    }
  }

  fn style(&self, element: &HeadlessElement, name: &str) -> Option<String> {
    self
      .elements
      .borrow()
      .get(element.0)
      .and_then(|data| data.styles.get(name).cloned())
  }

  fn set_style(&self, element: &HeadlessElement, name: &str, value: &str) {
    if let Some(data) = self.elements.borrow_mut().get_mut(element.0) {
      data.styles.insert(name.to_string(), value.to_string());
    }
  }

  fn scroll_y(&self) -> f64 {
    self.scroll_y.get()
  }

  fn set_scroll_y(&self, value: f64) {
    // Browsers clamp programmatic scrolling to the document.
    self.scroll_y.set(value.clamp(0.0, self.max_scroll()));
  }

  fn viewport_height(&self) -> f64 {
    self.viewport_height.get()
  }

  fn scroll_height(&self) -> f64 {
    self.scroll_height.get()
  }

  fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Option<FrameHandle> {
    let handle = FrameHandle(self.next_frame.get());
    self.next_frame.set(handle.0 + 1);
    self.frames.borrow_mut().push((handle, callback));

    Some(handle)
  }

  fn cancel_frame(&self, handle: FrameHandle) {
    self
      .frames
      .borrow_mut()
      .retain(|(pending, _)| *pending != handle);
  }

  fn listen_input(&self, handler: InputHandler) -> Option<InputSubscription> {
    let key = self.input.borrow_mut().insert(handler);
    let input = Rc::downgrade(&self.input);

    Some(InputSubscription::new(move || {
      if let Some(input) = input.upgrade() {
        input.borrow_mut().remove(key);
      }
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bounding_top_follows_scroll() {
    let host = HeadlessHost::browser(3000.0);
    let section = host.insert(&["#pricing"], 1200.0);

    assert_eq!(host.bounding_top(&section), 1200.0);
    host.set_scroll_y(200.0);
    assert_eq!(host.bounding_top(&section), 1000.0);
  }

  #[test]
  fn nested_queries_stay_inside_the_parent() {
    let host = HeadlessHost::browser(3000.0);
    let grid = host.insert(&["[data-cards-stagger]"], 1000.0);
    let other = host.insert(&["[data-cards-stagger]"], 2000.0);
    let first = host.insert_into(&grid, &["[data-card]"], 1000.0);
    let second = host.insert_into(&grid, &["[data-card]"], 1000.0);
    host.insert_into(&other, &["[data-card]"], 2000.0);

    assert_eq!(host.query_selector_all_in(&grid, "[data-card]"), vec![first, second]);
    assert_eq!(host.query_selector_all("[data-card]").len(), 3);
  }

  #[test]
  fn text_and_attributes() {
    let host = HeadlessHost::new();
    let counter = host.insert(&["[data-counter]"], 0.0);

    assert_eq!(host.text(&counter), None);
    host.set_attribute(&counter, "data-counter-target", "500");
    host.set_text(&counter, "0");

    assert_eq!(host.attribute(&counter, "data-counter-target").as_deref(), Some("500"));
    assert_eq!(host.attribute(&counter, "data-missing"), None);
    assert_eq!(host.text(&counter).as_deref(), Some("0"));
  }

  #[test]
  fn scroll_is_clamped_to_document() {
    let host = HeadlessHost::browser(1000.0);

    host.set_scroll_y(5000.0);
    assert_eq!(host.scroll_y(), 200.0);
    host.set_scroll_y(-10.0);
    assert_eq!(host.scroll_y(), 0.0);
  }

  #[test]
  fn cancelled_frames_never_run() {
    let host = HeadlessHost::new();
    let ran = Rc::new(Cell::new(0));

    let first = {
      let ran = ran.clone();
      host.request_frame(Box::new(move |_| ran.set(ran.get() + 1)))
    };
    {
      let ran = ran.clone();
      host.request_frame(Box::new(move |_| ran.set(ran.get() + 10)));
    }

    host.cancel_frame(first.unwrap());
    assert_eq!(host.run_frame(16.0), 1);
    assert_eq!(ran.get(), 10);
    assert_eq!(host.pending_frames(), 0);
  }

  #[test]
  fn dropping_subscription_detaches_listener() {
    let host = HeadlessHost::new();
    let subscription = host.listen_input(Rc::new(|_| true));

    assert!(host.dispatch(&InputEvent::Scroll));
    drop(subscription);
    assert_eq!(host.input_listeners(), 0);
    assert!(!host.dispatch(&InputEvent::Scroll));
  }
}
