use std::fmt;

/// The surface of the environment that animations and scrolling run against.
///
/// [`BrowserHost`](crate::BrowserHost) talks to the real DOM through
/// `web_sys`. [`HeadlessHost`](crate::HeadlessHost) keeps everything in
/// memory, which makes it usable during server rendering and in tests where
/// frames are driven by hand.
pub trait Host: 'static {
  /// A handle to a single element in the document.
  type Element: Clone + 'static;

  /// Whether a real browser environment is available.
  fn is_browser(&self) -> bool;

  /// Find the first element matching the selector.
  fn query_selector(&self, selector: &str) -> Option<Self::Element>;

  /// Find every element matching the selector, in document order.
  fn query_selector_all(&self, selector: &str) -> Vec<Self::Element>;

  /// Find every element matching the selector inside `parent`, in document
  /// order.
  fn query_selector_all_in(&self, parent: &Self::Element, selector: &str) -> Vec<Self::Element>;

  /// The region holding the main content of the page.
  fn main_element(&self) -> Option<Self::Element> {
    self.query_selector("main")
  }

  /// A stable identity for the element, used to detect tweens that fight
  /// over the same target.
  fn element_key(&self, element: &Self::Element) -> ElementKey;

  /// Distance from the top of the viewport to the top of the element.
  fn bounding_top(&self, element: &Self::Element) -> f64;

  /// Read an attribute of the element.
  fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

  /// The text content of the element.
  fn text(&self, element: &Self::Element) -> Option<String>;

  /// Replace the text content of the element.
  fn set_text(&self, element: &Self::Element, text: &str);

  /// Read an inline style property.
  fn style(&self, element: &Self::Element, name: &str) -> Option<String>;

  /// Write an inline style property.
  fn set_style(&self, element: &Self::Element, name: &str, value: &str);

  /// The current vertical scroll offset of the window.
  fn scroll_y(&self) -> f64;

  /// Jump the window to the given vertical scroll offset.
  fn set_scroll_y(&self, value: f64);

  /// Height of the visible viewport.
  fn viewport_height(&self) -> f64;

  /// Total scrollable height of the document.
  fn scroll_height(&self) -> f64;

  /// The largest scroll offset the document allows.
  fn max_scroll(&self) -> f64 {
    (self.scroll_height() - self.viewport_height()).max(0.0)
  }

  /// Schedule `callback` for the next frame. The callback receives a
  /// timestamp in milliseconds.
  ///
  /// Returns `None` when frames can't be scheduled at all.
  fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Option<FrameHandle>;

  /// Cancel a frame that hasn't run yet.
  fn cancel_frame(&self, handle: FrameHandle);

  /// Route wheel, touch and scroll input to `handler` until the returned
  /// subscription is dropped. The handler returns `true` to prevent the
  /// default browser behaviour.
  fn listen_input(&self, handler: InputHandler) -> Option<InputSubscription>;
}

/// Identity of an element within a host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

/// The id of a pending frame request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

pub type InputHandler = std::rc::Rc<dyn Fn(&InputEvent) -> bool>;

/// Units used by the `deltaX` and `deltaY` of a wheel event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DeltaMode {
  #[default]
  Pixel,
  Line,
  Page,
}

impl From<u32> for DeltaMode {
  fn from(value: u32) -> Self {
    match value {
      1 => Self::Line,
      2 => Self::Page,
      _ => Self::Pixel,
    }
  }
}

/// Input that the smooth scroller cares about.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
  Wheel {
    delta_x: f64,
    delta_y: f64,
    delta_mode: DeltaMode,
    ctrl_key: bool,
  },
  TouchStart {
    x: f64,
    y: f64,
  },
  TouchMove {
    x: f64,
    y: f64,
  },
  TouchEnd,
  /// The window scrolled, for whatever reason.
  Scroll,
}

/// Keeps an input listener attached. Dropping it detaches the listener.
pub struct InputSubscription(Option<Box<dyn FnOnce()>>);

impl InputSubscription {
  /// Create a subscription that runs `teardown` when dropped.
  pub fn new(teardown: impl FnOnce() + 'static) -> Self {
    Self(Some(Box::new(teardown)))
  }
}

impl Drop for InputSubscription {
  fn drop(&mut self) {
    if let Some(teardown) = self.0.take() {
      teardown();
    }
  }
}

impl fmt::Debug for InputSubscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("InputSubscription")
      .field(&self.0.is_some())
      .finish()
  }
}
