use std::cell::Cell;
use std::rc::Rc;

use leptos_glide_tween::Ease;
use leptos_glide_tween::Engine;
use leptos_glide_tween::Overwrite;
use leptos_glide_tween::Target;
use leptos_glide_tween::TweenHandle;
use leptos_glide_tween::TweenVars;
use leptos_glide_utils::Host;

/// Pixels left between the top of the viewport and an element scrolled to
/// with [`PageTransitions::scroll_to_element`].
pub const DEFAULT_SCROLL_OFFSET: f64 = 100.0;

/// Fades the page's `main` element in and out, and scrolls the window.
///
/// Every operation is best effort. A missing element turns it into a no-op.
pub struct PageTransitions<H: Host> {
  engine: Engine<H>,
  entrance: Rc<Cell<Option<TweenHandle>>>,
}

impl<H: Host> Clone for PageTransitions<H> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      entrance: self.entrance.clone(),
    }
  }
}

impl<H: Host> PageTransitions<H> {
  pub fn new(engine: Engine<H>) -> Self {
    Self {
      engine,
      entrance: Default::default(),
    }
  }

  pub fn engine(&self) -> &Engine<H> {
    &self.engine
  }

  /// Fade and slide `main` into place.
  pub fn animate_entrance(&self) -> Option<TweenHandle> {
    let main = self.engine.host().main_element()?;

    let handle = self.engine.from_to(
      Target::Element(main),
      TweenVars::builder().opacity(0.0).y(20.0).build(),
      TweenVars::builder()
        .opacity(1.0)
        .y(0.0)
        .duration(1.2)
        .ease(Ease::POWER3_OUT)
        .build(),
    );
    self.entrance.set(Some(handle));

    Some(handle)
  }

  /// Fade and slide `main` out, then call `on_complete`.
  ///
  /// Without a `main` element the callback runs straight away, before this
  /// returns. The exit takes over from a running entrance. Exits never
  /// cancel each other, so every callback passed in here runs.
  pub fn animate_exit(&self, on_complete: Option<Box<dyn FnOnce()>>) -> Option<TweenHandle> {
    let Some(main) = self.engine.host().main_element() else {
      if let Some(on_complete) = on_complete {
        on_complete();
      }

      return None;
    };

    if let Some(entrance) = self.entrance.take() {
      self.engine.kill(entrance);
    }

    let mut vars = TweenVars::builder()
      .opacity(0.0)
      .y(-20.0)
      .duration(0.6)
      .ease(Ease::POWER3_IN)
      .build();
    vars.on_complete = on_complete;

    Some(self.engine.to(Target::Element(main), vars))
  }

  /// Scroll the first element matching `selector` to just below the top of
  /// the viewport.
  pub fn scroll_to_element(&self, selector: &str) -> Option<TweenHandle> {
    self.scroll_to_element_with_offset(selector, DEFAULT_SCROLL_OFFSET)
  }

  /// Scroll the first element matching `selector` to `offset` pixels below
  /// the top of the viewport.
  pub fn scroll_to_element_with_offset(&self, selector: &str, offset: f64) -> Option<TweenHandle> {
    let host = self.engine.host();
    let Some(element) = host.query_selector(selector) else {
      log::debug!("no element matches `{selector}`");
      return None;
    };

    let target = host.bounding_top(&element) + host.scroll_y() - offset;

    Some(self.scroll_window(target, 1.2))
  }

  pub fn scroll_to_top(&self) -> TweenHandle {
    self.scroll_window(0.0, 1.0)
  }

  /// A newer scroll replaces an older one, and the user scrolling stops it.
  fn scroll_window(&self, target: f64, duration: f64) -> TweenHandle {
    self.engine.to(
      Target::Window,
      TweenVars::builder()
        .scroll_y(target)
        .duration(duration)
        .ease(Ease::POWER3_IN_OUT)
        .overwrite(Overwrite::Auto)
        .auto_kill(true)
        .build(),
    )
  }
}
