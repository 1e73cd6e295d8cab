use std::rc::Rc;

use leptos::on_cleanup;
use leptos::use_context;
use leptos::Scope;
use leptos_glide_scroll::SmoothScrollController;
use leptos_glide_tween::Engine;
use leptos_glide_utils::BrowserHost;
use leptos_glide_utils::ContextProvider;
use leptos_glide_utils::Host;

use crate::PageTransitions;
use crate::ScrollAnimations;

/// One animation engine with everything built on top of it.
pub struct GlideContext<H: Host = BrowserHost> {
  pub engine: Engine<H>,
  pub transitions: PageTransitions<H>,
  pub smooth_scroll: SmoothScrollController<H>,
  pub scroll_animations: ScrollAnimations<H>,
}

impl<H: Host> Clone for GlideContext<H> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      transitions: self.transitions.clone(),
      smooth_scroll: self.smooth_scroll.clone(),
      scroll_animations: self.scroll_animations.clone(),
    }
  }
}

impl<H: Host> GlideContext<H> {
  pub fn new(host: Rc<H>) -> Self {
    let engine = Engine::new(host);

    Self {
      transitions: PageTransitions::new(engine.clone()),
      smooth_scroll: SmoothScrollController::new(engine.clone()),
      scroll_animations: ScrollAnimations::new(engine.clone()),
      engine,
    }
  }

  /// Undo everything that outlives a page: smooth scrolling and scroll
  /// triggers.
  pub fn teardown(&self) {
    self.smooth_scroll.destroy();
    self.scroll_animations.cleanup();
  }
}

impl ContextProvider for GlideContext<BrowserHost> {
  fn from_leptos_scope(cx: Scope) -> Self {
    let context = Self::new(Rc::new(BrowserHost::new()));

    on_cleanup(cx, {
      let context = context.clone();
      move || context.teardown()
    });

    context
  }
}

/// Provide a [`GlideContext`] to `cx` and its children, reusing one from a
/// parent scope when there is one.
pub fn provide_glide(cx: Scope) -> GlideContext {
  GlideContext::provide(cx)
}

/// The [`GlideContext`] provided by [`provide_glide`], if any.
pub fn use_glide(cx: Scope) -> Option<GlideContext> {
  use_context(cx)
}
