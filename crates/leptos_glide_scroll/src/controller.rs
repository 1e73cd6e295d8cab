use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;

use leptos_glide_tween::Ease;
use leptos_glide_tween::Engine;
use leptos_glide_tween::LagSmoothing;
use leptos_glide_tween::TickerKey;
use leptos_glide_utils::FrameHandle;
use leptos_glide_utils::Host;

use crate::expo_out;
use crate::GestureOrientation;
use crate::ScrollTarget;
use crate::ScrollToOptions;
use crate::SmoothScroll;
use crate::SmoothScrollOptions;

/// The options every controller-managed instance is created with.
pub fn controller_options() -> SmoothScrollOptions {
  SmoothScrollOptions::builder()
    .duration(1.2)
    .easing(Ease::Custom(expo_out))
    .gesture_orientation(GestureOrientation::Vertical)
    .smooth_wheel(true)
    .wheel_multiplier(1.0)
    .touch_multiplier(2.0)
    .infinite(false)
    .build()
}

type FrameSlot = Rc<Cell<Option<FrameHandle>>>;

/// Everything owned by an initialized controller. Created and released as
/// one unit.
struct ActiveScroll<H: Host> {
  scroll: SmoothScroll<H>,
  ticker_key: TickerKey,
  lag_smoothing: Option<LagSmoothing>,
  keep_alive: FrameSlot,
}

/// Owns at most one [`SmoothScroll`] and drives it from an [`Engine`]'s
/// ticker.
///
/// Every scroll update refreshes the engine's scroll triggers, so reveal
/// effects follow the smoothed position. Clones share the same state.
pub struct SmoothScrollController<H: Host> {
  engine: Engine<H>,
  state: Rc<RefCell<Option<ActiveScroll<H>>>>,
}

impl<H: Host> Clone for SmoothScrollController<H> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      state: self.state.clone(),
    }
  }
}

impl<H: Host> SmoothScrollController<H> {
  pub fn new(engine: Engine<H>) -> Self {
    Self {
      engine,
      state: Default::default(),
    }
  }

  pub fn engine(&self) -> &Engine<H> {
    &self.engine
  }

  /// Start smooth scrolling. Does nothing outside a browser or when already
  /// initialized.
  pub fn initialize(&self) {
    let host = self.engine.host();

    if !host.is_browser() {
      log::debug!("smooth scroll skipped without a browser");
      return;
    }

    if self.is_active() {
      return;
    }

    let scroll = SmoothScroll::new(host.clone(), controller_options());

    let triggers = self.engine.scroll_triggers().clone();
    scroll.on_scroll(move |_| triggers.update());

    let ticker = self.engine.ticker();
    let ticker_key = {
      let scroll = scroll.clone();
      ticker.add(move |frame| scroll.raf(frame.time * 1000.0))
    };

    let lag_smoothing = ticker.lag_smoothing_setting();
    ticker.lag_smoothing(None);

    let keep_alive: FrameSlot = Default::default();
    request_keep_alive(host.clone(), Rc::downgrade(&keep_alive));

    *self.state.borrow_mut() = Some(ActiveScroll {
      scroll,
      ticker_key,
      lag_smoothing,
      keep_alive,
    });

    log::info!("smooth scroll initialized");
  }

  /// Forward to [`SmoothScroll::scroll_to`]. Does nothing when inactive.
  pub fn scroll_to(&self, target: impl Into<ScrollTarget>, options: ScrollToOptions) {
    // Cloned out so a completion callback may destroy the controller.
    if let Some(scroll) = self.instance() {
      scroll.scroll_to(target, options);
    }
  }

  /// Tear down the active instance. Safe to call at any time.
  pub fn destroy(&self) {
    let Some(active) = self.state.borrow_mut().take() else {
      return;
    };

    if let Some(frame) = active.keep_alive.take() {
      self.engine.host().cancel_frame(frame);
    }

    let ticker = self.engine.ticker();
    ticker.remove(active.ticker_key);
    ticker.lag_smoothing(active.lag_smoothing);
    active.scroll.destroy();

    log::info!("smooth scroll destroyed");
  }

  /// A handle to the live instance, if any.
  pub fn instance(&self) -> Option<SmoothScroll<H>> {
    self
      .state
      .borrow()
      .as_ref()
      .map(|active| active.scroll.clone())
  }

  pub fn is_active(&self) -> bool {
    self.state.borrow().is_some()
  }

  /// Whether a keep-alive frame is waiting to run.
  pub fn has_pending_frame(&self) -> bool {
    self
      .state
      .borrow()
      .as_ref()
      .map_or(false, |active| active.keep_alive.get().is_some())
  }
}

/// Keeps a frame requested for as long as the slot is alive. The frames
/// themselves do nothing, stepping happens on the ticker.
fn request_keep_alive<H: Host>(host: Rc<H>, slot: Weak<Cell<Option<FrameHandle>>>) {
  let Some(cell) = slot.upgrade() else {
    return;
  };

  let next = {
    let host = host.clone();
    move |_| request_keep_alive(host, slot)
  };

  cell.set(host.request_frame(Box::new(next)));
}

#[cfg(test)]
mod tests {
  use leptos_glide_tween::ScrollTriggerConfig;
  use leptos_glide_utils::DeltaMode;
  use leptos_glide_utils::HeadlessHost;
  use leptos_glide_utils::InputEvent;

  use super::*;

  fn setup() -> (Rc<HeadlessHost>, SmoothScrollController<HeadlessHost>) {
    let host = Rc::new(HeadlessHost::browser(4000.0));
    let controller = SmoothScrollController::new(Engine::new(host.clone()));
    (host, controller)
  }

  #[test]
  fn initialize_is_idempotent() {
    let (host, controller) = setup();

    controller.initialize();
    let first = controller.instance().unwrap();
    controller.initialize();
    controller.initialize();

    assert!(controller.instance().unwrap().ptr_eq(&first));
    assert_eq!(controller.engine().ticker().len(), 1);
    assert_eq!(host.input_listeners(), 1);
    // The engine's own loop plus a single keep-alive.
    assert_eq!(host.pending_frames(), 2);
  }

  #[test]
  fn destroy_without_initialize_is_a_no_op() {
    let (_host, controller) = setup();

    controller.destroy();
    controller.destroy();

    assert!(!controller.is_active());
    assert!(controller.instance().is_none());
  }

  #[test]
  fn instance_follows_the_lifecycle() {
    let (_host, controller) = setup();
    assert!(controller.instance().is_none());

    controller.initialize();
    assert!(controller.instance().is_some());
    assert!(controller.has_pending_frame());

    controller.destroy();
    assert!(controller.instance().is_none());
    assert!(!controller.has_pending_frame());
  }

  #[test]
  fn reinitializing_creates_a_fresh_instance() {
    let (host, controller) = setup();

    controller.initialize();
    let first = controller.instance().unwrap();
    controller.destroy();

    assert!(first.is_destroyed());
    assert_eq!(host.input_listeners(), 0);
    assert_eq!(host.pending_frames(), 1);
    assert!(controller.engine().ticker().is_empty());

    controller.initialize();
    let second = controller.instance().unwrap();

    assert!(!second.ptr_eq(&first));
    assert!(!second.is_destroyed());
    assert_eq!(host.pending_frames(), 2);

    controller.destroy();
    assert_eq!(host.pending_frames(), 1);
  }

  #[test]
  fn keep_alive_stops_after_destroy() {
    let (host, controller) = setup();

    controller.initialize();
    host.run_frame(0.0);
    host.run_frame(16.0);
    assert_eq!(host.pending_frames(), 2);

    controller.destroy();
    host.run_frame(32.0);
    assert_eq!(host.pending_frames(), 1);
  }

  #[test]
  fn skipped_without_a_browser() {
    let host = Rc::new(HeadlessHost::new());
    let controller = SmoothScrollController::new(Engine::new(host.clone()));

    controller.initialize();

    assert!(!controller.is_active());
    assert_eq!(host.input_listeners(), 0);
    controller.scroll_to(500.0, ScrollToOptions::default());
    assert_eq!(host.scroll_y(), 0.0);
  }

  #[test]
  fn lag_smoothing_is_restored_on_destroy() {
    let (_host, controller) = setup();
    let ticker = controller.engine().ticker().clone();

    controller.initialize();
    assert_eq!(ticker.lag_smoothing_setting(), None);

    controller.destroy();
    assert_eq!(ticker.lag_smoothing_setting(), Some(LagSmoothing::default()));
  }

  #[test]
  fn the_ticker_drives_scrolling_and_triggers() {
    let (host, controller) = setup();
    let section = host.insert(&["#features"], 1500.0);
    let entered = Rc::new(Cell::new(false));

    controller
      .engine()
      .scroll_triggers()
      .create(
        ScrollTriggerConfig::builder()
          .trigger(section)
          .on_enter(Rc::new({
            let entered = entered.clone();
            move || entered.set(true)
          }))
          .build(),
      );

    controller.initialize();
    host.dispatch(&InputEvent::Wheel {
      delta_x: 0.0,
      delta_y: 1000.0,
      delta_mode: DeltaMode::Pixel,
      ctrl_key: false,
    });

    host.run_frame(0.0);
    host.run_frame(600.0);
    assert!(host.scroll_y() > 820.0);
    assert!(entered.get());

    host.run_frame(1200.0);
    assert_eq!(host.scroll_y(), 1000.0);
  }

  #[test]
  fn scroll_to_delegates_when_active() {
    let (host, controller) = setup();
    controller.initialize();

    controller.scroll_to(
      ScrollTarget::Bottom,
      ScrollToOptions::builder().immediate(true).build(),
    );

    assert_eq!(host.scroll_y(), 3200.0);
  }
}
