use std::cell::RefCell;
use std::rc::Rc;

use leptos_glide_tween::Ease;
use leptos_glide_utils::Host;
use leptos_glide_utils::InputEvent;
use leptos_glide_utils::InputSubscription;
use slotmap::SlotMap;
use typed_builder::TypedBuilder;

use crate::animate::Animate;
use crate::animate::Motion;
use crate::virtual_scroll::InputSource;
use crate::virtual_scroll::VirtualScroll;
use crate::virtual_scroll::VirtualScrollDelta;
use crate::GestureOrientation;
use crate::SmoothScrollOptions;

slotmap::new_key_type! {
  pub struct ListenerKey;
}

type ScrollListener = Rc<dyn Fn(&ScrollEvent)>;

/// Which way the page last moved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Direction {
  #[default]
  None,
  Down,
  Up,
}

impl Direction {
  fn of(delta: f64) -> Self {
    if delta > 0.0 {
      Self::Down
    } else if delta < 0.0 {
      Self::Up
    } else {
      Self::None
    }
  }
}

/// A snapshot sent to scroll listeners after every update.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollEvent {
  pub scroll: f64,
  pub limit: f64,
  pub velocity: f64,
  pub direction: Direction,
  /// `scroll / limit`, or 1 when there's nothing to scroll.
  pub progress: f64,
}

/// Where [`SmoothScroll::scroll_to`] should go.
#[derive(Clone, Debug, PartialEq)]
pub enum ScrollTarget {
  /// An absolute offset in pixels.
  Position(f64),
  /// The top of the first element matching a selector.
  Selector(String),
  Top,
  Bottom,
}

impl From<f64> for ScrollTarget {
  fn from(value: f64) -> Self {
    Self::Position(value)
  }
}

impl From<&str> for ScrollTarget {
  fn from(value: &str) -> Self {
    match value {
      "top" | "#top" => Self::Top,
      "bottom" | "#bottom" => Self::Bottom,
      selector => Self::Selector(selector.to_string()),
    }
  }
}

impl From<String> for ScrollTarget {
  fn from(value: String) -> Self {
    value.as_str().into()
  }
}

#[derive(TypedBuilder)]
pub struct ScrollToOptions {
  /// Added to the resolved target, in pixels.
  #[builder(default)]
  pub offset: f64,

  /// Jump without animating.
  #[builder(default)]
  pub immediate: bool,

  /// Ignore user input until the scroll completes.
  #[builder(default)]
  pub lock: bool,

  /// Seconds. Falls back to the instance duration.
  #[builder(default, setter(strip_option))]
  pub duration: Option<f64>,

  /// Falls back to the instance easing.
  #[builder(default, setter(strip_option))]
  pub easing: Option<Ease>,

  /// Scroll even when stopped or locked.
  #[builder(default)]
  pub force: bool,

  /// Called when the target is reached. Dropped without being called when
  /// another scroll takes over.
  #[builder(default, setter(strip_option))]
  pub on_complete: Option<Box<dyn FnOnce()>>,
}

impl Default for ScrollToOptions {
  fn default() -> Self {
    Self::builder().build()
  }
}

#[derive(Default)]
struct ScrollState {
  animated_scroll: f64,
  target_scroll: f64,
  velocity: f64,
  direction: Direction,
  is_scrolling: bool,
  is_stopped: bool,
  is_locked: bool,
  destroyed: bool,
  last_time: Option<f64>,
  animate: Animate,
  on_complete: Option<Box<dyn FnOnce()>>,
}

struct SmoothScrollInner<H: Host> {
  host: Rc<H>,
  options: SmoothScrollOptions,
  state: RefCell<ScrollState>,
  virtual_scroll: RefCell<VirtualScroll>,
  listeners: RefCell<SlotMap<ListenerKey, ScrollListener>>,
  subscription: RefCell<Option<InputSubscription>>,
}

/// Eases the window's scroll position towards wherever wheel input, touch
/// input or [`SmoothScroll::scroll_to`] sends it.
///
/// Nothing moves until [`SmoothScroll::raf`] is called, once per frame, with
/// the current time. Cloning yields another handle to the same instance.
pub struct SmoothScroll<H: Host> {
  inner: Rc<SmoothScrollInner<H>>,
}

impl<H: Host> Clone for SmoothScroll<H> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<H: Host> SmoothScroll<H> {
  pub fn new(host: Rc<H>, options: SmoothScrollOptions) -> Self {
    let scroll = host.scroll_y();
    let virtual_scroll = VirtualScroll::new(options.wheel_multiplier, options.touch_multiplier);
    let inner = Rc::new(SmoothScrollInner {
      host,
      options,
      state: RefCell::new(ScrollState {
        animated_scroll: scroll,
        target_scroll: scroll,
        ..Default::default()
      }),
      virtual_scroll: RefCell::new(virtual_scroll),
      listeners: RefCell::new(SlotMap::with_key()),
      subscription: RefCell::new(None),
    });

    let weak = Rc::downgrade(&inner);
    let subscription = inner.host.listen_input(Rc::new(move |event| {
      weak
        .upgrade()
        .map_or(false, |inner| SmoothScroll { inner }.on_input(event))
    }));

    if subscription.is_none() {
      log::warn!("smooth scroll could not listen to input");
    }

    *inner.subscription.borrow_mut() = subscription;

    Self { inner }
  }

  /// Whether both handles refer to the same instance.
  pub fn ptr_eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.inner, &other.inner)
  }

  pub fn options(&self) -> &SmoothScrollOptions {
    &self.inner.options
  }

  /// Call `listener` after every scroll update.
  pub fn on_scroll(&self, listener: impl Fn(&ScrollEvent) + 'static) -> ListenerKey {
    self.inner.listeners.borrow_mut().insert(Rc::new(listener))
  }

  pub fn off(&self, key: ListenerKey) -> bool {
    self.inner.listeners.borrow_mut().remove(key).is_some()
  }

  /// Advance to `time` milliseconds.
  pub fn raf(&self, time: f64) {
    let (advanced, on_complete) = {
      let mut state = self.inner.state.borrow_mut();

      if state.destroyed {
        return;
      }

      let delta = time - state.last_time.unwrap_or(time);
      state.last_time = Some(time);

      let Some((value, completed)) = state.animate.advance(delta.max(0.0) / 1000.0) else {
        return;
      };

      state.velocity = value - state.animated_scroll;
      state.direction = Direction::of(state.velocity);
      state.animated_scroll = value;
      state.is_scrolling = !completed;

      if completed {
        state.velocity = 0.0;
        state.is_locked = false;
        (value, state.on_complete.take())
      } else {
        (value, None)
      }
    };

    self.inner.host.set_scroll_y(self.wrap(advanced));
    self.emit();

    if let Some(on_complete) = on_complete {
      on_complete();
    }
  }

  /// Scroll to `target`. Does nothing while stopped or locked unless
  /// `force` is set, or when the target can't be resolved.
  pub fn scroll_to(&self, target: impl Into<ScrollTarget>, options: ScrollToOptions) {
    self.scroll_to_inner(target.into(), options, true);
  }

  /// Resume reacting to input.
  pub fn start(&self) {
    if !self.inner.state.borrow().is_stopped {
      return;
    }

    self.inner.state.borrow_mut().is_stopped = false;
    self.reset();
  }

  /// Stop the current scroll and ignore input until [`SmoothScroll::start`].
  pub fn stop(&self) {
    if self.inner.state.borrow().is_stopped {
      return;
    }

    self.inner.state.borrow_mut().is_stopped = true;
    self.reset();
  }

  /// Detach from input and drop every listener. The instance is inert
  /// afterwards.
  pub fn destroy(&self) {
    {
      let mut state = self.inner.state.borrow_mut();
      state.destroyed = true;
      state.animate.stop();
      state.is_scrolling = false;
      state.on_complete = None;
    }

    let subscription = self.inner.subscription.borrow_mut().take();
    drop(subscription);
    self.inner.listeners.borrow_mut().clear();
  }

  /// The current animated position. Wrapped into `[0, limit)` when
  /// infinite.
  pub fn scroll(&self) -> f64 {
    self.wrap(self.inner.state.borrow().animated_scroll)
  }

  pub fn target_scroll(&self) -> f64 {
    self.inner.state.borrow().target_scroll
  }

  /// The largest scroll offset.
  pub fn limit(&self) -> f64 {
    self.inner.host.max_scroll()
  }

  pub fn velocity(&self) -> f64 {
    self.inner.state.borrow().velocity
  }

  pub fn direction(&self) -> Direction {
    self.inner.state.borrow().direction
  }

  pub fn progress(&self) -> f64 {
    let limit = self.limit();

    if limit == 0.0 {
      1.0
    } else {
      self.scroll() / limit
    }
  }

  pub fn is_scrolling(&self) -> bool {
    self.inner.state.borrow().is_scrolling
  }

  pub fn is_stopped(&self) -> bool {
    self.inner.state.borrow().is_stopped
  }

  pub fn is_locked(&self) -> bool {
    self.inner.state.borrow().is_locked
  }

  pub fn is_destroyed(&self) -> bool {
    self.inner.state.borrow().destroyed
  }

  fn scroll_to_inner(&self, target: ScrollTarget, options: ScrollToOptions, programmatic: bool) {
    let host = &self.inner.host;
    let settings = &self.inner.options;

    {
      let state = self.inner.state.borrow();

      if state.destroyed || ((state.is_stopped || state.is_locked) && !options.force) {
        return;
      }
    }

    let limit = self.limit();
    let resolved = match target {
      ScrollTarget::Position(value) => value,
      ScrollTarget::Top => 0.0,
      ScrollTarget::Bottom => limit,
      ScrollTarget::Selector(selector) => {
        let Some(element) = host.query_selector(&selector) else {
          log::debug!("smooth scroll target `{selector}` not found");
          return;
        };

        host.bounding_top(&element) + self.inner.state.borrow().animated_scroll
      }
    };

    let mut target = resolved + options.offset;

    if !settings.infinite {
      target = target.clamp(0.0, limit);
    }

    if options.immediate {
      {
        let mut state = self.inner.state.borrow_mut();
        state.animated_scroll = target;
        state.target_scroll = target;
        settle(&mut state);
      }

      host.set_scroll_y(self.wrap(target));
      self.emit();

      if let Some(on_complete) = options.on_complete {
        on_complete();
      }

      return;
    }

    let mut state = self.inner.state.borrow_mut();

    if !programmatic && target == state.target_scroll {
      return;
    }

    let motion = match options.duration.or(settings.duration) {
      Some(duration) => Motion::Duration(duration, options.easing.unwrap_or(settings.easing)),
      None => Motion::Lerp(settings.lerp),
    };

    let from = state.animated_scroll;
    state.target_scroll = target;
    state.is_locked = options.lock;
    state.on_complete = options.on_complete;
    state.animate.from_to(from, target, motion);
  }

  /// Returns `true` to prevent the browser's default handling.
  fn on_input(&self, event: &InputEvent) -> bool {
    if *event == InputEvent::Scroll {
      self.on_native_scroll();
      return false;
    }

    let page_height = self.inner.host.viewport_height();
    let Some(delta) = self.inner.virtual_scroll.borrow_mut().handle(event, page_height) else {
      return false;
    };

    self.on_virtual_scroll(delta)
  }

  fn on_virtual_scroll(&self, delta: VirtualScrollDelta) -> bool {
    let settings = &self.inner.options;

    if delta.ctrl_key {
      return false;
    }

    let smooth = match delta.source {
      InputSource::Wheel => settings.smooth_wheel,
      InputSource::Touch => settings.smooth_touch,
    };

    if !smooth {
      return false;
    }

    {
      let state = self.inner.state.borrow();

      if state.destroyed {
        return false;
      }

      if state.is_stopped || state.is_locked {
        return true;
      }
    }

    let amount = match settings.gesture_orientation {
      GestureOrientation::Vertical => delta.delta_y,
      GestureOrientation::Horizontal => delta.delta_x,
      GestureOrientation::Both => {
        if delta.delta_x.abs() > delta.delta_y.abs() {
          delta.delta_x
        } else {
          delta.delta_y
        }
      }
    };

    if amount == 0.0 {
      return true;
    }

    let target = self.inner.state.borrow().target_scroll + amount;
    self.scroll_to_inner(
      ScrollTarget::Position(target),
      ScrollToOptions::default(),
      false,
    );

    true
  }

  /// Scroll events we caused ourselves, or that arrive mid-animation, are
  /// ignored. Anything else moved the page behind our back.
  fn on_native_scroll(&self) {
    let actual = self.inner.host.scroll_y();

    {
      let mut state = self.inner.state.borrow_mut();

      if state.destroyed
        || state.is_scrolling
        || state.animate.is_running()
        || (actual - self.wrap(state.animated_scroll)).abs() < 1.0
      {
        return;
      }

      let last = state.animated_scroll;
      state.animated_scroll = actual;
      state.target_scroll = actual;
      state.velocity = 0.0;
      state.direction = Direction::of(actual - last);
    }

    self.emit();
  }

  fn reset(&self) {
    let actual = self.inner.host.scroll_y();
    let mut state = self.inner.state.borrow_mut();

    state.animated_scroll = actual;
    state.target_scroll = actual;
    settle(&mut state);
  }

  fn emit(&self) {
    let event = {
      let state = self.inner.state.borrow();
      let limit = self.limit();
      let scroll = self.wrap(state.animated_scroll);

      ScrollEvent {
        scroll,
        limit,
        velocity: state.velocity,
        direction: state.direction,
        progress: if limit == 0.0 { 1.0 } else { scroll / limit },
      }
    };

    let listeners: Vec<ScrollListener> = self.inner.listeners.borrow().values().cloned().collect();

    for listener in listeners {
      listener(&event);
    }
  }

  fn wrap(&self, value: f64) -> f64 {
    let limit = self.limit();

    if self.inner.options.infinite && limit > 0.0 {
      value.rem_euclid(limit)
    } else {
      value
    }
  }
}

/// Drop whatever scroll was in flight.
fn settle(state: &mut ScrollState) {
  state.is_locked = false;
  state.is_scrolling = false;
  state.velocity = 0.0;
  state.on_complete = None;
  state.animate.stop();
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use leptos_glide_utils::DeltaMode;
  use leptos_glide_utils::HeadlessHost;

  use super::*;

  fn setup(options: SmoothScrollOptions) -> (Rc<HeadlessHost>, SmoothScroll<HeadlessHost>) {
    let host = Rc::new(HeadlessHost::browser(4000.0));
    let scroll = SmoothScroll::new(host.clone(), options);
    (host, scroll)
  }

  fn wheel(delta_y: f64) -> InputEvent {
    InputEvent::Wheel {
      delta_x: 0.0,
      delta_y,
      delta_mode: DeltaMode::Pixel,
      ctrl_key: false,
    }
  }

  fn linear(duration: f64) -> SmoothScrollOptions {
    SmoothScrollOptions::builder()
      .duration(duration)
      .easing(Ease::Linear)
      .build()
  }

  #[test]
  fn wheel_input_is_smoothed_over_the_duration() {
    let (host, scroll) = setup(linear(1.0));

    assert!(host.dispatch(&wheel(400.0)));
    assert_eq!(scroll.target_scroll(), 400.0);
    assert_eq!(host.scroll_y(), 0.0);

    scroll.raf(0.0);
    scroll.raf(500.0);
    assert_eq!(host.scroll_y(), 200.0);
    assert!(scroll.is_scrolling());
    assert_eq!(scroll.direction(), Direction::Down);

    scroll.raf(1000.0);
    assert_eq!(host.scroll_y(), 400.0);
    assert!(!scroll.is_scrolling());
  }

  #[test]
  fn wheel_input_accumulates_on_the_target() {
    let (host, scroll) = setup(linear(1.0));

    host.dispatch(&wheel(100.0));
    host.dispatch(&wheel(100.0));
    assert_eq!(scroll.target_scroll(), 200.0);

    host.dispatch(&wheel(-500.0));
    assert_eq!(scroll.target_scroll(), 0.0);
  }

  #[test]
  fn zoom_and_native_touch_are_left_alone() {
    let (host, scroll) = setup(linear(1.0));

    let zoom = InputEvent::Wheel {
      delta_x: 0.0,
      delta_y: 100.0,
      delta_mode: DeltaMode::Pixel,
      ctrl_key: true,
    };
    assert!(!host.dispatch(&zoom));

    host.dispatch(&InputEvent::TouchStart { x: 0.0, y: 500.0 });
    assert!(!host.dispatch(&InputEvent::TouchMove { x: 0.0, y: 400.0 }));
    assert_eq!(scroll.target_scroll(), 0.0);
  }

  #[test]
  fn smooth_touch_uses_the_touch_multiplier() {
    let options = SmoothScrollOptions::builder()
      .duration(1.0)
      .smooth_touch(true)
      .touch_multiplier(2.0)
      .build();
    let (host, scroll) = setup(options);

    host.dispatch(&InputEvent::TouchStart { x: 0.0, y: 500.0 });
    assert!(host.dispatch(&InputEvent::TouchMove { x: 0.0, y: 400.0 }));
    assert_eq!(scroll.target_scroll(), 200.0);
  }

  #[test]
  fn listeners_receive_every_update() {
    let (host, scroll) = setup(linear(1.0));
    let events = Rc::new(RefCell::new(Vec::new()));
    let key = {
      let events = events.clone();
      scroll.on_scroll(move |event| events.borrow_mut().push(*event))
    };

    scroll.scroll_to(1600.0, ScrollToOptions::default());
    scroll.raf(0.0);
    scroll.raf(500.0);
    scroll.raf(1000.0);

    let events = events.borrow();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1].scroll, 800.0);
    assert_eq!(events[1].limit, 3200.0);
    assert_eq!(events[1].progress, 0.25);
    assert_eq!(events[2].velocity, 0.0);
    assert_eq!(host.scroll_y(), 1600.0);

    assert!(scroll.off(key));
    assert!(!scroll.off(key));
  }

  #[test]
  fn scroll_to_resolves_selectors_and_offsets() {
    let (host, scroll) = setup(SmoothScrollOptions::default());
    host.insert(&["#about"], 1200.0);
    let completed = Rc::new(Cell::new(false));

    scroll.scroll_to(
      "#about",
      ScrollToOptions::builder()
        .offset(-100.0)
        .immediate(true)
        .on_complete(Box::new({
          let completed = completed.clone();
          move || completed.set(true)
        }))
        .build(),
    );

    assert_eq!(host.scroll_y(), 1100.0);
    assert!(completed.get());

    scroll.scroll_to("#missing", ScrollToOptions::default());
    assert_eq!(scroll.target_scroll(), 1100.0);

    scroll.scroll_to(ScrollTarget::Bottom, ScrollToOptions::builder().immediate(true).build());
    assert_eq!(host.scroll_y(), 3200.0);

    scroll.scroll_to("top", ScrollToOptions::builder().immediate(true).build());
    assert_eq!(host.scroll_y(), 0.0);
  }

  #[test]
  fn on_complete_runs_once_the_target_is_reached() {
    let (_host, scroll) = setup(linear(0.5));
    let completed = Rc::new(Cell::new(0));

    scroll.scroll_to(
      300.0,
      ScrollToOptions::builder()
        .on_complete(Box::new({
          let completed = completed.clone();
          move || completed.set(completed.get() + 1)
        }))
        .build(),
    );

    scroll.raf(0.0);
    scroll.raf(250.0);
    assert_eq!(completed.get(), 0);
    scroll.raf(500.0);
    scroll.raf(750.0);
    assert_eq!(completed.get(), 1);
  }

  #[test]
  fn stopped_instances_swallow_input() {
    let (host, scroll) = setup(linear(1.0));

    scroll.stop();
    assert!(scroll.is_stopped());
    assert!(host.dispatch(&wheel(100.0)));
    assert_eq!(scroll.target_scroll(), 0.0);

    scroll.scroll_to(500.0, ScrollToOptions::default());
    assert_eq!(scroll.target_scroll(), 0.0);

    scroll.scroll_to(500.0, ScrollToOptions::builder().force(true).build());
    assert_eq!(scroll.target_scroll(), 500.0);

    scroll.start();
    host.dispatch(&wheel(100.0));
    assert_eq!(scroll.target_scroll(), 100.0);
  }

  #[test]
  fn locked_scrolls_ignore_the_wheel() {
    let (host, scroll) = setup(linear(1.0));

    scroll.scroll_to(1000.0, ScrollToOptions::builder().lock(true).build());
    host.dispatch(&wheel(100.0));
    assert_eq!(scroll.target_scroll(), 1000.0);

    scroll.raf(0.0);
    scroll.raf(1000.0);
    assert!(!scroll.is_locked());
    host.dispatch(&wheel(100.0));
    assert_eq!(scroll.target_scroll(), 1100.0);
  }

  #[test]
  fn native_scrolls_resynchronise() {
    let (host, scroll) = setup(linear(1.0));

    host.user_scroll(900.0);
    assert_eq!(scroll.scroll(), 900.0);
    assert_eq!(scroll.target_scroll(), 900.0);
    assert_eq!(scroll.direction(), Direction::Down);

    host.dispatch(&wheel(100.0));
    assert_eq!(scroll.target_scroll(), 1000.0);
  }

  #[test]
  fn destroy_detaches_everything() {
    let (host, scroll) = setup(linear(1.0));
    scroll.on_scroll(|_| {});
    assert_eq!(host.input_listeners(), 1);

    scroll.destroy();

    assert!(scroll.is_destroyed());
    assert_eq!(host.input_listeners(), 0);
    scroll.scroll_to(500.0, ScrollToOptions::default());
    scroll.raf(0.0);
    scroll.raf(1000.0);
    assert_eq!(host.scroll_y(), 0.0);
  }

  #[test]
  fn infinite_scroll_wraps() {
    let options = SmoothScrollOptions::builder().infinite(true).build();
    let (host, scroll) = setup(options);

    scroll.scroll_to(3300.0, ScrollToOptions::builder().immediate(true).build());

    assert_eq!(scroll.target_scroll(), 3300.0);
    assert_eq!(scroll.scroll(), 100.0);
    assert_eq!(host.scroll_y(), 100.0);
  }
}
