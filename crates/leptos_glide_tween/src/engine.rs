use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use leptos_glide_utils::ElementKey;
use leptos_glide_utils::FrameHandle;
use leptos_glide_utils::Host;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::tween::css_number;
use crate::tween::format_count;
use crate::tween::parse_count;
use crate::tween::PropertyTween;
use crate::tween::Transform;
use crate::tween::Tween;
use crate::tween::TweenState;
use crate::Overwrite;
use crate::Property;
use crate::ScrollTriggers;
use crate::Target;
use crate::TargetKey;
use crate::Ticker;
use crate::TweenVars;

/// How far, in pixels, the scroll position may drift from what an
/// auto-killing scroll tween last wrote before the tween gives up.
pub const AUTO_KILL_THRESHOLD: f64 = 7.0;

slotmap::new_key_type! {
  struct TweenKey;
}

/// Refers to a tween created by an [`Engine`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TweenHandle(TweenKey);

struct EngineInner<H: Host> {
  host: Rc<H>,
  ticker: Ticker,
  triggers: ScrollTriggers<H>,
  tweens: RefCell<SlotMap<TweenKey, Tween<H::Element>>>,
  transforms: RefCell<HashMap<ElementKey, Transform>>,
  next_order: Cell<u64>,
  frame: Cell<Option<FrameHandle>>,
}

impl<H: Host> Drop for EngineInner<H> {
  fn drop(&mut self) {
    if let Some(frame) = self.frame.take() {
      self.host.cancel_frame(frame);
    }
  }
}

/// Runs tweens against a [`Host`] on every frame.
///
/// An engine owns the [`Ticker`] that the host's frames feed, and a set of
/// [`ScrollTriggers`]. It keeps requesting frames until the last handle to it
/// is dropped. Cloning an engine yields another handle to the same engine.
pub struct Engine<H: Host> {
  inner: Rc<EngineInner<H>>,
}

impl<H: Host> Clone for Engine<H> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<H: Host> Engine<H> {
  pub fn new(host: Rc<H>) -> Self {
    let inner = Rc::new(EngineInner {
      triggers: ScrollTriggers::new(host.clone()),
      host,
      ticker: Ticker::new(),
      tweens: RefCell::new(SlotMap::with_key()),
      transforms: Default::default(),
      next_order: Cell::new(0),
      frame: Cell::new(None),
    });

    schedule_frame(&inner);

    Self { inner }
  }

  pub fn host(&self) -> &Rc<H> {
    &self.inner.host
  }

  pub fn ticker(&self) -> &Ticker {
    &self.inner.ticker
  }

  pub fn scroll_triggers(&self) -> &ScrollTriggers<H> {
    &self.inner.triggers
  }

  /// Tween the target from its current values to `vars`.
  pub fn to(&self, target: Target<H::Element>, vars: TweenVars) -> TweenHandle {
    self.add(target, None, vars)
  }

  /// Tween the target from `from` to the values it has right now. The
  /// starting values are applied immediately.
  pub fn from(&self, target: Target<H::Element>, mut from: TweenVars) -> TweenHandle {
    let key = self.target_key(&target);
    let current = |value: Option<f64>, property| value.map(|_| self.read(&target, key, property));
    let to = TweenVars {
      opacity: current(from.opacity, Property::Opacity),
      x: current(from.x, Property::X),
      y: current(from.y, Property::Y),
      scale: current(from.scale, Property::Scale),
      scroll_y: current(from.scroll_y, Property::ScrollY),
      text: current(from.text, Property::Text),
      duration: from.duration,
      delay: from.delay,
      ease: from.ease,
      overwrite: from.overwrite,
      auto_kill: from.auto_kill,
      on_complete: from.on_complete.take(),
    };

    self.add(target, Some(from), to)
  }

  /// Tween the target between explicit start and end values. The starting
  /// values are applied immediately.
  pub fn from_to(
    &self,
    target: Target<H::Element>,
    from: TweenVars,
    to: TweenVars,
  ) -> TweenHandle {
    self.add(target, Some(from), to)
  }

  /// Apply values straight away, without tweening.
  pub fn set(&self, target: Target<H::Element>, vars: TweenVars) {
    let key = self.target_key(&target);

    for (property, value) in vars.properties() {
      if property.supports(&target) {
        self.write(&target, key, property, value);
      }
    }
  }

  /// Stop a tween without completing it. Returns `false` when it had
  /// already finished.
  pub fn kill(&self, handle: TweenHandle) -> bool {
    let killed = self.inner.tweens.borrow_mut().remove(handle.0).is_some();
    self.prune_transforms();
    killed
  }

  /// Stop every tween of the target without completing them.
  pub fn kill_tweens_of(&self, target: &Target<H::Element>) {
    let key = self.target_key(target);
    self
      .inner
      .tweens
      .borrow_mut()
      .retain(|_, tween| tween.key != key);
    self.prune_transforms();
  }

  pub fn is_active(&self, handle: TweenHandle) -> bool {
    self.inner.tweens.borrow().contains_key(handle.0)
  }

  pub fn is_tweening(&self, target: &Target<H::Element>) -> bool {
    let key = self.target_key(target);
    self
      .inner
      .tweens
      .borrow()
      .values()
      .any(|tween| tween.key == key)
  }

  pub fn active_count(&self) -> usize {
    self.inner.tweens.borrow().len()
  }

  /// Advance to `now` (milliseconds): move the clock, render every tween,
  /// then run the ticker callbacks.
  pub fn tick(&self, now: f64) {
    let frame = self.inner.ticker.advance(now);
    self.render(frame.delta / 1000.0);
    self.inner.ticker.dispatch(&frame);
  }

  fn add(
    &self,
    target: Target<H::Element>,
    from: Option<TweenVars>,
    vars: TweenVars,
  ) -> TweenHandle {
    let key = self.target_key(&target);
    let max_scroll = self.inner.host.max_scroll();
    let properties: SmallVec<[PropertyTween; 4]> = vars
      .properties()
      .into_iter()
      .filter(|(property, _)| property.supports(&target))
      .map(|(property, end)| {
        PropertyTween {
          property,
          start: from.as_ref().and_then(|from| from.value(property)),
          end: match property {
            Property::ScrollY => end.clamp(0.0, max_scroll),
            _ => end,
          },
        }
      })
      .collect();

    for value in &properties {
      if let Some(start) = value.start {
        self.write(&target, key, value.property, start);
      }
    }

    let order = self.inner.next_order.get();
    self.inner.next_order.set(order + 1);

    let tween = Tween {
      target,
      key,
      order,
      properties,
      duration: vars.duration,
      delay: vars.delay,
      ease: vars.ease,
      overwrite: vars.overwrite,
      auto_kill: vars.auto_kill,
      elapsed: 0.0,
      started: false,
      last_scroll: None,
      on_complete: vars.on_complete,
    };

    log::debug!("tween {order} created for {key:?}");

    TweenHandle(self.inner.tweens.borrow_mut().insert(tween))
  }

  fn render(&self, delta: f64) {
    let mut completed: Vec<Box<dyn FnOnce()>> = Vec::new();
    let mut finished = false;

    {
      let mut tweens = self.inner.tweens.borrow_mut();
      let mut keys: Vec<(u64, TweenKey)> = tweens
        .iter()
        .map(|(key, tween)| (tween.order, key))
        .collect();
      keys.sort_unstable();

      for (_, key) in keys {
        // Overwriting may already have removed this tween.
        let Some(tween) = tweens.get_mut(key) else {
          continue;
        };

        tween.elapsed += delta;

        if tween.elapsed < tween.delay {
          continue;
        }

        if !tween.started {
          tween.started = true;
          self.capture_start(tween);

          if tween.overwrite == Overwrite::Auto {
            overwrite(&mut tweens, key);
          }
        }

        let Some(tween) = tweens.get_mut(key) else {
          continue;
        };

        match self.render_tween(tween) {
          TweenState::Running => {}
          TweenState::Completed => {
            if let Some(tween) = tweens.remove(key) {
              log::debug!("tween {} completed", tween.order);
              completed.extend(tween.on_complete);
            }
            finished = true;
          }
          TweenState::Killed => {
            log::debug!("tween {} killed", tween.order);
            tweens.remove(key);
            finished = true;
          }
        }
      }
    }

    if finished {
      self.prune_transforms();
    }

    for on_complete in completed {
      on_complete();
    }
  }

  /// Forget the transforms of elements that are back at rest with no tween
  /// left on them. Elements come and go with navigation.
  fn prune_transforms(&self) {
    let tweens = self.inner.tweens.borrow();
    self
      .inner
      .transforms
      .borrow_mut()
      .retain(|element, transform| {
        *transform != Transform::default()
          || tweens
            .values()
            .any(|tween| tween.key == TargetKey::Element(*element))
      });
  }

  fn capture_start(&self, tween: &mut Tween<H::Element>) {
    for index in 0..tween.properties.len() {
      if tween.properties[index].start.is_none() {
        let property = tween.properties[index].property;
        let value = self.read(&tween.target, tween.key, property);
        tween.properties[index].start = Some(value);
      }
    }
  }

  fn render_tween(&self, tween: &mut Tween<H::Element>) -> TweenState {
    let host = &self.inner.host;

    if tween.auto_kill {
      if let Some(last) = tween.last_scroll {
        if (host.scroll_y() - last).abs() > AUTO_KILL_THRESHOLD {
          return TweenState::Killed;
        }
      }
    }

    let progress = tween.progress();
    let eased = if progress >= 1.0 {
      1.0
    } else {
      tween.ease.apply(progress)
    };

    for value in &tween.properties {
      let start = value.start.unwrap_or(value.end);
      let current = start + (value.end - start) * eased;
      self.write(&tween.target, tween.key, value.property, current);
    }

    if tween.animates(Property::ScrollY) {
      tween.last_scroll = Some(host.scroll_y());
    }

    if progress >= 1.0 {
      TweenState::Completed
    } else {
      TweenState::Running
    }
  }

  fn target_key(&self, target: &Target<H::Element>) -> TargetKey {
    match target {
      Target::Element(element) => TargetKey::Element(self.inner.host.element_key(element)),
      Target::Window => TargetKey::Window,
    }
  }

  fn read(&self, target: &Target<H::Element>, key: TargetKey, property: Property) -> f64 {
    let host = &self.inner.host;

    match (target, property) {
      (Target::Window, _) => host.scroll_y(),
      (Target::Element(element), Property::Opacity) => {
        host
          .style(element, "opacity")
          .and_then(|value| value.trim().parse().ok())
          .unwrap_or(1.0)
      }
      (Target::Element(element), Property::Text) => {
        host
          .text(element)
          .and_then(|text| parse_count(&text))
          .unwrap_or_default()
      }
      (Target::Element(_), _) => {
        let TargetKey::Element(element_key) = key else {
          return 0.0;
        };

        self
          .inner
          .transforms
          .borrow()
          .get(&element_key)
          .copied()
          .unwrap_or_default()
          .get(property)
          .unwrap_or_default()
      }
    }
  }

  fn write(&self, target: &Target<H::Element>, key: TargetKey, property: Property, value: f64) {
    let host = &self.inner.host;

    match (target, property) {
      (Target::Window, Property::ScrollY) => host.set_scroll_y(value),
      (Target::Window, _) => {}
      (Target::Element(element), Property::Opacity) => {
        host.set_style(element, "opacity", &css_number(value));
      }
      (Target::Element(_), Property::ScrollY) => {}
      (Target::Element(element), Property::Text) => {
        host.set_text(element, &format_count(value));
      }
      (Target::Element(element), _) => {
        let TargetKey::Element(element_key) = key else {
          return;
        };

        let css = {
          let mut transforms = self.inner.transforms.borrow_mut();
          let transform = transforms.entry(element_key).or_default();
          transform.set(property, value);
          transform.to_css()
        };

        host.set_style(element, "transform", &css);
      }
    }
  }
}

/// Strip the properties of the tween at `key` from every older tween of the
/// same target.
fn overwrite<E>(tweens: &mut SlotMap<TweenKey, Tween<E>>, key: TweenKey) {
  let Some(tween) = tweens.get(key) else {
    return;
  };

  let target = tween.key;
  let order = tween.order;
  let properties: SmallVec<[Property; 4]> = tween
    .properties
    .iter()
    .map(|value| value.property)
    .collect();

  tweens.retain(|_, other| {
    if other.key != target || other.order >= order {
      return true;
    }

    other
      .properties
      .retain(|value| !properties.contains(&value.property));

    if other.properties.is_empty() {
      log::debug!("tween {} overwritten", other.order);
      false
    } else {
      true
    }
  });
}

fn schedule_frame<H: Host>(inner: &Rc<EngineInner<H>>) {
  let weak = Rc::downgrade(inner);
  let handle = inner.host.request_frame(Box::new(move |now| {
    let Some(inner) = weak.upgrade() else {
      return;
    };

    inner.frame.set(None);
    let engine = Engine { inner };
    engine.tick(now);
    schedule_frame(&engine.inner);
  }));

  inner.frame.set(handle);
}
