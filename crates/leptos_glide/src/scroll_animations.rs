use std::cell::RefCell;
use std::rc::Rc;

use leptos_glide_tween::Ease;
use leptos_glide_tween::EaseDirection;
use leptos_glide_tween::Engine;
use leptos_glide_tween::ScrollTriggerConfig;
use leptos_glide_tween::Target;
use leptos_glide_tween::TriggerKey;
use leptos_glide_tween::TweenVars;
use leptos_glide_utils::Host;

/// An effect played once on every element matching `selector` when it
/// scrolls into view.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Reveal {
  selector: &'static str,
  /// Start line as a fraction of the viewport height.
  start: f64,
  duration: f64,
  x: f64,
  y: f64,
  scale: f64,
}

const REVEALS: [Reveal; 4] = [
  Reveal {
    selector: "[data-fade-in]",
    start: 0.85,
    duration: 0.6,
    x: 0.0,
    y: 30.0,
    scale: 1.0,
  },
  Reveal {
    selector: "[data-fade-scale]",
    start: 0.9,
    duration: 0.6,
    x: 0.0,
    y: 30.0,
    scale: 0.98,
  },
  Reveal {
    selector: "[data-slide-left]",
    start: 0.85,
    duration: 0.8,
    x: -50.0,
    y: 0.0,
    scale: 1.0,
  },
  Reveal {
    selector: "[data-slide-right]",
    start: 0.85,
    duration: 0.8,
    x: 50.0,
    y: 0.0,
    scale: 1.0,
  },
];

impl Reveal {
  fn hidden(&self) -> TweenVars {
    TweenVars::builder()
      .opacity(0.0)
      .x(self.x)
      .y(self.y)
      .scale(self.scale)
      .build()
  }

  fn shown(&self) -> TweenVars {
    TweenVars::builder()
      .opacity(1.0)
      .x(0.0)
      .y(0.0)
      .scale(1.0)
      .duration(self.duration)
      .ease(POWER2_OUT)
      .build()
  }
}

const POWER2_OUT: Ease = Ease::Power(2, EaseDirection::Out);

/// Seconds between the start of one card and the next.
const CARD_STAGGER: f64 = 0.08;
const CARD_START: f64 = 0.85;

const COUNTER_START: f64 = 0.85;
const COUNTER_DURATION: f64 = 1.5;
const COUNTER_TARGET_ATTRIBUTE: &str = "data-counter-target";

/// Reveal-on-scroll effects for marked elements.
///
/// - `data-fade-in`, `data-fade-scale`, `data-slide-left` and
///   `data-slide-right` elements are hidden when
///   [`ScrollAnimations::init_all`] runs and animate in the first time their
///   top crosses the start line.
/// - The `data-card` children of a `data-cards-stagger` container are hidden
///   and animate in one after another once the container enters.
/// - `data-counter` elements count up to their `data-counter-target` once
///   they enter.
pub struct ScrollAnimations<H: Host> {
  engine: Engine<H>,
  triggers: Rc<RefCell<Option<Vec<TriggerKey>>>>,
}

impl<H: Host> Clone for ScrollAnimations<H> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      triggers: self.triggers.clone(),
    }
  }
}

impl<H: Host> ScrollAnimations<H> {
  pub fn new(engine: Engine<H>) -> Self {
    Self {
      engine,
      triggers: Default::default(),
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.triggers.borrow().is_some()
  }

  /// Set up every effect. Calling this again before
  /// [`ScrollAnimations::cleanup`] does nothing.
  pub fn init_all(&self) {
    if self.is_initialized() {
      return;
    }

    let mut keys = Vec::new();
    self.init_reveals(&mut keys);
    self.init_card_staggers(&mut keys);
    self.init_counters(&mut keys);

    log::debug!("scroll animations created {} triggers", keys.len());
    *self.triggers.borrow_mut() = Some(keys);
  }

  /// Remove the triggers created by [`ScrollAnimations::init_all`] and allow
  /// it to run again.
  pub fn cleanup(&self) {
    let Some(keys) = self.triggers.borrow_mut().take() else {
      return;
    };

    let triggers = self.engine.scroll_triggers();

    for key in keys {
      triggers.kill(key);
    }
  }

  /// Measure the start lines again on the next frame, e.g. after images
  /// load.
  pub fn refresh(&self) {
    let triggers = self.engine.scroll_triggers().clone();
    let handle = self
      .engine
      .host()
      .request_frame(Box::new(move |_| triggers.refresh()));

    if handle.is_none() {
      self.engine.scroll_triggers().refresh();
    }
  }

  fn init_reveals(&self, keys: &mut Vec<TriggerKey>) {
    let host = self.engine.host();

    for reveal in REVEALS {
      for element in host.query_selector_all(reveal.selector) {
        self
          .engine
          .set(Target::Element(element.clone()), reveal.hidden());

        let on_enter = {
          let engine = self.engine.clone();
          let element = element.clone();
          move || {
            engine.from_to(
              Target::Element(element.clone()),
              reveal.hidden(),
              reveal.shown(),
            );
          }
        };

        keys.push(self.once_entered(element, reveal.start, on_enter));
      }
    }
  }

  fn init_card_staggers(&self, keys: &mut Vec<TriggerKey>) {
    let host = self.engine.host();
    let hidden = || TweenVars::builder().opacity(0.0).y(20.0).build();

    for container in host.query_selector_all("[data-cards-stagger]") {
      let cards = host.query_selector_all_in(&container, "[data-card]");

      if cards.is_empty() {
        continue;
      }

      for card in &cards {
        self.engine.set(Target::Element(card.clone()), hidden());
      }

      let on_enter = {
        let engine = self.engine.clone();
        move || {
          for (index, card) in cards.iter().enumerate() {
            engine.from_to(
              Target::Element(card.clone()),
              hidden(),
              TweenVars::builder()
                .opacity(1.0)
                .y(0.0)
                .duration(0.5)
                .delay(index as f64 * CARD_STAGGER)
                .ease(POWER2_OUT)
                .build(),
            );
          }
        }
      };

      keys.push(self.once_entered(container, CARD_START, on_enter));
    }
  }

  fn init_counters(&self, keys: &mut Vec<TriggerKey>) {
    let host = self.engine.host();

    for counter in host.query_selector_all("[data-counter]") {
      let target = host
        .attribute(&counter, COUNTER_TARGET_ATTRIBUTE)
        .and_then(|value| parse_leading_int(&value))
        .unwrap_or_default();

      let on_enter = {
        let engine = self.engine.clone();
        let counter = counter.clone();
        move || {
          engine.to(
            Target::Element(counter.clone()),
            TweenVars::builder()
              .text(target as f64)
              .duration(COUNTER_DURATION)
              .ease(POWER2_OUT)
              .build(),
          );
        }
      };

      keys.push(self.once_entered(counter, COUNTER_START, on_enter));
    }
  }

  fn once_entered(
    &self,
    element: H::Element,
    start: f64,
    on_enter: impl Fn() + 'static,
  ) -> TriggerKey {
    self.engine.scroll_triggers().create(
      ScrollTriggerConfig::builder()
        .trigger(element)
        .start(start)
        .once(true)
        .on_enter(Rc::new(on_enter))
        .build(),
    )
  }
}

/// Read the integer at the start of `value`, ignoring whatever follows it.
/// `"1200+"` reads as 1200.
fn parse_leading_int(value: &str) -> Option<i64> {
  let value = value.trim_start();
  let end = value
    .char_indices()
    .find(|&(index, char)| !(char.is_ascii_digit() || (index == 0 && matches!(char, '-' | '+'))))
    .map_or(value.len(), |(index, _)| index);

  value[..end].parse().ok()
}

#[cfg(test)]
mod tests {
  use leptos_glide_utils::HeadlessElement;
  use leptos_glide_utils::HeadlessHost;

  use super::*;

  fn setup() -> (Rc<HeadlessHost>, ScrollAnimations<HeadlessHost>) {
    let host = Rc::new(HeadlessHost::browser(4000.0));
    let engine = Engine::new(host.clone());
    engine.ticker().lag_smoothing(None);

    (host, ScrollAnimations::new(engine))
  }

  #[test]
  fn elements_below_the_fold_start_hidden() {
    let (host, animations) = setup();
    let card = host.insert(&["[data-fade-scale]"], 2000.0);

    animations.init_all();

    assert_eq!(host.style(&card, "opacity").as_deref(), Some("0"));
    insta::assert_snapshot!(host.style(&card, "transform").unwrap(), @"translate3d(0px, 30px, 0px) scale(0.98)");
    assert_eq!(animations.engine.scroll_triggers().len(), 1);
  }

  #[test]
  fn elements_reveal_once_when_scrolled_into_view() {
    let (host, animations) = setup();
    let section = host.insert(&["[data-fade-in]"], 1500.0);

    animations.init_all();
    host.run_frame(0.0);

    // 1500 - 800 * 0.85 = 820
    host.user_scroll(820.0);
    assert!(animations.engine.is_tweening(&Target::Element(section)));

    host.run_frame(600.0);
    assert_eq!(host.style(&section, "opacity").as_deref(), Some("1"));
    insta::assert_snapshot!(host.style(&section, "transform").unwrap(), @"translate3d(0px, 0px, 0px)");

    host.user_scroll(0.0);
    host.user_scroll(900.0);
    assert_eq!(animations.engine.active_count(), 0);
    assert!(animations.engine.scroll_triggers().is_empty());
  }

  #[test]
  fn slides_come_in_from_the_side() {
    let (host, animations) = setup();
    let left = host.insert(&["[data-slide-left]"], 3000.0);
    let right = host.insert(&["[data-slide-right]"], 3000.0);

    animations.init_all();

    insta::assert_snapshot!(host.style(&left, "transform").unwrap(), @"translate3d(-50px, 0px, 0px)");
    insta::assert_snapshot!(host.style(&right, "transform").unwrap(), @"translate3d(50px, 0px, 0px)");
  }

  #[test]
  fn cards_reveal_one_after_another() {
    let (host, animations) = setup();
    let grid = host.insert(&["[data-cards-stagger]"], 1500.0);
    let cards: Vec<_> = (0..3)
      .map(|_| host.insert_into(&grid, &["[data-card]"], 1500.0))
      .collect();

    animations.init_all();
    host.run_frame(0.0);

    for card in &cards {
      assert_eq!(host.style(card, "opacity").as_deref(), Some("0"));
      insta::assert_snapshot!(host.style(card, "transform").unwrap(), @"translate3d(0px, 20px, 0px)");
    }

    host.user_scroll(820.0);
    assert_eq!(animations.engine.active_count(), 3);

    host.run_frame(100.0);
    let opacity = |card: &HeadlessElement| {
      host
        .style(card, "opacity")
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap()
    };
    assert!(opacity(&cards[0]) > opacity(&cards[1]));
    assert!(opacity(&cards[1]) > 0.0);
    assert_eq!(opacity(&cards[2]), 0.0);

    host.run_frame(700.0);
    for card in &cards {
      assert_eq!(host.style(card, "opacity").as_deref(), Some("1"));
    }
    assert_eq!(animations.engine.active_count(), 0);
  }

  #[test]
  fn empty_card_containers_are_skipped() {
    let (host, animations) = setup();
    host.insert(&["[data-cards-stagger]"], 1500.0);

    animations.init_all();

    assert!(animations.engine.scroll_triggers().is_empty());
  }

  #[test]
  fn counters_count_up_once_in_view() {
    let (host, animations) = setup();
    let counter = host.insert(&["[data-counter]"], 2000.0);
    host.set_attribute(&counter, "data-counter-target", "1200+");
    host.set_text(&counter, "0");

    animations.init_all();
    host.run_frame(0.0);
    assert_eq!(host.text(&counter).as_deref(), Some("0"));

    // 2000 - 800 * 0.85 = 1320
    host.user_scroll(1320.0);
    host.run_frame(750.0);
    assert_eq!(host.text(&counter).as_deref(), Some("1,050"));

    host.run_frame(1500.0);
    assert_eq!(host.text(&counter).as_deref(), Some("1,200"));
    assert!(animations.engine.scroll_triggers().is_empty());
  }

  #[test]
  fn counter_targets_read_like_integers() {
    assert_eq!(parse_leading_int("500"), Some(500));
    assert_eq!(parse_leading_int(" 98%"), Some(98));
    assert_eq!(parse_leading_int("-12abc"), Some(-12));
    assert_eq!(parse_leading_int("abc"), None);
    assert_eq!(parse_leading_int(""), None);
  }

  #[test]
  fn init_all_is_idempotent() {
    let (host, animations) = setup();
    host.insert(&["[data-fade-in]"], 2000.0);
    host.insert(&["[data-fade-scale]"], 2500.0);

    animations.init_all();
    animations.init_all();

    assert!(animations.is_initialized());
    assert_eq!(animations.engine.scroll_triggers().len(), 2);
  }

  #[test]
  fn cleanup_allows_initializing_again() {
    let (host, animations) = setup();
    host.insert(&["[data-fade-in]"], 2000.0);

    animations.init_all();
    animations.cleanup();

    assert!(!animations.is_initialized());
    assert!(animations.engine.scroll_triggers().is_empty());
    assert_eq!(host.input_listeners(), 0);

    animations.init_all();
    assert_eq!(animations.engine.scroll_triggers().len(), 1);

    animations.cleanup();
    animations.cleanup();
  }

  #[test]
  fn refresh_waits_for_the_next_frame() {
    let (host, animations) = setup();
    let section = host.insert(&["[data-fade-in]"], 1500.0);

    animations.init_all();
    host.set_scroll_y(1000.0);
    animations.refresh();
    assert!(!animations.engine.is_tweening(&Target::Element(section)));

    host.run_frame(0.0);
    assert!(animations.engine.is_tweening(&Target::Element(section)));
  }
}
