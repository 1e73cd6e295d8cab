use std::cell::RefCell;
use std::rc::Rc;

use leptos_glide_utils::Host;
use leptos_glide_utils::InputEvent;
use leptos_glide_utils::InputSubscription;
use slotmap::SlotMap;
use typed_builder::TypedBuilder;

slotmap::new_key_type! {
  pub struct TriggerKey;
}

type TriggerCallback = Rc<dyn Fn()>;

/// Describes when a scroll trigger fires.
#[derive(TypedBuilder)]
pub struct ScrollTriggerConfig<E> {
  /// The element whose top edge is watched.
  pub trigger: E,

  /// The start line as a fraction of the viewport height, measured from the
  /// top. `0.85` enters once the element's top passes 85% down the viewport.
  #[builder(default = 0.85)]
  pub start: f64,

  /// Remove the trigger after it first enters.
  #[builder(default)]
  pub once: bool,

  #[builder(default, setter(strip_option))]
  pub on_enter: Option<TriggerCallback>,

  /// Called when scrolling back up past the start line.
  #[builder(default, setter(strip_option))]
  pub on_leave_back: Option<TriggerCallback>,
}

struct Trigger<E> {
  config: ScrollTriggerConfig<E>,
  /// Scroll offset at which the trigger enters. Measured lazily.
  start_scroll: Option<f64>,
  entered: bool,
}

struct ScrollTriggersInner<H: Host> {
  host: Rc<H>,
  triggers: RefCell<SlotMap<TriggerKey, Trigger<H::Element>>>,
  subscription: RefCell<Option<InputSubscription>>,
}

/// Callbacks tied to scroll position crossing an element's start line.
///
/// Triggers follow native scroll events on their own. Anything that moves
/// the scroll position by other means should call [`ScrollTriggers::update`].
pub struct ScrollTriggers<H: Host> {
  inner: Rc<ScrollTriggersInner<H>>,
}

impl<H: Host> Clone for ScrollTriggers<H> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<H: Host> ScrollTriggers<H> {
  pub fn new(host: Rc<H>) -> Self {
    Self {
      inner: Rc::new(ScrollTriggersInner {
        host,
        triggers: RefCell::new(SlotMap::with_key()),
        subscription: RefCell::new(None),
      }),
    }
  }

  /// Register a trigger and evaluate it against the current position, so
  /// elements already in view enter straight away.
  pub fn create(&self, config: ScrollTriggerConfig<H::Element>) -> TriggerKey {
    let key = self.inner.triggers.borrow_mut().insert(Trigger {
      config,
      start_scroll: None,
      entered: false,
    });

    self.listen();
    self.update();

    key
  }

  pub fn kill(&self, key: TriggerKey) -> bool {
    let removed = self.inner.triggers.borrow_mut().remove(key).is_some();
    self.release_if_empty();
    removed
  }

  pub fn kill_all(&self) {
    self.inner.triggers.borrow_mut().clear();
    self.release_if_empty();
  }

  pub fn len(&self) -> usize {
    self.inner.triggers.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Measure every start line again, e.g. after layout changes, then
  /// update.
  pub fn refresh(&self) {
    for trigger in self.inner.triggers.borrow_mut().values_mut() {
      trigger.start_scroll = None;
    }

    self.update();
  }

  /// Fire the callbacks of triggers whose start line was crossed since the
  /// last update.
  pub fn update(&self) {
    let host = &self.inner.host;
    let scroll = host.scroll_y();
    let mut callbacks: Vec<TriggerCallback> = Vec::new();

    {
      let mut triggers = self.inner.triggers.borrow_mut();
      let mut finished = Vec::new();

      for (key, trigger) in triggers.iter_mut() {
        let start = *trigger.start_scroll.get_or_insert_with(|| {
          host.bounding_top(&trigger.config.trigger) + scroll
            - host.viewport_height() * trigger.config.start
        });

        let inside = scroll >= start;

        if inside && !trigger.entered {
          trigger.entered = true;
          callbacks.extend(trigger.config.on_enter.clone());

          if trigger.config.once {
            finished.push(key);
          }
        } else if !inside && trigger.entered {
          trigger.entered = false;
          callbacks.extend(trigger.config.on_leave_back.clone());
        }
      }

      for key in finished {
        triggers.remove(key);
      }
    }

    self.release_if_empty();

    for callback in callbacks {
      callback();
    }
  }

  fn listen(&self) {
    if self.inner.subscription.borrow().is_some() {
      return;
    }

    let inner = Rc::downgrade(&self.inner);
    let subscription = self.inner.host.listen_input(Rc::new(move |event| {
      if *event == InputEvent::Scroll {
        if let Some(inner) = inner.upgrade() {
          ScrollTriggers { inner }.update();
        }
      }

      false
    }));

    *self.inner.subscription.borrow_mut() = subscription;
  }

  fn release_if_empty(&self) {
    if self.inner.triggers.borrow().is_empty() {
      // Dropped outside of the borrow, the teardown may reach back into the
      // host.
      let subscription = self.inner.subscription.borrow_mut().take();
      drop(subscription);
    }
  }
}
