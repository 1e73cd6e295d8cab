use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

slotmap::new_key_type! {
  /// Identifies a callback registered with a [`Ticker`].
  pub struct TickerKey;
}

/// When a single frame takes longer than `threshold` milliseconds, the ticker
/// pretends only `adjusted_lag` milliseconds passed. Animations then pause
/// through a hiccup instead of jumping ahead.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LagSmoothing {
  pub threshold: f64,
  pub adjusted_lag: f64,
}

impl Default for LagSmoothing {
  fn default() -> Self {
    Self {
      threshold: 500.0,
      adjusted_lag: 33.0,
    }
  }
}

/// What a ticker callback receives every frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TickerFrame {
  /// Seconds since the first frame, after lag smoothing.
  pub time: f64,
  /// Milliseconds since the previous frame, after lag smoothing.
  pub delta: f64,
  /// Number of frames ticked so far, starting at 1.
  pub frame: u64,
}

type TickerCallback = Rc<dyn Fn(&TickerFrame)>;

struct TickerState {
  callbacks: SlotMap<TickerKey, TickerCallback>,
  lag_smoothing: Option<LagSmoothing>,
  start_time: Option<f64>,
  last_update: f64,
  time: f64,
  frame: u64,
}

impl Default for TickerState {
  fn default() -> Self {
    Self {
      callbacks: SlotMap::with_key(),
      lag_smoothing: Some(LagSmoothing::default()),
      start_time: None,
      last_update: 0.0,
      time: 0.0,
      frame: 0,
    }
  }
}

/// A shared clock fed by the host's frame source, with callbacks that run
/// once per frame.
///
/// Cloning a ticker yields another handle to the same clock.
#[derive(Clone, Default)]
pub struct Ticker(Rc<RefCell<TickerState>>);

impl Ticker {
  pub fn new() -> Self {
    Default::default()
  }

  /// Run `callback` on every frame until it is removed.
  pub fn add(&self, callback: impl Fn(&TickerFrame) + 'static) -> TickerKey {
    self.0.borrow_mut().callbacks.insert(Rc::new(callback))
  }

  /// Remove a callback. Returns `false` when it was already gone.
  pub fn remove(&self, key: TickerKey) -> bool {
    self.0.borrow_mut().callbacks.remove(key).is_some()
  }

  pub fn len(&self) -> usize {
    self.0.borrow().callbacks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Configure lag smoothing. `None` turns it off so that the clock always
  /// follows wall time, even across dropped frames.
  pub fn lag_smoothing(&self, setting: Option<LagSmoothing>) {
    self.0.borrow_mut().lag_smoothing = setting;
  }

  pub fn lag_smoothing_setting(&self) -> Option<LagSmoothing> {
    self.0.borrow().lag_smoothing
  }

  /// Seconds elapsed on the clock as of the last frame.
  pub fn time(&self) -> f64 {
    self.0.borrow().time
  }

  pub fn frame(&self) -> u64 {
    self.0.borrow().frame
  }

  /// Move the clock to `now` (milliseconds) without running callbacks.
  pub fn advance(&self, now: f64) -> TickerFrame {
    let mut state = self.0.borrow_mut();
    let mut start_time = match state.start_time {
      Some(start_time) => start_time,
      None => {
        state.last_update = now;
        now
      }
    };

    let mut delta = (now - state.last_update).max(0.0);

    if let Some(lag) = state.lag_smoothing {
      if delta > lag.threshold {
        start_time += delta - lag.adjusted_lag;
        delta = lag.adjusted_lag;
      }
    }

    state.start_time = Some(start_time);
    state.last_update = now;
    state.time = (now - start_time) / 1000.0;
    state.frame += 1;

    TickerFrame {
      time: state.time,
      delta,
      frame: state.frame,
    }
  }

  /// Run every registered callback with `frame`.
  ///
  /// Callbacks may add or remove callbacks. Ones added during dispatch first
  /// run on the next frame, and ones removed during dispatch don't run.
  pub fn dispatch(&self, frame: &TickerFrame) {
    let keys: Vec<TickerKey> = self.0.borrow().callbacks.keys().collect();

    for key in keys {
      let callback = self.0.borrow().callbacks.get(key).cloned();

      if let Some(callback) = callback {
        callback(frame);
      }
    }
  }

  /// Advance the clock and dispatch in one step.
  pub fn tick(&self, now: f64) -> TickerFrame {
    let frame = self.advance(now);
    self.dispatch(&frame);
    frame
  }
}
