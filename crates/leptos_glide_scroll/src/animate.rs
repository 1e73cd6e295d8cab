use leptos_glide_tween::Ease;

/// How an [`Animate`] moves towards its target.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Motion {
  /// Ease over a fixed number of seconds.
  Duration(f64, Ease),
  /// Close a fraction of the remaining distance every 60th of a second.
  Lerp(f64),
  /// Jump straight there.
  Immediate,
}

/// Interpolates a single value towards a target, one frame at a time.
#[derive(Debug)]
pub(crate) struct Animate {
  from: f64,
  to: f64,
  value: f64,
  elapsed: f64,
  motion: Motion,
  running: bool,
}

impl Default for Animate {
  fn default() -> Self {
    Self {
      from: 0.0,
      to: 0.0,
      value: 0.0,
      elapsed: 0.0,
      motion: Motion::Immediate,
      running: false,
    }
  }
}

impl Animate {
  pub fn from_to(&mut self, from: f64, to: f64, motion: Motion) {
    self.from = from;
    self.to = to;
    self.value = from;
    self.elapsed = 0.0;
    self.motion = motion;
    self.running = true;
  }

  pub fn stop(&mut self) {
    self.running = false;
  }

  pub fn is_running(&self) -> bool {
    self.running
  }

  /// Move `delta` seconds forward. Returns the new value and whether the
  /// target was reached, or `None` when idle.
  pub fn advance(&mut self, delta: f64) -> Option<(f64, bool)> {
    if !self.running {
      return None;
    }

    let completed = match self.motion {
      Motion::Duration(duration, ease) if duration > 0.0 => {
        self.elapsed += delta;
        let progress = (self.elapsed / duration).min(1.0);
        let completed = progress >= 1.0;
        let eased = if completed { 1.0 } else { ease.apply(progress) };
        self.value = self.from + (self.to - self.from) * eased;
        completed
      }
      Motion::Lerp(lerp) => {
        self.value = damp(self.value, self.to, lerp * 60.0, delta);
        if self.value.round() == self.to.round() {
          self.value = self.to;
          true
        } else {
          false
        }
      }
      _ => {
        self.value = self.to;
        true
      }
    };

    if completed {
      self.running = false;
    }

    Some((self.value, completed))
  }
}

/// Frame rate independent exponential smoothing.
fn damp(from: f64, to: f64, lambda: f64, delta: f64) -> f64 {
  let factor = 1.0 - (-lambda * delta).exp();
  from + (to - from) * factor
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn duration_motion_reaches_target_exactly() {
    let mut animate = Animate::default();
    animate.from_to(0.0, 500.0, Motion::Duration(1.0, Ease::Linear));

    assert_eq!(animate.advance(0.5), Some((250.0, false)));
    assert_eq!(animate.advance(0.6), Some((500.0, true)));
    assert!(!animate.is_running());
    assert_eq!(animate.advance(0.1), None);
  }

  #[test]
  fn lerp_motion_settles() {
    let mut animate = Animate::default();
    animate.from_to(0.0, 100.0, Motion::Lerp(0.1));

    let (first, done) = animate.advance(1.0 / 60.0).unwrap();
    assert!(first > 0.0 && first < 100.0);
    assert!(!done);

    let mut frames = 0;
    while animate.advance(1.0 / 60.0).map_or(false, |(_, done)| !done) {
      frames += 1;
      assert!(frames < 1000);
    }

    assert!(!animate.is_running());
  }

  #[test]
  fn immediate_motion_jumps() {
    let mut animate = Animate::default();
    animate.from_to(10.0, 40.0, Motion::Immediate);

    assert_eq!(animate.advance(0.0), Some((40.0, true)));
  }
}
