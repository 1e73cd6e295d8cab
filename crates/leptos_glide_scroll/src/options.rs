use leptos_glide_tween::Ease;
use typed_builder::TypedBuilder;

/// Exponential ease out, `1 - 2^(-10t)`, never above 1.
pub fn expo_out(t: f64) -> f64 {
  (1.0 - 2f64.powf(-10.0 * t)).min(1.0)
}

/// Which input axis drives the vertical scroll position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum GestureOrientation {
  #[default]
  Vertical,
  Horizontal,
  /// Whichever axis moved the most.
  Both,
}

/// Configuration of a [`SmoothScroll`](crate::SmoothScroll).
///
/// Scrolling is always vertical. With a `duration`, every scroll eases over
/// that many seconds using `easing`. Without one, the position chases the
/// target with `lerp` as the per-frame catch-up factor at 60fps.
#[derive(TypedBuilder, Clone, Debug)]
pub struct SmoothScrollOptions {
  /// Seconds.
  #[builder(default, setter(strip_option))]
  pub duration: Option<f64>,

  #[builder(default = Ease::Custom(expo_out))]
  pub easing: Ease,

  #[builder(default = 0.1)]
  pub lerp: f64,

  #[builder(default)]
  pub gesture_orientation: GestureOrientation,

  /// Smooth mouse wheel input. Otherwise the wheel scrolls natively.
  #[builder(default = true)]
  pub smooth_wheel: bool,

  /// Smooth touch input. Otherwise touch devices scroll natively.
  #[builder(default)]
  pub smooth_touch: bool,

  #[builder(default = 1.0)]
  pub wheel_multiplier: f64,

  #[builder(default = 1.0)]
  pub touch_multiplier: f64,

  /// Let the target run past the ends of the document.
  #[builder(default)]
  pub infinite: bool,
}

impl Default for SmoothScrollOptions {
  fn default() -> Self {
    Self::builder().build()
  }
}
