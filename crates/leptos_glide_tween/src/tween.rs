use leptos_glide_utils::ElementKey;
use smallvec::SmallVec;
use typed_builder::TypedBuilder;

use crate::Ease;

/// What a tween animates.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<E> {
  Element(E),
  /// The window, whose only animatable property is its scroll position.
  Window,
}

/// Identity of a [`Target`], used to find tweens that overlap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetKey {
  Element(ElementKey),
  Window,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
  Opacity,
  X,
  Y,
  Scale,
  ScrollY,
  /// A number shown as the element's text content.
  Text,
}

impl Property {
  /// Whether the property can be animated on the target kind.
  pub fn supports<E>(self, target: &Target<E>) -> bool {
    match target {
      Target::Element(_) => self != Property::ScrollY,
      Target::Window => self == Property::ScrollY,
    }
  }
}

/// What happens to older tweens of the same target when a new one starts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Overwrite {
  /// Leave them running. The newest tween renders last, so it wins.
  #[default]
  None,
  /// Strip the overlapping properties from older tweens, killing any that
  /// have nothing left to animate.
  Auto,
}

/// The values and timing of a tween.
///
/// ```
/// use leptos_glide_tween::{Ease, TweenVars};
///
/// let vars = TweenVars::builder()
///   .opacity(1.0)
///   .y(0.0)
///   .duration(1.2)
///   .ease(Ease::POWER3_OUT)
///   .build();
/// ```
#[derive(TypedBuilder)]
pub struct TweenVars {
  #[builder(default, setter(strip_option))]
  pub opacity: Option<f64>,

  /// Horizontal translation in pixels.
  #[builder(default, setter(strip_option))]
  pub x: Option<f64>,

  /// Vertical translation in pixels.
  #[builder(default, setter(strip_option))]
  pub y: Option<f64>,

  #[builder(default, setter(strip_option))]
  pub scale: Option<f64>,

  /// Window scroll offset in pixels. Clamped to the scrollable range.
  #[builder(default, setter(strip_option))]
  pub scroll_y: Option<f64>,

  /// A count written as text content, rounded up to a whole number.
  #[builder(default, setter(strip_option))]
  pub text: Option<f64>,

  /// Seconds.
  #[builder(default = 0.5)]
  pub duration: f64,

  /// Seconds to wait before starting.
  #[builder(default)]
  pub delay: f64,

  #[builder(default)]
  pub ease: Ease,

  #[builder(default)]
  pub overwrite: Overwrite,

  /// Stop a scroll tween as soon as something else moves the scroll
  /// position, e.g. the user.
  #[builder(default)]
  pub auto_kill: bool,

  /// Called once the tween completes. Not called when the tween is killed.
  #[builder(default, setter(strip_option))]
  pub on_complete: Option<Box<dyn FnOnce()>>,
}

impl TweenVars {
  /// The property values set on these vars.
  pub fn properties(&self) -> SmallVec<[(Property, f64); 4]> {
    [
      (Property::Opacity, self.opacity),
      (Property::X, self.x),
      (Property::Y, self.y),
      (Property::Scale, self.scale),
      (Property::ScrollY, self.scroll_y),
      (Property::Text, self.text),
    ]
    .into_iter()
    .filter_map(|(property, value)| value.map(|value| (property, value)))
    .collect()
  }

  pub(crate) fn value(&self, property: Property) -> Option<f64> {
    match property {
      Property::Opacity => self.opacity,
      Property::X => self.x,
      Property::Y => self.y,
      Property::Scale => self.scale,
      Property::ScrollY => self.scroll_y,
      Property::Text => self.text,
    }
  }
}

/// The transform components of an element, written together as a single
/// `transform` declaration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Transform {
  pub x: f64,
  pub y: f64,
  pub scale: f64,
}

impl Default for Transform {
  fn default() -> Self {
    Self {
      x: 0.0,
      y: 0.0,
      scale: 1.0,
    }
  }
}

impl Transform {
  pub fn get(&self, property: Property) -> Option<f64> {
    match property {
      Property::X => Some(self.x),
      Property::Y => Some(self.y),
      Property::Scale => Some(self.scale),
      _ => None,
    }
  }

  pub fn set(&mut self, property: Property, value: f64) {
    match property {
      Property::X => self.x = value,
      Property::Y => self.y = value,
      Property::Scale => self.scale = value,
      _ => {}
    }
  }

  pub fn to_css(self) -> String {
    let translate = format!(
      "translate3d({}px, {}px, 0px)",
      css_number(self.x),
      css_number(self.y)
    );

    if self.scale == 1.0 {
      translate
    } else {
      format!("{translate} scale({})", css_number(self.scale))
    }
  }
}

/// Format a count the way `toLocaleString` does in english: rounded up,
/// with a comma between every group of three digits.
pub(crate) fn format_count(value: f64) -> String {
  let value = value.ceil() as i64;
  let digits = value.unsigned_abs().to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

  if value < 0 {
    grouped.push('-');
  }

  for (index, digit) in digits.chars().enumerate() {
    if index > 0 && (digits.len() - index) % 3 == 0 {
      grouped.push(',');
    }

    grouped.push(digit);
  }

  grouped
}

/// Read a count back from text written by [`format_count`].
pub(crate) fn parse_count(text: &str) -> Option<f64> {
  text.trim().replace(',', "").parse().ok()
}

/// Format a number for css with at most four decimals and no negative zero.
pub(crate) fn css_number(value: f64) -> String {
  let rounded = (value * 10_000.0).round() / 10_000.0;

  if rounded == 0.0 {
    "0".into()
  } else {
    rounded.to_string()
  }
}

pub(crate) struct PropertyTween {
  pub property: Property,
  /// Captured from the target when the tween starts, unless given upfront.
  pub start: Option<f64>,
  pub end: f64,
}

pub(crate) enum TweenState {
  Running,
  Completed,
  Killed,
}

pub(crate) struct Tween<E> {
  pub target: Target<E>,
  pub key: TargetKey,
  pub order: u64,
  pub properties: SmallVec<[PropertyTween; 4]>,
  pub duration: f64,
  pub delay: f64,
  pub ease: Ease,
  pub overwrite: Overwrite,
  pub auto_kill: bool,
  pub elapsed: f64,
  pub started: bool,
  /// The scroll offset observed right after this tween last wrote it.
  pub last_scroll: Option<f64>,
  pub on_complete: Option<Box<dyn FnOnce()>>,
}

impl<E> Tween<E> {
  /// Linear progress through the tween, in `[0, 1]`.
  pub fn progress(&self) -> f64 {
    if self.duration <= 0.0 {
      1.0
    } else {
      ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0)
    }
  }

  pub fn animates(&self, property: Property) -> bool {
    self
      .properties
      .iter()
      .any(|value| value.property == property)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collects_only_set_properties() {
    let vars = TweenVars::builder().opacity(0.0).y(-20.0).build();

    assert_eq!(
      vars.properties().to_vec(),
      vec![(Property::Opacity, 0.0), (Property::Y, -20.0)]
    );
    assert_eq!(vars.duration, 0.5);
    assert_eq!(vars.ease, Ease::default());
  }

  #[test]
  fn transform_css() {
    let mut transform = Transform::default();
    insta::assert_snapshot!(transform.to_css(), @"translate3d(0px, 0px, 0px)");

    transform.set(Property::Y, 20.0);
    transform.set(Property::Scale, 0.95);
    insta::assert_snapshot!(transform.to_css(), @"translate3d(0px, 20px, 0px) scale(0.95)");
  }

  #[test]
  fn counts_round_up_and_group_digits() {
    assert_eq!(format_count(0.0), "0");
    assert_eq!(format_count(0.2), "1");
    assert_eq!(format_count(999.0), "999");
    assert_eq!(format_count(1234.5), "1,235");
    assert_eq!(format_count(1_000_000.0), "1,000,000");
    assert_eq!(format_count(-4321.0), "-4,321");

    assert_eq!(parse_count(" 12,500 "), Some(12_500.0));
    assert_eq!(parse_count("n/a"), None);
  }

  #[test]
  fn css_numbers_are_rounded() {
    assert_eq!(css_number(-0.0), "0");
    assert_eq!(css_number(0.123456), "0.1235");
    assert_eq!(css_number(-20.0), "-20");
  }
}
