use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Which end of the curve is eased.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EaseDirection {
  /// Starts slowly and accelerates.
  In,
  /// Starts quickly and decelerates.
  Out,
  /// Accelerates through the first half and decelerates through the second.
  InOut,
}

/// A curve mapping linear progress in `[0, 1]` to eased progress.
///
/// Names follow the `family.direction` convention, e.g. `"power3.out"`.
/// `powerN` raises progress to the power `N + 1`, so `power1` is quadratic
/// and `power3` is quartic.
#[derive(Copy, Clone, Debug)]
pub enum Ease {
  Linear,
  Power(u8, EaseDirection),
  Expo(EaseDirection),
  Custom(fn(f64) -> f64),
}

impl Ease {
  pub const POWER3_IN: Ease = Ease::Power(3, EaseDirection::In);
  pub const POWER3_IN_OUT: Ease = Ease::Power(3, EaseDirection::InOut);
  pub const POWER3_OUT: Ease = Ease::Power(3, EaseDirection::Out);

  /// Map `progress` onto the curve. Progress outside `[0, 1]` is clamped.
  pub fn apply(&self, progress: f64) -> f64 {
    let t = progress.clamp(0.0, 1.0);

    match *self {
      Ease::Linear => t,
      Ease::Power(power, direction) => {
        let exponent = i32::from(power) + 1;
        ease_with(direction, t, |t| t.powi(exponent))
      }
      Ease::Expo(direction) => {
        ease_with(direction, t, |t| {
          if t == 0.0 {
            0.0
          } else {
            2f64.powf(10.0 * (t - 1.0))
          }
        })
      }
      Ease::Custom(curve) => curve(t),
    }
  }
}

/// Derive the requested direction from an ease-in curve.
fn ease_with(direction: EaseDirection, t: f64, ease_in: impl Fn(f64) -> f64) -> f64 {
  match direction {
    EaseDirection::In => ease_in(t),
    EaseDirection::Out => 1.0 - ease_in(1.0 - t),
    EaseDirection::InOut => {
      if t < 0.5 {
        ease_in(t * 2.0) / 2.0
      } else {
        1.0 - ease_in((1.0 - t) * 2.0) / 2.0
      }
    }
  }
}

impl Default for Ease {
  fn default() -> Self {
    Ease::Power(1, EaseDirection::Out)
  }
}

impl PartialEq for Ease {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Ease::Linear, Ease::Linear) => true,
      (Ease::Power(a, x), Ease::Power(b, y)) => a == b && x == y,
      (Ease::Expo(x), Ease::Expo(y)) => x == y,
      (Ease::Custom(a), Ease::Custom(b)) => *a as usize == *b as usize,
      _ => false,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EaseParseError(String);

impl fmt::Display for EaseParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown ease `{}`", self.0)
  }
}

impl Error for EaseParseError {}

impl FromStr for Ease {
  type Err = EaseParseError;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    let error = || EaseParseError(value.to_string());
    let (family, direction) = match value.split_once('.') {
      Some((family, direction)) => (family, direction),
      None => (value, "out"),
    };

    let direction = match direction {
      "in" => EaseDirection::In,
      "out" => EaseDirection::Out,
      "inOut" => EaseDirection::InOut,
      _ => return Err(error()),
    };

    let ease = match family {
      "none" | "linear" | "power0" => Ease::Linear,
      "power1" | "quad" => Ease::Power(1, direction),
      "power2" | "cubic" => Ease::Power(2, direction),
      "power3" | "quart" => Ease::Power(3, direction),
      "power4" | "quint" | "strong" => Ease::Power(4, direction),
      "expo" => Ease::Expo(direction),
      _ => return Err(error()),
    };

    Ok(ease)
  }
}
