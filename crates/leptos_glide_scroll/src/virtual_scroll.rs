use leptos_glide_utils::DeltaMode;
use leptos_glide_utils::InputEvent;

/// Pixels per line for wheel events reported in lines.
pub const LINE_HEIGHT: f64 = 100.0 / 6.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
  Wheel,
  Touch,
}

/// Input normalised to pixels, in the direction the content should move.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VirtualScrollDelta {
  pub delta_x: f64,
  pub delta_y: f64,
  pub source: InputSource,
  pub ctrl_key: bool,
}

/// Turns raw wheel and touch events into scroll deltas.
#[derive(Debug)]
pub(crate) struct VirtualScroll {
  wheel_multiplier: f64,
  touch_multiplier: f64,
  touch: Option<(f64, f64)>,
}

impl VirtualScroll {
  pub fn new(wheel_multiplier: f64, touch_multiplier: f64) -> Self {
    Self {
      wheel_multiplier,
      touch_multiplier,
      touch: None,
    }
  }

  pub fn handle(&mut self, event: &InputEvent, page_height: f64) -> Option<VirtualScrollDelta> {
    match *event {
      InputEvent::Wheel {
        delta_x,
        delta_y,
        delta_mode,
        ctrl_key,
      } => {
        let unit = match delta_mode {
          DeltaMode::Pixel => 1.0,
          DeltaMode::Line => LINE_HEIGHT,
          DeltaMode::Page => page_height,
        };

        Some(VirtualScrollDelta {
          delta_x: delta_x * unit * self.wheel_multiplier,
          delta_y: delta_y * unit * self.wheel_multiplier,
          source: InputSource::Wheel,
          ctrl_key,
        })
      }
      InputEvent::TouchStart { x, y } => {
        self.touch = Some((x, y));
        None
      }
      InputEvent::TouchMove { x, y } => {
        let (last_x, last_y) = self.touch.replace((x, y))?;

        Some(VirtualScrollDelta {
          delta_x: -(x - last_x) * self.touch_multiplier,
          delta_y: -(y - last_y) * self.touch_multiplier,
          source: InputSource::Touch,
          ctrl_key: false,
        })
      }
      InputEvent::TouchEnd => {
        self.touch = None;
        None
      }
      InputEvent::Scroll => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn wheel(delta_y: f64, delta_mode: DeltaMode) -> InputEvent {
    InputEvent::Wheel {
      delta_x: 0.0,
      delta_y,
      delta_mode,
      ctrl_key: false,
    }
  }

  #[test]
  fn wheel_deltas_are_normalised_to_pixels() {
    let mut virtual_scroll = VirtualScroll::new(2.0, 1.0);

    let pixels = virtual_scroll.handle(&wheel(50.0, DeltaMode::Pixel), 800.0);
    assert_eq!(pixels.map(|delta| delta.delta_y), Some(100.0));

    let lines = virtual_scroll.handle(&wheel(3.0, DeltaMode::Line), 800.0);
    assert_eq!(lines.map(|delta| delta.delta_y), Some(100.0));

    let pages = virtual_scroll.handle(&wheel(1.0, DeltaMode::Page), 800.0);
    assert_eq!(pages.map(|delta| delta.delta_y), Some(1600.0));
  }

  #[test]
  fn touch_moves_become_inverted_deltas() {
    let mut virtual_scroll = VirtualScroll::new(1.0, 2.0);

    assert_eq!(
      virtual_scroll.handle(&InputEvent::TouchMove { x: 0.0, y: 0.0 }, 800.0),
      None
    );
    assert_eq!(
      virtual_scroll.handle(&InputEvent::TouchStart { x: 10.0, y: 300.0 }, 800.0),
      None
    );

    let delta = virtual_scroll
      .handle(&InputEvent::TouchMove { x: 10.0, y: 260.0 }, 800.0)
      .unwrap();
    assert_eq!(delta.delta_y, 80.0);
    assert_eq!(delta.delta_x, 0.0);
    assert_eq!(delta.source, InputSource::Touch);

    virtual_scroll.handle(&InputEvent::TouchEnd, 800.0);
    assert_eq!(
      virtual_scroll.handle(&InputEvent::TouchMove { x: 0.0, y: 0.0 }, 800.0),
      None
    );
  }
}
