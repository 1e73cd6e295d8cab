pub use controller::*;
pub use options::*;
pub use smooth_scroll::*;
pub use virtual_scroll::InputSource;
pub use virtual_scroll::VirtualScrollDelta;
pub use virtual_scroll::LINE_HEIGHT;

mod animate;
mod controller;
mod options;
mod smooth_scroll;
mod virtual_scroll;
