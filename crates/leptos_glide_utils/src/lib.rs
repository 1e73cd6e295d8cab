pub use browser::*;
pub use element_ids::*;
pub use global_listeners::*;
pub use headless::*;
pub use host::*;
pub use traits::*;

mod browser;
mod element_ids;
mod global_listeners;
mod headless;
mod host;
mod traits;
