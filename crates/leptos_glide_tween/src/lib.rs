pub use ease::*;
pub use engine::*;
pub use scroll_trigger::*;
pub use ticker::*;
pub use tween::Overwrite;
pub use tween::Property;
pub use tween::Target;
pub use tween::TargetKey;
pub use tween::TweenVars;

mod ease;
mod engine;
mod scroll_trigger;
mod ticker;
mod tween;
