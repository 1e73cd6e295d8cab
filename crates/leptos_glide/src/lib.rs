pub use context::*;
pub use leptos_glide_scroll as scroll;
pub use leptos_glide_scroll::ScrollTarget;
pub use leptos_glide_scroll::ScrollToOptions;
pub use leptos_glide_scroll::SmoothScrollController;
pub use leptos_glide_tween as tween;
pub use leptos_glide_utils as utils;
pub use page_transitions::*;
pub use scroll_animations::*;

mod context;
mod page_transitions;
mod scroll_animations;
