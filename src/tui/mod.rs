pub mod keys;
pub mod render;
pub mod theme;
pub mod utils;

pub use keys::{key_id, matches_key, text_char};
pub use render::{render, render_with_theme, viewport_rows};
pub use theme::BrowserTheme;
pub use utils::{
    apply_background_to_line, fit_to_width, pad_to_width, strip_ansi, truncate_to_width,
    truncate_to_width_with_ellipsis, visible_width,
};
