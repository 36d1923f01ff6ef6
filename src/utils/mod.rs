pub mod retry;
pub mod text;

pub use retry::with_retry;
pub use text::{char_len, normalize_user_input, truncate_chars};
