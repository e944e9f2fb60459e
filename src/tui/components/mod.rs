// Components - pieces of chrome shared by every screen
//
// - Title bar: app name, backend, streaming indicator
// - Status bar: focus, key hints, log problems
// - Toast: short-lived notice in the bottom-right corner
// - Scrollbar: drawn from a ScrollState

pub mod scrollbar;
pub mod status_bar;
pub mod title_bar;
pub mod toast;

pub use toast::Toast;
