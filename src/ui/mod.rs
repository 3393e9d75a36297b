pub mod components;

pub use components::{badge, banner_line, print_banner, print_change, print_farewell};
