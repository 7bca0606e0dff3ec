pub mod device_table;
pub mod progress;


pub use device_table::render_device_table;
pub use progress::{human_bytes, TerminalProgress};
