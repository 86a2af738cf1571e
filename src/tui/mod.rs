pub mod events;
pub mod selector;

pub use events::{Event, EventHandler};
pub use selector::{run_selector, Selector, SelectorAction};
