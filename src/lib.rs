//! Named text blocks pasted into whatever control holds input focus.

pub mod clipboard;
pub mod delivery;
pub mod error;
pub mod model;
pub mod platform;
pub mod scheduler;
pub mod services;
pub mod settings;
pub mod state_machine;
pub mod store;

#[cfg(test)]
mod fakes;

pub use error::{PasteError, StoreError};
pub use model::{Block, Chord, DeliveryStep, FocusTarget, PasteState, TargetClass, WindowHandle};
pub use scheduler::{Scheduler, TimerQueue};
pub use state_machine::{render_content, PasteEngine, PasteReport};
pub use store::{BlockStore, SettingsStore};
