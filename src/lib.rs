//! scene-review - video review tool with a scene/shot navigation index
//!
//! Retained-mode UI tree, video playback element and the detector-driven
//! index, plus the eframe host used by the binary.

// Engine plumbing (event bus, tick clock, timecodes)
pub mod core;

pub mod detect;
pub mod media;
pub mod ui;

// App modules
pub mod app;
pub mod cli;
pub mod config;
pub mod player;

pub use core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use player::Player;
pub use ui::{ElementId, InputSnapshot, Surface, UiTree};
