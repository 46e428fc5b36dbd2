//! Engine plumbing independent of widgets: control event bus, tick clock
//! and timecode helpers.

pub mod clock;
pub mod event_bus;
pub mod timecode;

pub use clock::FrameClock;
pub use event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use timecode::{TimecodeError, format_timecode, parse_timecode};
