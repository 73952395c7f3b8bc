//! Voxboard text crate - the editable text surface and key input dispatcher.
//!
//! `TextSurface` abstracts the buffer both input modalities write into; the
//! in-memory `EditBuffer` backs tests and the demo binary. `KeyDispatcher`
//! translates discrete key taps into surface edits.

pub mod keys;
pub mod surface;

pub use keys::{KeyAction, KeyDispatcher};
pub use surface::{ChangeListener, EditBuffer, TextSurface};
