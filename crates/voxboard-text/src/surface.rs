//! The editable text surface shared by key taps and dictation.
//!
//! Offsets are character offsets, not byte offsets; cursor and selection are
//! always clamped into the current text.

use std::sync::Mutex;

/// Callback invoked with the full buffer content after every programmatic
/// edit.
pub type ChangeListener = Box<dyn Fn(&str) + Send + Sync>;

/// An editable text buffer with a cursor/selection.
///
/// `set_value` emits a change notification to all subscribed listeners, so
/// observers (autosave, embedding hosts) see every edit regardless of which
/// input modality produced it.
pub trait TextSurface: Send + Sync {
    /// Full buffer content.
    fn value(&self) -> String;

    /// Replace the buffer content. Selection is clamped into the new text
    /// and listeners are notified.
    fn set_value(&self, text: &str);

    /// Selection as `(start, end)` char offsets, `start <= end`. A collapsed
    /// selection (`start == end`) is the cursor position.
    fn selection(&self) -> (usize, usize);

    /// Move the selection. Offsets beyond the text are clamped to its end.
    fn set_selection(&self, start: usize, end: usize);
}

struct BufferInner {
    text: String,
    sel_start: usize,
    sel_end: usize,
}

/// In-memory `TextSurface` implementation.
pub struct EditBuffer {
    inner: Mutex<BufferInner>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl EditBuffer {
    /// Create an empty buffer with the cursor at offset 0.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                text: String::new(),
                sel_start: 0,
                sel_end: 0,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a change listener.
    ///
    /// Listeners run synchronously during `set_value` and must not edit the
    /// buffer from inside the callback.
    pub fn subscribe(&self, listener: ChangeListener) {
        self.listeners
            .lock()
            .expect("listener mutex poisoned")
            .push(listener);
    }

    fn notify(&self, text: &str) {
        let listeners = self.listeners.lock().expect("listener mutex poisoned");
        for listener in listeners.iter() {
            listener(text);
        }
    }
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl TextSurface for EditBuffer {
    fn value(&self) -> String {
        self.inner.lock().expect("buffer mutex poisoned").text.clone()
    }

    fn set_value(&self, text: &str) {
        let snapshot = {
            let mut inner = self.inner.lock().expect("buffer mutex poisoned");
            inner.text = text.to_string();
            let len = char_len(&inner.text);
            inner.sel_start = inner.sel_start.min(len);
            inner.sel_end = inner.sel_end.min(len);
            inner.text.clone()
        };
        tracing::trace!(chars = char_len(&snapshot), "Surface content replaced");
        self.notify(&snapshot);
    }

    fn selection(&self) -> (usize, usize) {
        let inner = self.inner.lock().expect("buffer mutex poisoned");
        (inner.sel_start, inner.sel_end)
    }

    fn set_selection(&self, start: usize, end: usize) {
        let mut inner = self.inner.lock().expect("buffer mutex poisoned");
        let len = char_len(&inner.text);
        let start = start.min(len);
        let end = end.min(len).max(start);
        inner.sel_start = start;
        inner.sel_end = end;
    }
}
