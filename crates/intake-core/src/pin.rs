//! Short confirmation secret entered at commit time.

use std::fmt;

use zeroize::Zeroizing;

/// Confirmation PIN. Memory is wiped on drop and on every overwrite.
///
/// Not `Clone`; `Debug` is redacted.
#[derive(Default)]
pub struct Pin(Zeroizing<String>);

impl Pin {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace the held value, wiping the previous one.
    pub fn replace(&mut self, value: &str) {
        // Dropping the old `Zeroizing` buffer zeroes it.
        self.0 = Zeroizing::new(value.to_string());
    }

    /// Move the value out, leaving an empty PIN behind.
    pub fn take(&mut self) -> Pin {
        std::mem::take(self)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(***)")
    }
}
