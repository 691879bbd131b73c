//! Lobby code generation.

use std::sync::Mutex;

/// Highest code index before the generator wraps back to zero.
pub const MAX_LOBBY_CODE: u32 = 90_000;

/// Hands out five-digit, zero-padded lobby codes in sequence.
#[derive(Debug, Default)]
pub struct LobbyCodes {
    index: Mutex<u32>,
}

impl LobbyCodes {
    pub fn new() -> LobbyCodes {
        LobbyCodes::default()
    }

    /// Returns the next lobby code, wrapping after [`MAX_LOBBY_CODE`].
    pub fn next_code(&self) -> String {
        let mut index = self.index.lock().unwrap_or_else(|e| e.into_inner());
        if *index > MAX_LOBBY_CODE {
            *index = 0;
        }
        *index += 1;
        format!("{:05}", *index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_sequential_and_padded() {
        let codes = LobbyCodes::new();
        assert_eq!(codes.next_code(), "00001");
        assert_eq!(codes.next_code(), "00002");
        assert_eq!(codes.next_code(), "00003");
    }

    #[test]
    fn generator_wraps_past_the_maximum() {
        let codes = LobbyCodes {
            index: Mutex::new(MAX_LOBBY_CODE + 1),
        };
        assert_eq!(codes.next_code(), "00001");
    }
}
