//! Chronologically ordered push keys.
//!
//! Keys are 20 characters: 8 encode the millisecond timestamp, 12 are random.
//! Keys generated within the same millisecond increment the random part, so
//! keys from one generator sort lexicographically in creation order.

use rand::Rng;

use portfolio_core::{KeyError, StoreKey};

/// Alphabet in ascending ASCII order, so string order matches numeric order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Generator for push keys. Not thread-safe; wrap it in a mutex to share.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_time: i64,
    last_random: [u8; RANDOM_CHARS],
}

impl PushIdGenerator {
    /// Create a generator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the alphabet holds only valid key characters.
    pub fn next_key(&mut self) -> Result<StoreKey, KeyError> {
        self.next_key_at(chrono::Utc::now().timestamp_millis())
    }

    /// Generate a key for `now_ms` milliseconds since the epoch.
    ///
    /// A clock that moves backwards is treated as the previous timestamp, so
    /// ordering is preserved.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the alphabet holds only valid key characters.
    pub fn next_key_at(&mut self, now_ms: i64) -> Result<StoreKey, KeyError> {
        let mut now = now_ms.max(self.last_time);

        if now == self.last_time && self.last_time != 0 {
            if self.increment_random() {
                // All random digits overflowed; borrow the next millisecond.
                now += 1;
                self.randomize();
            }
        } else {
            self.randomize();
        }
        self.last_time = now;

        let mut key = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        let mut time_digits = [0u8; TIME_CHARS];
        let mut remaining = now;
        for digit in time_digits.iter_mut().rev() {
            *digit = u8::try_from(remaining.rem_euclid(64)).unwrap_or(0);
            remaining = remaining.div_euclid(64);
        }
        key.extend(time_digits.iter().map(|&d| push_char(d)));
        key.extend(self.last_random.iter().map(|&d| push_char(d)));

        StoreKey::parse(&key)
    }

    fn randomize(&mut self) {
        let mut rng = rand::rng();
        for digit in &mut self.last_random {
            *digit = rng.random_range(0..64);
        }
    }

    /// Add one to the random digits. Returns true on overflow.
    fn increment_random(&mut self) -> bool {
        for digit in self.last_random.iter_mut().rev() {
            if *digit == 63 {
                *digit = 0;
            } else {
                *digit += 1;
                return false;
            }
        }
        true
    }
}

fn push_char(digit: u8) -> char {
    PUSH_CHARS
        .get(usize::from(digit))
        .copied()
        .map_or('-', char::from)
}
