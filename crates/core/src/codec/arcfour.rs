//! Arcfour, the RC4 keystream cipher used by the standard security handler.
//!
//! A cipher value carries its whole permutation, so two values never share
//! state. The handler derives a key and builds a new value for every string.

/// RC4 keystream generator.
#[derive(Clone)]
pub struct Arcfour {
    perm: [u8; 256],
    x: u8,
    y: u8,
}

impl Arcfour {
    /// Schedule `key` into a fresh permutation.
    ///
    /// # Panics
    ///
    /// If `key` is empty or longer than 256 bytes. Object keys derived by the
    /// security handler are always 5 to 16 bytes.
    pub fn new(key: &[u8]) -> Self {
        assert!(
            (1..=256).contains(&key.len()),
            "arcfour key length must be in 1..=256"
        );

        let mut perm = [0u8; 256];
        for (slot, value) in perm.iter_mut().zip(0u8..=255) {
            *slot = value;
        }

        let mut y = 0u8;
        for (x, &k) in (0..256usize).zip(key.iter().cycle()) {
            y = y.wrapping_add(perm[x]).wrapping_add(k);
            perm.swap(x, usize::from(y));
        }

        Self { perm, x: 0, y: 0 }
    }

    /// XOR `data` with the keystream into a new buffer.
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.process_in_place(&mut out);
        out
    }

    /// XOR `data` with the keystream.
    pub fn process_in_place(&mut self, data: &mut [u8]) {
        for byte in data {
            *byte ^= self.next_byte();
        }
    }

    fn next_byte(&mut self) -> u8 {
        self.x = self.x.wrapping_add(1);
        let sx = self.perm[usize::from(self.x)];
        self.y = self.y.wrapping_add(sx);
        let sy = self.perm[usize::from(self.y)];
        self.perm[usize::from(self.x)] = sy;
        self.perm[usize::from(self.y)] = sx;
        self.perm[usize::from(sx.wrapping_add(sy))]
    }
}

impl std::fmt::Debug for Arcfour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print keystream state.
        f.debug_struct("Arcfour").finish_non_exhaustive()
    }
}
