// CDP Bridge - Chrome DevTools Protocol bridge for embedded script engines
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Script content hash, bit-compatible with V8's `Debugger.scriptParsed` hash.
//!
//! DevTools clients persist breakpoints by script hash, so the value computed
//! here must match what V8 would report for the same text. The text is read as
//! UTF-16 code units, two units (one 32-bit word) at a time, and fed into five
//! rolling polynomial hashes in turn. A trailing odd unit is folded in with its
//! bytes swapped.

const LANES: usize = 5;

const PRIMES: [u64; LANES] = [0x3FB75161, 0xAB1F4E4F, 0x82675BC5, 0xCD924D35, 0x81ABE279];

const RANDOM: [u64; LANES] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];

const RANDOM_ODD: [u32; LANES] = [0xB4663807, 0xCC322BF5, 0xD4F91BBD, 0xA7BEA11D, 0x8F462907];

/// Rolling state of the five hash lanes.
struct HashState {
    hashes: [u64; LANES],
    zi: [u64; LANES],
    current: usize,
}

impl HashState {
    fn new() -> Self {
        Self { hashes: [0; LANES], zi: [1; LANES], current: 0 }
    }

    fn update(&mut self, word: u32) {
        let lane = self.current;
        let xi = (word.wrapping_mul(RANDOM_ODD[lane]) & 0x7FFF_FFFF) as u64;
        self.hashes[lane] = (self.hashes[lane] + self.zi[lane] * xi) % PRIMES[lane];
        self.zi[lane] = (self.zi[lane] * RANDOM[lane]) % PRIMES[lane];
        self.current = (lane + 1) % LANES;
    }

    fn finish(mut self) -> String {
        for lane in 0..LANES {
            self.hashes[lane] =
                (self.hashes[lane] + self.zi[lane] * (PRIMES[lane] - 1)) % PRIMES[lane];
        }
        self.hashes.iter().map(|h| format!("{h:08x}")).collect()
    }
}

/// Compute the 40-hex-digit hash of `text`.
pub fn script_hash(text: &str) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut state = HashState::new();

    let mut pairs = units.chunks_exact(2);
    for pair in &mut pairs {
        state.update(((pair[1] as u32) << 16) | pair[0] as u32);
    }

    if let [last] = pairs.remainder() {
        let unit = *last as u32;
        state.update(((unit & 0xFF) << 8) | ((unit & 0xFF00) >> 8));
    }

    state.finish()
}
