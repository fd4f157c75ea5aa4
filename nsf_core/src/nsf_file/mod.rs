mod error;

#[cfg(test)]
mod tests;

pub use error::NsfError;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Program data is paged in fixed 4KB banks.
const BANK_SIZE: usize = 0x1000;
const HEADER_SIZE: usize = 0x80;
const MAGIC: [u8; 5] = [b'N', b'E', b'S', b'M', 0x1A];

bitflags! {
    /// Expansion sound chips an image can declare in its header.
    #[derive(Serialize, Deserialize)]
    pub struct ChipSet: u8 {
        const VRC6 = 1;
        const VRC7 = 1 << 1;
        const FDS = 1 << 2;
        const MMC5 = 1 << 3;
        const NAMCO_163 = 1 << 4;
        const SUNSOFT_5B = 1 << 5;
    }
}

/// A loaded NSF image: the fixed header fields plus the program data as
/// selectable 4KB banks. Immutable after loading except for the
/// bank-select table.
pub struct NsfFile {
    songs_count: u8,
    start_song: u8,

    init_address: u16,
    play_address: u16,

    name: String,
    artist: String,
    copyright: String,

    chips: ChipSet,

    bank_overrides: [u8; 8],
    bank_select: [u8; 8],
    banks: Vec<Vec<u8>>,
}

impl NsfFile {
    pub fn from_bytes(data: &[u8]) -> Result<Self, NsfError> {
        if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
            return Err(NsfError::InvalidMagic);
        }
        if data.len() < HEADER_SIZE {
            return Err(NsfError::TruncatedHeader);
        }

        let songs_count = data[0x6];
        let start_song = data[0x7];

        let load_address = u16::from_le_bytes([data[0x8], data[0x9]]);
        let init_address = u16::from_le_bytes([data[0xA], data[0xB]]);
        let play_address = u16::from_le_bytes([data[0xC], data[0xD]]);

        let name = read_fixed_string(&data[0x0E..0x2E]);
        let artist = read_fixed_string(&data[0x2E..0x4E]);
        let copyright = read_fixed_string(&data[0x4E..0x6E]);

        let mut bank_overrides = [0; 8];
        bank_overrides.copy_from_slice(&data[0x70..0x78]);

        let chips = ChipSet::from_bits_truncate(data[0x7B]);

        // the first bank is only partially filled when the load address does
        // not sit on a bank boundary, the prefix stays zero
        let mut program = vec![0; (load_address as usize) & (BANK_SIZE - 1)];
        program.extend_from_slice(&data[HEADER_SIZE..]);

        let mut banks = Vec::with_capacity(program.len() / BANK_SIZE + 1);
        for chunk in program.chunks(BANK_SIZE) {
            let mut bank = chunk.to_vec();
            bank.resize(BANK_SIZE, 0);
            banks.push(bank);
        }

        let mut file = Self {
            songs_count,
            start_song,
            init_address,
            play_address,
            name,
            artist,
            copyright,
            chips,
            bank_overrides,
            bank_select: [0; 8],
            banks,
        };
        file.reset_banks();

        Ok(file)
    }

    /// Restore the bank-select table to the header defaults. A zero override
    /// byte selects the window's own bank.
    pub(crate) fn reset_banks(&mut self) {
        for (i, select) in self.bank_select.iter_mut().enumerate() {
            let override_value = self.bank_overrides[i];

            *select = if override_value == 0 {
                i as u8
            } else {
                override_value
            };
        }
    }

    /// Writes to the 8-register window at 0x5FF8-0x5FFF select which bank
    /// each 4KB address window maps to, everything else is ignored.
    pub(crate) fn switch_bank(&mut self, address: u16, value: u8) {
        if (0x5FF8..=0x5FFF).contains(&address) {
            self.bank_select[(address & 0x7) as usize] = value;
        }
    }

    pub fn read(&self, address: u16) -> u8 {
        let window = ((address & 0x7000) >> 12) as usize;
        let bank = self.bank_select[window] as usize;

        self.banks
            .get(bank)
            .map_or(0, |bank| bank[(address as usize) & (BANK_SIZE - 1)])
    }

    /// Little-endian 16-bit read, the second byte is resolved on its own and
    /// may come from another bank.
    pub fn read_u16(&self, address: u16) -> u16 {
        let low = self.read(address) as u16;
        let high = self.read(address.wrapping_add(1)) as u16;

        high << 8 | low
    }

    pub fn songs_count(&self) -> u8 {
        self.songs_count
    }

    pub fn start_song(&self) -> u8 {
        self.start_song
    }

    pub fn init_address(&self) -> u16 {
        self.init_address
    }

    pub fn play_address(&self) -> u16 {
        self.play_address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    pub fn chips(&self) -> ChipSet {
        self.chips
    }

    pub(crate) fn bank_select(&self) -> [u8; 8] {
        self.bank_select
    }

    pub(crate) fn set_bank_select(&mut self, bank_select: [u8; 8]) {
        self.bank_select = bank_select;
    }
}

/// Fixed-width zero-padded header string.
fn read_fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
