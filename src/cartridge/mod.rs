use std::fs;
use std::path::Path;

use crate::config::Region;
use crate::error::LoadError;
use crate::memory::{CHR_BANK_SIZE, PRG_BANK_SIZE};

const HEADER_SIZE: usize = 16;
const MAGIC: &[u8; 4] = b"NES\x1a";

const FLAG_VERTICAL: u8 = 0x01;
const FLAG_BATTERY: u8 = 0x02;
const FLAG_TRAINER: u8 = 0x04;
const FLAG_FOUR_SCREEN: u8 = 0x08;

/// How the four logical nametables fold onto the console's VRAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
    SingleScreenLower,
    SingleScreenUpper,
}

/// A parsed iNES image. Only NROM boards are accepted.
#[derive(Debug, Clone)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    mapper: u8,
    mirroring: Mirroring,
    battery: bool,
    prg_ram_banks: u8,
    region: Region,
}

impl Cartridge {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let cartridge = Self::from_bytes(&data)?;
        log::info!("loaded {}", path.display());
        Ok(cartridge)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
            return Err(LoadError::BadMagic);
        }
        if data.len() < HEADER_SIZE {
            return Err(LoadError::Truncated {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let prg_banks = data[4] as usize;
        let chr_banks = data[5] as usize;
        let flags6 = data[6];
        let flags7 = data[7];

        if prg_banks == 0 {
            return Err(LoadError::NoPrgBanks);
        }
        if flags6 & FLAG_TRAINER != 0 {
            return Err(LoadError::TrainerUnsupported);
        }
        let mapper = (flags7 & 0xF0) | (flags6 >> 4);
        if mapper != 0 {
            return Err(LoadError::UnsupportedMapper(mapper));
        }

        let prg_size = prg_banks * PRG_BANK_SIZE;
        let chr_size = chr_banks * CHR_BANK_SIZE;
        let expected = HEADER_SIZE + prg_size + chr_size;
        if data.len() < expected {
            return Err(LoadError::Truncated {
                expected,
                actual: data.len(),
            });
        }

        let mirroring = if flags6 & FLAG_FOUR_SCREEN != 0 {
            Mirroring::FourScreen
        } else if flags6 & FLAG_VERTICAL != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg_start = HEADER_SIZE;
        let chr_start = prg_start + prg_size;
        let prg_rom = data[prg_start..chr_start].to_vec();
        let chr_is_ram = chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_SIZE]
        } else {
            data[chr_start..chr_start + chr_size].to_vec()
        };

        let region = if data[9] & 0x01 != 0 {
            Region::Pal
        } else {
            Region::Ntsc
        };

        log::info!(
            "cartridge: mapper {}, PRG {} KiB, CHR {} KiB{}, {:?} mirroring",
            mapper,
            prg_rom.len() / 1024,
            chr.len() / 1024,
            if chr_is_ram { " (RAM)" } else { "" },
            mirroring
        );

        Ok(Cartridge {
            prg_rom,
            chr,
            chr_is_ram,
            mapper,
            mirroring,
            battery: flags6 & FLAG_BATTERY != 0,
            prg_ram_banks: data[8],
            region,
        })
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }

    pub fn mapper(&self) -> u8 {
        self.mapper
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn has_battery(&self) -> bool {
        self.battery
    }

    /// 8 KiB units; iNES v1 writes 0 when it means 1.
    pub fn prg_ram_banks(&self) -> u8 {
        self.prg_ram_banks.max(1)
    }

    /// The header's TV-system bit. Dumps rarely set it.
    pub fn region(&self) -> Region {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0; HEADER_SIZE];
        data[..4].copy_from_slice(MAGIC);
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = flags6;
        data[7] = flags7;
        data.resize(
            HEADER_SIZE + prg_banks as usize * PRG_BANK_SIZE + chr_banks as usize * CHR_BANK_SIZE,
            0,
        );
        data
    }

    #[test]
    fn test_one_prg_bank_without_chr() {
        let mut data = image(1, 0, 0, 0);
        data[HEADER_SIZE] = 0xA9;

        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.prg_rom().len(), 16384);
        assert_eq!(cart.prg_rom()[0], 0xA9);
        assert!(cart.chr_is_ram());
        assert_eq!(cart.chr().len(), CHR_BANK_SIZE);
        assert_eq!(cart.mapper(), 0);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        assert_eq!(cart.region(), Region::Ntsc);
    }

    #[test]
    fn test_chr_rom_and_flags() {
        let mut data = image(2, 1, FLAG_VERTICAL | FLAG_BATTERY, 0);
        data[8] = 2;
        data[9] = 0x01;
        let last = data.len() - 1;
        data[last] = 0x5A;

        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.prg_rom().len(), 2 * PRG_BANK_SIZE);
        assert!(!cart.chr_is_ram());
        assert_eq!(cart.chr()[CHR_BANK_SIZE - 1], 0x5A);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert!(cart.has_battery());
        assert_eq!(cart.prg_ram_banks(), 2);
        assert_eq!(cart.region(), Region::Pal);
    }

    #[test]
    fn test_four_screen_wins_over_vertical() {
        let data = image(1, 1, FLAG_FOUR_SCREEN | FLAG_VERTICAL, 0);
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut data = image(1, 0, 0, 0);
        data[3] = 0x00;
        assert!(matches!(Cartridge::from_bytes(&data), Err(LoadError::BadMagic)));
        assert!(matches!(Cartridge::from_bytes(b"NE"), Err(LoadError::BadMagic)));
    }

    #[test]
    fn test_zero_prg_banks_is_rejected() {
        let data = image(0, 1, 0, 0);
        assert!(matches!(Cartridge::from_bytes(&data), Err(LoadError::NoPrgBanks)));
    }

    #[test]
    fn test_trainer_and_mapper_are_rejected() {
        let data = image(1, 0, FLAG_TRAINER, 0);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(LoadError::TrainerUnsupported)
        ));

        let data = image(1, 0, 0x10, 0x40);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(LoadError::UnsupportedMapper(0x41))
        ));
    }

    #[test]
    fn test_truncated_image() {
        let mut data = image(1, 1, 0, 0);
        data.truncate(HEADER_SIZE + PRG_BANK_SIZE);
        match Cartridge::from_bytes(&data) {
            Err(LoadError::Truncated { expected, actual }) => {
                assert_eq!(expected, HEADER_SIZE + PRG_BANK_SIZE + CHR_BANK_SIZE);
                assert_eq!(actual, HEADER_SIZE + PRG_BANK_SIZE);
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.mapper())),
        }

        assert!(matches!(
            Cartridge::from_bytes(&data[..8]),
            Err(LoadError::Truncated { expected: 16, actual: 8 })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Cartridge::load("/nonexistent/rom.nes").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
