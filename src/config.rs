use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Video standard the board is timed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
    Dendy,
}

impl Region {
    pub fn parse(name: &str) -> Option<Region> {
        match name.to_ascii_lowercase().as_str() {
            "ntsc" => Some(Region::Ntsc),
            "pal" => Some(Region::Pal),
            "dendy" => Some(Region::Dendy),
            _ => None,
        }
    }
}

/// Per-unit trace switches handed to the CPU and PPU constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    pub trace_cpu: bool,
    pub trace_ppu: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: Region,
    pub frames: u32,
    pub trace_cpu: bool,
    pub trace_ppu: bool,
    pub dump_registers: bool,
    pub screenshot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            region: Region::Ntsc,
            frames: 60,
            trace_cpu: false,
            trace_ppu: false,
            dump_registers: false,
            screenshot: None,
        }
    }
}

impl Config {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Overlays `NES_*` environment variables. An unparsable region or
    /// frame count keeps the current setting.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(region) = var("NES_REGION").as_deref().and_then(Region::parse) {
            self.region = region;
        }
        if let Some(frames) = var("NES_FRAMES").and_then(|v| v.parse::<u32>().ok()) {
            self.frames = frames;
        }
        self.trace_cpu = flag(var("NES_TRACE_CPU"), self.trace_cpu);
        self.trace_ppu = flag(var("NES_TRACE_PPU"), self.trace_ppu);
        self.dump_registers = flag(var("NES_DUMP_REGS"), self.dump_registers);
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            trace_cpu: self.trace_cpu,
            trace_ppu: self.trace_ppu,
        }
    }
}

fn flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(default)
}
