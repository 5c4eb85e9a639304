use std::cell::RefCell;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use nes_hardware::config::Region;
use nes_hardware::ppu::FrameBuffer;
use nes_hardware::{shutdown, Board, Cartridge, Config};

struct Args {
    rom: PathBuf,
    config_file: Option<PathBuf>,
    frames: Option<u32>,
    region: Option<Region>,
    trace_cpu: bool,
    trace_ppu: bool,
    dump: bool,
    screenshot: Option<PathBuf>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <rom.nes> [--frames N] [--region ntsc|pal|dendy] [--config FILE] \
         [--trace-cpu] [--trace-ppu] [--dump] [--screenshot FILE]",
        program
    )
}

fn value(args: &[String], i: usize) -> Result<&str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", args[i]))
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let program = args.first().map(String::as_str).unwrap_or("nes-hardware");
    let mut rom = None;
    let mut parsed = Args {
        rom: PathBuf::new(),
        config_file: None,
        frames: None,
        region: None,
        trace_cpu: false,
        trace_ppu: false,
        dump: false,
        screenshot: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Err(usage(program)),
            "--frames" => {
                let v = value(args, i)?;
                parsed.frames = Some(
                    v.parse()
                        .map_err(|_| format!("--frames: not a number: {}", v))?,
                );
                i += 1;
            }
            "--region" => {
                let v = value(args, i)?;
                parsed.region =
                    Some(Region::parse(v).ok_or_else(|| format!("--region: unknown region {}", v))?);
                i += 1;
            }
            "--config" => {
                parsed.config_file = Some(PathBuf::from(value(args, i)?));
                i += 1;
            }
            "--screenshot" => {
                parsed.screenshot = Some(PathBuf::from(value(args, i)?));
                i += 1;
            }
            "--trace-cpu" => parsed.trace_cpu = true,
            "--trace-ppu" => parsed.trace_ppu = true,
            "--dump" => parsed.dump = true,
            s if s.starts_with('-') => return Err(format!("Unknown option: {}\n{}", s, usage(program))),
            s => rom = Some(PathBuf::from(s)),
        }
        i += 1;
    }

    parsed.rom = rom.ok_or_else(|| usage(program))?;
    Ok(parsed)
}

/// Defaults, then the JSON file, then `NES_*` variables, then flags.
fn build_config(args: &Args) -> Result<Config, String> {
    let mut config = match &args.config_file {
        Some(path) => Config::from_json_file(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => Config::default(),
    };
    config.apply_env();

    if let Some(frames) = args.frames {
        config.frames = frames;
    }
    if let Some(region) = args.region {
        config.region = region;
    }
    config.trace_cpu |= args.trace_cpu;
    config.trace_ppu |= args.trace_ppu;
    config.dump_registers |= args.dump;
    if args.screenshot.is_some() {
        config.screenshot = args.screenshot.clone();
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), String> {
    let config = build_config(&args)?;
    let cartridge = Cartridge::load(&args.rom).map_err(|e| format!("{}: {}", args.rom.display(), e))?;

    if cartridge.region() != config.region {
        log::warn!(
            "header says {:?}, running with {:?} timing",
            cartridge.region(),
            config.region
        );
    }

    let mut board = Board::new(&cartridge, &config);
    let frame_buffer = Rc::new(RefCell::new(FrameBuffer::new()));
    board.set_video_sink(Box::new(frame_buffer.clone()));

    shutdown::install();
    // finish the pre-render line the board powers up on
    board.run_frame();
    let mut frames = 0;
    while frames < config.frames && !shutdown::should_quit() {
        let start = board.frame();
        board.run_until(|b| shutdown::should_quit() || b.frame() != start);
        if board.frame() == start {
            log::info!(
                "interrupted at scanline {}",
                board.ppu().map_or(0, |ppu| ppu.scanline())
            );
            break;
        }
        frames += 1;
    }

    log::info!(
        "ran {} frames, {} CPU cycles, {} frames drawn",
        frames,
        board.cpu_cycles(),
        frame_buffer.borrow().frames()
    );

    if config.dump_registers {
        if let Some(dump) = board.registers() {
            let json = serde_json::to_string_pretty(&dump).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }

    if let Some(path) = &config.screenshot {
        save_screenshot(&frame_buffer.borrow(), path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "screenshot")]
fn save_screenshot(frame_buffer: &FrameBuffer, path: &Path) -> Result<(), String> {
    let is_ppm = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("ppm"));
    if is_ppm {
        frame_buffer.save_ppm(path).map_err(|e| e.to_string())
    } else {
        frame_buffer.save_image(path).map_err(|e| e.to_string())
    }
}

#[cfg(not(feature = "screenshot"))]
fn save_screenshot(frame_buffer: &FrameBuffer, path: &Path) -> Result<(), String> {
    frame_buffer.save_ppm(path).map_err(|e| e.to_string())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(2);
        }
    };

    if let Err(msg) = run(args) {
        log::error!("{}", msg);
        process::exit(1);
    }
}
