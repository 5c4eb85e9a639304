//! Process-wide quit flag. The headless runner checks it before every clock pulse so
//! Ctrl+C still gets the register dump and screenshot written.

use std::sync::atomic::{AtomicBool, Ordering};

static QUIT_REQUESTED: AtomicBool = AtomicBool::new(false);

pub fn should_quit() -> bool {
    QUIT_REQUESTED.load(Ordering::SeqCst)
}

pub fn request_quit() {
    QUIT_REQUESTED.store(true, Ordering::SeqCst);
}

#[cfg(unix)]
pub fn install() {
    use std::os::raw::c_int;
    const SIGINT: c_int = 2;
    const SIGTERM: c_int = 15;

    extern "C" fn handler(_sig: c_int) {
        // only touch the atomic in signal context
        request_quit();
    }

    extern "C" {
        fn signal(sig: c_int, handler: extern "C" fn(c_int)) -> usize;
    }

    unsafe {
        let _ = signal(SIGINT, handler);
        let _ = signal(SIGTERM, handler);
    }
    log::debug!("SIGINT/SIGTERM handlers installed");
}

#[cfg(not(unix))]
pub fn install() {
    log::debug!("no signal handlers on this platform; runner stops after its frame budget");
}
