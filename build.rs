//! Puts `memory.x` where the linker can find it when building the firmware
//! image. Host builds never read the file.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());
    File::create(out.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out.display());

    println!("cargo:rerun-if-changed=memory.x");
    for var in [
        "FROSTWATCH_SSID",
        "FROSTWATCH_PASSWORD",
        "FROSTWATCH_API_KEY",
        "FROSTWATCH_FINGERPRINT",
        "FROSTWATCH_ALERT_EVENT",
        "FROSTWATCH_REPEAT_EVENT",
        "FROSTWATCH_CLEAR_EVENT",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }
}
