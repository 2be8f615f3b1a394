#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let data_dir = std::env::args_os()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("inkpad-data"));
    log::info!("Storing drawings in {}", data_dir.display());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "inkpad",
        native_options,
        Box::new(|cc| Ok(Box::new(inkpad::InkApp::new(cc, data_dir)))),
    )
}

// The web build embeds the library directly; there is no standalone binary.
#[cfg(target_arch = "wasm32")]
fn main() {}
