use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use hueying_panel::config::PanelConfig;
use hueying_panel::{env, payload, ui, updater};

#[derive(Parser, Debug)]
#[command(
    name = "Hueying AI Panel",
    author,
    version,
    about = "Control panel for a local AI service with encrypted workflow updates"
)]
struct Cli {
    /// Print panel version and exit without starting the UI.
    #[arg(long)]
    version_only: bool,

    /// Run the update check and workspace preparation headlessly, then exit.
    #[arg(long)]
    update_only: bool,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("Hueying AI Panel {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Err(err) = env::ensure_base_dirs() {
        warn!("failed to create app directories: {err}");
    }

    let config = PanelConfig::load();

    if cli.update_only {
        run_headless_update(&config);
        payload::run_exit_cleanup();
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_icon(default_icon())
            .with_inner_size(eframe::egui::vec2(config.window_width, config.window_height)),
        ..Default::default()
    };
    let result = eframe::run_native(
        "Hueying AI Panel",
        options,
        Box::new(|cc| Ok(Box::new(ui::PanelApp::new(cc)))),
    );
    payload::run_exit_cleanup();
    result
}

fn run_headless_update(config: &PanelConfig) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            error!("failed to create runtime: {err}");
            std::process::exit(1);
        }
    };

    let updater = updater::Updater::new(config);
    let outcome = runtime.block_on(updater.auto_update_if_needed(None));
    if !outcome.payload_ready {
        error!("no workflow payload available locally or remotely");
        std::process::exit(1);
    }

    let result = payload::init_payload(
        updater.payload_path(),
        &env::working_dir(),
        &config.key_bytes(),
    );
    match result {
        Ok(()) => info!(
            "workspace ready (version {})",
            updater.store().get_local_version()
        ),
        Err(err) => {
            error!("failed to prepare workspace: {err}");
            std::process::exit(1);
        }
    }
}

fn default_icon() -> eframe::egui::IconData {
    // Simple 2x2 icon: dark background with a teal accent.
    let rgba: Vec<u8> = vec![
        20, 24, 32, 255, 30, 220, 196, 255, //
        20, 24, 32, 255, 20, 180, 150, 255,
    ];
    eframe::egui::IconData {
        rgba,
        width: 2,
        height: 2,
    }
}
