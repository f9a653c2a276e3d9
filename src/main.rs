use std::{error::Error, fs, path::PathBuf};

use clap::{Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use log::{error, info, warn};
use roosty_alarm::{
    app::AlarmApp,
    audio::{self, Player, RodioPlayer, SilentPlayer},
    config::DEFAULT_SNOOZE_MINUTES,
    AlarmConfig, AlarmController, SettingsStore,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// settings file to use instead of the per user one
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// minutes the snooze button adds
    #[clap(long, short, default_value_t = DEFAULT_SNOOZE_MINUTES)]
    snooze: u32,
    #[clap(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// write a default settings file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// list the output devices an alarm can ring on
    Devices,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger, running without a log file is better than not waking up
    if simple_file_logger::init_logger!("roosty_alarm").is_err() {
        eprintln!("couldn't initialize logger, continuing without a log file");
    }

    let args = Args::parse();
    let store = SettingsStore::new(args.config.unwrap_or_else(SettingsStore::default_path));
    match args.command {
        Some(Action::Init { force }) => {
            init(&store, force)?;
            return Ok(());
        }
        Some(Action::Devices) => {
            let devices = audio::list_output_devices();
            if devices.is_empty() {
                println!("no output devices found");
            }
            for device in devices {
                println!("{device}");
            }
            return Ok(());
        }
        None => {}
    }

    let (player, backend_notice): (Box<dyn Player>, _) = if audio::backend_available() {
        (Box::new(RodioPlayer::new()), None)
    } else {
        error!("no audio output available, alarms will ring silently");
        (
            Box::new(SilentPlayer),
            Some("No audio output available, the alarm will only show on screen".to_string()),
        )
    };
    let devices = audio::list_output_devices();
    let controller = AlarmController::new(player, store);
    let app = AlarmApp::new(controller, devices, args.snooze, backend_notice);

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([460.0, 520.0])
            .with_resizable(false),
        ..Default::default()
    };
    info!("starting roosty alarm");
    // run the gui
    run_native(
        "Roosty Alarm",
        native_options,
        Box::new(move |_| Ok(Box::new(app))),
    )
    .map_err(Into::into)
}

fn init(store: &SettingsStore, force: bool) -> Result<(), Box<dyn Error>> {
    if store.exists() && !force {
        println!(
            "{} already exists, use --force to overwrite it",
            store.path().display()
        );
        return Ok(());
    }
    store.try_save(&AlarmConfig::new())?;
    println!("wrote {}", store.path().display());
    match SettingsStore::sounds_path() {
        Some(sounds) => {
            fs::create_dir_all(&sounds)?;
            println!("put your alarm sounds in {}", sounds.display());
        }
        None => warn!("no data directory, the default sound is looked up in the working directory"),
    }
    Ok(())
}
