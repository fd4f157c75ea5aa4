mod ui;

use nsf_core::{DEFAULT_SAMPLE_RATE, NSF};
use std::env::args;

fn main() {
    env_logger::init();

    let args = args().collect::<Vec<String>>();

    let file = args.get(1).map(|s| s.as_str());

    if file.is_none() || file == Some("-h") || file == Some("--help") {
        eprintln!("USAGE: {} <nsf-file> [-a]\n-a: remove audio", args[0]);
        return;
    }

    let has_audio = args.get(2).map(|s| s.as_str()) != Some("-a");

    let mut nsf = match NSF::from_file(file.unwrap(), DEFAULT_SAMPLE_RATE) {
        Ok(nsf) => nsf,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    log::info!(
        "loaded \"{}\" by \"{}\" ({} tracks, chips {:?})",
        nsf.name(),
        nsf.artist(),
        nsf.songs_count(),
        nsf.chips(),
    );

    nsf.play_start_song();

    ui::Ui::new(nsf, has_audio).run();
}
