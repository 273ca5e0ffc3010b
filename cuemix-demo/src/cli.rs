use anyhow::{Context, Result};
use cuemix::{
    AudioMixer, CueEvent, DirectoryLoader, MixerDesc, PlayHandle, PlayOptions, SoundRegistry,
    SoundRegistryDesc,
};
use std::path::Path;
use std::time::Duration;

#[derive(clap::Parser)]
#[command(name = "cuemix-demo", about = "Load sounds from a directory and play them")]
pub struct Args {
    /// Directory sound paths are resolved against.
    pub asset_root: String,
    /// Sound files relative to the asset root.
    #[arg(required = true)]
    pub sounds: Vec<String>,
    /// Fire three overlapping shots of each sound.
    #[arg(long)]
    pub overlap: bool,
}

/// Loads every sound under its file stem and plays them one after another
/// (or three overlapping shots each with `--overlap`).
pub fn run(args: Args) -> Result<()> {
    let mixer = AudioMixer::new(MixerDesc::default());
    let mut registry = SoundRegistry::with_mixer(mixer, SoundRegistryDesc::default())
        .with_loader(DirectoryLoader::new(&args.asset_root));

    registry
        .try_init()
        .context("audio output could not be started")?;

    for path in &args.sounds {
        let name = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
            .to_string();
        registry.load_sound(name, path);
    }
    log::info!("{} of {} sounds loaded", registry.len(), args.sounds.len());

    let mut names: Vec<String> = registry.names().cloned().collect();
    names.sort();

    for name in &names {
        let shots = if args.overlap { 3 } else { 1 };
        let mut handles = Vec::new();
        for shot in 0..shots {
            let volume = 1.0 - shot as f32 * 0.25;
            handles.push(registry.play_with(name, PlayOptions::new().volume(volume)));
            std::thread::sleep(Duration::from_millis(120));
        }
        log::info!("Playing '{}' {:?}", name, handles);

        wait_until_quiet(&registry, name, &handles);
        for event in registry.poll_events() {
            log_event(&registry, &event);
        }
    }

    log::info!("{} frames rendered", registry.mixer().frames_processed());
    registry.destroy();
    Ok(())
}

fn wait_until_quiet(registry: &SoundRegistry, name: &str, handles: &[PlayHandle]) {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while handles.iter().any(|h| registry.is_active(name, *h)) {
        if std::time::Instant::now() >= deadline {
            log::warn!("'{}' still playing after 10s, stopping it", name);
            for handle in handles {
                registry.stop(name, *handle);
            }
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn log_event(registry: &SoundRegistry, event: &CueEvent) {
    let name = event
        .cue()
        .and_then(|id| registry.name_of(id))
        .map(String::as_str)
        .unwrap_or("-");
    if event.is_error() {
        log::error!("{:?}", event);
    } else {
        log::debug!("[{}] {:?}", name, event);
    }
}
