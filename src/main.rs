use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn, Level};
use vibecatch::{
    AudioDeviceFactory, CaptureSession, Config, DeviceSource, Diagnostics, Mood, MoodStore,
    RecognitionClient, SessionEvent, SessionState,
};

/// Catch the song playing around you and file it by mood
#[derive(Debug, Parser)]
#[command(name = "vibecatch", version)]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/vibecatch")]
    config: String,

    /// Replay a 44.1kHz 16-bit mono WAV file instead of the microphone
    #[arg(long, value_name = "WAV")]
    file: Option<PathBuf>,

    /// Replay the file at capture speed
    #[arg(long, requires = "file")]
    realtime: bool,

    /// Keep the encoded recording at this path
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Run a single capture and exit
    #[arg(long)]
    once: bool,

    /// File recognized tracks under this mood without asking
    #[arg(long, value_name = "ID")]
    mood: Option<Mood>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        cfg.logging.level()?
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Vibecatch v{}", env!("CARGO_PKG_VERSION"));
    if cfg.recognition.api_key.is_empty() {
        warn!("No recognition API key configured (set VIBECATCH__RECOGNITION__API_KEY)");
    }

    let diagnostics = Diagnostics::tracing();
    let source = match &cli.file {
        Some(path) => DeviceSource::File {
            path: path.clone(),
            realtime: cli.realtime,
        },
        None => DeviceSource::Microphone,
    };
    let device = AudioDeviceFactory::create(source, diagnostics.clone())?;
    let recognizer = RecognitionClient::new(cfg.recognition.clone(), diagnostics.clone())?;

    let mut session = CaptureSession::new(
        cfg.capture.session_config(),
        device,
        Box::new(recognizer),
        diagnostics,
    );
    let mut events = session.subscribe();

    // Ctrl+C stops a running recording; otherwise it quits
    let recording = Arc::new(AtomicBool::new(false));
    let stop = session.stop_handle();
    let ctrl_c_recording = recording.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if ctrl_c_recording.load(Ordering::SeqCst) {
                stop.request_stop();
            } else {
                println!();
                std::process::exit(130);
            }
        }
    });

    let mut store = MoodStore::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if !cli.once {
            println!("\nPress Enter to start listening (q to quit)");
            match lines.next_line().await? {
                None => break,
                Some(line) if line.trim().eq_ignore_ascii_case("q") => break,
                Some(_) => {}
            }
        }

        println!("Listening...");
        let result = {
            let capture = session.capture();
            tokio::pin!(capture);

            let result = loop {
                tokio::select! {
                    result = &mut capture => break result,
                    Some(event) = events.recv() => render(&event, &recording),
                }
            };
            while let Ok(event) = events.try_recv() {
                render(&event, &recording);
            }
            result
        };

        if let (Some(path), Some(container)) = (&cli.save, session.container()) {
            container.write_to(path)?;
            info!("Saved recording to {}", path.display());
        }

        match result {
            Ok(track) => {
                println!("Found: {}", track);

                let mood = match cli.mood {
                    Some(mood) => Some(mood),
                    None => prompt_mood(&mut lines).await?,
                };
                if let Some(mood) = mood {
                    session.classify(mood, &mut store)?;
                    println!("Added to {}", mood.display_name());
                }

                print_collections(&store);
            }
            Err(e) => println!("{}", e),
        }

        if cli.once {
            break;
        }
    }

    Ok(())
}

fn render(event: &SessionEvent, recording: &AtomicBool) {
    match event {
        SessionEvent::StateChanged(state) => {
            recording.store(state.is_recording(), Ordering::SeqCst);
            if *state == SessionState::Submitting {
                println!("\nIdentifying...");
            }
        }
        SessionEvent::Progress(progress) => {
            print!("\r{} [{:>3.0}%]", progress, progress.percent);
            let _ = std::io::stdout().flush();
        }
        _ => {}
    }
}

async fn prompt_mood(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<Mood>> {
    println!("What's the vibe?");
    for (i, mood) in Mood::ALL.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, mood.display_name(), mood.id());
    }
    println!("Pick a number or id (Enter to skip):");

    loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let input = line.trim();
        if input.is_empty() {
            return Ok(None);
        }

        if let Ok(n) = input.parse::<usize>() {
            if let Some(mood) = n.checked_sub(1).and_then(|i| Mood::ALL.get(i)) {
                return Ok(Some(*mood));
            }
        }

        match input.parse::<Mood>() {
            Ok(mood) => return Ok(Some(mood)),
            Err(e) => println!("{}", e),
        }
    }
}

fn print_collections(store: &MoodStore) {
    for (mood, _) in store.list() {
        if let Some(playlist) = store.export(mood) {
            println!("\n{}", playlist);
        }
    }
}
