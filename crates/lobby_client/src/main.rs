use std::path::PathBuf;

use app::{AppBuilder, Application};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use futures::{stream, StreamExt};
use lobby_client::{
    random_room_name, ClientRuntime, DirectoryTask, IntervalTicks, LanSessionSource,
    SessionAnnouncer,
};
use lobby_shared::{
    discovery::SessionAdvertisement, LobbyConfig, Region, SessionFilter, SessionRecord, ViewState,
};

#[derive(Parser)]
#[command(name = "lobby_browser")]
#[command(about = "Lists multiplayer sessions announced on the local network")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "lobby.toml")]
    config: PathBuf,

    /// Only show sessions whose name contains this text (case-insensitive)
    #[arg(short, long)]
    name: Option<String>,

    /// Region tag to show, or "All"
    #[arg(short, long, default_value = "All")]
    region: String,

    /// Overrides the LAN discovery port from the config
    #[arg(long)]
    lan_port: Option<u16>,

    /// Announce a hosted session with this name (empty for a random one)
    #[arg(long)]
    host: Option<String>,

    /// Region of the hosted session
    #[arg(long, default_value_t = Region::Eu)]
    host_region: Region,

    /// Port players connect to on the hosted session
    #[arg(long, default_value_t = 7777)]
    host_port: u16,

    /// Session size of the hosted session (defaults to the config value)
    #[arg(long)]
    max_players: Option<u16>,
}

struct LobbyBrowserApp;

impl Application for LobbyBrowserApp {
    const APP_ID: &'static str = "lobby_browser";
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let _context = AppBuilder::<LobbyBrowserApp>::new(env!("CARGO_PKG_VERSION"))
        .map_err(|err| eyre!("failed to initialize app: {err}"))?
        .build();

    let mut config = LobbyConfig::load(&args.config)?;
    if let Some(port) = args.lan_port {
        config.lan.port = port;
    }
    config.validate()?;

    let runtime = ClientRuntime::multi_thread()?;
    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: LobbyConfig) -> Result<()> {
    let filter = SessionFilter::from_inputs(args.name.as_deref().unwrap_or(""), &args.region);
    println!("🔎 Filter: name {:?}, region {}", filter.name_substring(), filter.region());

    let source = if config.lan.enabled {
        LanSessionSource::spawn(&config.lan)?.into_stream().boxed()
    } else {
        println!("⚠️  LAN discovery disabled in config");
        stream::pending().boxed()
    };
    let ticks = IntervalTicks::try_new(config.browser.refresh_interval())
        .ok_or_else(|| eyre!("browser.refresh_interval_ms must be greater than 0"))?;
    let (directory, task) = DirectoryTask::spawn(filter, ticks, source);

    let _announcer = match args.host.as_deref() {
        Some(room) => {
            let room = match room.trim() {
                "" => random_room_name(),
                name => name.to_string(),
            };
            let max_players = args.max_players.unwrap_or(config.default_max_players);
            let record = SessionRecord::new(room, args.host_region.tag(), 1, u32::from(max_players));
            println!("📣 Hosting \"{}\" ({})", record.name, record.region);
            Some(SessionAnnouncer::spawn(
                &config.lan,
                SessionAdvertisement::new(args.host_port, record),
            )?)
        }
        None => None,
    };

    let mut views = directory.subscribe();
    let mut shown: Option<ViewState> = None;
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let update = views.borrow_and_update().clone();
                if shown.as_ref() != Some(&update.view) {
                    render(&update.view);
                    shown = Some(update.view);
                }
            }
        }
    }

    task.shutdown().await;
    Ok(())
}

fn render(view: &ViewState) {
    println!();
    if view.is_empty() {
        println!("(no sessions)");
        return;
    }
    println!("{:<24} {:<8} {}", "NAME", "REGION", "PLAYERS");
    for session in view.iter() {
        let marker = if session.is_full() { " (full)" } else { "" };
        println!(
            "{:<24} {:<8} {}{}",
            session.name,
            session.region,
            session.occupancy_label(),
            marker
        );
    }
}
