//! `delve simulate`: drive a room headlessly and stream its events.

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use delve_core::{Command, Event, PlayerId};
use delve_world::{self as world, query, GameRoom, RoomConfig};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    /// Number of players joining at the start.
    #[arg(long, default_value_t = 1)]
    players: u64,
    /// Number of ticks to run.
    #[arg(long, default_value_t = 300)]
    ticks: u64,
    /// TOML file with room settings; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the room's base seed.
    #[arg(long)]
    seed: Option<u32>,
    /// Overrides the map width.
    #[arg(long)]
    width: Option<u32>,
    /// Overrides the map height.
    #[arg(long)]
    height: Option<u32>,
    /// Players fire at the nearest bot on their map every tick.
    #[arg(long)]
    shoot: bool,
}

#[derive(Debug, Serialize)]
struct EventLine<'a> {
    tick: u64,
    event: &'a Event,
}

pub(crate) fn run(args: &SimulateArgs, out: &mut impl Write) -> Result<()> {
    let config = load_config(args)?;
    let dt = config.tick_interval();
    let mut room = GameRoom::new(config);
    let mut events = Vec::new();

    for id in 1..=args.players {
        world::apply(
            &mut room,
            Command::AddPlayer {
                player: PlayerId::new(id),
            },
            &mut events,
        )?;
    }
    emit(out, 0, &mut events)?;

    for tick in 1..=args.ticks {
        if args.shoot {
            for command in aim_at_nearest_bots(&room) {
                world::apply(&mut room, command, &mut events)?;
            }
        }
        world::apply(&mut room, Command::Tick { dt }, &mut events)?;
        emit(out, tick, &mut events)?;
    }

    for player in query::players(&room) {
        info!(
            player = player.id.get(),
            depth = player.depth,
            lives = player.lives,
            score = player.score,
            "final player state"
        );
    }
    info!(
        ticks = args.ticks,
        instances = query::instances(&room).len(),
        "simulation finished"
    );
    Ok(())
}

fn load_config(args: &SimulateArgs) -> Result<RoomConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_config(&text).with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => RoomConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.base_seed = seed;
    }
    if let Some(width) = args.width {
        config.map_width = width;
    }
    if let Some(height) = args.height {
        config.map_height = height;
    }
    Ok(config)
}

fn parse_config(text: &str) -> Result<RoomConfig> {
    Ok(toml::from_str(text)?)
}

/// One shot per active player towards the closest bot sharing their map.
fn aim_at_nearest_bots(room: &GameRoom) -> Vec<Command> {
    query::players(room)
        .filter(|player| player.is_active())
        .filter_map(|player| {
            let bots = query::bots(room, player.map())?;
            let origin = player.cell;
            let target = bots.iter().map(|bot| bot.cell()).min_by_key(|cell| {
                let dx = i64::from(cell.column()) - i64::from(origin.column());
                let dy = i64::from(cell.row()) - i64::from(origin.row());
                dx * dx + dy * dy
            })?;
            let dx = f64::from(target.column()) - f64::from(origin.column());
            let dy = f64::from(target.row()) - f64::from(origin.row());
            let angle = dy.atan2(dx) as f32;
            Some(Command::Shoot {
                player: player.id,
                angle,
            })
        })
        .collect()
}

fn emit(out: &mut impl Write, tick: u64, events: &mut Vec<Event>) -> Result<()> {
    for event in events.drain(..) {
        serde_json::to_writer(
            &mut *out,
            &EventLine {
                tick,
                event: &event,
            },
        )?;
        writeln!(out)?;
    }
    Ok(())
}
