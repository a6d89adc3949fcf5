//! `delve generate`: print a regenerated dungeon.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use delve_core::{CellCoord, DungeonData, Seed};
use serde_json::json;
use tracing::info;

#[derive(Debug, Args)]
pub(crate) struct GenerateArgs {
    /// Map width in tiles.
    #[arg(long, default_value_t = 120)]
    width: u32,
    /// Map height in tiles.
    #[arg(long, default_value_t = 120)]
    height: u32,
    /// 31-bit generation seed.
    #[arg(long, default_value_t = 42)]
    seed: u32,
    /// Depth of the map; deeper maps carry more rooms and obstacles.
    #[arg(long, default_value_t = 0)]
    depth: u32,
    /// Print a JSON document with the wire-encoded grid instead of text.
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(args: &GenerateArgs, out: &mut impl Write) -> Result<()> {
    let seed = Seed::new(args.seed);
    let dungeon = delve_system_generation::generate(args.width, args.height, seed, args.depth);
    info!(
        seed = seed.get(),
        depth = args.depth,
        rooms = dungeon.rooms().len(),
        "dungeon generated"
    );

    if args.json {
        serde_json::to_writer(&mut *out, &describe_json(&dungeon))?;
        writeln!(out)?;
    } else {
        write!(out, "{}", dungeon.grid().render())?;
        write!(out, "{}", describe_text(&dungeon))?;
    }
    Ok(())
}

fn describe_json(dungeon: &DungeonData) -> serde_json::Value {
    let grid = dungeon.grid();
    json!({
        "width": grid.width(),
        "height": grid.height(),
        "seed": dungeon.seed(),
        "depth": dungeon.depth(),
        "tiles": grid.to_wire(),
        "spawn_point": dungeon.spawn_point(),
        "entry_portal": dungeon.entry_portal(),
        "exit_portal": dungeon.exit_portal(),
        "transport_points": dungeon.transport_points(),
        "rooms": dungeon.rooms().len(),
    })
}

fn describe_text(dungeon: &DungeonData) -> String {
    let pads: Vec<String> = dungeon
        .transport_points()
        .iter()
        .map(|cell| coordinate(*cell))
        .collect();
    format!(
        "seed {} depth {} size {}x{}\nrooms {}\nspawn {}\nentry {}\nexit {}\npads {}\n",
        dungeon.seed().get(),
        dungeon.depth(),
        dungeon.grid().width(),
        dungeon.grid().height(),
        dungeon.rooms().len(),
        coordinate(dungeon.spawn_point()),
        dungeon.entry_portal().map_or_else(|| "-".to_owned(), coordinate),
        coordinate(dungeon.exit_portal()),
        pads.join(" "),
    )
}

fn coordinate(cell: CellCoord) -> String {
    format!("({},{})", cell.column(), cell.row())
}
