use crate::config::Config;
use crate::error::Result;
use crate::output::{self, Format};
use crate::store::repo;
use crate::store::tasks::Direction;

pub fn move_up(config: &Config, id: i64, format: Format) -> Result<()> {
    run(config, id, Direction::Up, format)
}

pub fn move_down(config: &Config, id: i64, format: Format) -> Result<()> {
    run(config, id, Direction::Down, format)
}

fn run(config: &Config, id: i64, direction: Direction, format: Format) -> Result<()> {
    let store = repo::open_store(config)?;
    let outcome = store.move_task(id, direction)?;
    output::print_move(&outcome, format)?;
    Ok(())
}
