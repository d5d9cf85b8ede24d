use crate::config::Config;
use crate::error::Result;
use crate::output::{self, Format};
use crate::store::repo;

pub fn run(config: &Config, id: i64, format: Format) -> Result<()> {
    let store = repo::open_store(config)?;
    let task = store.get(id)?;
    output::print_task(&task, format)?;
    Ok(())
}
