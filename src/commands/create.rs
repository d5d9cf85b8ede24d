use crate::config::Config;
use crate::error::Result;
use crate::model::TaskInput;
use crate::output::{self, Format};
use crate::store::repo;

pub fn run(config: &Config, name: String, cost: String, due: String, format: Format) -> Result<()> {
    let input = TaskInput::parse(&name, &cost, &due)?;
    let store = repo::open_store(config)?;
    let task = store.create(&input)?;
    output::print_task(&task, format)?;
    Ok(())
}
