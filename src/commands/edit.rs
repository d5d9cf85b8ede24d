use crate::config::Config;
use crate::error::Result;
use crate::model::{Cost, TaskInput, parse_due_date};
use crate::output::{self, Format};
use crate::store::repo;

/// Update the given fields, keeping the current value of any left out.
pub fn run(
    config: &Config,
    id: i64,
    name: Option<String>,
    cost: Option<String>,
    due: Option<String>,
    format: Format,
) -> Result<()> {
    let store = repo::open_store(config)?;
    let current = store.get(id)?;

    let cost: Cost = match cost {
        Some(raw) => raw.parse()?,
        None => current.cost,
    };
    let due_date = match due {
        Some(raw) => parse_due_date(&raw)?,
        None => current.due_date,
    };
    let input = TaskInput::new(name.unwrap_or(current.name), cost, due_date)?;

    let task = store.update(id, &input)?;
    output::print_task(&task, format)?;
    Ok(())
}
