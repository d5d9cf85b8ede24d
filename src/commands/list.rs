use crate::config::Config;
use crate::error::Result;
use crate::output::{self, Format};
use crate::store::repo;

pub fn run(config: &Config, format: Format) -> Result<()> {
    let store = repo::open_store(config)?;
    let listing = store.list()?;
    output::print_listing(&listing, format)?;
    Ok(())
}
