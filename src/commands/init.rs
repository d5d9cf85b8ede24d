use std::path::Path;

use crate::error::Result;
use crate::store::repo;

pub fn run(root: &Path) -> Result<()> {
    let dir = repo::init(root)?;
    eprintln!("Initialized {} in {}", repo::DIR_NAME, dir.display());
    Ok(())
}
