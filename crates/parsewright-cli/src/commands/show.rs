//! Show command implementation.

use super::parse_target;
use crate::cli::TargetArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use parsewright_store::ArtifactStore;

/// Execute the show command.
pub fn execute_show(args: TargetArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let id = parse_target(&args.target)?;
    let artifact = ArtifactStore::new(&config.paths.artifacts_dir).load(&id)?;

    println!("{}", formatter.artifact(&artifact)?);
    Ok(())
}
