//! Command implementations.

pub mod check;
pub mod profiles;
pub mod run;
pub mod show;

pub use self::check::execute_check;
pub use self::profiles::execute_profiles;
pub use self::run::execute_run;
pub use self::show::execute_show;

use crate::error::{CliError, Result};
use parsewright_domain::ProfileId;

/// Parse a `--target` value.
fn parse_target(target: &str) -> Result<ProfileId> {
    ProfileId::parse(target).map_err(CliError::InvalidInput)
}
