//! Standard GVD modes and command registration.

use std::sync::Arc;

use gvd_platform::{ConsoleLog, ShellService, SystemService, TimeService};
use gvd_types::config::CliConfig;
use gvd_types::error::Result;

use crate::cli::{Cli, CliBuilder};
use crate::mode::{ModeDef, ModeId, ModeTable};

pub const EXEC: ModeId = ModeId::new("exec");
pub const SHELL: ModeId = ModeId::new("shell");
pub const CONFIG: ModeId = ModeId::new("config");
pub const CONFIG_GVD: ModeId = ModeId::new("config-gvd");

/// The four standard modes: Exec at the top, Shell and Configure below it,
/// and Configure GVD below Configure.
pub fn standard_modes() -> Result<ModeTable> {
    ModeTable::new(vec![
        ModeDef::apex(EXEC, "Exec"),
        ModeDef::child(SHELL, EXEC, "shell", "Shell"),
        ModeDef::child(CONFIG, EXEC, "config", "Configure").configurable(),
        ModeDef::child(CONFIG_GVD, CONFIG, "gvd", "Configure GVD").configurable(),
    ])
}

/// Host services the standard commands call into.
#[derive(Clone)]
pub struct Services {
    pub system: Arc<dyn SystemService>,
    pub time: Arc<dyn TimeService>,
    pub shell: Arc<dyn ShellService>,
    pub console: Arc<dyn ConsoleLog>,
}

/// Register every standard command fragment into `builder`.
pub fn register_builtins(builder: &mut CliBuilder, services: &Services) -> Result<()> {
    crate::system_commands::register(builder, services)?;
    crate::logfile_commands::register(builder, services)?;
    crate::gvd_commands::register(builder)?;
    Ok(())
}

/// Build the standard CLI: modes, commands, and the platform host name.
pub fn standard_cli(config: CliConfig, services: &Services) -> Result<Cli> {
    let mut builder = CliBuilder::new(standard_modes()?, config);
    match services.system.hostname() {
        Ok(name) => builder = builder.hostname(name),
        Err(e) => log::warn!("host name unavailable: {e}"),
    }
    register_builtins(&mut builder, services)?;
    Ok(builder.build())
}
