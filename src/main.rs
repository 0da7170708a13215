//! Binary entry point: read configuration, start file logging, open the
//! store, load the directory and hand control to the Ratatui event loop.
use employee_directory::{init_logging, open_database, run_app, App, Config};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;
    info!(db = %config.db_path.display(), role = %config.role, "starting employee directory");

    let conn = open_database(&config.db_path)?;
    let mut app = App::open(conn, config.role).with_role_file(config.role_path);
    run_app(&mut app)
}
