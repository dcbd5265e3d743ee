use anyhow::Result;

fn main() -> Result<()> {
    let matches = hexterm::cli::parse_args();
    hexterm::boot::init_common(matches.get_one::<String>("log-file").map(String::as_str));

    if hexterm::cli::actions::run_one_shot_actions(&matches)? {
        return Ok(());
    }

    let config = hexterm::cli::resolve_config(&matches)?;
    log::info!(
        "Starting with port '{}' at {} baud",
        config.serial.port,
        config.serial.baud
    );
    hexterm::tui::start(config)
}
