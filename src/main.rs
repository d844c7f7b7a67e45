use anyhow::format_err;
use clap::Parser;

use aonorm::interfaces::cli::{init_logging, log_heading, Cli};
use aonorm::interfaces::input::InputSystem;
use aonorm::interfaces::NaoSystem;
use aonorm::io::{read_aonorm_yaml, write_aonorm_yaml};

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging(cli.output.as_deref(), cli.level_filter())?;
    log_heading();

    if let Some(template) = cli.write_template.as_ref() {
        write_aonorm_yaml(template, &InputSystem::default())?;
        log::info!("Template input written to {}.", template.display());
        return Ok(());
    }

    let config = cli
        .config
        .as_ref()
        .ok_or_else(|| format_err!("No input file given. Use `--config` or `--write-template`."))?;
    let inp: InputSystem = read_aonorm_yaml(config)?;
    let nao = NaoSystem::from_adapter(&inp)?;
    let nfailed = nao.log_symmetry_report(inp.symmetry_threshold);
    if nfailed > 0 {
        log::warn!("{nfailed} matrices failed their symmetry check.");
    }
    Ok(())
}
