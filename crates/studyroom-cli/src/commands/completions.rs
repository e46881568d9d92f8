use clap_complete::Shell;

use super::CliResult;

pub fn run(shell: Shell, cmd: &mut clap::Command) -> CliResult {
    clap_complete::generate(shell, cmd, "studyroom", &mut std::io::stdout());
    Ok(())
}
