use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let mut command = Cli::command();
    let mut buffer = Vec::new();
    match shell {
        CompletionShell::Bash => render(shells::Bash, &mut command, &mut buffer),
        CompletionShell::Zsh => render(shells::Zsh, &mut command, &mut buffer),
        CompletionShell::Fish => render(shells::Fish, &mut command, &mut buffer),
    }

    match output_path {
        Some(path) => {
            std::fs::write(path, &buffer)?;
            println!("{}", path.display());
        }
        None => io::stdout().write_all(&buffer)?,
    }
    Ok(())
}

fn render<G: Generator>(generator: G, command: &mut clap::Command, buffer: &mut Vec<u8>) {
    generate(generator, command, "heartsync", buffer);
}
