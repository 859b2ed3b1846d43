use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::app::App;

/// What a line typed at the prompt asks for
#[derive(Debug, PartialEq, Eq)]
pub enum ReplInput<'a> {
    Empty,
    Quit,
    Reset,
    Cwd,
    Help,
    Unknown(&'a str),
    Command(&'a str),
}

pub fn parse_line(line: &str) -> ReplInput<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ReplInput::Empty,
        ":quit" | ":q" | ":exit" => ReplInput::Quit,
        ":reset" => ReplInput::Reset,
        ":cwd" => ReplInput::Cwd,
        ":help" => ReplInput::Help,
        _ if trimmed.starts_with(':') => ReplInput::Unknown(trimmed),
        _ => ReplInput::Command(line.trim_end()),
    }
}

fn print_help() {
    println!("{}", "Commands are sent to a persistent bash shell.".bright_black());
    println!("  {}  restart the shell in the project root", ":reset".bright_cyan());
    println!("  {}    show the shell's working directory", ":cwd".bright_cyan());
    println!("  {}   leave (Ctrl-D works too)", ":quit".bright_cyan());
}

/// Read commands until `:quit` or end of input
pub async fn run_repl(app: &App) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let bash = app.bash_tool();

    println!(
        "{} {}",
        "shellkeep".bright_green().bold(),
        format!("(root: {}) type :help for commands", app.project().root_dir().display())
            .bright_black()
    );

    loop {
        let readline = rl.readline(&format!("{} ", "$".bright_green().bold()));

        match readline {
            Ok(line) => {
                match parse_line(&line) {
                    ReplInput::Empty => continue,
                    ReplInput::Quit => break,
                    ReplInput::Help => print_help(),
                    ReplInput::Reset => match bash.reset().await {
                        Ok(()) => println!(
                            "{} {}",
                            "Shell reset to".bright_black(),
                            app.project().root_dir().display()
                        ),
                        Err(e) => eprintln!("{} {}", "Error:".bright_red().bold(), e),
                    },
                    ReplInput::Cwd => match bash.working_directory().await {
                        Ok(dir) => println!("{}", dir.display()),
                        Err(e) => eprintln!("{} {}", "Error:".bright_red().bold(), e),
                    },
                    ReplInput::Unknown(cmd) => {
                        eprintln!("{} unknown command {}", "Error:".bright_red().bold(), cmd);
                    }
                    ReplInput::Command(command) => {
                        let _ = rl.add_history_entry(command);
                        let result = app.run_command(command, false).await;
                        if result.success {
                            println!("{}", result.content);
                        } else {
                            eprintln!("{}", result.text().bright_red());
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_cyan());
    Ok(())
}
