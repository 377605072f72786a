// Command-line option parsing. Plain argument matching, no clap.

use std::path::PathBuf;

use crate::CliError;

/// Where the plan is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub input: Input,
    /// `None` writes to stdout.
    pub output: Option<PathBuf>,
    /// `None` uses `PlanConfig::default()`.
    pub config: Option<PathBuf>,
    pub pretty: bool,
    pub verbose: bool,
    /// Exit 2 when the retry policy would ask for a new plan.
    pub check: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            input: Input::Stdin,
            output: None,
            config: None,
            pretty: false,
            verbose: false,
            check: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Options),
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input" | "-i" => {
                let value = value_for(&arg, args.next())?;
                options.input = if value == "-" {
                    Input::Stdin
                } else {
                    Input::File(PathBuf::from(value))
                };
            }
            "--output" | "-o" => {
                options.output = Some(PathBuf::from(value_for(&arg, args.next())?));
            }
            "--config" | "-c" => {
                options.config = Some(PathBuf::from(value_for(&arg, args.next())?));
            }
            "--pretty" => options.pretty = true,
            "--verbose" | "-v" => options.verbose = true,
            "--check" => options.check = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(CliError::Usage(format!("unknown argument: {other}"))),
        }
    }

    Ok(Command::Run(options))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::Usage(format!("{flag} requires a value")))
}

pub fn usage() -> &'static str {
    "\
Usage: resolve-plan [OPTIONS]

Options:
  --input, -i <PATH>      Plan to resolve, or - for stdin (default: stdin)
  --output, -o <PATH>     Write the resolved plan here (default: stdout)
  --config, -c <PATH>     Resolver / height / retry config JSON
  --pretty                Pretty-print the output JSON
  --verbose, -v           List every correction and warning on stderr
  --check                 Exit 2 if the retry policy would request a new plan
  --help, -h              Show this help"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, CliError> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_read_stdin_and_write_stdout() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(Options::default()));
    }

    #[test]
    fn all_flags() {
        let cmd = parse(&[
            "--input", "plan.json", "-o", "out.json", "--config", "cfg.json", "--pretty", "-v",
            "--check",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Run(Options {
                input: Input::File("plan.json".into()),
                output: Some("out.json".into()),
                config: Some("cfg.json".into()),
                pretty: true,
                verbose: true,
                check: true,
            })
        );
    }

    #[test]
    fn dash_means_stdin() {
        let Command::Run(options) = parse(&["-i", "-"]).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(options.input, Input::Stdin);
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse(&["--pretty", "-h"]).unwrap(), Command::Help);
    }

    #[test]
    fn missing_value_and_unknown_flag_are_usage_errors() {
        assert!(matches!(parse(&["--output"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["--fast"]), Err(CliError::Usage(_))));
    }
}
