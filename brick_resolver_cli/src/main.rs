// CLI entry point for the build-plan resolver.
//
// Resolves one generated plan into a physically buildable one. The resolved
// plan (`{ steps, report }`) goes to `--output` or stdout; a one-line
// summary goes to stderr.
//
// Usage:
//   resolve-plan [OPTIONS]
//     --input, -i <PATH>    Plan JSON, or - for stdin (default: stdin)
//     --output, -o <PATH>   Resolved plan JSON (default: stdout)
//     --config, -c <PATH>   PlanConfig JSON (resolver, heights, retry)
//     --pretty              Pretty-print output
//     --verbose, -v         List every correction and warning
//     --check               Exit 2 if the plan should be regenerated
//
// Exit codes: 0 success, 1 usage / I/O / JSON / config error, 2 `--check`
// failed.

use std::process::ExitCode;

use brick_resolver_cli::options::{Command, parse_args, usage};
use brick_resolver_cli::{describe_report, run};

fn main() -> ExitCode {
    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            println!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            eprintln!("{}", usage());
            return ExitCode::from(1);
        }
    };

    let outcome = match run(&options) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("resolve-plan: {e}");
            return ExitCode::from(1);
        }
    };

    let report = &outcome.resolution.report;
    eprintln!("{report}");
    if options.verbose {
        for line in describe_report(report) {
            eprintln!("  {line}");
        }
    }

    if options.check && outcome.needs_retry {
        eprintln!("retry policy exceeded: plan should be regenerated");
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
