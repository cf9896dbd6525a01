//! vault_doctor - single-node diagnostics for a Vault-compatible cluster.
//!
//! Commands:
//! - `medic` - run the checks and print a report
//! - `completion <shell>` - print a shell completion script

use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tracing::debug;

use vault_doctor::cli::{self, Command, MedicArgs};
use vault_doctor::client::HttpClusterClient;
use vault_doctor::completion;
use vault_doctor::config::{load_dotenv, Config};
use vault_doctor::logging::init_logging;
use vault_doctor::medic::{self, RunSettings};
use vault_doctor::report::{banner, OutputMode, Palette, PrettyOptions};
use vault_doctor::terminal::{term_width, TerminalPrompt};
use vault_doctor::unseal::UnsealPrompt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    load_dotenv(".env");

    let version = cli::build_version();
    let code = match cli::parse(std::env::args()) {
        Ok(Command::Help) => {
            print!("{}", cli::help_text(version));
            0
        }
        Ok(Command::Version) => {
            println!("{}", cli::version_line(version));
            0
        }
        Ok(Command::Completion(shell)) => print_completion(shell.as_deref()),
        Ok(Command::Medic(args)) => run_medic(*args, version).await?,
        Err(e) => {
            let _ = e.print();
            if e.use_stderr() {
                1
            } else {
                0
            }
        }
    };

    io::stdout().flush()?;
    std::process::exit(code);
}

fn print_completion(shell: Option<&str>) -> i32 {
    let Some(shell) = shell else {
        eprintln!("{}", completion::USAGE);
        return 1;
    };
    match completion::script(shell) {
        Ok(script) => {
            print!("{}", script);
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

async fn run_medic(args: MedicArgs, version: &str) -> Result<i32> {
    init_logging(&args.log_format, args.log_level);

    let output = OutputMode::select(args.json, args.quiet);
    let palette = Palette::from_env(args.no_color);
    let config = Config::from(args.connection);
    debug!(addr = %config.addr, ?output, "starting medic");

    if output == OutputMode::Pretty {
        println!("{}", banner(version, &palette));
    }

    let client = HttpClusterClient::new(config.skip_verify)?;
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64)?;
    let settings = RunSettings::new(version, timestamp).with_output(output);

    let mut prompt = TerminalPrompt::new(palette);
    let prompt: &mut dyn UnsealPrompt = &mut prompt;
    let report = medic::run(&client, &config, &settings, Some(prompt)).await;

    let options = PrettyOptions::new(palette, term_width());
    let mut stdout = io::stdout().lock();
    report.render(output, &options, &mut stdout)?;
    Ok(report.exit_code())
}
