use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gravcal::cli::{Cli, Commands, GlobalOpts};

/// Environment variable holding an `EnvFilter` directive
const LOG_ENV: &str = "GRAVCAL_LOG";

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Calc(args) => gravcal::cli::commands::calc::run(args, &global),
        Commands::Limits(args) => gravcal::cli::commands::limits::run(args, &global),
        Commands::Density(args) => gravcal::cli::commands::density::run(args, &global),
        Commands::Classes(args) => gravcal::cli::commands::classes::run(args, &global),
        Commands::New(args) => gravcal::cli::commands::new::run(args, &global),
        Commands::Completions(args) => gravcal::cli::commands::completions::run(args),
    }
}

/// Log records go to stderr so stdout stays clean for reports
fn init_logging(global: &GlobalOpts) {
    let default = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();
}
