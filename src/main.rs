use mocha_mono::{
    cli::{self, Command},
    errors::MochaError,
    executor::{CommandRunner, Context, Profile, RunRequest},
    picker::toml::Config,
    printer,
    report::Report,
};

use cli::Opts;
use structopt::StructOpt;
use tokio::runtime;
use tokio_util::sync::CancellationToken;

/// Log to stderr when RUST_LOG is set, or at debug level with --verbose.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) if verbose => EnvFilter::new("mocha_mono=debug"),
        Err(_) => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

async fn execute(opts: Opts, mut ctx: Context) -> Result<i32, MochaError> {
    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    ctx.discover(&token).await?;

    let run = match opts.cmd {
        Command::List => {
            ctx.resolve_all().await?;
            print!("{}", printer::tree(&ctx.tree, None));
            return Ok(0);
        }
        Command::Run {
            target,
            case,
            debug,
        } => {
            let id = ctx.select_target(&target, case.as_deref()).await?;
            let profile = if debug { Profile::Debug } else { Profile::Run };
            let runner = CommandRunner::from_config(&ctx.config, profile);
            let request = RunRequest::single(id).with_profile(profile);
            match ctx.execute_test(&request, &token, &runner).await? {
                Some(run) => run,
                None => return Ok(0),
            }
        }
        Command::Reconcile {
            target,
            report,
            case,
        } => {
            let id = ctx.select_target(&target, case.as_deref()).await?;
            let json = tokio::fs::read_to_string(&report)
                .await
                .map_err(|err| MochaError::io(&report, err))?;
            ctx.reconcile(&id, &Report::from_json(&json)?)?
        }
    };

    print!(
        "{}",
        printer::summary(&ctx.tree, &run, opts.diff, opts.only.as_ref())
    );
    Ok(run.failed_ids().len() as i32)
}

fn run() -> Result<i32, MochaError> {
    let opts = Opts::from_args();
    init_tracing(opts.verbose);

    let config = Config::from_path(&opts.dir)?;
    let root = opts
        .dir
        .canonicalize()
        .map_err(|err| MochaError::io(&opts.dir, err))?;
    let ctx = Context::new(root, config);

    let runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(opts.jobs.unwrap_or_else(num_cpus::get))
        .build()
        .map_err(|err| MochaError::Runner(err.to_string()))?;

    runtime.block_on(execute(opts, ctx))
}

fn main() {
    std::process::exit(match run() {
        Err(err) => {
            println!("error: {}", err);
            1
        }
        Ok(failed_tests) => failed_tests,
    })
}
