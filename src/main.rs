use std::process;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use hub::api::HostingApi;
use hub::prelude::*;

fn main() {
    // HUB_LOG takes EnvFilter directives, e.g. HUB_LOG=hub=debug
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("HUB_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_env();
    let repo = GitContext::new(&config);
    let mut console = Console::stdout(&config, &repo);

    let code = match run(&config, &repo, &mut console) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };
    if let Err(e) = console.finish() {
        debug!(error = %e, "pager shutdown");
    }
    process::exit(code);
}

fn run(config: &Config, repo: &GitContext, console: &mut Console<'_>) -> Result<i32, HubError> {
    #[cfg(feature = "api")]
    let api = hub::api::GitHubApi::new(&config.host, repo);
    #[cfg(not(feature = "api"))]
    let api = hub::api::OfflineApi;
    let api: &dyn HostingApi = &api;

    let mut args = Args::from_argv(std::env::args().skip(1));
    let scope = Scope::new(repo, api, config);
    Resolver::new(RuleSet::builtin(), repo).dispatch(&mut args, &scope)?;

    if args.is_noop() {
        let renderer = PosixRenderer::loose();
        for line in (Planner { renderer: &renderer }).plan(&args)? {
            console.puts(line)?;
        }
        return Ok(0);
    }
    Orchestrator::new(&ProcessExecutor).run(args, console)
}
