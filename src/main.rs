use anyhow::Result;
use deriv_tokgen::args;
use deriv_tokgen::config::Config;
use deriv_tokgen::logging::{self, LogConfig};
use deriv_tokgen::report;
use deriv_tokgen::session::BrowserSession;
use deriv_tokgen::theme;
use deriv_tokgen::workflow;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = args::parse();
    theme::init_color(invocation.cli.no_color);
    logging::init(if invocation.cli.verbose {
        LogConfig::debug()
    } else {
        LogConfig::from_env()
    });

    let config = {
        let mut config = Config::load(invocation.cli.config.clone())?;
        invocation.apply_overrides(&mut config);
        config
    };
    let credentials = invocation.credentials()?;
    let headless = invocation.headless();
    info!(headless, app_id = %config.app_id, "starting");

    // Launch failures are fatal; anything after this point must still reach
    // the teardown below.
    let spinner = theme::spinner("launching Chromium");
    let session = match BrowserSession::launch(&config, headless).await {
        Ok(session) => {
            theme::spinner_ok(&spinner, "browser ready");
            session
        }
        Err(e) => {
            theme::spinner_fail(&spinner, "browser launch failed");
            return Err(e);
        }
    };

    let driver = session.driver();
    let outcome = workflow::run(&driver, &config, &credentials).await;
    session.close().await;

    // The run's own failures are reported, not propagated: callers judge
    // success from the output and the result file, not the exit status.
    match outcome {
        Ok(outcome) => {
            if let Err(e) = report::report(&config, &outcome) {
                error!("reporting failed: {e:#}");
            }
        }
        Err(e) => error!("run failed: {e:#}"),
    }
    Ok(())
}
