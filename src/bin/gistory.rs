use gistory::{
    config::Config,
    env::{EnvVar, GISTORY_CONFIG},
    GistClient, Gists,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    simple_env_load::load_env_from([".dev.env", ".secrets.env"]);
    alto_logger::init_term_logger()?;

    log::info!(
        "{} ({} @ {}, built {})",
        gistory::USER_AGENT,
        gistory::GIT_BRANCH,
        gistory::GIT_REVISION,
        gistory::BUILD_TIME
    );

    let config = match GISTORY_CONFIG::get() {
        Ok(path) => {
            log::info!("loading config from {path}");
            Config::load(&path).await?
        }
        Err(_) => Config::from_env()?,
    };

    log::debug!("using {} for the github token", config.github.token.key());
    let client = GistClient::new_with_ep(&config.github.api_url, &config.github.token)?;

    gistory::http::serve(config.server.address, Gists::new(client)).await
}
