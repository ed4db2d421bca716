use filepick_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;
    filepick_api::telemetry::init_telemetry(config.json_logs());

    let (_state, router) = filepick_api::setup::initialize_app(config.clone()).await?;
    filepick_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
