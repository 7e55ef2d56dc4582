use clap::Parser;
use eyre::Result;
use starknet_scripts::{
    cli::{CliArgs, Commands},
    commands::{
        create_accounts::create_accounts, demo::demo, deploy::deploy_and_initialize,
        upgrade::upgrade,
    },
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let CliArgs { network, command } = CliArgs::parse();
    match command {
        Commands::Demo(args) => demo(args, &network).await?,
        Commands::Deploy(args) => deploy_and_initialize(args, &network).await?,
        Commands::Upgrade(args) => upgrade(args, &network).await?,
        Commands::CreateAccounts(args) => create_accounts(args, &network).await?,
    };

    Ok(())
}
