use dotenvy::dotenv;
use log::{error, info};
use loyalty_server::{cli::handle_command_line_args, config::ServerConfig, server::run_server};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let Some(cli) = handle_command_line_args() else {
        return;
    };
    let mut config = ServerConfig::from_env_or_default();
    if let Err(e) = cli.apply(&mut config) {
        error!("🪛️ {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }

    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
