use std::io;

use clap::Parser;
use log::info;

use flan_assist::cli::CliArgs;
use flan_assist::flan_t5::FlanT5Generator;
use flan_assist::session::Session;
use flan_assist::system_resources::SystemResources;

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliArgs::parse().into_config()?;

    SystemResources::snapshot().log_summary();
    println!("Loading {} model...", config.model_id);
    let generator = FlanT5Generator::load(&config)?;
    info!("Context file: {:?}", config.context_path);

    let stdin = io::stdin();
    let mut session = Session::new(&generator, config.context_path.clone(), stdin.lock(), io::stdout());
    session.run()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    std::env::set_var("TOKENIZERS_PARALLELISM", "false");

    if let Err(e) = run() {
        eprintln!("Application error: {}", e);
        let mut current_err: Option<&(dyn std::error::Error + 'static)> = e.source();
        while let Some(source) = current_err {
            eprintln!("Caused by: {}", source);
            current_err = source.source();
        }
        std::process::exit(1);
    }
}
