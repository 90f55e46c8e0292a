use royal_quads_lib::config::Config;

#[tokio::main]
async fn main() {
    if let Err(e) = royal_quads_lib::run(Config::from_env()).await {
        eprintln!("royal-quads: {e}");
        std::process::exit(1);
    }
}
