use std::net::SocketAddr;
use tokio::net::TcpListener;

use noteful::{build_app, cli, db};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/noteful.db".to_string());

    let pool = db::init_pool(&database_url).await;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("seed") {
        let path = args.get(2).map(String::as_str).unwrap_or("db/data.json");
        if let Err(err) = cli::seed_database(&pool, path).await {
            eprintln!("Seed failed: {err}");
            std::process::exit(1);
        }
        return;
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let app = build_app(pool);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.unwrap();

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await.unwrap();
}
