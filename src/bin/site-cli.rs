use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::Value;

use content_server::routing::Request;
use content_server::site;

#[derive(Parser)]
#[command(name = "site-cli")]
#[command(about = "Management CLI for the content server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every route the site grammar accepts
    Sitemap,
    /// Resolve a link to its route and canonical form
    Resolve {
        /// Path with optional query, e.g. "/episodes/42?t=90"
        link: String,

        #[arg(short, long, default_value = "GET")]
        method: Method,
    },
    /// Fetch the site map from a running server
    Status {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sitemap => {
            for route in site::router().description().routes() {
                println!("{route}");
            }
        }
        Commands::Resolve { link, method } => {
            let router = site::router();
            match router.match_request(&Request::with_method(method, &link)) {
                Some(route) => {
                    println!("route:     {route:?}");
                    if let Some(canonical) = router.path_for(&route) {
                        println!("canonical: {canonical}");
                    }
                }
                None => {
                    eprintln!("No route matches {link}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Status { url } => {
            let res = reqwest::get(format!("{}/sitemap", url.trim_end_matches('/'))).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
