//! Fires the same vote many times at once and reports how many the server
//! accepted. Anything other than one acceptance means the uniqueness guarantee
//! is broken.
use clap::Parser;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    dish_id: String,

    voter: String,

    #[arg(long, default_value = "http://localhost:1111")]
    url: String,

    #[arg(long, default_value_t = 20)]
    attempts: usize,

    #[arg(long, default_value_t = 5)]
    score: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = Client::new();
    let endpoint = format!(
        "{}/dishes/{}/votes",
        args.url.trim_end_matches('/'),
        args.dish_id
    );

    let requests = (0..args.attempts).map(|_| {
        client
            .post(&endpoint)
            .json(&json!({ "voter": args.voter, "score": args.score }))
            .send()
    });

    let mut accepted = 0;
    let mut duplicates = 0;
    let mut other = Vec::new();

    for response in join_all(requests).await {
        match response?.status() {
            StatusCode::CREATED => accepted += 1,
            StatusCode::CONFLICT => duplicates += 1,
            status => other.push(status),
        }
    }

    println!("Accepted: {accepted}");
    println!("Duplicates: {duplicates}");
    if !other.is_empty() {
        println!("Other: {other:?}");
    }

    if accepted > 1 {
        anyhow::bail!("{accepted} votes accepted for the same participant");
    }

    Ok(())
}
