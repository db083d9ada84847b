#![allow(
    clippy::print_stdout,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items
)]

//! Login Gate Server Example
//!
//! A small site behind the login gate. Anonymous visitors asking for an HTML
//! page are sent to `/login.html`; stylesheets and images always load.
//!
//! Run with: `cargo run --example login_server`
//!
//! Test endpoints:
//!   curl -i http://localhost:8080/report.html
//!
//!   curl -i -X POST http://localhost:8080/login \
//!     -d "username=admin&password=hunter2" \
//!     -c cookies.txt
//!
//!   curl http://localhost:8080/whoami -b cookies.txt
//!
//!   curl -i http://localhost:8080/logout -b cookies.txt

use std::time::Duration;

use axum::Router;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use gatehouse::api::axum::setup_login;
use gatehouse::session::InMemorySessionRepository;
use gatehouse::{FailurePolicy, GateConfig, RequestGate, SecretString, SessionRepository};

const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
  <head><link rel="stylesheet" href="/style.css"></head>
  <body>
    <form method="post" action="/login">
      <input name="username" placeholder="username">
      <input name="password" type="password" placeholder="password">
      <button type="submit">Log in</button>
    </form>
  </body>
</html>"#;

async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

async fn report() -> Html<&'static str> {
    Html("<h1>Quarterly report</h1><a href=\"/logout\">Log out</a>")
}

async fn index() -> Html<&'static str> {
    Html("<h1>Home</h1><a href=\"/report.html\">Report</a> <a href=\"/whoami\">Who am I?</a>")
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], "body { font-family: sans-serif; }")
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // In production, load secret from environment variable
    let mut config = GateConfig::new("/login.html")
        .with_home_path("/")
        .with_failure_policy(FailurePolicy::Delayed(Duration::from_secs(2)));
    if let Ok(secret) = std::env::var("SESSION_SECRET") {
        config.session.secret_key = SecretString::new(secret);
    }

    let sessions = InMemorySessionRepository::new();
    let gate = RequestGate::new(
        config,
        |username: &str, password: &str| username == "admin" && password == "hunter2",
        sessions.clone(),
    )
    .expect("valid gate configuration");

    // Clones share storage, so this task prunes the gate's sessions
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            if let Ok(pruned) = sessions.prune_expired().await {
                println!("Pruned {pruned} expired sessions");
            }
        }
    });

    let app = setup_login(
        Router::new()
            .route("/", get(index))
            .route("/login.html", get(login_page))
            .route("/report.html", get(report))
            .route("/style.css", get(stylesheet)),
        gate,
    );

    println!("Starting login gate server on http://localhost:8080");
    println!();
    println!("Endpoints:");
    println!("  POST /login       - Login (sets session cookie)");
    println!("  GET  /logout      - Logout (clears session)");
    println!("  GET  /whoami      - Show the logged in user");
    println!("  GET  /report.html - Protected page");
    println!();
    println!("Test user: admin / hunter2");
    println!();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    axum::serve(listener, app).await
}
