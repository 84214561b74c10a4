//  MAIN.rs
//    by Lut99
//
//  Created:
//    13 Jan 2025, 14:26:40
//  Last edited:
//    03 Feb 2025, 10:29:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Shows an example host authenticating a request with the cookie
//!   strategy.
//

use std::collections::HashMap;
use std::convert::Infallible;

use auth_strategies::auth::cookie::CookieStrategy;
use auth_strategies::spec::metadata::User;
use auth_strategies::spec::request::{Cookies, Request};
use auth_strategies::spec::strategy::HttpError as _;
use auth_strategies::spec::Strategy as _;
use clap::Parser;
use error_trace::trace;
use tracing::{error, info, Level};


/***** ARGUMENTS *****/
/// Defines the arguments for this binary.
#[derive(Debug, Parser)]
struct Arguments {
    /// Whether to enable INFO- and DEBUG-level logging.
    #[clap(long)]
    debug: bool,
    /// Whether to enable TRACE-level logging. Implies '--debug'.
    #[clap(long)]
    trace: bool,

    /// The name of the cookie carrying the token.
    #[clap(short, long, default_value = "token")]
    cookie_name: String,
    /// The token presented in the request's cookie.
    #[clap(short, long, default_value = "letmein")]
    token: String,
}





/***** ENTRYPOINT *****/
#[tokio::main]
async fn main() {
    // Parse the arguments
    let args = Arguments::parse();

    // Setup the logger
    tracing_subscriber::fmt()
        .with_max_level(if args.trace {
            Level::TRACE
        } else if args.debug {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .init();
    info!("{} - v{}", env!("CARGO_BIN_NAME"), env!("CARGO_PKG_VERSION"));

    // The "user database" that the verify callback consults
    let mut users: HashMap<String, User> = HashMap::new();
    users.insert("letmein".into(), User { id: "amy".into(), name: "Amy Hacker".into() });

    // Setup the strategy around it
    let strategy = match CookieStrategy::builder()
        .cookie_name(args.cookie_name.clone())
        .verify(move |token| {
            let user: Option<User> = users.get(&token).cloned();
            async move { Ok::<_, Infallible>(user) }
        })
        .build()
    {
        Ok(strategy) => strategy,
        Err(err) => {
            error!("{}", trace!(("Failed to build the cookie strategy"), err));
            std::process::exit(1);
        },
    };

    // Mimic the cookie-parsing middleware that would normally run before any strategy
    let mut cookies = Cookies::new();
    cookies.insert(args.cookie_name.clone(), args.token.clone());
    let mut request = Request::new();
    request.cookies = Some(cookies);

    // Authenticate the request, reporting like a host framework would
    match strategy.authenticate(&request).await {
        Ok(Ok(user)) => info!("Authenticated request as {} ({})", user.name, user.id),
        Ok(Err(err)) => {
            info!("{}", trace!(("Request was not authenticated (status {})", err.status_code()), err));
            std::process::exit(1);
        },
        Err(err) => {
            error!("{}", trace!(("Failed to authenticate the request"), err));
            std::process::exit(1);
        },
    }
}
