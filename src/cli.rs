use clap::{Parser, Subcommand};

/// CLI entry point so operators can inspect and reset a crawl store.
/// Exit codes: 0=success, 1=queue empty, 2=invalid arguments, 3=storage or config error
#[derive(Parser, Debug)]
#[command(name = "crawl-store")]
#[command(about = "Inspect and manage a crawler's visited set, request queue and cookies")]
#[command(version)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        default_value = "./crawl_store.redb",
        help = "Path to the store file"
    )]
    pub path: String,

    #[arg(long, global = true, default_value = "crawl", help = "Key prefix of the crawler")]
    pub prefix: String,

    #[arg(long, global = true, help = "Root namespace name (defaults to the prefix)")]
    pub bucket: Option<String>,

    #[arg(
        short,
        long,
        global = true,
        help = "JSON config file; overrides --path, --prefix and --bucket"
    )]
    pub config: Option<String>,

    #[arg(long, global = true, help = "Write rotated text and JSON logs to this directory")]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store file and namespaces if they do not exist yet.
    Init,

    /// Wipe every visited record, queued request and cookie under the root namespace.
    Clear,

    /// Print the number of queued requests.
    Size,

    /// Append a payload to the request queue.
    Enqueue {
        #[arg(help = "Payload, stored as raw bytes")]
        payload: String,
    },

    /// Remove and print the oldest queued payload.
    Dequeue,

    /// Print the oldest queued payload without removing it.
    Peek,

    /// Mark a request fingerprint as visited.
    Visit {
        #[arg(help = "Request fingerprint")]
        fingerprint: u64,
    },

    /// Print whether a request fingerprint was visited.
    IsVisited {
        #[arg(help = "Request fingerprint")]
        fingerprint: u64,
    },

    /// Store the cookie header for a host.
    SetCookies {
        #[arg(help = "Host, with port if non-default (e.g. example.com:8080)")]
        host: String,

        #[arg(help = "Cookie header value")]
        cookies: String,
    },

    /// Print the cookie header stored for a host.
    Cookies {
        #[arg(help = "Host, with port if non-default")]
        host: String,
    },
}
