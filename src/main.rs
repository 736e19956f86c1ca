use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Render one slide deck thumbnail through the cache pipeline.
#[derive(Parser, Debug)]
#[command(name = "slidethumb", version, about)]
struct Args {
    /// Deck label to thumbnail
    #[arg(long)]
    label: String,

    /// Slide server address (defaults to http://localhost:<port>)
    #[arg(long)]
    server: Option<String>,

    /// Sub directory the server is mounted under
    #[arg(short = 's', long, default_value = "/")]
    sub_directory: String,

    /// Resource directory (holds md/ and thumbnail/)
    #[arg(short = 'd', long, default_value = "resource")]
    resource: PathBuf,

    /// Slide server port (used when --server is not given)
    #[arg(short = 'p', long, default_value_t = 3000)]
    port: u16,

    /// Global config file
    #[arg(short = 'f', long, default_value = "config.yaml")]
    config: PathBuf,

    /// Cache limit, e.g. 512KB, 100MB, 1GB
    #[arg(short = 'b', long, default_value = "100MB")]
    cache_bytes: String,

    /// Renderer navigation timeout [msec]
    #[arg(long, default_value_t = 15000)]
    timeout: u64,

    /// Screenshot settle-poll interval [msec]
    #[arg(long, default_value_t = 100)]
    wait_interval: u64,

    /// Screenshot settle-poll limit
    #[arg(long, default_value_t = 10)]
    wait_limit: u32,

    /// Output file for the thumbnail bytes
    #[arg(short = 'o', long, default_value = "thumbnail.png")]
    out: PathBuf,
}

/// Parse a human-readable byte size ("100MB"). Unit-less input is taken as
/// bytes; unparseable input falls back to 1 GiB.
fn parse_cache_bytes(raw: &str) -> u64 {
    const FALLBACK: u64 = 1024 * 1024 * 1024;

    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let Ok(value) = digits.parse::<u64>() else {
        return FALLBACK;
    };

    match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => value,
        "KB" => value * 1024,
        "MB" => value * 1024 * 1024,
        "GB" => value * 1024 * 1024 * 1024,
        _ => FALLBACK,
    }
}

#[cfg(feature = "cdp")]
fn run(args: Args) -> slidethumb::Result<()> {
    use slidethumb::cdp::CdpRenderer;
    use slidethumb::service::{ServiceConfig, ThumbnailService};
    use slidethumb::stabilize::StabilizePolicy;
    use slidethumb::Viewport;

    let resource_dir = if args.resource.is_absolute() {
        args.resource.clone()
    } else {
        std::env::current_dir()
            .map_err(|e| slidethumb::Error::ConfigError(format!("cwd: {}", e)))?
            .join(&args.resource)
    };

    let config = ServiceConfig {
        server_address: args
            .server
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", args.port)),
        sub_directory: args.sub_directory.clone(),
        resource_dir,
        config_path: args.config.clone(),
        cache_bytes: parse_cache_bytes(&args.cache_bytes),
        policy: StabilizePolicy {
            timeout: Duration::from_millis(args.timeout),
            wait_interval: Duration::from_millis(args.wait_interval),
            wait_limit: args.wait_limit,
        },
        viewport: Viewport::default(),
    };

    let renderer = CdpRenderer::new(Viewport::default())?;
    let service = ThumbnailService::new(renderer, config)?;

    let thumbnail = service.generate(&args.label)?;
    std::fs::write(&args.out, &thumbnail.data)
        .map_err(|e| slidethumb::Error::ArtifactIo(format!("write {}: {}", args.out.display(), e)))?;

    println!(
        "{}: {} bytes ({:?}) -> {}",
        args.label,
        thumbnail.data.len(),
        thumbnail.served_from,
        args.out.display()
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    #[cfg(feature = "cdp")]
    {
        if let Err(e) = run(args) {
            eprintln!("slidethumb: {} (http {})", e, e.http_status());
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "cdp"))]
    {
        let _ = args;
        println!("slidethumb: built without the `cdp` feature; no renderer backend available");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cache_bytes() {
        assert_eq!(parse_cache_bytes("100MB"), 100 * 1024 * 1024);
        assert_eq!(parse_cache_bytes("512kb"), 512 * 1024);
        assert_eq!(parse_cache_bytes("1GB"), 1024 * 1024 * 1024);
        assert_eq!(parse_cache_bytes("4096"), 4096);
        assert_eq!(parse_cache_bytes("12 MB"), 12 * 1024 * 1024);
    }

    #[test]
    fn test_parse_cache_bytes_fallback() {
        assert_eq!(parse_cache_bytes("lots"), 1024 * 1024 * 1024);
        assert_eq!(parse_cache_bytes("10TB"), 1024 * 1024 * 1024);
    }
}
