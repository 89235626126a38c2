use std::net::SocketAddr;

use dosebench_testserver::{TestServer, TestServerOptions};
use tokio::net::TcpListener;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut options = TestServerOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:3000")
                })?;
                bind_addr = addr.parse()?;
            }
            "--unhealthy" => options.healthy = false,
            "-h" | "--help" => {
                eprintln!(
                    "dosebench-testserver\n\nUSAGE:\n  dosebench-testserver [--bind 127.0.0.1:0] [--unhealthy]\n\nOUTPUT:\n  Prints BASE_URL=<url> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let server = TestServer::serve(listener, options);

    println!("BASE_URL={}", server.base_url());

    let _ = tokio::signal::ctrl_c().await;
    server.shutdown().await;
    Ok(())
}
