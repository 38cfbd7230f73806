use anyhow::Result;
use bias_lite::cli::{self, Cli};
use clap::Parser;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::run(&cli)
}
