use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = podcast_forge::cli::Cli::parse();
    podcast_forge::run(cli)
}
