use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "podcast-forge", version, about = "Assemble two-host podcast episodes from dialogue scripts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Assemble(AssembleArgs),
    Parse(ParseArgs),
    Cues(CuesArgs),
    Voices(VoicesArgs),
    Effect(EffectArgs),
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct AssembleArgs {
    #[arg(long, value_name = "FILE", help = "Script file, or - for stdin")]
    pub script: PathBuf,

    #[arg(long, help = "Speaker label of the first host")]
    pub host1: String,

    #[arg(long, help = "Speaker label of the second host")]
    pub host2: String,

    #[arg(long, help = "Voice id for the first host")]
    pub voice1: Option<String>,

    #[arg(long, help = "Voice id for the second host")]
    pub voice2: Option<String>,

    #[arg(long, value_name = "PATH", help = "Output audio file (.mp3 or .wav)")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Skip sound effect cues")]
    pub no_effects: bool,

    #[arg(long, help = "Parallel synthesis requests")]
    pub concurrency: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    #[arg(long, value_name = "FILE", help = "Script file, or - for stdin")]
    pub script: PathBuf,

    #[arg(long, help = "Speaker label of the first host")]
    pub host1: String,

    #[arg(long, help = "Speaker label of the second host")]
    pub host2: String,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CuesArgs {
    #[arg(long, value_name = "FILE", help = "Script file, or - for stdin")]
    pub script: PathBuf,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VoicesArgs {
    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EffectArgs {
    #[arg(value_name = "DESCRIPTION", help = "Effect description, e.g. \"drum roll\"")]
    pub description: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[arg(long, help = "Show current config as JSON")]
    pub show: bool,

    #[arg(long, help = "Create default config file")]
    pub init: bool,

    #[arg(long, help = "Validate configuration")]
    pub validate: bool,
}
