pub mod assembler;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod script;
pub mod sfx;
pub mod tts;

use anyhow::Context;
use audio::cache::EffectCache;
use cli::{Cli, Commands};
use sfx::EffectLibrary;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tts::elevenlabs::validate_voice_id;
use tts::{ElevenLabsEffects, ElevenLabsVoice};

pub use assembler::{AssembledEpisode, AssemblySettings, AudioAssembler, Host};
pub use error::{AssemblyError, AudioError, FailureKind, SynthesisError};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Assemble(args) => assemble(args),
        Commands::Parse(args) => parse(args),
        Commands::Cues(args) => cues(args),
        Commands::Voices(args) => voices(args),
        Commands::Effect(args) => effect(args),
        Commands::Config(args) => config_cmd(args),
    }
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn assemble(args: cli::AssembleArgs) -> anyhow::Result<()> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(concurrency) = args.concurrency {
        config.assembly.concurrency = concurrency;
    }
    config.validate().context("invalid configuration")?;

    let raw = read_script(&args.script)?;
    let title = script::title::extract_title(&raw)
        .unwrap_or_else(|| script::title::default_title(chrono::Local::now().date_naive()));
    let transcript = script::title::strip_title_line(&raw);

    let output = args.output.unwrap_or_else(|| {
        PathBuf::from("output").join(format!("{}_podcast.mp3", script::title::safe_filename(&title)))
    });

    let voice1 = args
        .voice1
        .unwrap_or_else(|| config.voice_for_label(&args.host1, &config.voice.host1_voice));
    let voice2 = args
        .voice2
        .unwrap_or_else(|| config.voice_for_label(&args.host2, &config.voice.host2_voice));
    let first = Host::new(args.host1, validate_voice_id(&voice1).context("voice for host1")?);
    let second = Host::new(args.host2, validate_voice_id(&voice2).context("voice for host2")?);

    let api_key = config.api_key()?;
    let voice = ElevenLabsVoice::new(&config.voice, api_key).context("build voice client")?;
    let mut assembler = AudioAssembler::new(Box::new(voice), config.assembly_settings());

    if config.effects.enabled && !args.no_effects {
        assembler = assembler.with_effects(effect_library(&config)?);
    }

    tracing::info!(title = %title, output = %output.display(), "generating episode");
    let episode = assembler
        .assemble(transcript, &first, &second, &output)
        .context("audio generation failed")?;

    println!("Title: {title}");
    println!("Output: {}", episode.path.display());
    println!(
        "Turns: {} ({} segments), effects applied: {}, duration: {:.1}s",
        episode.turns,
        episode.segments,
        episode.cues_applied,
        episode.duration.as_secs_f64()
    );
    Ok(())
}

fn parse(args: cli::ParseArgs) -> anyhow::Result<()> {
    let raw = read_script(&args.script)?;
    let turns = script::parse_dialogue(&raw, &args.host1, &args.host2)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    for turn in &turns {
        let label = match turn.speaker {
            script::Speaker::First => &args.host1,
            script::Speaker::Second => &args.host2,
        };
        println!("{label}: {}", turn.text);
    }
    Ok(())
}

fn cues(args: cli::CuesArgs) -> anyhow::Result<()> {
    let raw = read_script(&args.script)?;
    let found = script::scan(&raw, &script::CueVocabulary::standard());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    for cue in &found {
        println!("line {}: [{}] -> {}", cue.line_index, cue.cue_token, cue.effect_description);
    }
    Ok(())
}

fn voices(args: cli::VoicesArgs) -> anyhow::Result<()> {
    let config = config::Config::load().context("load config")?;
    let client =
        ElevenLabsVoice::new(&config.voice, config.api_key()?).context("build voice client")?;
    let voices = client.list_voices().context("list voices")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
        return Ok(());
    }

    for voice in voices {
        println!("{}\t{}", voice.voice_id, voice.name);
    }
    Ok(())
}

fn effect(args: cli::EffectArgs) -> anyhow::Result<()> {
    let config = config::Config::load().context("load config")?;
    let library = effect_library(&config)?;
    match library.synthesize_effect(&args.description) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => anyhow::bail!("could not generate effect '{}'", args.description),
    }
}

fn config_cmd(args: cli::ConfigArgs) -> anyhow::Result<()> {
    if args.init {
        let path = config::Config::init_default()?;
        println!("Initialized config at {}", path.display());
        return Ok(());
    }

    if args.show {
        let config = config::Config::load()?;
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    if args.validate {
        let config = config::Config::load()?;
        config.validate()?;
        println!("Config OK");
        return Ok(());
    }

    let path = config::Config::default_path()?;
    println!("{}", path.display());
    Ok(())
}

fn effect_library(config: &config::Config) -> anyhow::Result<EffectLibrary> {
    let backend = ElevenLabsEffects::new(
        &config.voice.base_url,
        config.api_key()?,
        Duration::from_secs(config.effects.timeout_seconds),
    )
    .context("build effect client")?;
    let cache = EffectCache::new(config.effect_cache_dir()?);
    Ok(EffectLibrary::new(cache, Box::new(backend)))
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("read script from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("read script {}", path.display()))
}
