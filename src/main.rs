//! wolfsounds command line extractor
//!
//! Renders every sound of an AUDIOHED/AUDIOT pair or a VSWAP file to WAV.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use wolfsounds::export::{export_pcm16, export_pcm8};
use wolfsounds::pcspeaker::PC_RATE;
use wolfsounds::replayer::IMF_RATE;
use wolfsounds::{
    AudioArchive, ImfPlayer, LayoutTable, Opl2, PcSpeaker, VSwapContainer, WolfSoundsError,
};

const DEFAULT_AUDIOT_RATE: u32 = 44_100;
const DEFAULT_VSWAP_RATE: u32 = 8_000;

#[derive(Parser, Debug)]
#[command(name = "wolfsounds", version, about = "Extract Wolfenstein 3D era sounds to WAV")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render PC speaker sounds, Adlib sound effects and music from AUDIOHED/AUDIOT
    Audiot(AudiotArgs),
    /// Dump digitized sounds from a VSWAP file
    Vswap(VswapArgs),
}

#[derive(Args, Debug)]
struct AudiotArgs {
    /// AUDIOHED index file
    audiohed: PathBuf,
    /// AUDIOT data file
    audiot: PathBuf,
    /// Output directory
    outdir: PathBuf,
    /// Game version tag (WL1, WL6, SOD or one from --layouts); defaults to the file extension
    #[arg(long)]
    game: Option<String>,
    /// JSON file with extra or replacement section layouts
    #[arg(long)]
    layouts: Option<PathBuf>,
    /// Output sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_AUDIOT_RATE)]
    rate: u32,
    /// Do not render Adlib sound effects
    #[arg(long)]
    skip_adlib_sfx: bool,
    /// Log and skip chunks that fail to decode instead of aborting
    #[arg(long)]
    keep_going: bool,
}

#[derive(Args, Debug)]
struct VswapArgs {
    /// VSWAP file
    vswap: PathBuf,
    /// Output directory
    outdir: PathBuf,
    /// Output sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_VSWAP_RATE)]
    rate: u32,
    /// Write each sound page separately instead of reassembled sounds
    #[arg(long)]
    pages: bool,
    /// Log and skip sounds that fail to decode instead of aborting
    #[arg(long)]
    keep_going: bool,
}

/// Apply `--keep-going`: a decode error either aborts or becomes a warning
fn recover<T>(result: wolfsounds::Result<T>, keep_going: bool, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if keep_going => {
            warn!("skipping {}: {}", what, e);
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("failed to decode {}", what)),
    }
}

fn check_rate(rate: u32, tick_rate: u32, what: &str) -> Result<()> {
    if rate < tick_rate {
        return Err(WolfSoundsError::ConfigError(format!(
            "sample rate {} Hz is below the {} tick rate of {} Hz",
            rate, what, tick_rate
        ))
        .into());
    }
    Ok(())
}

fn prepare_outdir(outdir: &Path) -> Result<()> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("cannot create output directory {}", outdir.display()))
}

fn run_audiot(args: AudiotArgs) -> Result<()> {
    check_rate(args.rate, PC_RATE, "PC speaker")?;
    check_rate(args.rate, IMF_RATE, "Adlib")?;

    let mut table = LayoutTable::builtin();
    if let Some(path) = &args.layouts {
        let json = fs::read_to_string(path)
            .with_context(|| format!("cannot read layout file {}", path.display()))?;
        table.merge_json(&json)?;
    }
    let layout = match &args.game {
        Some(tag) => table.get(tag)?,
        None => table.for_path(&args.audiot)?,
    };

    let archive = AudioArchive::open(&args.audiohed, &args.audiot)?;
    layout.validate(archive.len())?;
    prepare_outdir(&args.outdir)?;

    let speaker = PcSpeaker::new(args.rate);
    let mut pc_count = 0;
    for (n, chunk) in layout.pc_sound_range().enumerate() {
        let what = format!("PC sound {} (chunk {})", n, chunk);
        let Some(sound) = recover(archive.pc_sound(chunk), args.keep_going, &what)? else {
            continue;
        };
        let pcm = speaker.render(&sound);
        export_pcm8(args.outdir.join(format!("pcsound_{}.wav", n)), &pcm, args.rate)?;
        pc_count += 1;
    }
    info!("wrote {} PC speaker sounds", pc_count);

    let player = ImfPlayer::new(args.rate);
    let mut chip = Opl2::new(args.rate);

    if !args.skip_adlib_sfx {
        let mut sfx_count = 0;
        for (n, chunk) in layout.adlib_sound_range().enumerate() {
            let what = format!("Adlib sound {} (chunk {})", n, chunk);
            let Some(sound) = recover(archive.adlib_sound(chunk), args.keep_going, &what)? else {
                continue;
            };
            let rendered = player.render_sound(&sound, &mut chip);
            let Some(pcm) = recover(rendered, args.keep_going, &what)? else {
                continue;
            };
            export_pcm16(args.outdir.join(format!("adlib_sound_{}.wav", n)), &pcm, args.rate)?;
            sfx_count += 1;
        }
        info!("wrote {} Adlib sound effects", sfx_count);
    }

    let mut music_count = 0;
    for (n, chunk) in layout.music_range(archive.len()).enumerate() {
        let what = format!("music {} (chunk {})", n, chunk);
        let Some(song) = recover(archive.music(chunk), args.keep_going, &what)? else {
            continue;
        };
        let pcm = player.render(&song, &mut chip);
        export_pcm16(args.outdir.join(format!("adlib_music_{}.wav", n)), &pcm, args.rate)?;
        music_count += 1;
    }
    info!("wrote {} music tracks", music_count);

    Ok(())
}

fn run_vswap(args: VswapArgs) -> Result<()> {
    if args.rate == 0 {
        return Err(WolfSoundsError::ConfigError("sample rate must be non-zero".into()).into());
    }

    let container = VSwapContainer::load(&args.vswap)?;
    prepare_outdir(&args.outdir)?;

    if args.pages {
        let pages = container.sound_pages();
        for (n, page) in pages.iter().enumerate() {
            export_pcm8(args.outdir.join(format!("page_{}.wav", n)), &page.data, args.rate)?;
        }
        info!("wrote {} sound pages", pages.len());
        return Ok(());
    }

    let what = format!("sound table of {}", args.vswap.display());
    let Some(sounds) = recover(container.digitized_sounds(), args.keep_going, &what)? else {
        return Ok(());
    };
    for sound in &sounds {
        export_pcm8(
            args.outdir.join(format!("digisound_{}.wav", sound.index)),
            &sound.data,
            args.rate,
        )?;
    }
    info!("wrote {} digitized sounds", sounds.len());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Audiot(args) => run_audiot(args),
        Command::Vswap(args) => run_vswap(args),
    }
}
