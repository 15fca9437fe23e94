//! Patch inspection tool
//!
//! Loads a patch file and prints its modules, routing and mappings.
//!
//! Usage: patch-inspect [PATCH] [--config PATH]
//!
//! PATCH is a file path or a patch name inside the configured patch
//! directory. Without PATH the config is read from ~/Documents/rack/rack.yaml.

use anyhow::{bail, Context, Result};
use rack_core::config::{default_config_path, RackConfig, CONFIG_FILENAME};
use rack_core::patch::KnobSetId;
use rack_core::persist::load_patch_file;
use rack_core::PatchData;
use rack_midi::ChanneledId;
use std::path::PathBuf;

struct Args {
    patch: Option<String>,
    config: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut patch = None;
    let mut config = default_config_path(CONFIG_FILENAME);

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = args
                    .next()
                    .map(PathBuf::from)
                    .context("--config needs a path")?;
            }
            "-h" | "--help" => {
                println!("Usage: patch-inspect [PATCH] [--config PATH]");
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                if patch.replace(other.to_string()).is_some() {
                    bail!("Only one patch can be inspected at a time");
                }
            }
        }
    }

    Ok(Args { patch, config })
}

fn slug(pd: &PatchData, module_id: u16) -> &str {
    pd.module_slug(module_id).unwrap_or("<missing>")
}

fn describe_id(panel_id: u32) -> String {
    match ChanneledId::decode(panel_id) {
        Some(id) => id.to_string(),
        None => format!("{:#x}", panel_id),
    }
}

fn print_patch(pd: &PatchData) {
    println!("Patch: {}", pd.patch_name);
    if !pd.description.is_empty() {
        println!("  {}", pd.description);
    }

    println!();
    println!("Modules ({}):", pd.num_modules());
    for (id, name) in pd.module_slugs.iter().enumerate() {
        let bypassed = if pd.bypassed_modules.contains(&(id as u16)) {
            " (bypassed)"
        } else {
            ""
        };
        println!("  {:>3}  {}{}", id, name, bypassed);
    }

    println!();
    println!("Cables ({}):", pd.int_cables.len());
    for cable in &pd.int_cables {
        let ins: Vec<String> = cable
            .ins
            .iter()
            .map(|j| format!("{}:{}", slug(pd, j.module_id), j.jack_id))
            .collect();
        println!(
            "  {}:{} -> {}",
            slug(pd, cable.out.module_id),
            cable.out.jack_id,
            ins.join(", ")
        );
    }

    println!();
    println!("Panel inputs ({}):", pd.mapped_ins.len());
    for map in &pd.mapped_ins {
        for jack in &map.ins {
            println!(
                "  {:<20} -> {}:{}",
                describe_id(map.panel_jack_id),
                slug(pd, jack.module_id),
                jack.jack_id
            );
        }
    }

    println!();
    println!("Panel outputs ({}):", pd.mapped_outs.len());
    for map in &pd.mapped_outs {
        println!(
            "  {}:{} -> {}",
            slug(pd, map.out.module_id),
            map.out.jack_id,
            describe_id(map.panel_jack_id)
        );
    }

    let sets = (0..pd.knob_sets.len() as u32)
        .map(KnobSetId::Index)
        .chain(std::iter::once(KnobSetId::Midi));
    for set_id in sets {
        let Some(knob_set) = pd.knob_set(set_id) else {
            continue;
        };
        println!();
        println!(
            "{} ({} mappings):",
            pd.valid_knob_set_name(set_id),
            knob_set.set.len()
        );
        for knob in &knob_set.set {
            let alias = if knob.alias_name.is_empty() {
                String::new()
            } else {
                format!(" \"{}\"", knob.alias_name)
            };
            println!(
                "  {:<20} -> {} param {} [{:.2}, {:.2}]{}",
                describe_id(knob.panel_knob_id as u32),
                slug(pd, knob.module_id),
                knob.param_id,
                knob.min,
                knob.max,
                alias
            );
        }
    }

    let mut recomputed = pd.clone();
    recomputed.update_midi_poly_num();

    println!();
    println!(
        "MIDI: polyphony {} (inputs need {}), mode {:?}, pitch wheel +/-{} semitones",
        pd.midi_poly_num, recomputed.midi_poly_num, pd.midi_poly_mode, pd.midi_pitchwheel_range
    );
    if pd.suggested_samplerate > 0 || pd.suggested_blocksize > 0 {
        println!(
            "Engine: {} Hz, block size {}",
            pd.suggested_samplerate, pd.suggested_blocksize
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;
    let config = RackConfig::load(&args.config);

    let name = args
        .patch
        .unwrap_or_else(|| config.default_patch_name.clone());
    let path = config.patch_path(&name);

    let mut pd = load_patch_file(&path)
        .with_context(|| format!("Failed to load patch {:?}", path))?;
    // Direct assignment keeps the saved polyphony for display
    pd.calibration = config.calibration;

    print_patch(&pd);
    Ok(())
}
