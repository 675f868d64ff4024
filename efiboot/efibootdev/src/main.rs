// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Command-line front-end for inspecting and modifying EFI boot entries.
//!
//! Thin shell over [`efi_bootdev`]: every subcommand loads the entry list
//! for the selected load-option type, operates on it, and (for mutating
//! commands) persists it back through `save_all`.

use anyhow::bail;
use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use efi_bootdev::BootEntry;
use efi_bootdev::BootEntryManager;
use efi_bootdev::OptionType;
use std::str::FromStr;

#[derive(Parser)]
#[clap(name = "efibootdev", about = "Manage EFI boot entries")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show EFI boot entries
    Show(ShowCmd),
    /// Modify an EFI boot entry
    Mod(ModCmd),
    /// Add an EFI boot entry
    Add(AddCmd),
    /// Delete an EFI boot entry
    Del(DelCmd),
}

fn parse_type(s: &str) -> Result<OptionType, String> {
    OptionType::from_str(s).map_err(|()| format!("unknown type \"{s}\" (boot|driver|sysprep)"))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("invalid value \"{s}\""))
}

#[derive(Args)]
struct TypeArg {
    /// Load option type
    #[clap(
        short = 't',
        long = "type",
        value_name = "boot|driver|sysprep",
        default_value = "boot",
        value_parser = parse_type
    )]
    option_type: OptionType,
}

#[derive(Args)]
struct SetArgs {
    /// Boot order position (negative counts from the end)
    #[clap(short = 'o', long, value_name = "position", allow_hyphen_values = true)]
    position: Option<String>,

    /// Attributes
    #[clap(short = 'a', long, value_name = "attributes", value_parser = parse_u32)]
    attributes: Option<u32>,

    /// Description
    #[clap(short = 'd', long, value_name = "description")]
    description: Option<String>,

    /// Device path (repeatable; replaces the whole list)
    #[clap(short = 'p', long = "path", value_name = "path")]
    paths: Vec<String>,

    /// Additional data, base64-encoded
    #[clap(short = 'x', long, value_name = "base64 data")]
    data: Option<String>,
}

#[derive(Args)]
struct ShowCmd {
    #[clap(flatten)]
    option_type: TypeArg,

    /// Show boot order position
    #[clap(short = 'o', long)]
    position: bool,

    /// Show variable name
    #[clap(short = 'n', long)]
    name: bool,

    /// Show attributes
    #[clap(short = 'a', long)]
    attributes: bool,

    /// Show description
    #[clap(short = 'd', long)]
    description: bool,

    /// Show primary path
    #[clap(short = 'p', long)]
    path: bool,

    /// Show all paths
    #[clap(short = 'P', long)]
    paths: bool,

    /// Show additional data
    #[clap(short = 'x', long)]
    data: bool,

    /// Entries to show (position or variable name); all when omitted
    #[clap(value_name = "position|name")]
    entries: Vec<String>,
}

#[derive(Args)]
struct ModCmd {
    #[clap(flatten)]
    option_type: TypeArg,

    #[clap(flatten)]
    set: SetArgs,

    /// Entry to modify (position or variable name)
    #[clap(value_name = "position|name")]
    entry: String,
}

#[derive(Args)]
struct AddCmd {
    #[clap(flatten)]
    option_type: TypeArg,

    #[clap(flatten)]
    set: SetArgs,

    /// Do not show the created variable name
    #[clap(short = 'q', long)]
    quiet: bool,
}

#[derive(Args)]
struct DelCmd {
    #[clap(flatten)]
    option_type: TypeArg,

    /// Entry to delete (position or variable name)
    #[clap(value_name = "position|name")]
    entry: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("EFIBOOT_LOG"))
        .init();

    if let Err(err) = try_main() {
        eprintln!("efibootdev: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut manager = BootEntryManager::new(efivar_store::platform_store());

    match cli.command {
        Commands::Show(cmd) => {
            let entries = load_entries(&mut manager, cmd.option_type.option_type)?;
            if cmd.entries.is_empty() {
                for position in 0..entries.len() {
                    show_entry(&cmd, &entries, position);
                }
            } else {
                for id in &cmd.entries {
                    let position = parse_id(id, &entries)?;
                    show_entry(&cmd, &entries, position);
                }
            }
        }
        Commands::Mod(cmd) => {
            let option_type = cmd.option_type.option_type;
            let mut entries = load_entries(&mut manager, option_type)?;
            let position = parse_id(&cmd.entry, &entries)?;
            apply_settings(&mut entries, position, &cmd.set)?;
            manager
                .save_all(option_type, &mut entries)
                .context("could not save entries")?;
        }
        Commands::Add(cmd) => {
            let option_type = cmd.option_type.option_type;
            if cmd.set.description.is_none() {
                bail!("must provide a description");
            }
            if cmd.set.paths.is_empty() {
                bail!("must provide at least one path");
            }

            let mut entries = load_entries(&mut manager, option_type)?;
            let mut entry = BootEntry::new();
            entry.set_type(option_type);
            entries.insert(0, entry);

            let position = apply_settings(&mut entries, 0, &cmd.set)?;
            manager
                .save_all(option_type, &mut entries)
                .context("could not save entries")?;

            if !cmd.quiet {
                // save_all assigned the index, so the name exists now
                if let Some(name) = entries[position].name() {
                    println!("{name}");
                }
            }
        }
        Commands::Del(cmd) => {
            let option_type = cmd.option_type.option_type;
            let mut entries = load_entries(&mut manager, option_type)?;
            let position = parse_id(&cmd.entry, &entries)?;

            let removed = entries.remove(position);
            manager
                .save_all(option_type, &mut entries)
                .context("could not update boot order")?;
            manager
                .delete(&removed)
                .context("could not delete entry")?;
        }
    }

    Ok(())
}

fn load_entries(
    manager: &mut BootEntryManager<Box<dyn efivar_store::VarStore>>,
    option_type: OptionType,
) -> anyhow::Result<Vec<BootEntry>> {
    manager
        .load_all(option_type)
        .context("could not load boot entries")
}

/// Resolve an entry identifier: a variable name (matched case-insensitively)
/// or a boot-order position, negative counting from the end.
fn parse_id(arg: &str, entries: &[BootEntry]) -> anyhow::Result<usize> {
    if let Some(position) = entries
        .iter()
        .position(|e| e.name().is_some_and(|n| n.eq_ignore_ascii_case(arg)))
    {
        return Ok(position);
    }
    parse_position(arg, entries.len())
}

fn parse_position(arg: &str, count: usize) -> anyhow::Result<usize> {
    let position: i64 = arg
        .parse()
        .with_context(|| format!("invalid position \"{arg}\""))?;
    let resolved = if position < 0 {
        position + count as i64
    } else {
        position
    };
    if resolved < 0 || resolved >= count as i64 {
        bail!("position {arg} out of range");
    }
    Ok(resolved as usize)
}

/// Apply `--attributes`/`--description`/`--path`/`--data`, then any
/// `--position` move. Returns the entry's final position.
fn apply_settings(
    entries: &mut Vec<BootEntry>,
    position: usize,
    set: &SetArgs,
) -> anyhow::Result<usize> {
    let entry = &mut entries[position];

    if let Some(attributes) = set.attributes {
        entry.set_attributes(attributes);
    }
    if let Some(description) = &set.description {
        entry.set_description(description);
    }
    if !set.paths.is_empty() {
        entry
            .set_paths_text(&set.paths)
            .context("could not set paths")?;
    }
    if let Some(encoded) = &set.data {
        let data = BASE64
            .decode(encoded)
            .context("invalid base64 additional data")?;
        entry.set_data(&data);
    }

    if let Some(position_arg) = &set.position {
        let new_position = parse_position(position_arg, entries.len())?;
        let entry = entries.remove(position);
        entries.insert(new_position, entry);
        return Ok(new_position);
    }
    Ok(position)
}

fn show_entry(cmd: &ShowCmd, entries: &[BootEntry], position: usize) {
    let entry = &entries[position];

    // Show all fields if no fields are selected.
    let all = !(cmd.position
        || cmd.name
        || cmd.attributes
        || cmd.description
        || cmd.path
        || cmd.paths
        || cmd.data);

    let mut fields: Vec<String> = Vec::new();

    if all || cmd.position {
        fields.push(position.to_string());
    }
    if all || cmd.name {
        fields.push(entry.name().unwrap_or_default().to_string());
    }
    if all || cmd.attributes {
        fields.push(format!("{:08x}", entry.attributes()));
    }
    if all || cmd.description {
        fields.push(entry.description().to_string());
    }
    let path_count = if all || cmd.paths {
        entry.path_count()
    } else if cmd.path {
        1
    } else {
        0
    };
    for index in 0..path_count {
        if let Some(text) = entry.path_text(index) {
            fields.push(text.to_string());
        }
    }
    if (all || cmd.data) && !entry.data().is_empty() {
        fields.push(BASE64.encode(entry.data()));
    }

    println!("{}", fields.join(" "));
}
