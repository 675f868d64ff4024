// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Command-line converter between binary EFI device paths and their textual
//! representation.
//!
//! By default reads a binary device path on stdin and prints its text form;
//! with `--text` converts the other way, writing the binary path to stdout.

use anyhow::bail;
use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::io::Write;
use uefi_devpath::DevicePath;

#[derive(Parser)]
#[clap(name = "efidevpath", about = "Convert EFI device paths")]
struct Cli {
    /// Use display-only representation
    #[clap(short = 'd', long = "displayonly")]
    display_only: bool,

    /// Use shortcut representation
    #[clap(short = 's', long = "shortcuts")]
    allow_shortcuts: bool,

    /// Convert text back to an EFI device path
    #[clap(short = 't', long = "text", value_name = "TEXT")]
    text: Option<String>,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("efidevpath: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(text) = &cli.text {
        let path =
            DevicePath::from_text(text).context("could not convert text to device path")?;
        std::io::stdout()
            .write_all(path.as_bytes())
            .context("could not write device path")?;
    } else {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("could not read device path")?;
        if !uefi_devpath::validate(&data, 0) {
            bail!("malformed device path");
        }
        let path = DevicePath::from_bytes(&data)?;
        println!("{}", path.to_text(cli.display_only, cli.allow_shortcuts));
    }

    Ok(())
}
