// This file is part of pwmd, an application to drive the PWM custom IP core of an FPGA through its memory-mapped register.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// pwmd is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// pwmd is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! pwmd_cli - command-line client for the pwmd daemon.
//!
//! Every command talks to the daemon over the system DBus, so the daemon must be running.
//!
//! ```bash
//! pwmd_cli set 750      # write a duty cycle of 750 out of 9999
//! pwmd_cli get          # read the duty cycle as a percentage
//! pwmd_cli status       # show the binding and node of the driver
//! ```

use clap::{Parser, Subcommand};
use log::debug;

mod get;
mod proxies;
mod set;
mod status;

#[derive(Parser, Debug)]
#[command(name = "pwmd_cli", bin_name = "pwmd_cli")]
struct Cli {
    #[arg(
        long = "node",
        default_value = "pwm_c2",
        help = "name of the device node to talk to"
    )]
    node: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a duty cycle, from 0 to 9999
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(0..=9999))]
        duty: u32,
    },
    /// Read the duty cycle status as a percentage of full scale
    Get,
    /// Show the state of the driver
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");
    let result = match cli.command {
        Commands::Set { duty } => set::set_handler(&cli.node, duty).await,
        Commands::Get => get::get_handler(&cli.node).await,
        Commands::Status => status::status_handler(&cli.node).await,
    };
    match result {
        Ok(msg) => println!("{msg}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
    Ok(())
}
