// SPDX-License-Identifier: GPL-3.0-or-later
use structopt::StructOpt;

use std::path::PathBuf;

use crate::camera::Bus;
use crate::util::parse_address;

#[derive(Debug, Default, StructOpt)]
#[structopt(
    name = "therm-timelapse",
    about = "Live false-color view and timed snapshots from an MLX90640 thermal camera."
)]
pub(crate) struct Args {
    /// Path to a configuration file. If not given, `config.toml` in the working directory is
    /// used if it exists.
    #[structopt(short, long, parse(from_os_str))]
    pub(crate) config_path: Option<PathBuf>,

    /// I2C bus the camera is attached to, either a bus number or a path to the device.
    #[structopt(short, long)]
    pub(crate) bus: Option<Bus>,

    /// I2C address of the camera, in decimal or hexadecimal (`0x33`).
    #[structopt(short, long, parse(try_from_str = parse_address))]
    pub(crate) address: Option<u8>,

    /// Seconds between snapshots.
    #[structopt(short, long)]
    pub(crate) interval: Option<u64>,

    /// Directory snapshots are saved in.
    #[structopt(short, long, parse(from_os_str))]
    pub(crate) output_dir: Option<PathBuf>,
}
