use std::error::Error;
use std::fs::read_to_string;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::info;
use mosbius_bitstream::{BitFile, BitFileParserOptions, ConflictPolicy, Order};
use mosbius_compiler::regmap::{validate_register_map, validate_sizing_map};
use mosbius_compiler::{
    BuildOptions, CanonicalConfig, ConnectionTable, PinMap, PinNumbers, build_bitstream,
    parse_json,
};
use mosbius_types::NUM_REGISTERS;

fn order_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("order")
            .long("order")
            .value_parser(value_parser!(Order))
            .default_value("asc")
            .help("Register order in the artifact: asc (register 1 first) or desc"),
    )
    .arg(
        Arg::new("m2k")
            .long("m2k")
            .action(ArgAction::SetTrue)
            .help("Descending order with a leading 0 line, for the M2K programming setup"),
    )
}

/// The artifact layout selected by `--order` and `--m2k`.
fn layout(m: &ArgMatches) -> (Order, bool) {
    if m.get_flag("m2k") {
        (Order::Descending, true)
    } else {
        (*m.get_one::<Order>("order").unwrap(), false)
    }
}

fn bitgen(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let arg_config = m.get_one::<PathBuf>("config").unwrap();
    let arg_pinmap = m.get_one::<PathBuf>("pinmap").unwrap();
    let arg_output = m.get_one::<PathBuf>("output").unwrap();
    let arg_csv = m.get_one::<PathBuf>("csv");
    let (order, compat_prefix) = layout(m);
    let policy = if m.get_flag("allow-overwrite") {
        ConflictPolicy::Overwrite
    } else {
        ConflictPolicy::Strict
    };

    let pins = PinMap::from_file(arg_pinmap)?;
    info!("{}: {} terminals", arg_pinmap.display(), pins.len());
    let config = CanonicalConfig::from_file(arg_config, &pins)?;
    let bs = build_bitstream(&config, &pins, &BuildOptions::new().policy(policy))?;
    let table = match arg_csv {
        Some(_) => {
            let arg_numbers = m.get_one::<PathBuf>("pin-numbers").unwrap();
            Some(ConnectionTable::new(&config, &PinNumbers::from_file(arg_numbers)?)?)
        }
        None => None,
    };

    let file = BitFile::new()
        .with_bits(bs.into_bits())
        .with_order(order)
        .with_compat_prefix(compat_prefix);
    file.emit_to_file(arg_output)?;
    println!(
        "Bitstream saved to {} ({} bits, order={order})",
        arg_output.display(),
        file.num_lines()
    );
    if let (Some(path), Some(table)) = (arg_csv, table) {
        table.emit_to_file(path)?;
        println!("CSV saved to {} ({} rows)", path.display(), table.rows.len());
    }
    Ok(())
}

fn check(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let arg_bitstream = m.get_one::<PathBuf>("bitstream").unwrap();
    let (order, compat_prefix) = layout(m);
    let mut options = BitFileParserOptions::new()
        .order(order)
        .expected_len(NUM_REGISTERS as usize);
    if compat_prefix {
        options = options.compat_prefix();
    }
    let file = BitFile::parse_from_file(arg_bitstream, &options)?;
    println!(
        "{}: {} bits, {} set",
        arg_bitstream.display(),
        file.bits.len(),
        file.bits.count_ones()
    );
    Ok(())
}

fn validate_map(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let arg_map = m.get_one::<PathBuf>("register-map").unwrap();
    let (rows, entries) = validate_register_map(&parse_json(&read_to_string(arg_map)?)?)?;
    println!("PASS: register map matches the equations (rows={rows}, bus_entries={entries})");
    if let Some(arg_sizing) = m.get_one::<PathBuf>("sizing") {
        let (devices, entries) = validate_sizing_map(&parse_json(&read_to_string(arg_sizing)?)?)?;
        println!("PASS: sizing map matches the equations (devices={devices}, entries={entries})");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("MOSBIUS_LOG", "warn"))
        .format_timestamp(None)
        .init();
    let m = Command::new("mosbius")
        .about("MOSbius switch matrix bitstream generator")
        .subcommand_required(true)
        .subcommand(order_args(
            Command::new("bitgen")
                .about("Compile a connection document into a bitstream")
                .arg(
                    Arg::new("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("pinmap")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .requires("pin-numbers")
                        .value_parser(value_parser!(PathBuf))
                        .help("Also write a terminal/bus connection table"),
                )
                .arg(
                    Arg::new("pin-numbers")
                        .long("pin-numbers")
                        .value_parser(value_parser!(PathBuf))
                        .help("Terminal to package pin map, labels the connection table"),
                )
                .arg(
                    Arg::new("allow-overwrite")
                        .long("allow-overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Let later writes win over conflicting earlier ones instead of failing"),
                ),
        ))
        .subcommand(order_args(
            Command::new("check")
                .about("Load a bitstream artifact and summarize it")
                .arg(
                    Arg::new("bitstream")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        ))
        .subcommand(
            Command::new("validate-map")
                .about("Check precomputed register maps against the address equations")
                .arg(
                    Arg::new("register-map")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("sizing")
                        .long("sizing")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .get_matches();
    match m.subcommand() {
        Some(("bitgen", m)) => bitgen(m)?,
        Some(("check", m)) => check(m)?,
        Some(("validate-map", m)) => validate_map(m)?,
        _ => unreachable!(),
    }
    Ok(())
}
