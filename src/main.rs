//! Command-line driver for the HyperSplit / RFG packet classification
//! platform (spec §6.1). This binary is the only part of the crate that
//! touches `std::fs`; `hspc` itself is `#![no_std]` and operates on owned
//! buffers handed to it here.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::time::Instant;

const GROUP_FILE: &str = "group_result.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Wustl,
    #[value(name = "wustl_g")]
    WustlG,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PcAlgo {
    Hs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GrpAlgo {
    Rfg,
}

/// NSLab Packet Classification Platform.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Opts {
    /// Rule file to build from.
    #[arg(short, long)]
    rule: std::path::PathBuf,

    /// Rule file format.
    #[arg(short, long, value_enum)]
    format: Format,

    /// Optional trace file to search once the index is built.
    #[arg(short, long)]
    trace: Option<std::path::PathBuf>,

    /// Packet classification algorithm to build and search with.
    #[arg(short, long, value_enum)]
    pc: Option<PcAlgo>,

    /// Grouping algorithm: groups the rule set and exits without building.
    #[arg(short, long, value_enum)]
    grp: Option<GrpAlgo>,
}

fn main() {
    env_logger::init();
    let opts = Opts::parse();
    if let Err(e) = run(&opts) {
        log::error!("{e:#}");
        std::process::exit(-1);
    }
}

fn run(opts: &Opts) -> Result<()> {
    match (opts.pc, opts.grp) {
        (Some(_), Some(_)) => bail!("cannot run in hybrid mode [pc & grp]"),
        (None, None) => bail!("must specify either --pc or --grp"),
        _ => {}
    }

    let rule_content = std::fs::read_to_string(&opts.rule)
        .with_context(|| format!("cannot open rule file {}", opts.rule.display()))?;

    if opts.grp.is_some() {
        return run_group(opts, &rule_content);
    }
    run_build(opts, &rule_content)
}

/// `-g rfg`: group the rule set and write it to `group_result.txt`, then
/// exit without building an index.
///
/// The original groups whatever partition loading left behind, which for
/// `wustl` input with more than two rules has already been auto-grouped
/// during load — `-g rfg` would then assert on a partition that is no
/// longer flat. This reimplementation always reverts to a flat rule set
/// first so grouping mode is well-defined regardless of rule count (see
/// DESIGN.md).
fn run_group(opts: &Opts, rule_content: &str) -> Result<()> {
    let flat = match opts.format {
        Format::Wustl => hspc::parse::load_rules(rule_content)?,
        Format::WustlG => {
            let partition = hspc::parse::parse_partition(rule_content)?;
            hspc::rfg::revert_partition(&partition)?
        }
    };

    log::info!("grouping {} rules", flat.rule_num());
    let start = Instant::now();
    let grouped = hspc::rfg::group(&flat)?;
    log::info!("grouping pass, {} subset(s) ({:?})", grouped.subset_num(), start.elapsed());

    let text = hspc::parse::format_partition(&grouped);
    std::fs::write(GROUP_FILE, text).with_context(|| format!("cannot write {GROUP_FILE}"))?;
    log::info!("wrote {GROUP_FILE}");

    Ok(())
}

/// `-p hs`: build a HyperSplit forest and, if `-t` is given, search a
/// trace against it.
fn run_build(opts: &Opts, rule_content: &str) -> Result<()> {
    let partition = match opts.format {
        Format::Wustl => {
            let rule_set = hspc::parse::load_rules(rule_content)?;
            if rule_set.rule_num() > 2 {
                log::info!("grouping {} rules", rule_set.rule_num());
                hspc::rfg::group(&rule_set)?
            } else {
                hspc::Partition::single(rule_set)
            }
        }
        Format::WustlG => hspc::parse::parse_partition(rule_content)?,
    };
    log::info!("subset_num={}, rule_num={}", partition.subset_num(), partition.rule_num());

    log::info!("building");
    let start = Instant::now();
    let forest = hspc::hypersplit::Forest::build(&partition)?;
    log::info!("building pass ({:?})", start.elapsed());

    let Some(trace_path) = &opts.trace else {
        return Ok(());
    };
    let trace_content =
        std::fs::read_to_string(trace_path).with_context(|| format!("cannot open trace file {}", trace_path.display()))?;
    let mut trace = hspc::parse::parse_trace(&trace_content)?;

    log::info!("searching");
    let start = Instant::now();
    forest.search_trace(&mut trace);
    let elapsed = start.elapsed();

    let mut mismatches = 0u32;
    for (i, packet) in trace.packets.iter().enumerate() {
        if packet.found != packet.match_rule {
            mismatches += 1;
            log::warn!("packet {i} matched {}, but should match {}", packet.found, packet.match_rule);
        }
    }

    let micros = elapsed.as_micros().max(1) as u64;
    let pps = (trace.packets.len() as u64 * 1_000_000) / micros;
    log::info!("searching pass ({:?})", elapsed);
    log::info!("searched {} packets, {mismatches} mismatches, {pps} pps", trace.packets.len());

    Ok(())
}
