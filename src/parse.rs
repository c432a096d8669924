//! C1 file I/O: WUSTL rule/trace/partition text formats (spec §6.2–§6.4).
//!
//! Everything here operates on borrowed `&str` content, not `std::fs` —
//! the core library stays `no_std`; the CLI binary (`src/main.rs`) is the
//! only place that touches a filesystem, reading a file into a `String`
//! and handing its contents to these functions.

use crate::dim::{Dimension, DIM_MAX};
use crate::error::Error;
use crate::rule::{Packet, Partition, Rule, RuleSet, Trace, PKT_MAX, RULE_MAX};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

fn parse_u32(tok: &str) -> Result<u32, Error> {
    tok.parse::<u32>().map_err(|_| Error::Unsupported("expected an integer"))
}

fn parse_hex_u32(tok: &str) -> Result<u32, Error> {
    let digits = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")).unwrap_or(tok);
    u32::from_str_radix(digits, 16).map_err(|_| Error::Unsupported("expected a hex integer"))
}

/// Parse `@A.B.C.D/m` (or, without the leading `@`, `E.F.G.H/n`) into the
/// `[lo, hi]` range the CIDR block denotes.
fn parse_ip_cidr(tok: &str, require_at: bool) -> Result<[u32; 2], Error> {
    let tok = if require_at {
        tok.strip_prefix('@').ok_or(Error::Unsupported("expected '@' before source IP"))?
    } else {
        tok
    };
    let (ip_part, mask_part) = tok.split_once('/').ok_or(Error::Unsupported("expected IP/mask"))?;
    let mut octets = ip_part.split('.');
    let mut ip: u32 = 0;
    for _ in 0..4 {
        let o: u32 = octets.next().ok_or(Error::Unsupported("expected 4 IP octets"))?.parse().map_err(|_| Error::Unsupported("bad IP octet"))?;
        ip = (ip << 8) | o;
    }
    if octets.next().is_some() {
        return Err(Error::Unsupported("too many IP octets"));
    }
    let mask_len: u32 = mask_part.parse().map_err(|_| Error::Unsupported("bad CIDR mask length"))?;
    let mask: u32 = if mask_len >= 32 { u32::MAX } else { !((1u32 << (32 - mask_len)) - 1) };
    Ok([ip & mask, ip | !mask])
}

/// Split a WUSTL rule line into whitespace tokens with literal `:`
/// separators dropped, matching the format's `sp0 : sp1` style fields.
fn rule_tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().filter(|&t| t != ":").collect()
}

/// Load a WUSTL-format rule file. Blank lines and lines starting with `#`
/// are skipped; priority is the 0-based index among successfully parsed
/// lines.
pub fn load_rules(content: &str) -> Result<RuleSet, Error> {
    let mut rules = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if rules.len() >= RULE_MAX {
            return Err(Error::Unsupported("too many rules"));
        }

        let tokens = rule_tokens(line);
        // 7 tokens => 16 integers (no NIC); 9 tokens => 18 integers (NIC,
        // which this build does not compile in).
        if tokens.len() == 9 {
            return Err(Error::Unsupported("NIC dimension is not supported"));
        }
        if tokens.len() != 7 {
            return Err(Error::Unsupported("malformed rule line"));
        }

        let sip = parse_ip_cidr(tokens[0], true)?;
        let dip = parse_ip_cidr(tokens[1], false)?;
        let sp0 = parse_u32(tokens[2])?;
        let sp1 = parse_u32(tokens[3])?;
        let dp0 = parse_u32(tokens[4])?;
        let dp1 = parse_u32(tokens[5])?;

        let (proto_val_tok, proto_mask_tok) = tokens[6]
            .split_once('/')
            .ok_or(Error::Unsupported("expected protocol/mask"))?;
        let proto_val = parse_hex_u32(proto_val_tok)?;
        let proto_mask = parse_hex_u32(proto_mask_tok)?;
        let proto = if proto_mask == 0xff {
            [proto_val, proto_val]
        } else if proto_mask == 0 {
            [0, 0xff]
        } else {
            [proto_val, proto_mask]
        };

        let mut dims = [[0u32, 0]; DIM_MAX];
        dims[Dimension::Sip as usize] = sip;
        dims[Dimension::Dip as usize] = dip;
        dims[Dimension::Sport as usize] = [sp0, sp1];
        dims[Dimension::Dport as usize] = [dp0, dp1];
        dims[Dimension::Proto as usize] = proto;

        let priority = rules.len() as u32;
        rules.push(Rule::new(dims, priority)?);
    }

    Ok(RuleSet::from_rules(rules))
}

/// Load a WUSTL-format trace file: `sip dip sport dport proto
/// expected_match_rule` per packet, whitespace separated. The file's
/// 1-based `expected_match_rule` is stored decremented by 1.
pub fn parse_trace(content: &str) -> Result<Trace, Error> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    if tokens.len() % 6 != 0 {
        return Err(Error::Unsupported("malformed trace file"));
    }

    let mut packets = Vec::new();
    for chunk in tokens.chunks_exact(6) {
        if packets.len() >= PKT_MAX {
            return Err(Error::Unsupported("too many packets"));
        }
        let sip = parse_u32(chunk[0])?;
        let dip = parse_u32(chunk[1])?;
        let sport = parse_u32(chunk[2])?;
        let dport = parse_u32(chunk[3])?;
        let proto = parse_u32(chunk[4])?;
        let expected = parse_u32(chunk[5])?;
        if expected == 0 {
            return Err(Error::Unsupported("expected_match_rule is 1-based"));
        }

        let mut packet = Packet::new([sip, dip, sport, dport, proto]);
        packet.match_rule = expected - 1;
        packets.push(packet);
    }

    Ok(Trace { packets })
}

/// Parse a `wustl_g` partition file: alternating `idx rule_count` headers
/// and `rule_count` rule lines of 11 integers each (spec §6.4).
pub fn parse_partition(content: &str) -> Result<Partition, Error> {
    let mut tokens = content.split_whitespace();
    let mut subsets = Vec::new();

    loop {
        let idx_tok = match tokens.next() {
            Some(t) => t,
            None => break,
        };
        let _idx = parse_u32(idx_tok)?;
        let rule_count = tokens
            .next()
            .ok_or(Error::Unsupported("expected rule_count after partition index"))
            .and_then(parse_u32)?;

        let mut rules = Vec::with_capacity(rule_count as usize);
        for _ in 0..rule_count {
            let mut vals = [0u32; 11];
            for v in &mut vals {
                *v = tokens.next().ok_or(Error::Unsupported("short partition rule line")).and_then(parse_u32)?;
            }
            let dims = [
                [vals[0], vals[1]],
                [vals[2], vals[3]],
                [vals[4], vals[5]],
                [vals[6], vals[7]],
                [vals[8], vals[9]],
            ];
            rules.push(Rule::new(dims, vals[10])?);
        }

        subsets.push(RuleSet::from_rules(rules));
    }

    if subsets.is_empty() {
        return Err(Error::Unsupported("empty partition file"));
    }
    Ok(Partition { subsets })
}

/// Render a partition back into the `wustl_g` text format written by the
/// `-g rfg` CLI mode.
pub fn format_partition(partition: &Partition) -> String {
    let mut out = String::new();
    for (i, subset) in partition.subsets.iter().enumerate() {
        let _ = writeln!(out, "{} {}", i, subset.rule_num());
        for rule in &subset.rules {
            let [sip_lo, sip_hi] = rule.range(Dimension::Sip);
            let [dip_lo, dip_hi] = rule.range(Dimension::Dip);
            let [sp_lo, sp_hi] = rule.range(Dimension::Sport);
            let [dp_lo, dp_hi] = rule.range(Dimension::Dport);
            let [pr_lo, pr_hi] = rule.range(Dimension::Proto);
            let _ = writeln!(
                out,
                "{} {} {} {} {} {} {} {} {} {} {}",
                sip_lo, sip_hi, dip_lo, dip_hi, sp_lo, sp_hi, dp_lo, dp_hi, pr_lo, pr_hi, rule.priority
            );
        }
    }
    out
}
