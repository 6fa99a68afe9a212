//! The interactive command loop (spec §6 "Command surface").

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use memscan_scan::ScanOptions;
use memscan_session::{
    delete, dregion, set_continuous, set_many, watch, CancellationFlag, Selection, Session,
    SessionState, TargetIo,
};
use memscan_types::ScanValue;

use crate::format::{dump, list_header, list_row, region_row};
use crate::options::Options;
use crate::parse::parse_scan_expr;

/// Drives the command loop over `target`, reading lines from `input` and
/// writing output to `output` (spec §1 calls out stdin/stdout line
/// protocol as the command layer's concern, not the core engine's).
pub fn run<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    mut target: Box<dyn TargetIo>,
    initial_pid: Option<i32>,
) -> Result<()> {
    let mut session = Session::new();
    let mut options = Options::default();
    let cancel = CancellationFlag::new();

    if let Some(pid) = initial_pid {
        session.attach(target.as_mut(), pid)?;
        writeln!(output, "attached to pid {pid}")?;
    }

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match dispatch(
            line,
            &mut session,
            target.as_mut(),
            &mut options,
            &cancel,
            &mut output,
        ) {
            Ok(Control::Continue) => {}
            Ok(Control::Exit) => break,
            Err(err) => writeln!(output, "error: {err}")?,
        }
    }
    Ok(())
}

enum Control {
    Continue,
    Exit,
}

#[allow(clippy::too_many_lines)]
fn dispatch<W: Write>(
    line: &str,
    session: &mut Session,
    target: &mut dyn TargetIo,
    options: &mut Options,
    cancel: &CancellationFlag,
    output: &mut W,
) -> Result<Control> {
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "exit" | "quit" => return Ok(Control::Exit),

        "help" => {
            writeln!(
                output,
                "pid, reset, snapshot, set, list, delete, dregion, lregions, \
                 update, watch, dump, write, option, shell, show, help, exit"
            )?;
        }

        "show" => {
            writeln!(output, "{} matches", session.num_matches())?;
            for region in session.regions().regions() {
                writeln!(output, "{}", region_row(region))?;
            }
        }

        "pid" => {
            let pid: i32 = rest.parse().context("pid must be an integer")?;
            session.attach(target, pid)?;
            writeln!(output, "attached to pid {pid}")?;
        }

        "reset" => {
            session.reset();
            writeln!(output, "match set cleared")?;
        }

        "option" => {
            if rest.is_empty() {
                writeln!(output, "{}", options.show())?;
            } else {
                let (key, value) = rest
                    .split_once('=')
                    .context("usage: option key=value")?;
                options.set(key.trim(), value.trim())?;
                writeln!(output, "ok")?;
            }
        }

        "snapshot" => {
            let scan_options = ScanOptions {
                endianness: options.endianness,
                detect_reverse_change: options.detect_reverse_change,
            };
            let expr = parse_scan_expr("any", options.scan_data_type)?;
            let outcome = session.scan(
                target,
                options.region_scan_level,
                options.scan_data_type,
                expr.match_type,
                &expr.user_value,
                &scan_options,
                cancel,
            )?;
            report_outcome(output, outcome)?;
        }

        "update" => {
            if session.state() != SessionState::Narrowing {
                bail!("no match set to update; run a scan first");
            }
            let expr = parse_scan_expr(rest, options.scan_data_type)?;
            let scan_options = ScanOptions {
                endianness: options.endianness,
                detect_reverse_change: options.detect_reverse_change,
            };
            let outcome = session.scan(
                target,
                options.region_scan_level,
                options.scan_data_type,
                expr.match_type,
                &expr.user_value,
                &scan_options,
                cancel,
            )?;
            report_outcome(output, outcome)?;
        }

        other if is_scan_expression(other, rest) => {
            let expr = parse_scan_expr(line, options.scan_data_type)?;
            let scan_options = ScanOptions {
                endianness: options.endianness,
                detect_reverse_change: options.detect_reverse_change,
            };
            let outcome = session.scan(
                target,
                options.region_scan_level,
                options.scan_data_type,
                expr.match_type,
                &expr.user_value,
                &scan_options,
                cancel,
            )?;
            report_outcome(output, outcome)?;
        }

        "list" => {
            let store = session.store().context("no match set; run a scan first")?;
            let limit: usize = if rest.is_empty() {
                usize::MAX
            } else {
                rest.parse().context("list count must be an integer")?
            };
            let count = store.num_matches().min(limit);
            writeln!(output, "{}", list_header(count))?;
            for ordinal in 0..count {
                let location = memscan_session::resolve(store, ordinal)?;
                let width = location.flags.max_width_in_bytes() as usize;
                let bytes = store.old_bytes_at(location, width);
                writeln!(output, "{}", list_row(ordinal, &location, session.regions(), &bytes))?;
            }
        }

        "lregions" => {
            for region in session.regions().regions() {
                writeln!(output, "{}", region_row(region))?;
            }
        }

        "delete" => {
            let store = session
                .store_mut()
                .context("no match set; run a scan first")?;
            for ordinal in parse_selection_ids(rest, store.num_matches())? {
                delete(store, ordinal)?;
            }
            writeln!(output, "ok")?;
        }

        "dregion" => {
            let (invert, ids_str) = rest
                .strip_prefix('!')
                .map_or((false, rest), |r| (true, r));
            let ids: Vec<u32> = ids_str
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.parse().context("region ids must be integers"))
                .collect::<Result<_>>()?;
            let (store, regions) = session.store_and_regions_mut()?;
            dregion(store, regions, &ids, invert)?;
            writeln!(output, "ok")?;
        }

        "set" => {
            let (selection_str, value_str) = rest
                .split_once(' ')
                .context("usage: set <selection> <value>[/seconds]")?;
            let (value_str, interval) = match value_str.rsplit_once('/') {
                Some((v, secs)) => {
                    let secs: u64 = secs.parse().context("interval must be an integer")?;
                    (v, Some(Duration::from_secs(secs)))
                }
                None => (value_str, None),
            };
            let value: f64 = value_str.parse().context("value must be a number")?;
            let store = session.store().context("no match set; run a scan first")?;
            let selection = parse_selection(selection_str, store.num_matches())?;
            let pid = session.pid().context("no target attached")?;
            let scan_value = ScanValue::U64(value as u64);
            let needs_swap = options.endianness.needs_swap();
            if let Some(interval) = interval {
                set_continuous(store, target, pid, &selection, scan_value, needs_swap, interval, cancel)?;
            } else {
                set_many(store, target, pid, &selection, scan_value, needs_swap)?;
            }
            writeln!(output, "ok")?;
        }

        "watch" => {
            let ordinal: usize = rest.parse().context("usage: watch <ordinal>")?;
            let store = session.store().context("no match set; run a scan first")?;
            let pid = session.pid().context("no target attached")?;
            let needs_swap = options.endianness.needs_swap();
            watch(store, target, pid, ordinal, needs_swap, cancel, |old, new| {
                let _ = writeln!(output, "{old} -> {new}");
            })?;
        }

        "dump" => {
            let mut parts = rest.splitn(2, ' ');
            let addr_str = parts.next().unwrap_or_default();
            let len_str = parts.next().unwrap_or("256");
            let addr = u64::from_str_radix(addr_str.trim_start_matches("0x"), 16)
                .context("dump address must be hex")?;
            let len: usize = len_str.parse().context("dump length must be an integer")?;
            let pid = session.pid().context("no target attached")?;
            let mut buf = vec![0u8; len];
            target.read_bytes(pid, addr, &mut buf)?;
            write!(output, "{}", dump(addr, &buf, options.dump_with_ascii))?;
        }

        "write" => {
            let mut parts = rest.splitn(3, ' ');
            let addr_str = parts.next().unwrap_or_default();
            let width_str = parts.next().unwrap_or_default();
            let value_str = parts.next().unwrap_or_default();
            let addr = u64::from_str_radix(addr_str.trim_start_matches("0x"), 16)
                .context("write address must be hex")?;
            let value: i64 = value_str.parse().context("write value must be an integer")?;
            let pid = session.pid().context("no target attached")?;
            let bytes: Vec<u8> = match width_str {
                "1" => vec![value as u8],
                "2" => (value as u16).to_ne_bytes().to_vec(),
                "4" => (value as u32).to_ne_bytes().to_vec(),
                "8" => (value as u64).to_ne_bytes().to_vec(),
                _ => bail!("write width must be 1, 2, 4, or 8"),
            };
            target.write_bytes(pid, addr, &bytes)?;
            writeln!(output, "ok")?;
        }

        "shell" => {
            if rest.is_empty() {
                bail!("usage: shell <command>");
            }
            let status = std::process::Command::new("sh").arg("-c").arg(rest).status();
            match status {
                Ok(status) => writeln!(output, "exited with {status}")?,
                Err(err) => writeln!(output, "error: {err}")?,
            }
        }

        other => bail!("unknown command {other:?} (try `help`)"),
    }
    Ok(Control::Continue)
}

fn report_outcome<W: Write>(output: &mut W, outcome: memscan_session::ScanOutcome) -> Result<()> {
    if outcome.cancelled {
        writeln!(output, "scan cancelled, {} matches found so far", outcome.num_matches)?;
    } else {
        writeln!(output, "{} matches found", outcome.num_matches)?;
    }
    Ok(())
}

/// Scan-expression commands overlap syntactically with everything else
/// (`=`, `100`, `"text"` aren't reserved words), so anything that isn't
/// one of the named commands above and fails to parse as a scan
/// expression falls through to the `unknown command` error instead.
fn is_scan_expression(command: &str, rest: &str) -> bool {
    let full = if rest.is_empty() {
        command.to_string()
    } else {
        format!("{command} {rest}")
    };
    let first = full.chars().next();
    matches!(first, Some(c) if c.is_ascii_digit() || "=!<>+-\".".contains(c))
        || full.eq_ignore_ascii_case("any")
        || full == "a"
}

fn parse_selection(selection_str: &str, num_matches: usize) -> Result<Selection> {
    if selection_str.eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }
    Ok(Selection::Ids(parse_selection_ids(selection_str, num_matches)?))
}

fn parse_selection_ids(selection_str: &str, num_matches: usize) -> Result<Vec<usize>> {
    if selection_str.eq_ignore_ascii_case("all") {
        return Ok((0..num_matches).collect());
    }
    selection_str
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().parse::<usize>().context("match ordinals must be integers"))
        .collect()
}
