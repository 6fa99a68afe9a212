//! `/proc/<pid>/maps` parsing into [`memscan_region::Region`] (spec §6
//! `read_maps`).

use std::fs;

use memscan_region::{Permissions, Region, RegionType};

use crate::error::LinuxTargetError;

/// Parses one `/proc/<pid>/maps` line, e.g.
/// `00400000-00452000 r-xp 00000000 08:02 173521 /usr/bin/cat`.
fn parse_line(line: &str, next_id: u32, exe_path: Option<&str>) -> Option<Region> {
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?;
    let _offset = fields.next()?;
    let _dev = fields.next()?;
    let _inode = fields.next()?;
    let pathname = fields.next().unwrap_or("").to_string();

    let (start_str, end_str) = range.split_once('-')?;
    let start = u64::from_str_radix(start_str, 16).ok()?;
    let end = u64::from_str_radix(end_str, 16).ok()?;

    let mut chars = perms.chars();
    let permissions = Permissions {
        read: chars.next() == Some('r'),
        write: chars.next() == Some('w'),
        exec: chars.next() == Some('x'),
    };

    let region_type = classify(&pathname, exe_path);

    Some(Region {
        id: next_id,
        start,
        size: end - start,
        load_addr: start,
        permissions,
        region_type,
        filename: (!pathname.is_empty()).then_some(pathname),
    })
}

fn classify(pathname: &str, exe_path: Option<&str>) -> RegionType {
    if pathname == "[heap]" {
        RegionType::Heap
    } else if pathname.starts_with("[stack") {
        RegionType::Stack
    } else if pathname.is_empty() {
        // Anonymous mappings are the closest Linux analogue of a process's
        // uninitialised-data segment once it has grown past the binary's
        // own .bss; treating them as bss keeps `region_scan_level`'s
        // "heap+stack+exe, then +bss" staging meaningful on Linux.
        RegionType::Bss
    } else if Some(pathname) == exe_path {
        RegionType::Exe
    } else if pathname.starts_with('[') {
        RegionType::Misc
    } else {
        RegionType::Mapped
    }
}

/// Reads and parses `/proc/<pid>/maps`.
pub fn read_maps(pid: i32) -> Result<Vec<Region>, LinuxTargetError> {
    let exe_path = fs::read_link(format!("/proc/{pid}/exe"))
        .ok()
        .and_then(|p| p.to_str().map(str::to_string));

    let path = format!("/proc/{pid}/maps");
    let contents = fs::read_to_string(&path).map_err(|err| LinuxTargetError::Maps {
        pid,
        reason: err.to_string(),
    })?;

    let mut regions = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if let Some(region) = parse_line(line, i as u32 + 1, exe_path.as_deref()) {
            regions.push(region);
        } else {
            tracing::warn!(pid, line, "skipping unparseable /proc/<pid>/maps line");
        }
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_line() {
        let line = "00400000-00452000 r-xp 00000000 08:02 173521 /usr/bin/cat";
        let region = parse_line(line, 1, Some("/usr/bin/cat")).unwrap();
        assert_eq!(region.start, 0x0040_0000);
        assert_eq!(region.size, 0x5_2000);
        assert!(region.permissions.read);
        assert!(!region.permissions.write);
        assert!(region.permissions.exec);
        assert_eq!(region.region_type, RegionType::Exe);
    }

    #[test]
    fn classifies_heap_and_stack_and_anonymous() {
        assert_eq!(classify("[heap]", None), RegionType::Heap);
        assert_eq!(classify("[stack]", None), RegionType::Stack);
        assert_eq!(classify("[stack:1234]", None), RegionType::Stack);
        assert_eq!(classify("", None), RegionType::Bss);
        assert_eq!(classify("[vdso]", None), RegionType::Misc);
        assert_eq!(classify("/lib/x86_64-linux-gnu/libc.so.6", None), RegionType::Mapped);
    }

    #[test]
    fn anonymous_mapping_has_no_filename() {
        let line = "7f1234000000-7f1234021000 rw-p 00000000 00:00 0 ";
        let region = parse_line(line, 2, None).unwrap();
        assert_eq!(region.filename, None);
        assert_eq!(region.region_type, RegionType::Bss);
    }
}
