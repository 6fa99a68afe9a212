//! Spawns a real child process, attaches via ptrace, and round-trips a
//! write through its address space. Skipped (not failed) when the
//! sandbox denies `CAP_SYS_PTRACE`, which is common in containers.
#![cfg(target_os = "linux")]

use std::process::{Child, Command};
use std::time::Duration;

use memscan_session::TargetIo;
use memscan_target_linux::LinuxTarget;

struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[test]
fn attach_read_write_roundtrip() {
    let child = Command::new("sleep")
        .arg("5")
        .spawn()
        .expect("spawning `sleep` for the test target");
    let mut guard = KillOnDrop(child);
    let pid = guard.0.id() as i32;
    std::thread::sleep(Duration::from_millis(50));

    let mut target = LinuxTarget::new();
    if let Err(err) = target.attach(pid) {
        eprintln!("skipping: ptrace attach unavailable in this sandbox ({err})");
        return;
    }

    let regions = match target.read_maps(pid) {
        Ok(r) => r,
        Err(err) => {
            eprintln!("skipping: could not read maps ({err})");
            let _ = target.detach(pid);
            return;
        }
    };
    let writable = regions.iter().find(|r| r.permissions.write && r.size >= 8);
    let Some(region) = writable else {
        eprintln!("skipping: no writable region found");
        let _ = target.detach(pid);
        return;
    };

    let mut original = [0u8; 8];
    target
        .read_bytes(pid, region.start, &mut original)
        .expect("reading the original bytes");

    // Round-trip: write back exactly what was read, so the child's state
    // is unaffected, then confirm the read-after-write agrees.
    target
        .write_bytes(pid, region.start, &original)
        .expect("writing the bytes back");
    let mut after = [0u8; 8];
    target
        .read_bytes(pid, region.start, &mut after)
        .expect("reading the bytes back");
    assert_eq!(original, after);

    target.detach(pid).expect("detaching");
}
