use crate::config::Config;
use crate::hid::{matches_onlykey, HidApiBackend, HidBackend};

pub fn check(cfg: &Config) -> anyhow::Result<()> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: hidraw nodes readable
    #[cfg(target_os = "linux")]
    {
        let nodes: Vec<_> = std::fs::read_dir("/dev")
            .map(|dir| {
                dir.filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.to_string_lossy().starts_with("/dev/hidraw"))
                    .collect()
            })
            .unwrap_or_default();
        if !nodes.is_empty()
            && !nodes
                .iter()
                .any(|p| std::fs::OpenOptions::new().read(true).write(true).open(p).is_ok())
        {
            errors.push(format!(
                "none of {} /dev/hidraw* node(s) can be opened read/write\n  \
                 → install the OnlyKey udev rule: 49-onlykey.rules\n  \
                 → then replug the key",
                nodes.len()
            ));
        }
    }

    // Check 2: HID API and device presence
    match HidApiBackend::new().and_then(|mut b| b.enumerate()) {
        Ok(devices) => {
            if !devices.iter().any(matches_onlykey) {
                errors.push(format!(
                    "no OnlyKey among {} HID device(s)\n  \
                     → plug the key in and unlock it with your PIN",
                    devices.len()
                ));
            }
        }
        Err(e) => errors.push(format!("cannot initialise HID API: {e}")),
    }

    // Check 3: claim directory
    let lock_dir = cfg.session_config().lock_dir;
    match &lock_dir {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                errors.push(format!(
                    "cannot create lock directory {}: {e}\n  \
                     → pass --lock-dir <writable dir>",
                    dir.display()
                ));
            }
        }
        None => errors.push("no lock directory available\n  → pass --lock-dir <writable dir>".to_string()),
    }

    if errors.is_empty() {
        println!("OK: OnlyKey reachable");
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}
