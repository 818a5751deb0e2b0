mod common;

use std::time::Instant;

use common::*;
use onlykey_hid::{Error, Session};

#[test]
fn test_absent_device_exhausts_retries() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = ScriptedBackend::new(vec![keyboard()]);
    let config = fast_config(Some(dir.path().to_path_buf()));
    let delay = config.connect_delay;

    let start = Instant::now();
    let res = Session::connect(&mut backend, config);
    let elapsed = start.elapsed();

    match res {
        Err(Error::TransportUnavailable { attempts, reason }) => {
            assert_eq!(attempts, 5);
            assert!(reason.contains("No OnlyKey"), "reason: {reason}");
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("connected to a missing device"),
    }
    assert_eq!(backend.enumerations, 5);
    assert!(elapsed >= delay * 4, "elapsed {elapsed:?}");
}

#[test]
fn test_connect_succeeds_once_device_appears() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = ScriptedBackend::new(vec![keyboard(), onlykey("/dev/hidraw7")]);
    backend.absent_for = 2;

    let session = Session::connect(&mut backend, fast_config(Some(dir.path().to_path_buf()))).unwrap();
    assert_eq!(session.device_path(), Some("/dev/hidraw7"));
    assert_eq!(backend.enumerations, 3);
    session.close();
}

#[test]
fn test_second_session_on_same_device_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let mut first_backend = ScriptedBackend::new(vec![onlykey("/dev/hidraw7")]);
    let first = Session::connect(&mut first_backend, fast_config(Some(dir.path().to_path_buf()))).unwrap();

    let mut second_backend = ScriptedBackend::new(vec![onlykey("/dev/hidraw7")]);
    let res = Session::connect(&mut second_backend, fast_config(Some(dir.path().to_path_buf())));
    assert!(matches!(res, Err(Error::DeviceBusy(ref p)) if p == "/dev/hidraw7"));
    // No retries on a busy device.
    assert_eq!(second_backend.enumerations, 1);

    first.close();
    let again = Session::connect(&mut second_backend, fast_config(Some(dir.path().to_path_buf())));
    assert!(again.is_ok());
}

#[test]
fn test_connect_without_lock_dir_skips_claim() {
    let mut a = ScriptedBackend::new(vec![onlykey("/dev/hidraw2")]);
    let mut b = ScriptedBackend::new(vec![onlykey("/dev/hidraw2")]);
    let _first = Session::connect(&mut a, fast_config(None)).unwrap();
    assert!(Session::connect(&mut b, fast_config(None)).is_ok());
}
