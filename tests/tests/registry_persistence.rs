//! Registry scenarios across simulated power cycles.
//!
//! A `MemFlash` stands in for the device's flash; "rebooting" means
//! building a fresh registry control block over the same flash image.

use switchyard_abi::Error;
use switchyard_registry::{FlashStore, MemFlash, NODE_WORDS, Registry, RegistryLayout};
use switchyard_tests::hosted;

// 16 directory nodes (96 words) followed by 160 words of data.
const LAYOUT: RegistryLayout = RegistryLayout::new(0, 16, 96, 160);
type DeviceFlash = MemFlash<256>;

fn boot(flash: &DeviceFlash) -> Registry<'_> {
    hosted::install();
    let registry = Registry::new(flash, LAYOUT);
    registry.init().unwrap();
    registry
}

fn read(registry: &Registry<'_>, key: &[u8]) -> Result<Vec<u8>, Error> {
    let mut buf = [0u8; 128];
    let len = registry.try_get_value(key, &mut buf)?;
    Ok(buf[..len].to_vec())
}

#[test]
fn test_persistence_across_reboot() {
    let flash = DeviceFlash::new();
    {
        let registry = boot(&flash);
        registry.add(b"k1", b"v1").unwrap();
        registry.add(b"k2", b"v2").unwrap();
        registry.delete(b"k1").unwrap();
    }

    let registry = boot(&flash);
    assert_eq!(read(&registry, b"k1"), Err(Error::NotFound));
    assert_eq!(read(&registry, b"k2").unwrap(), b"v2");
}

#[test]
fn test_duplicate_rejection_preserves_first_value() {
    let flash = DeviceFlash::new();
    let registry = boot(&flash);

    registry.add(b"k", b"v1").unwrap();
    assert_eq!(registry.add(b"k", b"v2"), Err(Error::Duplicate));
    assert_eq!(read(&registry, b"k").unwrap(), b"v1");
}

#[test]
fn test_many_records_roundtrip() {
    let flash = DeviceFlash::new();
    let registry = boot(&flash);

    let entries: [(&[u8], &[u8]); 5] = [
        (b"wifi.ssid", b"workshop"),
        (b"wifi.channel", b"11"),
        (b"display.rotation", b"180"),
        (b"telemetry.interval_s", b"60"),
        (b"device.name", b"bench-unit-3"),
    ];
    for (key, value) in entries {
        registry.add(key, value).unwrap();
    }
    for (key, value) in entries {
        assert_eq!(read(&registry, key).unwrap(), value);
    }

    let info = registry.get_info().unwrap();
    assert_eq!(info.in_use_nodes, 5);
    assert_eq!(info.free_nodes, LAYOUT.node_count - 5);
}

#[test]
fn test_update_is_delete_then_add() {
    let flash = DeviceFlash::new();
    {
        let registry = boot(&flash);
        registry.add(b"boot.count", b"1").unwrap();
        registry.delete(b"boot.count").unwrap();
        registry.add(b"boot.count", b"2").unwrap();
    }

    let registry = boot(&flash);
    assert_eq!(read(&registry, b"boot.count").unwrap(), b"2");
}

#[test]
fn test_crash_before_commit_is_invisible_after_reboot() {
    let flash = DeviceFlash::new();
    {
        let registry = boot(&flash);
        registry.add(b"good", b"committed").unwrap();
    }

    // Simulate a crash mid-add on the next node: span words programmed,
    // ready flag never written (node words: ready, delete, then the four
    // span words).
    let node_base = LAYOUT.node_start + NODE_WORDS;
    flash.write_word(node_base + 2, 1000).unwrap();
    flash.write_word(node_base + 3, 4).unwrap();
    flash.write_word(node_base + 4, 1008).unwrap();
    flash.write_word(node_base + 5, 4).unwrap();

    let registry = boot(&flash);
    assert_eq!(read(&registry, b"good").unwrap(), b"committed");

    // The wreck is skipped, not resurrected, and new adds go past it.
    registry.add(b"next", b"entry").unwrap();
    assert_eq!(read(&registry, b"next").unwrap(), b"entry");
    let info = registry.get_info().unwrap();
    assert_eq!(info.in_use_nodes, 2);
    assert_eq!(info.free_nodes, LAYOUT.node_count - 3);
}

#[test]
fn test_clean_all_wipes_the_device() {
    let flash = DeviceFlash::new();
    let registry = boot(&flash);

    registry.add(b"a", b"1").unwrap();
    registry.add(b"b", b"2").unwrap();
    registry.clean_all().unwrap();

    let info = registry.get_info().unwrap();
    assert_eq!(info.in_use_nodes, 0);
    assert_eq!(info.free_nodes, info.total_nodes);
    assert_eq!(info.free_data_bytes, info.total_data_bytes);
    assert_eq!(info.in_use_data_bytes, 0);

    // And it stays empty across a reboot.
    drop(registry);
    let registry = boot(&flash);
    assert_eq!(read(&registry, b"a"), Err(Error::NotFound));
}

#[test]
fn test_flash_use_is_strictly_appending() {
    let flash = DeviceFlash::new();
    let registry = boot(&flash);

    registry.add(b"first", b"aaaa").unwrap();
    let after_first = registry.get_info().unwrap();
    registry.delete(b"first").unwrap();
    registry.add(b"second", b"bbbb").unwrap();
    let after_second = registry.get_info().unwrap();

    // Deleting reclaims nothing; the second record appended.
    assert!(after_second.free_data_bytes < after_first.free_data_bytes);
    assert_eq!(read(&registry, b"second").unwrap(), b"bbbb");
}
