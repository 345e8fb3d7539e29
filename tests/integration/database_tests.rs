//! Tag database against simulated flash: provisioning, lookup bounds,
//! recovery and fault handling.

use mopguard::adapters::config_store::FlashConfigStore;
use mopguard::adapters::memory_flash::MemoryFlash;
use mopguard::app::commands::{AppCommand, CommandReply};
use mopguard::app::ports::{ConfigPort, FlashError};
use mopguard::app::service::AppService;
use mopguard::compliance::ComplianceEngine;
use mopguard::config::SystemConfig;
use mopguard::diagnostics::Diagnostics;
use mopguard::error::Error;
use mopguard::storage::layout::RFID_REGION;
use mopguard::storage::record::Record;
use mopguard::storage::{EntityType, RegionCounts, RfidRecord, TagDatabase};

use crate::mock_hw::{RecordingNotify, RecordingSink, provisioned_flash, tag};

fn numbered(i: u32) -> RfidRecord {
    RfidRecord {
        tag: tag(&format!("{i:06}")),
        entity: EntityType::Wall,
        id: (i % 50 + 1) as u16,
    }
}

#[test]
fn thousand_tags_resolve_within_log_bound() {
    let mut db = TagDatabase::open(MemoryFlash::new(), None).unwrap();
    for i in 0..1000 {
        db.insert_rfid(&numbered(i)).unwrap();
    }
    for i in (0..1000).step_by(37) {
        let lookup = db.find_tag(&numbered(i).tag).unwrap();
        assert!(lookup.search.found);
        assert_eq!(lookup.search.index, i);
        assert!(!lookup.search.capped);
        assert!(lookup.search.iterations <= 11, "{} probes", lookup.search.iterations);
    }
    let miss = db.find_tag(&tag("999999")).unwrap();
    assert!(!miss.search.found);
    assert!(miss.record.is_none());
}

#[test]
fn records_survive_reopen_and_config_blob() {
    let mut store = FlashConfigStore::new(provisioned_flash());
    let config = SystemConfig {
        mop_debounce_reads: 4,
        ..Default::default()
    };
    store.save(&config).unwrap();
    assert_eq!(store.load().unwrap().mop_debounce_reads, 4);

    let db = TagDatabase::open(store.into_inner(), None).unwrap();
    assert_eq!(
        db.counts(),
        RegionCounts {
            rfid: 6,
            room: 2,
            mop: 2
        }
    );
    let wall = db.find_tag(&tag("W06")).unwrap().record.unwrap();
    assert_eq!(wall.entity, EntityType::Wall);
    assert_eq!(wall.id, 6);
    assert_eq!(db.find_room(5).unwrap().record.unwrap().allowed_colors, 0x02);
}

#[test]
fn read_fault_is_absorbed_by_tag_handling() {
    let mut db = TagDatabase::open(provisioned_flash(), None).unwrap();
    db.flash_mut().set_read_fault(true);
    assert_eq!(
        db.find_tag(&tag("W05")).unwrap_err(),
        Error::Flash(FlashError::IoError)
    );

    let mut engine = ComplianceEngine::new(&SystemConfig::default());
    let mut diag = Diagnostics::new();
    let out = engine.handle_tag(tag("W05"), &db, 1, &mut diag);
    assert!(out.events.is_empty());
    assert_eq!(diag.flash_errors, 1);
    assert_eq!(engine.room_id(), 0);
}

#[test]
fn externally_written_unsorted_region_is_detected() {
    let mut flash = MemoryFlash::new();
    let mut buf = [0u8; 32];
    for (slot, i) in [3u32, 1, 2].into_iter().enumerate() {
        numbered(i).encode(&mut buf);
        let addr = RFID_REGION.addr(slot as u32).unwrap();
        flash.poke(addr, &buf[..RfidRecord::STRIDE]).unwrap();
    }

    let mut app = AppService::new(SystemConfig::default(), flash, None).unwrap();
    assert_eq!(app.diagnostics().order_violations, 1);

    let reply = app
        .handle_command(
            AppCommand::VerifyDatabase,
            &mut RecordingSink::new(),
            &mut RecordingNotify::default(),
        )
        .unwrap();
    assert_eq!(reply, CommandReply::OrderViolations(1));

    // Lookups stay bounded even though they may miss.
    let lookup = app.database().find_tag(&numbered(1).tag).unwrap();
    assert!(lookup.search.iterations <= 3);
}

#[test]
fn provisioning_through_commands() {
    let mut app = AppService::new(SystemConfig::default(), MemoryFlash::new(), None).unwrap();
    let mut sink = RecordingSink::new();
    let mut notify = RecordingNotify::default();

    for i in 0..3 {
        let reply = app
            .handle_command(AppCommand::InsertRfid(numbered(i)), &mut sink, &mut notify)
            .unwrap();
        assert_eq!(reply, CommandReply::Inserted(i));
    }
    let err = app
        .handle_command(AppCommand::InsertRfid(numbered(1)), &mut sink, &mut notify)
        .unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    let reply = app
        .handle_command(AppCommand::SearchTag(numbered(2).tag), &mut sink, &mut notify)
        .unwrap();
    match reply {
        CommandReply::Search { result, record } => {
            assert!(result.found);
            assert_eq!(result.index, 2);
            assert_eq!(record, Some(numbered(2)));
        }
        other => panic!("unexpected reply {other:?}"),
    }
}
