use super::*;
use time::OffsetDateTime;
use time::macros::datetime;

fn frame(id: &str, code: Option<&str>, created_on: OffsetDateTime) -> Frame {
    Frame {
        frame_id: id.into(),
        project_id: "p1".into(),
        name: None,
        design_code: code.map(str::to_owned),
        created_on,
    }
}

fn sample() -> VersionList {
    VersionList::from_frames(vec![
        frame("100", Some("<p>1</p>"), datetime!(2025-01-01 10:00 UTC)),
        frame("300", Some("<p>3</p>"), datetime!(2025-01-03 10:00 UTC)),
        frame("200", None, datetime!(2025-01-02 10:00 UTC)),
    ])
}

#[test]
fn sorted_is_newest_first_with_id_tiebreak() {
    let mut list = sample();
    list.insert(frame("250", None, datetime!(2025-01-03 10:00 UTC))).unwrap();
    let ids: Vec<_> = list.sorted().iter().map(|f| f.frame_id.as_str()).collect();
    assert_eq!(ids, ["300", "250", "200", "100"]);
}

#[test]
fn completed_skips_placeholders() {
    let list = sample();
    let ids: Vec<_> = list.completed().iter().map(|f| f.frame_id.as_str()).collect();
    assert_eq!(ids, ["300", "100"]);
    assert_eq!(list.completed_count(), 2);
    assert_eq!(list.next_version_name(), "Version 3");
    assert_eq!(list.latest().map(|f| f.frame_id.as_str()), Some("300"));
    assert_eq!(list.latest_completed().map(|f| f.frame_id.as_str()), Some("300"));
}

#[test]
fn upgrade_happens_once() {
    let mut list = sample();
    let upgraded = list.upgrade("200", "<p>2</p>").unwrap();
    assert_eq!(upgraded.name.as_deref(), Some("Version 3"));
    assert_eq!(upgraded.design_code.as_deref(), Some("<p>2</p>"));

    assert_eq!(list.upgrade("200", "<p>again</p>"), Err(VersionError::AlreadyUpgraded("200".into())));
    assert_eq!(list.get("200").and_then(|f| f.design_code.as_deref()), Some("<p>2</p>"));
    assert_eq!(list.upgrade("999", "x"), Err(VersionError::NotFound("999".into())));
}

#[test]
fn blank_code_counts_as_placeholder() {
    let mut list = VersionList::new();
    list.insert(frame("1", Some("   "), datetime!(2025-01-01 0:00 UTC))).unwrap();
    assert_eq!(list.completed_count(), 0);
    assert!(list.upgrade("1", "<p></p>").is_ok());
}

#[test]
fn display_name_falls_back_to_position() {
    let mut list = sample();
    let newest = list.get("300").cloned().unwrap();
    let oldest = list.get("100").cloned().unwrap();
    assert_eq!(list.display_name(&newest), "Version 2");
    assert_eq!(list.display_name(&oldest), "Version 1");

    list.upgrade("200", "<p>2</p>").unwrap();
    let named = list.get("200").cloned().unwrap();
    assert_eq!(list.display_name(&named), "Version 3");
}

#[test]
fn insert_rejects_duplicates_and_remove_returns_frame() {
    let mut list = sample();
    let dup = frame("100", None, datetime!(2025-02-01 0:00 UTC));
    assert_eq!(list.insert(dup), Err(VersionError::Duplicate("100".into())));
    assert_eq!(list.remove("100").map(|f| f.frame_id), Some("100".into()));
    assert_eq!(list.remove("100"), None);
    assert_eq!(list.len(), 2);
}
