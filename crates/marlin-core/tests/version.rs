use marlin_core::version::{self, Version, VersionGeneric, VersionNumber};

#[test]
fn canonical_semantic_strings_round_trip() {
    for s in [
        "1",
        "1.2",
        "1.2.3",
        "1.2.3-SNAPSHOT",
        "32.1.3-jre",
        "5.4.2.Final",
        "2.0.0-rc.1",
        "1.0-20240615.143022-42",
    ] {
        let parsed = VersionNumber::parse(s).unwrap_or_else(|| panic!("{s} should be semantic"));
        assert_eq!(parsed.to_string(), s);
        assert_eq!(Version::parse(s).to_string(), s);
    }
}

#[test]
fn generic_display_is_original_text() {
    assert_eq!(Version::parse("1.0a1").to_string(), "1.0a1");
}

#[test]
fn documented_orderings() {
    assert!(Version::parse("1.2.3") < Version::parse("1.2.4"));
    let alpha = VersionGeneric::parse("1.0-alpha");
    let release = VersionGeneric::parse("1.0");
    let sp = VersionGeneric::parse("1.0-sp");
    assert!(alpha < release);
    assert!(release < sp);
    assert_eq!(VersionGeneric::parse("1.0.0"), VersionGeneric::parse("1"));
}

#[test]
fn snapshot_detection() {
    assert!(Version::parse("1.0-SNAPSHOT").is_snapshot());
    assert!(Version::parse("1.0-snapshot").is_snapshot());
    assert!(!Version::parse("1.0").is_snapshot());
    assert!(Version::parse("1.0a-SNAPSHOT.x").is_snapshot());
}

#[test]
fn unknown_sentinel() {
    assert!(Version::UNKNOWN.is_unknown());
    assert!(Version::default().is_unknown());
    assert!(!Version::parse("0.1").is_unknown());
    assert!(Version::UNKNOWN < Version::parse("0.0.1"));
}

#[test]
fn explicit_zero_is_a_real_version() {
    assert!(!Version::parse("0").is_unknown());
    assert!(!Version::parse("0.0").is_unknown());
    assert!(!Version::parse("0-alpha").is_unknown());
    assert!(Version::parse("").is_unknown());
}

#[test]
fn semantic_and_token_orderings_differ_on_service_packs() {
    assert!(Version::parse("1.0-sp") < Version::parse("1.0"));
    assert!(Version::parse("1.0").to_generic() < Version::parse("1.0-sp").to_generic());
}

fn mixed_release_train() -> Vec<Version> {
    (0..7)
        .flat_map(|m| {
            [
                format!("2.{m}RC1"),
                format!("2.{m}-RC2"),
                format!("2.{m}-GA"),
                format!("2.{m}.1"),
                format!("2.{m}.Final"),
                format!("2.{m}CR3"),
            ]
        })
        .map(|s| Version::parse(&s))
        .collect()
}

#[test]
fn sorting_mixed_shapes_is_stable_under_any_input_order() {
    let mut expected = mixed_release_train();
    assert_eq!(expected.len(), 42);
    version::sort_versions(&mut expected);
    let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();

    let base = mixed_release_train();
    for step in [1, 5, 11, 13, 17, 19, 23, 25, 29, 31, 37, 41] {
        for offset in 0..base.len() {
            // `step` is coprime with 42, so this visits every index once.
            let mut shuffled: Vec<Version> = (0..base.len())
                .map(|i| base[(offset + i * step) % base.len()].clone())
                .collect();
            version::sort_versions(&mut shuffled);
            let got: Vec<String> = shuffled.iter().map(ToString::to_string).collect();
            assert_eq!(got, expected, "step {step}, offset {offset}");
        }
    }

    let first = &expected[..6];
    assert_eq!(first, ["2.0RC1", "2.0-RC2", "2.0CR3", "2.0-GA", "2.0.Final", "2.0.1"]);
}

#[test]
fn max_of_mixed_list() {
    let versions: Vec<Version> = ["1.0", "1.10", "1.9", "1.10-rc1", "1.2a1"]
        .into_iter()
        .map(Version::parse)
        .collect();
    let max = versions.iter().max().unwrap();
    assert_eq!(max.to_string(), "1.10");
}
