use emma_ia_transfer::metadata::MetadataValue;
use emma_ia_transfer::package::parse_package;
use emma_ia_transfer::translate::{identifier_fields, split_file_level, translate};

fn text(value: &str) -> MetadataValue {
    MetadataValue::Text(value.to_string())
}

fn list(values: &[&str]) -> MetadataValue {
    MetadataValue::List(values.iter().map(|v| v.to_string()).collect())
}

#[test]
fn parse_extracts_root_fields() {
    let xml = br#"<sip>
        <dc_title>Delivering on the Promise</dc_title>
        <dc_identifier>isbn:9781234567890</dc_identifier>
    </sip>"#;

    let metadata = parse_package(xml).expect("well-formed package should parse");

    assert_eq!(metadata.get("dc_title"), Some(&text("Delivering on the Promise")));
    assert_eq!(metadata.get("dc_identifier"), Some(&text("isbn:9781234567890")));
    assert_eq!(metadata.len(), 2, "only the two present fields should appear");
}

#[test]
fn parse_strips_namespace_prefixes() {
    let xml = br#"<emma:sip xmlns:emma="http://example.org/emma">
        <emma:dc_title>Prefixed</emma:dc_title>
    </emma:sip>"#;

    let metadata = parse_package(xml).expect("namespaced package should parse");

    assert_eq!(metadata.get("dc_title"), Some(&text("Prefixed")));
}

#[test]
fn parse_maps_exact_true_false_to_flags() {
    let xml = br#"<sip>
        <rem_complete>true</rem_complete>
        <emma_restricted>FALSE</emma_restricted>
        <dc_title>True Stories</dc_title>
    </sip>"#;

    let metadata = parse_package(xml).expect("package should parse");

    assert_eq!(metadata.get("rem_complete"), Some(&MetadataValue::Flag(true)));
    assert_eq!(
        metadata.get("emma_restricted"),
        Some(&MetadataValue::Flag(false)),
        "a false flag is data, not absence, and must be retained"
    );
    assert_eq!(
        metadata.get("dc_title"),
        Some(&text("True Stories")),
        "only exact true/false text becomes a flag"
    );
}

#[test]
fn parse_collects_child_elements_into_sequences() {
    let xml = br#"<sip>
        <dc_identifier>
            <value>isbn:111</value>
            <value>oclc:222</value>
            <empty></empty>
        </dc_identifier>
    </sip>"#;

    let metadata = parse_package(xml).expect("package should parse");

    assert_eq!(
        metadata.get("dc_identifier"),
        Some(&list(&["isbn:111", "oclc:222"])),
        "blank children are dropped from the sequence"
    );
}

#[test]
fn parse_omits_blank_fields() {
    let xml = br#"<sip>
        <dc_description></dc_description>
        <dc_subject/>
        <dc_title>Kept</dc_title>
    </sip>"#;

    let metadata = parse_package(xml).expect("package should parse");

    assert!(!metadata.contains_key("dc_description"));
    assert!(!metadata.contains_key("dc_subject"));
    assert_eq!(metadata.len(), 1);
}

#[test]
fn parse_tolerates_empty_document() {
    let metadata = parse_package(b"").expect("empty document is not an error");
    assert!(metadata.is_empty());
}

#[test]
fn parse_rejects_malformed_xml() {
    assert!(parse_package(b"<sip><dc_title>broken</sip>").is_err());
}

#[test]
fn translate_renames_direct_fields() {
    let mut source = emma_ia_transfer::metadata::MetadataMap::new();
    source.insert("dc_title".into(), text("Foo"));
    source.insert("dc_creator".into(), text("Bar, Baz"));
    source.insert("emma_repositoryRecordId".into(), text("emma-12345"));

    let result = translate(&source).expect("valid metadata should translate");

    assert_eq!(result.get("title"), Some(&text("Foo")));
    assert_eq!(result.get("creator"), Some(&text("Bar, Baz")));
    assert_eq!(result.get("identifier"), Some(&text("emma-12345")));
}

#[test]
fn translate_drops_unrecognised_fields_and_blanks() {
    let mut source = emma_ia_transfer::metadata::MetadataMap::new();
    source.insert("emma_mystery".into(), text("ignored"));
    source.insert("dc_title".into(), text(""));

    let result = translate(&source).expect("translation is total over odd input");

    assert!(
        result.is_empty(),
        "no target field may appear without a present, recognised source field"
    );
}

#[test]
fn translate_maps_media_type_values() {
    let mut source = emma_ia_transfer::metadata::MetadataMap::new();
    source.insert("dc_type".into(), text("text"));

    let result = translate(&source).expect("known dc_type should translate");
    assert_eq!(result.get("mediatype"), Some(&text("texts")));

    source.insert("dc_type".into(), text("hologram"));
    assert!(
        translate(&source).is_err(),
        "a dc_type outside the fixed table is a contract violation"
    );
}

#[test]
fn translate_inverts_completion_into_portion() {
    let mut source = emma_ia_transfer::metadata::MetadataMap::new();

    source.insert("rem_complete".into(), MetadataValue::Flag(true));
    let result = translate(&source).expect("flag input translates");
    assert_eq!(
        result.get("portion"),
        Some(&MetadataValue::Flag(false)),
        "a complete submission is not a portion"
    );

    source.insert("rem_complete".into(), text("FALSE"));
    let result = translate(&source).expect("text input translates");
    assert_eq!(result.get("portion"), Some(&MetadataValue::Flag(true)));
}

#[test]
fn identifier_schemes_rename_and_accumulate_in_order() {
    let identifiers = list(&["oclc:123", "isbn:456", "oclc:789", "doi:10.1/x"]);

    let result = identifier_fields(Some(&identifiers));

    assert_eq!(result.get("ocld-id"), Some(&list(&["123", "789"])));
    assert_eq!(result.get("isbn"), Some(&list(&["456"])));
    assert_eq!(
        result.get("doi"),
        Some(&list(&["10.1/x"])),
        "unknown schemes pass through unchanged"
    );
}

#[test]
fn identifier_without_scheme_separator_keeps_whole_value_as_scheme() {
    let result = identifier_fields(Some(&text("bareword")));
    assert_eq!(result.get("bareword"), Some(&list(&[""])));
}

#[test]
fn example_scenario_isbn_only() {
    // A package with a title and one ISBN identifier but no repository
    // record id translates without producing a target identifier.
    let xml = br#"<sip>
        <dc_title>Foo</dc_title>
        <dc_identifier>isbn:12345</dc_identifier>
    </sip>"#;

    let metadata = parse_package(xml).expect("package should parse");
    let result = translate(&metadata).expect("metadata should translate");

    assert_eq!(result.get("title"), Some(&text("Foo")));
    assert_eq!(result.get("isbn"), Some(&list(&["12345"])));
    assert!(
        !result.contains_key("identifier"),
        "no identifier field may appear without emma_repositoryRecordId"
    );
}

#[test]
fn split_separates_file_level_fields_from_title_entry() {
    let mut source = emma_ia_transfer::metadata::MetadataMap::new();
    source.insert("dc_title".into(), text("Foo"));
    source.insert("emma_repositoryRecordId".into(), text("emma-1"));
    source.insert("rem_status".into(), text("remediated"));
    source.insert("rem_complete".into(), MetadataValue::Flag(false));

    let translated = translate(&source).expect("metadata should translate");
    let (title, file) = split_file_level(&translated);

    assert!(title.contains_key("title"));
    assert!(title.contains_key("identifier"));
    assert!(file.contains_key("remediation_status"));
    assert!(file.contains_key("portion"));
    assert!(!file.contains_key("title"));
    assert!(!title.contains_key("portion"));
}
