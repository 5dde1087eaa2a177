use serial_test::serial;

use emma_ia_transfer::config::env_flag;
use emma_ia_transfer::store::{bucket_name, prefix_of, KeyPrefix};
use emma_ia_transfer::submission::{submission_id, Role};

#[test]
fn bucket_names_follow_the_deployment_convention() {
    assert_eq!(bucket_name("ia", "production"), "emma-ia-queue-production");
    assert_eq!(bucket_name("ht", "staging"), "emma-ht-queue-staging");
    assert_eq!(bucket_name("emma", "production"), "emma-storage-production");
}

#[test]
fn bucket_names_fold_case() {
    assert_eq!(bucket_name("IA", "Production"), "emma-ia-queue-production");
    assert_eq!(bucket_name("EMMA", "STAGING"), "emma-storage-staging");
}

#[test]
fn unrecognised_repository_matches_descriptive_names_by_substring() {
    assert_eq!(
        bucket_name("internetarchive", "staging"),
        "emma-ia-queue-staging"
    );
    assert_eq!(
        bucket_name("hathitrust", "production"),
        "emma-ht-queue-production"
    );
    assert_eq!(
        bucket_name("unknown", "staging"),
        "emma-unknown-queue-staging",
        "a code matching no descriptive name is used literally"
    );
}

#[test]
fn empty_selectors_fall_back_to_defaults() {
    assert_eq!(bucket_name("", ""), "emma-ia-queue-production");
}

#[test]
fn key_prefixes_are_empty_or_slash_terminated() {
    assert_eq!(prefix_of("sub1.xml"), "");
    assert_eq!(prefix_of("archive/sub1.xml"), "archive/");
    assert_eq!(prefix_of("a/b/sub1.xml"), "a/b/");
}

#[test]
fn key_prefix_filter_states() {
    assert!(KeyPrefix::Any.accepts("a/b/c.xml"));
    assert!(KeyPrefix::TopLevel.accepts("c.xml"));
    assert!(!KeyPrefix::TopLevel.accepts("a/c.xml"));
    assert!(KeyPrefix::Under("a".into()).accepts("a/c.xml"));
    assert!(KeyPrefix::Under("a/".into()).accepts("a/c.xml"));
    assert!(!KeyPrefix::Under("a".into()).accepts("a/b/c.xml"));
    assert!(!KeyPrefix::Under("a".into()).accepts("c.xml"));
    assert!(
        KeyPrefix::Under(String::new()).accepts("c.xml"),
        "an empty prefix filter means top-level only"
    );
}

#[test]
fn submission_ids_strip_the_trailing_extension() {
    assert_eq!(submission_id("sub1.xml"), "sub1");
    assert_eq!(submission_id("sub1.pdf"), "sub1");
    assert_eq!(submission_id("archive/item.tar.gz"), "archive/item.tar");
    assert_eq!(submission_id("noextension"), "noextension");
    assert_eq!(submission_id("trailingdot."), "trailingdot.");
}

#[test]
fn package_classification_is_case_sensitive() {
    assert_eq!(Role::of("sub1.xml"), Role::Package);
    assert_eq!(Role::of("sub1.XML"), Role::DataFile);
    assert_eq!(Role::of("sub1.pdf"), Role::DataFile);
}

#[test]
#[serial]
fn env_flags_accept_the_usual_spellings() {
    for value in ["1", "yes", "TRUE", "On"] {
        std::env::set_var("TRANSFER_TEST_FLAG", value);
        assert!(env_flag("TRANSFER_TEST_FLAG", false), "{value} should read true");
    }
    for value in ["0", "no", "FALSE", "off"] {
        std::env::set_var("TRANSFER_TEST_FLAG", value);
        assert!(!env_flag("TRANSFER_TEST_FLAG", true), "{value} should read false");
    }
    std::env::set_var("TRANSFER_TEST_FLAG", "maybe");
    assert!(env_flag("TRANSFER_TEST_FLAG", true));
    std::env::remove_var("TRANSFER_TEST_FLAG");
    assert!(!env_flag("TRANSFER_TEST_FLAG", false));
}
