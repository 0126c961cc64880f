//! Property-based tests using proptest
//!
//! These tests check the invariants the reconciliation loop relies on:
//! enum validation, expand/flatten round-trips, canonicalization
//! idempotence and diff reflexivity.

use dataplex_dcl::dataplex::{
    Asset, AssetResourceSpec, AssetResourceSpecReadAccessModeEnum, AssetResourceSpecTypeEnum,
    DataplexResource, DiscoverySpec, Lake, LakeMetastore, Zone, ZoneResourceSpec,
    ZoneResourceSpecLocationTypeEnum, ZoneTypeEnum,
};
use dataplex_dcl::dcl::canonicalize::self_link_to_name;
use dataplex_dcl::dcl::enums::DclEnum;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn arb_text() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 _-]{0,30}"
}

fn arb_labels() -> impl Strategy<Value = Option<BTreeMap<String, String>>> {
    prop::option::of(prop::collection::btree_map("[a-z][a-z0-9_]{0,10}", "[a-z0-9-]{0,10}", 1..4))
}

fn arb_lake() -> impl Strategy<Value = Lake> {
    (
        "[a-z][a-z0-9-]{0,20}",
        prop::option::of(arb_text()),
        prop::option::of(arb_text()),
        arb_labels(),
        prop::option::of("[a-z]{1,10}".prop_map(|s| format!("projects/p/locations/us-central1/services/{s}"))),
    )
        .prop_map(|(name, display_name, description, labels, service)| Lake {
            display_name,
            description,
            labels,
            metastore: service.map(|s| LakeMetastore {
                service: Some(s),
                ..Default::default()
            }),
            ..Lake::new("my-project", "us-central1", name)
        })
}

fn arb_discovery_spec() -> impl Strategy<Value = DiscoverySpec> {
    (
        any::<bool>(),
        prop::option::of(prop::collection::vec("[a-z*/]{1,12}", 1..3)),
        prop::option::of("[0-9*]{1,2} \\* \\* \\* \\*"),
    )
        .prop_map(|(enabled, include_patterns, schedule)| DiscoverySpec {
            enabled: Some(enabled),
            include_patterns,
            schedule,
            ..Default::default()
        })
}

fn arb_zone() -> impl Strategy<Value = Zone> {
    (
        "[a-z][a-z0-9-]{0,20}",
        prop_oneof![Just("RAW"), Just("CURATED")],
        prop_oneof![Just("SINGLE_REGION"), Just("MULTI_REGION")],
        prop::option::of(arb_text()),
        arb_labels(),
        arb_discovery_spec(),
    )
        .prop_map(|(name, zone_type, location_type, display_name, labels, discovery)| Zone {
            zone_type: Some(ZoneTypeEnum::new(zone_type)),
            resource_spec: Some(ZoneResourceSpec {
                location_type: Some(ZoneResourceSpecLocationTypeEnum::new(location_type)),
                ..Default::default()
            }),
            display_name,
            labels,
            discovery_spec: Some(discovery),
            ..Zone::new("my-project", "us-central1", "sales", name)
        })
}

fn arb_asset() -> impl Strategy<Value = Asset> {
    (
        "[a-z][a-z0-9-]{0,20}",
        prop_oneof![Just("STORAGE_BUCKET"), Just("BIGQUERY_DATASET")],
        prop_oneof![Just("DIRECT"), Just("MANAGED")],
        "[a-z][a-z0-9-]{2,20}",
        prop::option::of(arb_text()),
        arb_discovery_spec(),
    )
        .prop_map(|(name, kind, mode, bucket, description, discovery)| Asset {
            resource_spec: Some(AssetResourceSpec {
                name: Some(format!("projects/my-project/buckets/{bucket}")),
                resource_type: Some(AssetResourceSpecTypeEnum::new(kind)),
                read_access_mode: Some(AssetResourceSpecReadAccessModeEnum::new(mode)),
                ..Default::default()
            }),
            description,
            discovery_spec: Some(discovery),
            ..Asset::new("my-project", "us-central1", "sales", "raw", name)
        })
}

proptest! {
    #[test]
    fn listed_enum_values_validate(idx in 0usize..ZoneTypeEnum::VALUES.len()) {
        let value = ZoneTypeEnum::new(ZoneTypeEnum::VALUES[idx]);
        prop_assert!(value.validate().is_ok());
        prop_assert!(ZoneTypeEnum::new("").validate().is_ok());
    }

    #[test]
    fn unlisted_enum_values_fail(value in "[A-Z_]{1,20}") {
        prop_assume!(!AssetResourceSpecTypeEnum::VALUES.contains(&value.as_str()));
        prop_assert!(AssetResourceSpecTypeEnum::new(value).validate().is_err());
    }

    #[test]
    fn lake_expand_flatten_preserves_user_fields(lake in arb_lake()) {
        let body = lake.expand().expect("expand");
        let back = Lake::flatten(&body);

        prop_assert_eq!(back.name.as_deref().map(self_link_to_name), lake.name.as_deref());
        prop_assert_eq!(&back.display_name, &lake.display_name);
        prop_assert_eq!(&back.description, &lake.description);
        prop_assert_eq!(&back.labels, &lake.labels);
        prop_assert_eq!(
            back.metastore.and_then(|m| m.service),
            lake.metastore.and_then(|m| m.service)
        );
    }

    #[test]
    fn zone_expand_flatten_preserves_user_fields(zone in arb_zone()) {
        let back = Zone::flatten(&zone.expand().expect("expand"));
        prop_assert_eq!(back.name.as_deref().map(self_link_to_name), zone.name.as_deref());
        prop_assert_eq!(&back.zone_type, &zone.zone_type);
        prop_assert_eq!(
            back.resource_spec.and_then(|r| r.location_type),
            zone.resource_spec.and_then(|r| r.location_type)
        );
        let (b, z) = (back.discovery_spec.unwrap_or_default(), zone.discovery_spec.unwrap_or_default());
        prop_assert_eq!(b.enabled, z.enabled);
        prop_assert_eq!(b.include_patterns, z.include_patterns);
        prop_assert_eq!(b.schedule, z.schedule);
    }

    #[test]
    fn zone_canonicalize_desired_is_idempotent(desired in arb_zone(), initial in arb_zone()) {
        let once = Zone::canonicalize_desired(&desired, Some(&initial));
        let twice = Zone::canonicalize_desired(&once, Some(&initial));
        prop_assert_eq!(&once, &twice);

        let fresh = Zone::canonicalize_desired(&desired, None);
        prop_assert_eq!(&Zone::canonicalize_desired(&fresh, None), &fresh);
    }

    #[test]
    fn asset_expand_flatten_preserves_user_fields(asset in arb_asset()) {
        let back = Asset::flatten(&asset.expand().expect("expand"));
        prop_assert_eq!(back.name.as_deref().map(self_link_to_name), asset.name.as_deref());
        prop_assert_eq!(&back.description, &asset.description);
        prop_assert_eq!(&back.resource_spec, &asset.resource_spec);
        let (b, a) = (back.discovery_spec.unwrap_or_default(), asset.discovery_spec.unwrap_or_default());
        prop_assert_eq!(b.enabled, a.enabled);
        prop_assert_eq!(b.include_patterns, a.include_patterns);
        prop_assert_eq!(b.schedule, a.schedule);
    }

    #[test]
    fn asset_canonicalize_desired_is_idempotent(desired in arb_asset(), initial in arb_asset()) {
        let once = Asset::canonicalize_desired(&desired, Some(&initial));
        let twice = Asset::canonicalize_desired(&once, Some(&initial));
        prop_assert_eq!(&once, &twice);

        let fresh = Asset::canonicalize_desired(&desired, None);
        prop_assert_eq!(&Asset::canonicalize_desired(&fresh, None), &fresh);
    }

    #[test]
    fn diff_with_self_is_empty(lake in arb_lake(), zone in arb_zone(), asset in arb_asset()) {
        prop_assert!(Lake::diff(&lake, &lake).is_empty());
        prop_assert!(Zone::diff(&zone, &zone).is_empty());
        prop_assert!(Asset::diff(&asset, &asset).is_empty());
    }

    #[test]
    fn server_echo_converges(zone in arb_zone()) {
        let mut server = Zone::flatten(&zone.expand().expect("expand"));
        server.adopt_identity(&zone);
        server.uid = Some("uid-1".to_string());
        let new_state = Zone::canonicalize_new(server, &zone);
        let desired = Zone::canonicalize_desired(&zone, Some(&new_state));
        prop_assert!(Zone::diff(&desired, &new_state).is_empty());
    }
}

proptest! {
    #[test]
    fn plan_without_diffs_is_empty(zone in arb_zone()) {
        let ops = dataplex_dcl::dataplex::plan::<Zone>(true, &Zone::diff(&zone, &zone), &[]).expect("plan");
        prop_assert!(ops.is_empty());
    }
}
