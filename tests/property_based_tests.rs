use inventory_propagation::propagation::{identity_attributes, BatchPaginator};
use inventory_propagation::testing::{numbered_records, InMemoryRecordStore};
use inventory_propagation::{DeviceStatus, MigrationVersion, RecordFilter, TenantStoreId};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

fn identity_payload_strategy() -> impl Strategy<Value = BTreeMap<String, serde_json::Value>> {
    let value = prop_oneof![
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-z0-9:]{0,12}".prop_map(serde_json::Value::from),
        any::<bool>().prop_map(serde_json::Value::from),
        Just(serde_json::Value::Null),
    ];
    prop::collection::btree_map("[a-z_]{1,10}", value, 0..16)
}

proptest! {
    /// Property: attributes come out sorted by name whatever the input order
    #[test]
    fn mapped_attributes_are_sorted_and_order_independent(payload in identity_payload_strategy()) {
        let forward = identity_attributes(payload.iter()).unwrap();
        let reversed = identity_attributes(payload.iter().rev()).unwrap();

        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(forward.len(), payload.len());
        prop_assert!(forward.windows(2).all(|pair| pair[0].name < pair[1].name));
        prop_assert!(forward.iter().all(|a| a.scope == "identity"));
    }

    /// Property: every value decodes back to what was mapped
    #[test]
    fn mapped_values_are_json(payload in identity_payload_strategy()) {
        for attribute in identity_attributes(payload.iter()).unwrap() {
            let decoded: serde_json::Value = serde_json::from_str(&attribute.value).unwrap();
            prop_assert_eq!(&decoded, &payload[&attribute.name]);
        }
    }

    /// Property: a walk visits each record exactly once, in store order
    #[test]
    fn paginator_visits_every_record_once(count in 0usize..300, limit in 1u64..64) {
        let store_id = TenantStoreId::for_tenant("deviceauth", "t1");
        let records = numbered_records("dev", count, DeviceStatus::Accepted);
        let store = InMemoryRecordStore::new().with_tenant_store(store_id.clone(), records.clone());

        let (visited, pages) = block_on(async {
            let mut paginator = BatchPaginator::new(&store, &store_id, RecordFilter::all(), limit);
            let mut visited = Vec::new();
            while let Some(page) = paginator.next_page().await.unwrap() {
                assert!(!page.is_empty());
                assert!(page.len() as u64 <= limit);
                visited.extend(page.into_iter().map(|r| r.id));
            }
            (visited, paginator.pages_fetched())
        });

        let expected: Vec<String> = records.into_iter().map(|r| r.id).collect();
        prop_assert_eq!(&visited, &expected);
        prop_assert_eq!(visited.iter().collect::<HashSet<_>>().len(), count);
        // the final page is short, or an empty page follows an exact multiple
        prop_assert_eq!(pages as u64, count as u64 / limit + 1);
    }

    /// Property: formatted versions parse back to themselves
    #[test]
    fn migration_versions_parse_their_display(
        major in 0u32..1000,
        minor in 0u32..1000,
        patch in 0u32..1000,
    ) {
        let version = MigrationVersion::new(major, minor, patch);
        prop_assert_eq!(MigrationVersion::parse(&version.to_string()).unwrap(), version);
    }

    /// Property: labels with a non-digit component never parse
    #[test]
    fn migration_versions_reject_non_numeric(label in "[0-9]{1,3}\\.[a-z]{1,3}\\.[0-9]{1,3}") {
        prop_assert!(MigrationVersion::parse(&label).is_err());
    }
}
