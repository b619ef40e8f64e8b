use keyed_di::{DiError, KeyedResolver, KeyedServiceCollectionExt, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Something {
    id: u32,
}

#[test]
fn can_decorate_service_registered_with_key() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("blub", "blub".to_string()).unwrap();
    services.add_keyed_singleton("bløb", "bløb".to_string()).unwrap();
    services
        .decorate_keyed::<String, _>("blub", |_, s| Arc::new(format!("DECORATED{}", s)))
        .unwrap();

    let provider = services.build();

    assert_eq!(&*provider.get_by_key::<String>("blub").unwrap(), "DECORATEDblub");
    assert_eq!(&*provider.get_by_key::<String>("bløb").unwrap(), "bløb");
}

#[test]
fn can_decorate_all_services_registered_with_key() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("blub", "blub".to_string()).unwrap();
    services.add_keyed_singleton("bløb", "bløb".to_string()).unwrap();
    services
        .decorate_all_keyed::<String, _>(|_, s| Arc::new(format!("DECORATED{}", s)))
        .unwrap();

    let provider = services.build();

    assert_eq!(&*provider.get_by_key::<String>("blub").unwrap(), "DECORATEDblub");
    assert_eq!(&*provider.get_by_key::<String>("bløb").unwrap(), "DECORATEDbløb");
}

#[test]
fn decorate_all_leaves_later_keys_alone() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("blub", "blub".to_string()).unwrap();
    services
        .decorate_all_keyed::<String, _>(|_, s| Arc::new(format!("DECORATED{}", s)))
        .unwrap();
    services.add_keyed_singleton("late", "late".to_string()).unwrap();

    let provider = services.build();

    assert_eq!(&*provider.get_by_key::<String>("blub").unwrap(), "DECORATEDblub");
    assert_eq!(&*provider.get_by_key::<String>("late").unwrap(), "late");
}

#[test]
fn decorators_apply_in_registration_order() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("key", "x".to_string()).unwrap();
    services
        .decorate_keyed::<String, _>("key", |_, s| Arc::new(format!("d1({})", s)))
        .unwrap()
        .decorate_keyed::<String, _>("key", |_, s| Arc::new(format!("d2({})", s)))
        .unwrap();

    let provider = services.build();

    assert_eq!(&*provider.get_by_key::<String>("key").unwrap(), "d2(d1(x))");
}

#[test]
fn can_handle_keyed_things() {
    let a = Arc::new(Something { id: 1 });
    let b = Arc::new(Something { id: 2 });
    let c = Arc::new(Something { id: 3 });

    let mut services = ServiceCollection::new();
    let (ra, rb, rc) = (a.clone(), b.clone(), c.clone());
    services
        .add_keyed_singleton_trait_factory::<Something, _>("c", move |_| rc.clone())
        .unwrap()
        .add_keyed_singleton_trait_factory::<Something, _>("a", move |_| ra.clone())
        .unwrap()
        .add_keyed_singleton_trait_factory::<Something, _>("b", move |_| rb.clone())
        .unwrap();

    let provider = services.build();

    assert!(Arc::ptr_eq(&provider.get_by_key::<Something>("a").unwrap(), &a));
    assert!(Arc::ptr_eq(&provider.get_by_key::<Something>("b").unwrap(), &b));
    assert!(Arc::ptr_eq(&provider.get_by_key::<Something>("c").unwrap(), &c));
}

#[test]
fn factories_can_use_the_resolver_for_further_lookups() {
    struct Settings {
        prefix: &'static str,
    }

    let mut services = ServiceCollection::new();
    services.add_singleton(Settings { prefix: "tenant" });
    services
        .add_keyed_singleton_factory("a", |r| format!("{}-a", r.get_required::<Settings>().prefix))
        .unwrap();
    services
        .add_keyed_singleton_factory("b", |r| {
            let a = r.get_required_by_key::<String>("a");
            format!("{}+b", a)
        })
        .unwrap();

    let provider = services.build();

    assert_eq!(&*provider.get_by_key::<String>("b").unwrap(), "tenant-a+b");
}

#[test]
fn does_not_behave_as_if_it_was_transient() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = constructed.clone();

    let mut services = ServiceCollection::new();
    services
        .add_keyed_singleton_factory("thing", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Something { id: 7 }
        })
        .unwrap();

    let provider = services.build();

    let first = provider.get_by_key::<Something>("thing").unwrap();
    let second = provider.get_by_key::<Something>("thing").unwrap();
    let third = provider.clone().get_by_key::<Something>("thing").unwrap();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
}

#[test]
fn decorating_one_key_leaves_other_keys_untouched() {
    let decorated = Arc::new(AtomicUsize::new(0));
    let seen = decorated.clone();

    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("a", 1u32).unwrap();
    services.add_keyed_singleton("b", 2u32).unwrap();
    services
        .decorate_keyed::<u32, _>("a", move |_, v| {
            seen.fetch_add(1, Ordering::SeqCst);
            Arc::new(*v * 100)
        })
        .unwrap();

    let provider = services.build();

    assert_eq!(*provider.get_by_key::<u32>("b").unwrap(), 2);
    assert_eq!(decorated.load(Ordering::SeqCst), 0);
    assert_eq!(*provider.get_by_key::<u32>("a").unwrap(), 100);
    assert_eq!(decorated.load(Ordering::SeqCst), 1);
}

#[test]
fn keyed_types_are_isolated_from_each_other() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("port", 8080u16).unwrap();
    services.add_keyed_singleton("port", 9090u32).unwrap();

    let provider = services.build();

    assert_eq!(*provider.get_by_key::<u16>("port").unwrap(), 8080);
    assert_eq!(*provider.get_by_key::<u32>("port").unwrap(), 9090);
}

#[test]
fn duplicate_key_is_rejected_and_original_stays_usable() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("primary", "first".to_string()).unwrap();

    let err = services
        .add_keyed_singleton("primary", "second".to_string())
        .err()
        .unwrap();
    assert_eq!(
        err,
        DiError::DuplicateKey {
            service: std::any::type_name::<String>(),
            key: "primary".to_string(),
        }
    );

    let provider = services.build();
    assert_eq!(&*provider.get_by_key::<String>("primary").unwrap(), "first");
}

#[test]
fn resolving_unregistered_type_fails() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("x", 1u8).unwrap();
    let provider = services.build();

    match provider.get_by_key::<Something>("x") {
        Err(DiError::RegistryNotFound { service, key }) => {
            assert!(service.contains("Something"));
            assert_eq!(key, "x");
        }
        other => panic!("expected RegistryNotFound, got {:?}", other.map(|s| s.id)),
    }
}

#[test]
fn resolving_unknown_key_fails() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("known", 1u8).unwrap();
    let provider = services.build();

    let err = provider.get_by_key::<u8>("unknown").unwrap_err();
    assert_eq!(
        err,
        DiError::KeyNotFound {
            service: "u8",
            key: "unknown".to_string(),
        }
    );
    assert_eq!(err.to_string(), "Could not find a registered instance of u8 with key 'unknown'");
}

#[test]
fn decorating_before_any_registration_fails() {
    let mut services = ServiceCollection::new();

    let err = services
        .decorate_keyed::<String, _>("blub", |_, s| s)
        .err()
        .unwrap();
    assert!(matches!(err, DiError::RegistryNotRegistered { key: Some(ref k), .. } if k == "blub"));

    let err = services.decorate_all_keyed::<String, _>(|_, s| s).err().unwrap();
    assert!(matches!(err, DiError::RegistryNotRegistered { key: None, .. }));
}

#[test]
fn decorating_unknown_key_fails() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("blub", "blub".to_string()).unwrap();

    let err = services
        .decorate_keyed::<String, _>("missing", |_, s| s)
        .err()
        .unwrap();
    assert!(matches!(err, DiError::DecorateUnknownKey { ref key, .. } if key == "missing"));
}

#[test]
fn decorating_after_resolution_is_rejected() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("blub", "blub".to_string()).unwrap();
    services.add_keyed_singleton("bløb", "bløb".to_string()).unwrap();
    let provider = services.build();

    let before = provider.get_by_key::<String>("blub").unwrap();
    let registry = provider.keyed_services::<String>().unwrap();

    let err = registry
        .decorate("blub", |_, s| Ok(Arc::new(format!("late{}", s))))
        .unwrap_err();
    assert!(matches!(err, DiError::KeyAlreadyRequested { ref key, .. } if key == "blub"));

    // All-or-nothing: the unresolved key is not decorated either.
    let err = registry
        .decorate_all(|_, s| Ok(Arc::new(format!("late{}", s))))
        .unwrap_err();
    assert!(matches!(err, DiError::KeyAlreadyRequested { .. }));

    let after = provider.get_by_key::<String>("blub").unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(&*provider.get_by_key::<String>("bløb").unwrap(), "bløb");
}

#[test]
fn key_stays_frozen_after_a_failed_request() {
    let mut services = ServiceCollection::new();
    services
        .add_keyed_singleton_try_factory::<Something, _>("broken", |_| {
            Err(DiError::Construction("no route to host".to_string()))
        })
        .unwrap();
    let provider = services.build();

    assert!(provider.get_by_key::<Something>("broken").is_err());

    let registry = provider.keyed_services::<Something>().unwrap();
    assert!(!registry.is_resolved("broken"));

    let err = registry.decorate("broken", |_, s| Ok(s)).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Cannot decorate {} with key 'broken': the key has already been requested",
            std::any::type_name::<Something>()
        )
    );
}

#[test]
fn failed_construction_is_not_memoized() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let mut services = ServiceCollection::new();
    services
        .add_keyed_singleton_try_factory("flaky", move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DiError::Construction("connection refused".to_string()))
            } else {
                Ok(Something { id: 42 })
            }
        })
        .unwrap();

    let provider = services.build();

    let err = provider.get_by_key::<Something>("flaky").unwrap_err();
    assert_eq!(err, DiError::Construction("connection refused".to_string()));

    let first = provider.get_by_key::<Something>("flaky").unwrap();
    let second = provider.get_by_key::<Something>("flaky").unwrap();
    assert_eq!(first.id, 42);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn keyed_registry_is_created_once_per_type() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("a", 1i64).unwrap();
    services.add_keyed_singleton("b", 2i64).unwrap();
    services.add_keyed_singleton("c", 3i64).unwrap();

    assert_eq!(services.len(), 1);

    let provider = services.build();
    let registry = provider.keyed_services::<i64>().unwrap();
    assert_eq!(registry.keys(), vec!["a", "b", "c"]);
    assert!(!registry.is_resolved("a"));

    provider.get_by_key::<i64>("a").unwrap();
    assert!(registry.is_resolved("a"));
    assert!(!registry.is_resolved("b"));
    assert!(provider.keyed_services::<i32>().is_none());
}

#[test]
#[should_panic(expected = "Failed to resolve u8 with key 'missing'")]
fn get_required_by_key_panics_with_context() {
    let mut services = ServiceCollection::new();
    services.add_keyed_singleton("present", 1u8).unwrap();
    let provider = services.build();

    provider.get_required_by_key::<u8>("missing");
}

#[test]
fn value_types_and_trait_objects_share_one_api() {
    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Danish;
    impl Greeter for Danish {
        fn greet(&self) -> String {
            "hej".to_string()
        }
    }

    struct Loud(Arc<dyn Greeter>);
    impl Greeter for Loud {
        fn greet(&self) -> String {
            self.0.greet().to_uppercase()
        }
    }

    let mut services = ServiceCollection::new();
    services
        .add_keyed_singleton_trait_factory::<dyn Greeter, _>("en", |_| Arc::new(English))
        .unwrap()
        .add_keyed_singleton_trait_factory::<dyn Greeter, _>("da", |_| Arc::new(Danish))
        .unwrap()
        .decorate_keyed::<dyn Greeter, _>("da", |_, inner| Arc::new(Loud(inner)))
        .unwrap()
        .add_keyed_singleton("answer", 42u64)
        .unwrap();

    let provider = services.build();

    assert_eq!(provider.get_by_key::<dyn Greeter>("en").unwrap().greet(), "hello");
    assert_eq!(provider.get_by_key::<dyn Greeter>("da").unwrap().greet(), "HEJ");
    assert_eq!(*provider.get_by_key::<u64>("answer").unwrap(), 42);
}
