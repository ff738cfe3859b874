//! DST tests for batch fan-out
//!
//! TigerStyle: Every key lands in exactly one bucket; one key's failure never
//! affects another.

use smartcache_core::{ActorConfig, BatchConfig, EntityKey};
use smartcache_dst::{FaultConfig, FaultType, SimConfig, Simulation};
use std::collections::HashSet;

const SCALE_KEYS_COUNT: usize = 1_000;

fn emails(prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}{}@example.com", prefix, i))
        .collect()
}

fn looks_like_email(s: &str) -> bool {
    s.contains('@') && s.contains('.')
}

#[test]
fn test_dst_batch_partitions_outcomes() {
    let config = SimConfig::from_env_or_random();

    let result = Simulation::new(config).run(|env| async move {
        let runtime = env.runtime()?;
        runtime.add(&EntityKey::new("old@example.com")?).await?;

        let keys = vec![
            "new@example.com".to_string(),
            "old@example.com".to_string(),
            "not-an-email".to_string(),
            "new@example.com".to_string(),
        ];
        let result = runtime
            .add_many_with(&keys, looks_like_email)
            .await?
            .sorted();

        assert_eq!(result.added, vec!["new@example.com"]);
        assert_eq!(result.already_breached, vec!["old@example.com"]);
        assert_eq!(result.invalid, vec!["not-an-email"]);
        assert!(result.failed.is_empty());
        assert_eq!(result.total(), 3, "duplicates collapse");

        Ok(())
    });

    assert!(result.is_ok(), "Test failed: {:?}", result.err());
}

#[test]
fn test_dst_batch_failure_isolation() {
    let config = SimConfig::from_env_or_random();
    const FAILED_COUNT: u64 = 3;

    let result = Simulation::new(config)
        .with_fault(
            FaultConfig::new(FaultType::StorageWriteFail, 1.0)
                .with_filter("storage_write")
                .max_triggers(FAILED_COUNT),
        )
        .run(|env| async move {
            let runtime = env.runtime()?;
            let keys = emails("iso", 10);

            let result = runtime.add_many(&keys).await?;
            assert_eq!(result.failed.len(), FAILED_COUNT as usize);
            assert_eq!(result.added.len(), keys.len() - FAILED_COUNT as usize);
            assert_eq!(result.total(), keys.len());

            for failure in &result.failed {
                let key = EntityKey::new(failure.key.as_str())?;
                assert!(!env.store.contains(&key));
                assert!(!runtime.is_breached(&key).await?);
            }
            for added in &result.added {
                assert!(env.store.contains(&EntityKey::new(added.as_str())?));
            }

            // Failed keys can be retried once the store recovers
            let retry: Vec<String> = result.failed.iter().map(|f| f.key.clone()).collect();
            let retried = runtime.add_many(&retry).await?;
            assert_eq!(retried.added.len(), retry.len());

            Ok(())
        });

    assert!(result.is_ok(), "Test failed: {:?}", result.err());
}

#[test]
fn test_dst_batch_at_scale() {
    let config = SimConfig::from_env_or_random().with_actor_config(ActorConfig {
        collection_age_ms: 60_000,
        ..Default::default()
    });

    let result = Simulation::new(config).run(|env| async move {
        let runtime = env.runtime()?;
        let keys = emails("scale", SCALE_KEYS_COUNT);

        let first = runtime.add_many(&keys).await?;
        assert_eq!(first.added.len(), SCALE_KEYS_COUNT);
        let unique: HashSet<&String> = first.added.iter().collect();
        assert_eq!(unique.len(), SCALE_KEYS_COUNT);
        assert_eq!(runtime.stats().active_count, SCALE_KEYS_COUNT);

        let second = runtime.add_many(&keys).await?;
        assert_eq!(second.already_breached.len(), SCALE_KEYS_COUNT);
        assert!(second.added.is_empty());

        env.advance_time_ms(60_000);
        assert_eq!(runtime.sweep_idle(), SCALE_KEYS_COUNT);
        assert_eq!(runtime.stats().active_count, 0);

        let checked = runtime.check_many(&keys, looks_like_email).await?;
        assert_eq!(checked.breached.len(), SCALE_KEYS_COUNT);
        assert_eq!(env.store.record_count(), SCALE_KEYS_COUNT);

        Ok(())
    });

    assert!(result.is_ok(), "Test failed: {:?}", result.err());
}

#[test]
fn test_dst_batch_bounded_concurrency() {
    let config = SimConfig::from_env_or_random().with_batch_config(BatchConfig {
        concurrency_max: 4,
        sort_results: true,
        ..Default::default()
    });

    let result = Simulation::new(config).run(|env| async move {
        let runtime = env.runtime()?;
        let keys = emails("bounded", 50);

        let result = runtime.add_many(&keys).await?;
        let mut expected = keys.clone();
        expected.sort();
        assert_eq!(result.added, expected);

        Ok(())
    });

    assert!(result.is_ok(), "Test failed: {:?}", result.err());
}

#[test]
fn test_dst_remove_many_then_check() {
    let config = SimConfig::from_env_or_random();

    let result = Simulation::new(config).run(|env| async move {
        let runtime = env.runtime()?;
        let keys = emails("rm", 10);
        runtime.add_many(&keys).await?;

        let removed = runtime.remove_many(&keys[..5], looks_like_email).await?;
        assert_eq!(removed.removed.len(), 5);

        let checked = runtime.check_many(&keys, looks_like_email).await?.sorted();
        assert_eq!(checked.breached.len(), 5);
        assert_eq!(checked.not_breached.len(), 5);
        assert_eq!(env.store.record_count(), 5);

        Ok(())
    });

    assert!(result.is_ok(), "Test failed: {:?}", result.err());
}
