// Runs against a live Redis. Point REDIS_URL at a scratch database and run
// `cargo test -- --ignored`.

use std::time::Duration;

use levelq::{Element, LevelStore, PriorityQueue, QueueConfig, QueueError, RedisStore};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

async fn fresh_queue(base_key: &str, levels: i64) -> PriorityQueue<RedisStore> {
    let store = RedisStore::connect(&redis_url(), base_key, levels).await.unwrap();
    store.purge().await.unwrap();
    let config = QueueConfig::new(base_key, levels)
        .with_regular_interval(Duration::from_secs(3600))
        .with_poll_interval(Duration::from_secs(3600))
        .with_threshold_count(u64::MAX);
    PriorityQueue::new(config, store).unwrap()
}

async fn pop_id(q: &PriorityQueue<RedisStore>) -> Option<String> {
    q.pop::<String>().await.unwrap().map(|e| e.id)
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_push_pop_order() {
    let q = fresh_queue("test:levelq:pushpop", 3).await;
    q.push(1, &Element::new("a", "A-value")).await.unwrap();
    q.push(2, &Element::new("b", "B-value")).await.unwrap();
    q.push(1, &Element::new("c", "C-value")).await.unwrap();

    assert_eq!(pop_id(&q).await.as_deref(), Some("a"));
    assert_eq!(pop_id(&q).await.as_deref(), Some("c"));
    assert_eq!(pop_id(&q).await.as_deref(), Some("b"));
    assert_eq!(pop_id(&q).await, None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_count_before() {
    let q = fresh_queue("test:levelq:countbefore", 3).await;
    for (level, id) in [(1, "a"), (1, "b"), (2, "c"), (3, "d")] {
        q.push(level, &Element::new(id, format!("{id}-value"))).await.unwrap();
    }
    q.refresh().await.unwrap();

    let mut ranks = Vec::new();
    for id in ["a", "b", "c", "d"] {
        ranks.push(q.count_before(id).await.unwrap());
    }
    // default term adds levels 1..=L from the snapshot [2, 3, 4]
    assert_eq!(ranks, vec![2, 3, 3, 4]);

    assert!(matches!(q.count_before("nonexistent").await, Err(QueueError::NotFound(_))));
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_pull_is_lazy() {
    let q = fresh_queue("test:levelq:pull", 2).await;
    q.push(1, &Element::new("a", "A-value")).await.unwrap();
    q.push(1, &Element::new("b", "B-value")).await.unwrap();
    q.pull("a").await.unwrap();

    assert!(matches!(q.count_before("a").await, Err(QueueError::NotFound(_))));
    assert_eq!(q.store().lengths().await.unwrap(), vec![2, 0]);
    assert_eq!(q.count_before("b").await.unwrap(), 0);

    assert_eq!(pop_id(&q).await.as_deref(), Some("b"));
    assert_eq!(pop_id(&q).await, None);
    assert_eq!(q.len(1).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_ids_with_separators_survive() {
    let q = fresh_queue("test:levelq:separators", 1).await;
    let id = "tenant:42:job:7";
    q.push(1, &Element::new(id, "x:y:z")).await.unwrap();
    assert!(q.contains(id).await.unwrap());

    let elem = q.pop::<String>().await.unwrap().unwrap();
    assert_eq!(elem, Element::new(id, "x:y:z".to_string()));
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_pulled_record_stays_dead_across_levels() {
    let q = fresh_queue("test:levelq:relevel", 2).await;
    q.push(1, &Element::new("a", "first")).await.unwrap();
    q.pull("a").await.unwrap();
    // level 2 hands out seq 1 again
    q.push(2, &Element::new("a", "second")).await.unwrap();

    let elem = q.pop::<String>().await.unwrap().unwrap();
    assert_eq!(elem.value, "second");
    assert_eq!(pop_id(&q).await, None);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn redis_repush_into_lower_level_supersedes() {
    let q = fresh_queue("test:levelq:demote", 2).await;
    q.push(1, &Element::new("a", "old")).await.unwrap();
    q.push(2, &Element::new("a", "new")).await.unwrap();
    q.push(1, &Element::new("b", "B")).await.unwrap();

    let pos = q.store().count_within_level("b").await.unwrap().unwrap();
    assert_eq!((pos.level, pos.ahead), (1, 0));

    let elem = q.pop::<String>().await.unwrap().unwrap();
    assert_eq!(elem, Element::new("b", "B".to_string()));
    let elem = q.pop::<String>().await.unwrap().unwrap();
    assert_eq!(elem, Element::new("a", "new".to_string()));
    assert_eq!(pop_id(&q).await, None);
}
