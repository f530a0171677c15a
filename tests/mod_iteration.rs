use bson::{Document, doc};
use nexusdriver::testing::MemoryExecutor;
use nexusdriver::{AsyncIterable, Collection, CollectionOptions, DocumentCodec, DriverError, Namespace, SerdeCodec};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn numbers(n: i32) -> Vec<Document> {
    (0..n).map(|i| doc! { "n": i }).collect()
}

fn collection(exec: MemoryExecutor) -> (Arc<MemoryExecutor>, Collection<Document>) {
    let exec = Arc::new(exec);
    let ns = Namespace::new("stats", "numbers").unwrap();
    (Arc::clone(&exec), Collection::new(ns, Arc::new(DocumentCodec), CollectionOptions::default(), exec))
}

fn n_of(d: &Document) -> i32 {
    d.get_i32("n").unwrap()
}

#[tokio::test]
async fn test_for_each_visits_every_document_in_order() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(7)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    coll.find_all().for_each(move |d| {
        sink.lock().push(n_of(&d));
        Ok(())
    })
    .await
    .unwrap();
    assert_eq!(*seen.lock(), (0..7).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_for_each_stops_at_the_failing_document() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(10)));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let outcome = coll
        .find_all()
        .for_each(move |d| {
            let n = n_of(&d);
            sink.lock().push(n);
            if n == 4 { Err(DriverError::Operation("stop at 4".into())) } else { Ok(()) }
        })
        .await;
    assert_eq!(outcome, Err(DriverError::Operation("stop at 4".into())));
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_panicking_action_becomes_an_iteration_error() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(3)));
    let outcome = coll
        .find_all()
        .for_each(|d| {
            assert!(n_of(&d) < 1, "too big");
            Ok(())
        })
        .await;
    assert!(matches!(outcome, Err(DriverError::Iteration(msg)) if msg.contains("too big")));
}

#[tokio::test]
async fn test_one_uses_a_single_result_read() {
    let (exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(5)));
    let first = coll.find_all().skip(2).one().await.unwrap();
    assert_eq!(first, Some(doc! { "n": 2 }));
    let (op, _) = exec.finds().pop().unwrap();
    assert!(op.single_result);
    assert_eq!(op.skip, 2);
}

#[tokio::test]
async fn test_one_on_no_match_is_none() {
    let (_exec, coll) = collection(MemoryExecutor::new());
    assert_eq!(coll.find_document(doc! { "n": 99 }).one().await, Ok(None));
}

#[tokio::test]
async fn test_collect_into_preserves_order_and_appends() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(5)));
    let all = coll.find_all().collect_into(vec![doc! { "n": -1 }]).await.unwrap();
    assert_eq!(all.iter().map(n_of).collect::<Vec<_>>(), vec![-1, 0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_map_is_applied_at_consumption() {
    let (exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(4)));
    let doubled = coll.find_all().limit(3).map(|d| n_of(&d) * 2);
    assert!(exec.finds().is_empty());
    assert_eq!(doubled.collect_into(Vec::new()).await.unwrap(), vec![0, 2, 4]);
    assert_eq!(doubled.one().await.unwrap(), Some(0));
    assert!(exec.finds().last().unwrap().0.single_result);
}

#[tokio::test]
async fn test_find_failure_reaches_every_consumer() {
    let err = DriverError::Server { code: 13, message: "unauthorized".into() };
    let (_exec, coll) = collection(MemoryExecutor::new().failing_find(err.clone()));
    let view = coll.find_all();
    assert_eq!(view.one().await, Err(err.clone()));
    assert_eq!(view.collect_into(Vec::new()).await, Err(err.clone()));
    assert_eq!(view.for_each(|_| Ok(())).await, Err(err));
}

#[tokio::test]
async fn test_cursor_failure_after_some_batches() {
    let err = DriverError::Operation("cursor not found".into());
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(5)).failing_cursor(err.clone()));
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    let outcome = coll
        .find_all()
        .for_each(move |_| {
            *counter.lock() += 1;
            Ok(())
        })
        .await;
    assert_eq!(outcome, Err(err));
    assert_eq!(*count.lock(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deferred_batches_complete_off_thread() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(9)).deferred());
    let view = coll.find_all().batch_size(2);
    let all = view.collect_into(Vec::new()).await.unwrap();
    assert_eq!(all.iter().map(n_of).collect::<Vec<_>>(), (0..9).collect::<Vec<_>>());
    assert_eq!(view.count().await.unwrap(), 9);
    assert_eq!(view.one().await.unwrap(), Some(doc! { "n": 0 }));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    n: i32,
}

#[tokio::test]
async fn test_typed_views_decode_and_report_bad_documents() {
    let exec = Arc::new(MemoryExecutor::new().with_documents(vec![doc! { "n": 1 }, doc! { "n": "x" }]));
    let coll: Collection<Reading> = Collection::new(
        Namespace::new("stats", "readings").unwrap(),
        Arc::new(SerdeCodec::<Reading>::new()),
        CollectionOptions::default(),
        exec,
    );
    let view = coll.find(&Reading { n: 1 }).unwrap();
    assert_eq!(view.state().filter, Some(doc! { "n": 1 }));
    assert_eq!(view.one().await, Ok(Some(Reading { n: 1 })));
    assert!(matches!(view.collect_into(Vec::new()).await, Err(DriverError::Decoding(_))));
}

#[tokio::test]
async fn test_panicking_map_fails_one_like_for_each() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(3)));
    let mapped = coll.find_all().map(|_| -> i32 { panic!("transform boom") });
    let err = DriverError::Iteration("transform boom".into());
    assert_eq!(mapped.for_each(|_| Ok(())).await, Err(err.clone()));
    assert_eq!(mapped.one().await, Err(err));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_map_fails_one_when_deferred() {
    let (_exec, coll) = collection(MemoryExecutor::new().with_documents(numbers(3)).deferred());
    let mapped = coll.find_all().map(|_| -> i32 { panic!("transform boom") });
    let outcome = tokio::time::timeout(std::time::Duration::from_secs(2), mapped.one()).await;
    assert_eq!(outcome.unwrap(), Err(DriverError::Iteration("transform boom".into())));
}
