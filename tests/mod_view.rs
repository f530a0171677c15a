use bson::{Document, doc};
use nexusdriver::operation::{UpdateKind, WriteKind, WriteRequest};
use nexusdriver::testing::MemoryExecutor;
use nexusdriver::{
    Collection, CollectionOptions, DocumentCodec, DriverError, Namespace, ReadPreference, WriteConcern,
};
use std::sync::Arc;
use std::time::Duration;

fn orders(options: CollectionOptions) -> (Arc<MemoryExecutor>, Collection<Document>) {
    let exec = Arc::new(MemoryExecutor::new());
    let ns = Namespace::new("shop", "orders").unwrap();
    let coll = Collection::new(ns, Arc::new(DocumentCodec), options, exec.clone());
    (exec, coll)
}

#[tokio::test]
async fn test_update_and_remove_request_shapes() {
    let (exec, coll) = orders(CollectionOptions::default());
    let view = coll.find_document(doc! { "status": "open" });

    view.update(doc! { "$set": { "seen": true } }).unwrap().await.unwrap();
    view.update_one(doc! { "$inc": { "n": 1 } }).unwrap().await.unwrap();
    view.clone().upsert().replace(&doc! { "status": "closed" }).unwrap().await.unwrap();
    view.remove().await.unwrap();
    view.remove_one().await.unwrap();

    let writes = exec.writes();
    assert_eq!(writes.len(), 5);
    let kinds: Vec<WriteKind> = writes.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WriteKind::Update, WriteKind::Update, WriteKind::Update, WriteKind::Delete, WriteKind::Delete]);

    let filter = doc! { "status": "open" };
    assert_eq!(
        writes[0].requests,
        vec![WriteRequest::Update {
            filter: filter.clone(),
            update: doc! { "$set": { "seen": true } },
            kind: UpdateKind::Update,
            upsert: false,
            multi: true,
        }]
    );
    assert!(!writes[1].requests[0].is_multi());
    assert_eq!(
        writes[2].requests,
        vec![WriteRequest::Update {
            filter: filter.clone(),
            update: doc! { "status": "closed" },
            kind: UpdateKind::Replace,
            upsert: true,
            multi: false,
        }]
    );
    assert_eq!(writes[3].requests, vec![WriteRequest::Delete { filter: filter.clone(), multi: true }]);
    assert_eq!(writes[4].requests, vec![WriteRequest::Delete { filter, multi: false }]);
    assert!(writes.iter().all(|w| w.ordered && w.namespace.full_name() == "shop.orders"));
}

#[tokio::test]
async fn test_unfiltered_writes_match_everything() {
    let (exec, coll) = orders(CollectionOptions::default());
    coll.find_all().remove().await.unwrap();
    assert_eq!(exec.writes()[0].requests, vec![WriteRequest::Delete { filter: Document::new(), multi: true }]);
}

#[tokio::test]
async fn test_find_descriptor_carries_view_state() {
    let options = CollectionOptions { batch_size: 50, ..CollectionOptions::default() }
        .with_read_preference(ReadPreference::SecondaryPreferred);
    let (exec, coll) = orders(options);
    let view = coll
        .find_document(doc! { "qty": { "$gt": 2 } })
        .sort(doc! { "qty": -1 })
        .skip(3)
        .limit(7)
        .fields(doc! { "qty": 1 })
        .max_time(Duration::from_millis(250));

    assert_eq!(view.count().await.unwrap(), 0);
    nexusdriver::AsyncIterable::for_each(&view, |_doc| Ok(())).await.unwrap();

    let (find, rp) = exec.finds().pop().unwrap();
    assert_eq!(rp, ReadPreference::SecondaryPreferred);
    assert_eq!(find.filter, Some(doc! { "qty": { "$gt": 2 } }));
    assert_eq!(find.sort, Some(doc! { "qty": -1 }));
    assert_eq!(find.projection, Some(doc! { "qty": 1 }));
    assert_eq!((find.skip, find.limit, find.batch_size), (3, 7, 50));
    assert_eq!(find.max_time, Some(Duration::from_millis(250)));
    assert!(!find.single_result);

    let (count, _) = exec.counts().pop().unwrap();
    assert_eq!(count.filter, Some(doc! { "qty": { "$gt": 2 } }));
    assert_eq!((count.skip, count.limit), (3, 7));
}

#[tokio::test]
async fn test_builder_calls_after_submission_do_not_leak() {
    let (exec, coll) = orders(CollectionOptions::default());
    let view = coll.find_document(doc! { "a": 1 });
    let pending = view.count();
    let _later = view.skip(10);
    pending.await.unwrap();
    assert_eq!(exec.counts()[0].0.skip, 0);
}

#[tokio::test]
async fn test_empty_documents_fail_before_the_executor() {
    let (exec, coll) = orders(CollectionOptions::default());
    let view = coll.find_document(doc! { "a": 1 });

    assert!(matches!(view.update(Document::new()), Err(DriverError::Argument(_))));
    assert!(matches!(view.update_one(Document::new()), Err(DriverError::Argument(_))));
    assert!(matches!(view.replace(&Document::new()), Err(DriverError::Argument(_))));
    assert!(matches!(coll.insert_many(&mut Vec::<Document>::new()), Err(DriverError::Argument(_))));
    assert!(exec.writes().is_empty());
}

#[tokio::test]
async fn test_write_concern_is_forwarded() {
    let options = CollectionOptions::default().with_write_concern(WriteConcern::UNACKNOWLEDGED);
    let (exec, coll) = orders(options);
    let result = coll.find_all().remove_one().await.unwrap();
    assert!(!result.acknowledged);
    assert_eq!(exec.writes()[0].write_concern, WriteConcern::UNACKNOWLEDGED);
}

#[tokio::test]
async fn test_executor_failure_arrives_through_the_completion() {
    let exec = Arc::new(MemoryExecutor::new().failing_writes(DriverError::Server { code: 11000, message: "dup".into() }));
    let coll = Collection::new(Namespace::parse("shop.orders").unwrap(), Arc::new(DocumentCodec), CollectionOptions::default(), exec);
    let pending = coll.find_all().update(doc! { "$set": { "x": 1 } }).unwrap();
    assert_eq!(pending.await, Err(DriverError::Server { code: 11000, message: "dup".into() }));
}
