use std::{collections::HashSet, sync::Arc};
use txwatch_connector::{
    model::{Address, Transaction},
    storage::{InMemoryStorage, Storage},
};

fn transfer(hash: &str, from: &str, to: &str) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: from.into(),
        to: to.into(),
        value: "100".to_string(),
        block_number: "1".to_string(),
    }
}

#[tokio::test]
async fn subscription_is_idempotent_and_permanent() {
    let storage = InMemoryStorage::new();
    let address = Address::new("0xAddress1");

    storage.add_address(&address).await.unwrap();
    storage.add_address(&address).await.unwrap();

    assert!(storage.is_subscribed(&address).await.unwrap());
    assert!(storage.is_subscribed(&"0xADDRESS1".into()).await.unwrap());
    assert_eq!(storage.subscribed_addresses().await.unwrap(), vec![address]);
}

#[tokio::test]
async fn unknown_address_is_not_subscribed() {
    let storage = InMemoryStorage::new();
    assert!(!storage.is_subscribed(&"0xAddress2".into()).await.unwrap());
}

#[tokio::test]
async fn unknown_address_has_an_empty_log() {
    let storage = InMemoryStorage::new();
    assert!(storage
        .get_transactions(&"0xNobody".into())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn logs_preserve_insertion_order_per_address() {
    let storage = InMemoryStorage::new();
    let a = Address::new("0xAddress1");
    let b = Address::new("0xAddress2");
    let first = transfer("0xTxHash1", "0xAddress1", "0xAddress2");
    let second = transfer("0xTxHash2", "0xAddress3", "0xAddress1");

    storage.add_transaction(&a, first.clone()).await.unwrap();
    storage.add_transaction(&b, first.clone()).await.unwrap();
    storage.add_transaction(&a, second.clone()).await.unwrap();

    assert_eq!(storage.get_transactions(&a).await.unwrap(), vec![first.clone(), second]);
    assert_eq!(storage.get_transactions(&b).await.unwrap(), vec![first]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_are_all_kept_exactly_once() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 250;

    let storage = Arc::new(InMemoryStorage::new());
    let address = Address::new("0xHot");

    let tasks: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let storage = storage.clone();
            let address = address.clone();
            tokio::spawn(async move {
                for i in 0..PER_WRITER {
                    let tx = transfer(&format!("0x{writer}-{i}"), "0xHot", "0xOther");
                    storage.add_transaction(&address, tx).await.unwrap();
                }
            })
        })
        .collect();
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    let log = storage.get_transactions(&address).await.unwrap();
    assert_eq!(log.len(), WRITERS * PER_WRITER);
    let unique: HashSet<_> = log.iter().map(|tx| tx.hash.as_str()).collect();
    assert_eq!(unique.len(), WRITERS * PER_WRITER);

    // Each writer's own entries keep their relative order.
    for writer in 0..WRITERS {
        let prefix = format!("0x{writer}-");
        let seen: Vec<usize> = log
            .iter()
            .filter_map(|tx| tx.hash.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        assert_eq!(seen, (0..PER_WRITER).collect::<Vec<_>>());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_and_writers_run_side_by_side() {
    let storage = Arc::new(InMemoryStorage::new());
    let address = Address::new("0xShared");

    let writer = tokio::spawn({
        let storage = storage.clone();
        let address = address.clone();
        async move {
            storage.add_address(&address).await.unwrap();
            for i in 0..500 {
                storage
                    .add_transaction(&address, transfer(&format!("0x{i}"), "0xShared", "0xB"))
                    .await
                    .unwrap();
            }
        }
    });
    let reader = tokio::spawn({
        let storage = storage.clone();
        let address = address.clone();
        async move {
            let mut last_len = 0;
            for _ in 0..500 {
                let len = storage.get_transactions(&address).await.unwrap().len();
                assert!(len >= last_len, "log shrank from {last_len} to {len}");
                last_len = len;
                tokio::task::yield_now().await;
            }
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();
    assert!(storage.is_subscribed(&address).await.unwrap());
    assert_eq!(storage.get_transactions(&address).await.unwrap().len(), 500);
}
